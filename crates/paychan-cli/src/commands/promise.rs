//! `paychan sign-promise` / `paychan recover-promise`.

use clap::Args;
use paychan_crypto::{KeyPair, Promise, Signature, SignedMessage};
use serde::Serialize;

use super::parse_word;

#[derive(Args, Debug)]
pub struct PromiseFields {
    /// Channel the promise is drawn on: a 32-byte hub channel id, or a
    /// channel address widened to a word.
    #[arg(long)]
    pub channel_id: String,

    /// Cumulative promised amount.
    #[arg(long)]
    pub amount: u128,

    /// Transactor fee.
    #[arg(long, default_value_t = 0)]
    pub fee: u128,

    /// Lock preimage (32-byte hex). Only its hash is signed.
    #[arg(long)]
    pub lock: String,
}

impl PromiseFields {
    fn promise(&self) -> anyhow::Result<Promise> {
        let channel_id = parse_channel(&self.channel_id)?;
        let lock = parse_word(&self.lock)?;
        Ok(Promise::new(channel_id, self.amount, self.fee, &lock))
    }
}

/// Accept either a 32-byte word or a 20-byte address.
fn parse_channel(s: &str) -> anyhow::Result<[u8; 32]> {
    match s.parse::<paychan_core::types::Address>() {
        Ok(address) => Ok(address.to_word()),
        Err(_) => parse_word(s),
    }
}

#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub fields: PromiseFields,

    /// Signer secret key (hex).
    #[arg(long)]
    pub key: String,
}

#[derive(Args, Debug)]
pub struct RecoverArgs {
    #[command(flatten)]
    pub fields: PromiseFields,

    /// 65-byte signature (hex).
    #[arg(long)]
    pub signature: String,
}

#[derive(Serialize)]
struct SignedPromise {
    signer: String,
    hashlock: String,
    signature: String,
}

pub fn sign(args: &SignArgs) -> anyhow::Result<()> {
    let keypair = KeyPair::from_hex(&args.key)?;
    let promise = args.fields.promise()?;
    let signature = promise.sign(&keypair)?;

    let output = SignedPromise {
        signer: keypair.address().to_hex(),
        hashlock: format!("0x{}", hex::encode(promise.hashlock)),
        signature: signature.to_hex(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn recover(args: &RecoverArgs) -> anyhow::Result<()> {
    let promise = args.fields.promise()?;
    let signature = Signature::from_hex(&args.signature)?;
    match promise.signer(signature.as_bytes()) {
        Some(signer) => println!("{signer}"),
        None => anyhow::bail!("signature does not recover to a valid signer"),
    }
    Ok(())
}
