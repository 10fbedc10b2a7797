//! `paychan keygen`: Generate a secp256k1 key pair.

use clap::Args;
use paychan_crypto::KeyPair;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct KeyOutput {
    address: String,
    secret: String,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    let keypair = KeyPair::generate();
    let output = KeyOutput {
        address: keypair.address().to_hex(),
        secret: format!("0x{}", hex::encode(keypair.secret_bytes())),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Address: {}", output.address);
        println!("Secret:  {}", output.secret);
    }
    Ok(())
}
