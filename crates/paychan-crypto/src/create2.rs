//! Deterministic deployment addresses.
//!
//! An instance is a minimal proxy pointing at a shared implementation. Its
//! address is `keccak256(0xff ‖ deployer ‖ salt ‖ keccak256(proxy_code))[12..]`,
//! which is known before anything is deployed there.

use paychan_core::types::Address;

use crate::hashing::{keccak256, Hash, Packed};

/// EIP-1167 minimal proxy bytecode; bytes 20..40 hold the implementation address.
const MINIMAL_PROXY_TEMPLATE: [u8; 55] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d,
    0x3d, 0x36, 0x3d, 0x73, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe,
    0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0xbe, 0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d,
    0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

const IMPLEMENTATION_OFFSET: usize = 20;
const CREATE2_PREFIX: u8 = 0xff;

/// Proxy bytecode forwarding to `implementation`.
pub fn proxy_code(implementation: &Address) -> Vec<u8> {
    let mut code = MINIMAL_PROXY_TEMPLATE.to_vec();
    code[IMPLEMENTATION_OFFSET..IMPLEMENTATION_OFFSET + 20].copy_from_slice(implementation.as_bytes());
    code
}

/// Hash of the proxy bytecode for `implementation`.
pub fn proxy_code_hash(implementation: &Address) -> Hash {
    keccak256(&proxy_code(implementation))
}

/// Address code with hash `code_hash` lands at when `deployer` deploys it with `salt`.
pub fn create2_address(deployer: &Address, salt: &Hash, code_hash: &Hash) -> Address {
    let digest = Packed::new()
        .bytes(&[CREATE2_PREFIX])
        .address(deployer)
        .word(salt)
        .word(code_hash)
        .hash();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address(out)
}

/// Salt of an identity's channel with one accountant: `keccak256(identity ‖ accountant)`.
pub fn channel_salt(identity: &Address, accountant: &Address) -> Hash {
    Packed::new().address(identity).address(accountant).hash()
}

/// Salt of an accountant: its operator address widened to a word.
pub fn accountant_salt(operator: &Address) -> Hash {
    operator.to_word()
}
