pub mod address;
pub mod init;
pub mod keygen;
pub mod promise;
pub mod simulate;

use anyhow::Context;
use paychan_core::config::ProtocolConfig;
use std::path::Path;

/// Load the configuration at `path`, or the defaults when the file does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<ProtocolConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ProtocolConfig::default());
    }
    ProtocolConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

/// Parse a 32-byte hex word, with or without `0x`.
pub fn parse_word(s: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = hex::decode(s.trim_start_matches("0x")).context("invalid hex")?;
    let word: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected 32 bytes, got {}", bytes.len()))?;
    Ok(word)
}
