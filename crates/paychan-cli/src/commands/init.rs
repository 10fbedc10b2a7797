//! `paychan init`: Write a default protocol configuration.

use clap::Args;
use paychan_core::config::ProtocolConfig;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!(
            "configuration file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    ProtocolConfig::default().save(path)?;
    tracing::info!(path = %path.display(), "wrote default config");
    println!("Initialized protocol configuration at {}", path.display());
    println!("Edit it to set the registry, ledger and implementation addresses.");
    Ok(())
}
