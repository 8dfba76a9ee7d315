use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use nameservice::Params;

#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub params: Params,
    pub start_time: u64,
    pub name: String,
    pub genesis_out: Option<PathBuf>,
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        let params = match std::env::var("NAMESERVICE_PARAMS") {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read params file {path}"))?;
                Params::from_json(&json).with_context(|| format!("Invalid params in {path}"))?
            }
            Err(_) => Params::default(),
        };

        let start_time = match std::env::var("AUCTION_START") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("AUCTION_START must be unix seconds, got {v}"))?,
            Err(_) => now(),
        };

        let label = std::env::var("AUCTION_NAME").unwrap_or_else(|_| "wallet".to_string());
        if label.contains('.') {
            bail!("AUCTION_NAME must be a single label, got {label}");
        }
        let name = format!("{label}.{}", params.root_name);

        let genesis_out = std::env::var("GENESIS_OUT").ok().map(PathBuf::from);

        Ok(Self {
            params,
            start_time,
            name,
            genesis_out,
        })
    }
}

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
