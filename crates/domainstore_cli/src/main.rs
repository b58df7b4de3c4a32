//! CLI smoke entry point.
//!
//! # Responsibility
//! - Start file logging under `<base>/logs` (next to the config file when
//!   one is given).
//! - Open a store from a config file or a base directory.
//! - Print every domain with its resource/prompt counts.
//!
//! Usage: `domainstore_cli <config.json | base_dir>`

use domainstore_core::{core_version, default_log_level, init_logging, DomainStore, StoreConfig};
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("domainstore: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let target = std::env::args()
        .nth(1)
        .ok_or("usage: domainstore_cli <config.json | base_dir>")?;
    let target = std::env::current_dir()?.join(target);
    let (config, base_dir) = if target.is_file() {
        let base_dir = target.parent().unwrap_or(Path::new("/")).to_path_buf();
        (StoreConfig::from_json_file(&target)?, base_dir)
    } else {
        (StoreConfig::under(&target), target)
    };
    init_logging(default_log_level(), base_dir.join("logs"))?;

    println!("domainstore_core version={}", core_version());
    let store = DomainStore::open(&config)?;
    for (domain, stats) in store.domain_overview()? {
        println!(
            "domain={domain} resources={} prompts={}",
            stats.resources, stats.prompts
        );
    }
    store.close()?;
    Ok(())
}
