use anyhow::Result;
use clap::ArgMatches;

use crate::api::modbus::{DriveConfig, DriveConfigBuilder};

/// Resolve the drive configuration: defaults, then `--config FILE`, then
/// individual flags.
///
/// `matches` are the subcommand's matches, which carry the global flags.
pub fn resolve_config(matches: &ArgMatches) -> Result<DriveConfig> {
    let base = match matches.get_one::<String>("config") {
        Some(path) => DriveConfig::from_file(path)?,
        None => DriveConfig::default(),
    };

    let mut builder = DriveConfigBuilder::from(base);
    if let Some(port) = matches.get_one::<String>("port") {
        builder = builder.with_port(port);
    }
    if let Some(&baud_rate) = matches.get_one::<u32>("baud-rate") {
        builder = builder.with_baud_rate(baud_rate);
    }
    if let Some(&slave_id) = matches.get_one::<u8>("slave-id") {
        builder = builder.with_slave_id(slave_id);
    }
    if let Some(&timeout_ms) = matches.get_one::<u64>("timeout-ms") {
        builder = builder.with_timeout(timeout_ms);
    }
    if let Some(&max_output) = matches.get_one::<f64>("max-output") {
        builder = builder.with_max_output(max_output);
    }

    let config = builder.build()?;
    log::debug!("Resolved configuration: {config:?}");
    Ok(config)
}

/// `--log-file`, if given on the command line.
pub fn log_file(matches: &ArgMatches) -> Option<&str> {
    let sub = matches.subcommand().map(|(_, sub)| sub).unwrap_or(matches);
    sub.get_one::<String>("log-file").map(String::as_str)
}
