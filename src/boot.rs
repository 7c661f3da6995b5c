use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use std::io::{self, Write};

use env_logger::{Builder, Env, Target};

use crate::api::modbus::CancelToken;

pub const LOG_FILE_ENV: &str = "VFDCTL_LOG_FILE";

/// Initialize logging for the binary.
///
/// `log_file` (from `--log-file`) wins over `VFDCTL_LOG_FILE`. Without a
/// file, records go to stderr at `warn` unless `RUST_LOG` says otherwise.
pub fn init_logger(log_file: Option<&str>) {
    let path = log_file
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_FILE_ENV).ok());

    if let Some(path) = path {
        if let Err(err) = init_file_logger(&path) {
            eprintln!("Failed to initialize file logger at '{path}': {err}");
            init_stderr_logger();
        }
    } else {
        init_stderr_logger();
    }
}

fn init_stderr_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

fn init_file_logger(path: &str) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter_level(LevelFilter::Debug)
        .parse_default_env();
    builder.try_init().map_err(io::Error::other)?;

    log::info!("File logger initialized at {path}");

    Ok(())
}

/// Route Ctrl+C to `cancel`. Polling stops at the next cycle boundary and
/// the session closes normally.
pub fn install_interrupt_handler(cancel: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, stopping after the current cycle");
        cancel.cancel();
    })
    .context("Failed to install Ctrl+C handler")
}
