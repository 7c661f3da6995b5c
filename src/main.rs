use anyhow::Result;

use vfdctl::{boot, cli};

fn main() -> Result<()> {
    let matches = cli::parse_args();
    boot::init_logger(cli::config::log_file(&matches));

    if let Err(err) = cli::actions::run(&matches) {
        log::error!("{err:#}");
        return Err(err);
    }
    Ok(())
}
