pub mod actions;
pub mod config;

use clap::{Arg, ArgMatches, Command};

/// Parse a register address or value, accepting decimal or `0x` hex.
fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|err| format!("'{s}' is not a 16-bit register value: {err}"))
}

/// Build the `vfdctl` command tree.
pub fn build_command() -> Command {
    Command::new("vfdctl")
        .about("Supervisory client for Modbus RTU variable-frequency drives")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON configuration file")
                .value_name("FILE")
                .global(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Serial port of the drive")
                .value_name("PORT")
                .global(true),
        )
        .arg(
            Arg::new("baud-rate")
                .long("baud-rate")
                .help("Serial port baud rate")
                .value_name("BAUD")
                .value_parser(clap::value_parser!(u32))
                .global(true),
        )
        .arg(
            Arg::new("slave-id")
                .long("slave-id")
                .help("Modbus slave address of the drive")
                .value_name("ID")
                .value_parser(clap::value_parser!(u8))
                .global(true),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .help("Response timeout per exchange in milliseconds")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new("max-output")
                .long("max-output")
                .help("Upper bound accepted for reference setpoints")
                .value_name("VALUE")
                .value_parser(clap::value_parser!(f64))
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write debug logs to this file (also VFDCTL_LOG_FILE)")
                .value_name("FILE")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("Output results as JSON lines")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("test").about("Read frequency, current and fault state once"))
        .subcommand(Command::new("monitor").about("Poll drive status until Ctrl+C"))
        .subcommand(
            Command::new("dump").about("Read every register with the drive state, stop on fault"),
        )
        .subcommand(Command::new("start").about("Send the START command"))
        .subcommand(Command::new("stop").about("Send the STOP command"))
        .subcommand(Command::new("estop").about("Send the EMERGENCY STOP command"))
        .subcommand(Command::new("reset").about("Send the FAULT RESET command"))
        .subcommand(
            Command::new("set-ref")
                .about("Set a reference setpoint")
                .arg(
                    Arg::new("value")
                        .help("Setpoint, 0..=max output")
                        .value_name("VALUE")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .help("Reference register to write")
                        .value_name("REGISTER")
                        .value_parser(["reference_1", "reference_2"])
                        .default_value("reference_1"),
                ),
        )
        .subcommand(
            Command::new("read").about("Read one holding register").arg(
                Arg::new("address")
                    .help("Register address (decimal or 0x hex)")
                    .value_name("ADDR")
                    .required(true)
                    .value_parser(parse_u16),
            ),
        )
        .subcommand(
            Command::new("write")
                .about("Write one holding register")
                .arg(
                    Arg::new("address")
                        .help("Register address (decimal or 0x hex)")
                        .value_name("ADDR")
                        .required(true)
                        .value_parser(parse_u16),
                )
                .arg(
                    Arg::new("value")
                        .help("Raw value (decimal or 0x hex)")
                        .value_name("VALUE")
                        .required(true)
                        .value_parser(parse_u16),
                ),
        )
        .subcommand(Command::new("registers").about("List the drive register map"))
}

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}
