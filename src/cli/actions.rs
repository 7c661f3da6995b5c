use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::{self, Write};

use clap::ArgMatches;

use crate::{
    api::modbus::{
        all_registers, register, Access, CancelToken, ControlCommand, DriveClient, DriveError,
        RegisterName, StatusHandler, StatusSample, SweepHandler, SweepRecord, ThreadSleep,
    },
    boot,
    cli::config::resolve_config,
};

/// Outcome of a single write, for `--json` output
#[derive(Serialize)]
struct WriteOutcome {
    timestamp: String,
    action: String,
    address: u16,
    value: u16,
}

/// Outcome of a single read, for `--json` output
#[derive(Serialize)]
struct ReadOutcome {
    timestamp: String,
    address: u16,
    value: u16,
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{json}");
    Ok(())
}

/// Renders status cycles on one overwritten terminal line, or as JSON lines.
struct ConsoleStatus {
    json: bool,
}

impl StatusHandler for ConsoleStatus {
    fn handle_sample(&mut self, sample: &StatusSample) {
        if self.json {
            if let Ok(s) = serde_json::to_string(sample) {
                println!("{s}");
            }
        } else {
            print!("\r{sample}");
            let _ = io::stdout().flush();
        }
    }

    fn handle_skipped(&mut self, error: &DriveError) {
        if !self.json {
            print!("\r{:<60}", format!("Read error: {error}"));
            let _ = io::stdout().flush();
        }
    }
}

struct ConsoleSweep {
    json: bool,
}

impl SweepHandler for ConsoleSweep {
    fn handle_record(&mut self, record: &SweepRecord) {
        if self.json {
            if let Ok(s) = serde_json::to_string(record) {
                println!("{s}");
            }
        } else {
            println!("{record}");
        }
    }

    fn handle_failed(&mut self, error: &DriveError) {
        if !self.json {
            eprintln!("Read error: {error:#}");
        }
    }
}

fn print_registers(json: bool) -> Result<()> {
    if json {
        return print_json(&all_registers());
    }
    println!("{:<14} {:>7} {:>6} {:<6} unit", "name", "address", "scale", "access");
    for def in all_registers() {
        let access = match def.access {
            Access::Read => "read",
            Access::Write => "write",
        };
        println!(
            "{:<14} {:>7} {:>6} {:<6} {}",
            def.name.to_string(),
            def.address,
            def.scale,
            access,
            def.unit
        );
    }
    Ok(())
}

fn send_command(client: &DriveClient, command: ControlCommand, json: bool) -> Result<()> {
    client.send(command)?;
    if json {
        print_json(&WriteOutcome {
            timestamp: timestamp(),
            action: command.to_string(),
            address: register(RegisterName::ControlWord).address,
            value: command.code(),
        })
    } else {
        println!("Command {command} (0x{:04X}) sent", command.code());
        Ok(())
    }
}

/// Run the subcommand selected on the command line.
pub fn run(matches: &ArgMatches) -> Result<()> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("No subcommand given, see --help"))?;
    let json = sub.get_flag("json");

    if name == "registers" {
        return print_registers(json);
    }

    let config = resolve_config(sub)?;
    let client = DriveClient::new(config);

    match name {
        "test" => {
            let report = client.test_connection()?;
            if json {
                print_json(&report)?;
            } else {
                println!("{report}");
            }
        }
        "monitor" => {
            let cancel = CancelToken::new();
            boot::install_interrupt_handler(cancel.clone())?;
            if !json {
                println!("Monitoring {} (Ctrl+C to stop)", client.config().port_name);
            }
            let mut console = ConsoleStatus { json };
            let summary = client.monitor(cancel, ThreadSleep, &mut console)?;
            if !json {
                println!();
                println!(
                    "Stopped: {} samples, {} skipped cycles",
                    summary.samples, summary.skipped
                );
            }
        }
        "dump" => {
            let cancel = CancelToken::new();
            boot::install_interrupt_handler(cancel.clone())?;
            let mut console = ConsoleSweep { json };
            let summary = client.dump(cancel, ThreadSleep, &mut console)?;
            if json {
                print_json(&summary)?;
            } else if let Some(address) = summary.fault_at {
                println!("Drive in FAULT at register {address}, dump stopped");
            } else {
                println!(
                    "Dump finished: {} registers, {} failed reads",
                    summary.records, summary.failed
                );
            }
        }
        "start" => send_command(&client, ControlCommand::Start, json)?,
        "stop" => send_command(&client, ControlCommand::Stop, json)?,
        "estop" => send_command(&client, ControlCommand::EmergencyStop, json)?,
        "reset" => send_command(&client, ControlCommand::ResetFault, json)?,
        "set-ref" => {
            let value = *sub
                .get_one::<f64>("value")
                .ok_or_else(|| anyhow!("Missing reference value"))?;
            let target = sub
                .get_one::<String>("target")
                .map(|s| s.parse::<RegisterName>())
                .transpose()?
                .unwrap_or(RegisterName::Reference1);
            let raw = client.set_reference_on(target, value)?;
            if json {
                print_json(&WriteOutcome {
                    timestamp: timestamp(),
                    action: format!("set-{target}"),
                    address: register(target).address,
                    value: raw,
                })?;
            } else {
                println!("Reference {target} set to {raw}");
            }
        }
        "read" => {
            let address = *sub
                .get_one::<u16>("address")
                .ok_or_else(|| anyhow!("Missing register address"))?;
            let value = client.read_register(address)?;
            if json {
                print_json(&ReadOutcome {
                    timestamp: timestamp(),
                    address,
                    value,
                })?;
            } else {
                println!("Register {address} = {value} (0x{value:04X})");
            }
        }
        "write" => {
            let address = *sub
                .get_one::<u16>("address")
                .ok_or_else(|| anyhow!("Missing register address"))?;
            let value = *sub
                .get_one::<u16>("value")
                .ok_or_else(|| anyhow!("Missing register value"))?;
            client.write_register(address, value)?;
            if json {
                print_json(&WriteOutcome {
                    timestamp: timestamp(),
                    action: "write".to_string(),
                    address,
                    value,
                })?;
            } else {
                println!("Wrote {value} (0x{value:04X}) to register {address}");
            }
        }
        other => return Err(anyhow!("Unknown subcommand: {other}")),
    }
    Ok(())
}
