/*++

Licensed under the Apache-2.0 license.

File Name:

   main.rs

Abstract:

    Main entry point GSC Imaging application

--*/
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{arg, value_parser, Command};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod config;
mod dump;
mod headerinfo;
mod verify;

fn image_arg() -> clap::Arg {
    arg!(--"image" <FILE> "Flash image")
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

/// Entry point
fn main() -> ExitCode {
    let sub_cmds = vec![
        Command::new("verify")
            .about("Locate and verify every signed image in a flash image")
            .arg(image_arg())
            .arg(
                arg!(--"config" <FILE> "Verifier configuration and key table")
                    .required(false)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(arg!(--"skip-hash-checking" "Ignore checksums and the signed digest"))
            .arg(arg!(--"debug-buf" "Print the decrypted buffer of every image"))
            .arg(arg!(--"strict-keys" "Reject images signed with unknown keys"))
            .arg(
                arg!(--"seed" <U64> "Seed for the verifier randomness")
                    .required(false)
                    .value_parser(value_parser!(u64)),
            ),
        Command::new("headerinfo")
            .about("Print the decoded signed headers and manifests")
            .arg(image_arg())
            .arg(
                arg!(--"section" <NAME> "Only images in this section (RO_A, RW_A, RO_B, RW_B)")
                    .required(false)
                    .value_parser(value_parser!(String)),
            ),
        Command::new("dump")
            .about("Print the keys, signatures and fuse maps of every signed header as TOML")
            .arg(image_arg()),
    ];

    let cmd = Command::new("gsc-image-app")
        .arg_required_else_help(true)
        .subcommands(sub_cmds)
        .arg(arg!(-v --"verbose" "Verbose output").global(true))
        .about("GSC firmware imaging tools")
        .get_matches();

    let level = if cmd.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialize logging: {err}");
    }

    let result = match cmd.subcommand() {
        Some(("verify", args)) => verify::run_cmd(args),
        Some(("headerinfo", args)) => headerinfo::run_cmd(args).map(|()| true),
        Some(("dump", args)) => dump::run_cmd(args).map(|()| true),
        _ => unreachable!(),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
