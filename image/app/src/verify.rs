/*++

Licensed under the Apache-2.0 license.

File Name:

   verify.rs

Abstract:

    Scan a flash image and verify every signed image found in it

--*/

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use gsc_image_verify::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use zerocopy::IntoBytes;

use crate::config::{load_config, AppConfig};

/// Run the command
///
/// # Returns
///
/// * Whether at least one image verified
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<bool> {
    let image_path: &PathBuf = args
        .get_one::<PathBuf>("image")
        .with_context(|| "image arg not specified")?;

    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let (config, keys) = match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let config = load_config(path)?;
            let keys = config.key_table(path.parent().unwrap_or(Path::new(".")))?;
            (config, keys)
        }
        None => (
            AppConfig::default(),
            KeyTable::builtin().map_err(|err| anyhow!("Built-in key table: {err}"))?,
        ),
    };

    let mut verify_config = config.verify;
    verify_config.skip_hash_checking |= args.get_flag("skip-hash-checking");
    verify_config.verbose |= args.get_flag("verbose");
    verify_config.debug_buf |= args.get_flag("debug-buf");
    verify_config.strict_keys |= args.get_flag("strict-keys");

    let rng = match args.get_one::<u64>("seed") {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_entropy(),
    };
    let mut ctx = VerifierContext::new(rng);

    let scanner = ImageScanner::new(SimulatedOtp::default(), &keys, verify_config);
    let reports = scanner.scan(&mut ctx, &image, 0);

    let mut found = 0;
    let mut verified = 0;
    for report in reports.iter().filter(|r| r.is_candidate()) {
        found += 1;
        if report.is_verified() {
            verified += 1;
        }
        print_report(report);
    }

    println!(
        "{}: {found} image(s) found, {verified} verified",
        image_path.display()
    );
    if keys.is_empty() && verified > 0 {
        println!("No key table given; verified images are only self consistent");
    }

    Ok(verified > 0)
}

fn print_report(report: &CandidateReport) {
    println!("{report}");

    if report.unverified_key() {
        println!("  warning: signed with a key missing from the key table");
    }

    if let Some(heads) = &report.hash_heads {
        println!(
            "  img {:08x} {}  fuses {:08x} {}  info {:08x} {}",
            heads.img,
            mark(report.checksums.contains(ChecksumMatch::IMG)),
            heads.fuses,
            mark(report.checksums.contains(ChecksumMatch::FUSES)),
            heads.info,
            mark(report.checksums.contains(ChecksumMatch::INFO)),
        );
    }

    if let Some(diagnostics) = &report.diagnostics {
        let hashes = &diagnostics.hashes;
        println!("  Himg   = {}", hex::encode(hashes.img_hash.as_bytes()));
        println!("  Hfss   = {}", hex::encode(hashes.fuses_hash.as_bytes()));
        println!("  Hinf   = {}", hex::encode(hashes.info_hash.as_bytes()));
        println!("  Hfinal = {}", hex::encode(hashes.final_hash.as_bytes()));
    }

    if let Some(buf) = &report.debug_buf {
        println!("  Decrypted buffer:");
        for row in buf.chunks(8) {
            let row: Vec<String> = row.iter().map(|w| format!("{w:08x}")).collect();
            println!("    {}", row.join(" "));
        }
    }
}

fn mark(matched: bool) -> &'static str {
    if matched {
        "ok"
    } else {
        "MISMATCH"
    }
}
