/*++

Licensed under the Apache-2.0 license.

File Name:

   headerinfo.rs

Abstract:

    Print the decoded contents of every signed header and manifest

--*/

use std::path::PathBuf;

use anyhow::Context;
use chrono::DateTime;
use clap::ArgMatches;
use gsc_image_types::*;
use gsc_image_verify::{find_next_candidate, parse_candidate, Candidate};

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let image_path: &PathBuf = args
        .get_one::<PathBuf>("image")
        .with_context(|| "image arg not specified")?;
    let section = args.get_one::<String>("section");

    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let mut offset = 0;
    while let Some(found) = find_next_candidate(&image, offset) {
        match parse_candidate(&image, found) {
            Ok(Candidate::Header(header)) => {
                let family = header.family().context("Header without a chip family")?;
                let name = family.section(header.ro_base()).to_string();
                if section.map_or(true, |s| s.eq_ignore_ascii_case(&name)) {
                    print_header(found, family, &header);
                }
            }
            Ok(Candidate::Manifest(manifest)) => {
                if section.is_none() {
                    print_manifest(found, &manifest);
                }
            }
            Err(_) => {}
        }
        offset = found + 1;
    }

    Ok(())
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{timestamp:#x}"))
}

fn format_map(words: &[u32]) -> String {
    words
        .iter()
        .map(|w| format!("{w:08x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_header(offset: usize, family: ChipFamily, header: &SignedHeader) {
    println!("0x{offset:08x}: {family} signed header");
    println!("  section      : {}", family.section(header.ro_base()));
    println!(
        "  keyid        : {:#010x} ({})",
        header.keyid(),
        if header.signed_for_prod() { "prod" } else { "dev" }
    );
    println!("  image size   : {:#x}", header.image_size());
    println!("  ro           : {:#x}..{:#x}", header.ro_base(), header.ro_max());
    println!("  rx           : {:#x}..{:#x}", header.rx_base(), header.rx_max());
    println!(
        "  entry point  : +{:#x}",
        header.rx_base().wrapping_sub(header.ro_base())
    );
    println!("  version      : {}", header.version());
    println!("  timestamp    : {}", format_timestamp(header.timestamp()));
    println!("  img_chk      : {:#010x}", header.img_chk());
    println!("  fuses_chk    : {:#010x}", header.fuses_chk());
    println!("  info_chk     : {:#010x}", header.info_chk());
    println!("  fusemap      : {}", format_map(header.fusemap()));
    println!("  infomap      : {}", format_map(header.infomap()));
    println!("  config1      : {:#010x}", header.config1());
    println!("  applysec     : {:#010x}", header.applysec());

    let board_id = header.board_id();
    if board_id.is_blank() {
        println!("  board id     : any");
    } else {
        println!(
            "  board id     : {:08x}:{:08x}:{:08x}",
            board_id.id, board_id.mask, board_id.flags
        );
    }
    match header.rw_product_family() {
        0 => println!("  product      : any"),
        product => println!("  product      : {product:#010x}"),
    }

    if header.is_node_locked() {
        println!(
            "  node locked  : {:#010x} {:#010x}",
            header.dev_id0(),
            header.dev_id1()
        );
    }
    if !matches!(header.swap_mark(), 0 | SIGNED_HEADER_PADDING) {
        println!(
            "  swap mark    : size {:#x} at {:#x}",
            header.swap_mark_size(),
            header.swap_mark_offset()
        );
    }

    match header.trailer() {
        HeaderTrailer::FlashTrim(words) => println!("  flash trim   : {}", format_map(&words)),
        HeaderTrailer::ExtSig { keyid, .. } if keyid != SIGNED_HEADER_PADDING => {
            println!("  ext sig key  : {keyid:#010x}")
        }
        HeaderTrailer::ExtSig { .. } => {}
    }
}

fn print_manifest(offset: usize, manifest: &SignedManifest) {
    let kind = match manifest.kind() {
        Some(ManifestKind::RomExt) => "ROM_EXT",
        Some(ManifestKind::OwnerFw) => "owner firmware",
        None => "unknown",
    };
    println!("0x{offset:08x}: OpenTitan {kind} manifest");
    println!("  key id       : {:#010x}", manifest.key_id());
    println!("  image size   : {:#x}", manifest.image_size());
    println!(
        "  code         : {:#x}..{:#x}",
        manifest.code_start(),
        manifest.code_end()
    );
    println!("  entry point  : +{:#x}", manifest.entry_point());
    println!(
        "  version      : {}.{} (security {})",
        manifest.major(),
        manifest.minor(),
        manifest.security_version()
    );
    println!("  timestamp    : {}", format_timestamp(manifest.timestamp()));
}
