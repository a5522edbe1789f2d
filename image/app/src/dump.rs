/*++

Licensed under the Apache-2.0 license.

File Name:

   dump.rs

Abstract:

    Dump the signing keys of a flash image as a key table configuration

--*/

use std::path::PathBuf;

use anyhow::Context;
use clap::ArgMatches;
use gsc_drivers::PubExponent;
use gsc_image_types::*;
use gsc_image_verify::*;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_derive::Serialize;

use crate::config::KeyConfig;

/// Signature and sensing maps of one signed header
#[derive(Debug, Serialize)]
struct ImageDump {
    offset: u64,

    family: ChipFamily,

    section: String,

    keyid: u32,

    signature: String,

    fusemap: Vec<u32>,

    infomap: Vec<u32>,
}

/// Key table followed by the per image details
#[derive(Debug, Default, Serialize)]
struct Dump {
    keys: Vec<KeyConfig>,

    images: Vec<ImageDump>,
}

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let image_path: &PathBuf = args
        .get_one::<PathBuf>("image")
        .with_context(|| "image arg not specified")?;

    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let dump = dump_image(&image);
    print!("{}", toml::to_string(&dump).context("Failed to serialize dump")?);

    Ok(())
}

fn dump_image(image: &[u8]) -> Dump {
    let mut dump = Dump::default();

    let mut offset = 0;
    while let Some(found) = find_next_candidate(image, offset) {
        offset = found + 1;
        let Ok(Candidate::Header(header)) = parse_candidate(image, found) else {
            continue;
        };
        let Some(family) = header.family() else {
            continue;
        };
        let section = family.section(header.ro_base());

        dump.images.push(ImageDump {
            offset: found as u64,
            family,
            section: section.to_string(),
            keyid: header.keyid(),
            signature: hex::encode(zerocopy::IntoBytes::as_bytes(header.signature())),
            fusemap: header.fusemap().to_vec(),
            infomap: header.infomap().to_vec(),
        });

        if dump.keys.iter().any(|k| k.keyid == Some(header.keyid())) {
            continue;
        }

        // RO images are checked by the boot ROM, RW images by the RO loader
        let role = match section {
            ImageSection::RoA | ImageSection::RoB => KeyRole::Rom,
            _ => KeyRole::Loader,
        };
        let Some(exponent) = detect_exponent(image, found, &header, family, role) else {
            warn!(
                "Key {:#010x} at offset {found:#x} is not a valid public key",
                header.keyid()
            );
            continue;
        };

        dump.keys.push(KeyConfig {
            name: format!("{family} {role} {:08x}", header.keyid()),
            family,
            role,
            keyid: Some(header.keyid()),
            exponent: Some(exponent.value()),
            modulus: Some(header.key().to_vec()),
            pem: None,
        });
    }

    dump
}

/// The exponent under which the image verifies, defaulting to 3.
///
/// Returns `None` when the header key id does not match its modulus.
fn detect_exponent(
    image: &[u8],
    offset: usize,
    header: &SignedHeader,
    family: ChipFamily,
    role: KeyRole,
) -> Option<PubExponent> {
    let e65537 = PubExponent::E65537.value();
    let keyid = header.keyid();
    let entry = KeyEntry::new("e65537 check", family, role, keyid, header.key(), e65537).ok()?;
    let keys = KeyTable::try_from(vec![entry]).ok()?;
    let config = VerifyConfig {
        strict_keys: true,
        ..Default::default()
    };
    let verifier = ImageVerifier::new(SimulatedOtp::default(), &keys, config);
    let mut ctx = VerifierContext::new(StdRng::seed_from_u64(0));

    if verifier.verify_candidate(&mut ctx, image, offset).is_verified() {
        Some(PubExponent::E65537)
    } else {
        Some(PubExponent::E3)
    }
}
