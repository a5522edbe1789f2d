// Licensed under the Apache-2.0 license

use gsc_drivers::InfoBank;
use gsc_error::GscError;
use gsc_image_fake_keys::*;
use gsc_image_gen::{ImageGenerator, ImageGeneratorConfig, ImageGeneratorKeyConfig};
use gsc_image_openssl::OsslCrypto;
use gsc_image_types::*;
use gsc_image_verify::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use zerocopy::IntoBytes;

const IMAGE_PAYLOAD_SIZE: usize = 3 * 1024;

fn ctx(seed: u64) -> VerifierContext<StdRng> {
    VerifierContext::new(StdRng::seed_from_u64(seed))
}

fn dev_keys() -> KeyTable {
    let mut keys = KeyTable::new();
    for (name, key, role) in [
        ("dev rom", &DEV_KEY_3072_E3, KeyRole::Rom),
        ("dev loader", &DEV_KEY_3072_E65537, KeyRole::Loader),
        ("dev legacy", &DEV_KEY_2048_E3, KeyRole::Loader),
    ] {
        let entry = KeyEntry::new(
            name,
            ChipFamily::Haven,
            role,
            key.keyid,
            &key.modulus,
            key.exponent.value(),
        )
        .unwrap();
        keys.insert(entry).unwrap();
    }
    keys
}

fn image_config(family: ChipFamily, key: &ImageGeneratorKeyConfig) -> ImageGeneratorConfig {
    let payload = (0..IMAGE_PAYLOAD_SIZE).map(|i| (i % 251) as u8).collect();
    let mut config = ImageGeneratorConfig::new(family, key.clone(), payload);
    config.epoch = 0;
    config.major = 4;
    config.minor = 22;
    config
}

fn generate(config: &ImageGeneratorConfig) -> Vec<u8> {
    ImageGenerator::new(OsslCrypto::default())
        .generate(config)
        .unwrap()
        .to_bytes()
}

/// Erased flash of `len` bytes with images placed at the given offsets
fn flash(len: usize, images: &[(usize, &[u8])]) -> Vec<u8> {
    let mut buf = vec![0xffu8; len];
    for (offset, image) in images {
        buf[*offset..*offset + image.len()].copy_from_slice(image);
    }
    buf
}

fn scan(keys: &KeyTable, config: VerifyConfig, buf: &[u8]) -> Vec<CandidateReport> {
    let scanner = ImageScanner::new(SimulatedOtp::default(), keys, config);
    scanner.scan(&mut ctx(0), buf, 0)
}

fn candidates(reports: &[CandidateReport]) -> Vec<&CandidateReport> {
    reports.iter().filter(|r| r.is_candidate()).collect()
}

#[test]
fn test_verify_3072_e3() {
    let _ = simple_logger::SimpleLogger::new().init();

    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(16 * 1024, &[(0, &image)]);
    let reports = scan(&dev_keys(), VerifyConfig::default(), &buf);

    // One report per 2KB boundary
    assert_eq!(reports.len(), 8);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.offset, i * CANDIDATE_ALIGNMENT);
    }

    let report = &reports[0];
    assert_eq!(report.kind, ImageKind::Header(ChipFamily::Haven));
    assert_eq!(report.disposition, Disposition::Verified);
    assert!(report.unlocked);
    assert!(!report.warm_boot);
    assert!(!report.unverified_key());
    assert_eq!(report.checksums, ChecksumMatch::all());
    assert_eq!(
        report.key_source,
        Some(KeySource::Table {
            name: "dev rom".into(),
            family: ChipFamily::Haven,
            role: KeyRole::Rom,
        })
    );
    assert!(report.debug_buf.is_none());

    assert_eq!(candidates(&reports).len(), 1);
}

#[test]
fn test_verify_3072_e65537() {
    let image = generate(&image_config(ChipFamily::Citadel, &DEV_KEY_3072_E65537));
    let buf = flash(8 * 1024, &[(0, &image)]);
    let reports = scan(&dev_keys(), VerifyConfig::default(), &buf);
    assert_eq!(reports[0].kind, ImageKind::Header(ChipFamily::Citadel));
    assert!(reports[0].is_verified());
}

#[test]
fn test_verify_legacy_2048() {
    let image = generate(&image_config(ChipFamily::Dauntless, &DEV_KEY_2048_E3));
    let buf = flash(8 * 1024, &[(0, &image)]);
    let reports = scan(&dev_keys(), VerifyConfig::default(), &buf);
    assert_eq!(reports[0].kind, ImageKind::Header(ChipFamily::Dauntless));
    assert!(reports[0].is_verified());
}

#[test]
fn test_tampered_payload_rejected_and_scan_continues() {
    let ro = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let rw = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E65537));
    let rw_offset = round_up_2kb(ro.len());
    let mut buf = flash(16 * 1024, &[(0, &ro), (rw_offset, &rw)]);
    buf[SIGNED_HEADER_SIZE + 100] ^= 0x01;

    let reports = scan(&dev_keys(), VerifyConfig::default(), &buf);
    let found = candidates(&reports);
    assert_eq!(found.len(), 2);

    assert_eq!(found[0].offset, 0);
    assert_eq!(
        found[0].disposition,
        Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_IMG_CHECKSUM_MISMATCH)
    );
    assert!(!found[0].checksums.contains(ChecksumMatch::IMG));
    assert!(found[0].key_source.is_none());

    assert_eq!(found[1].offset, rw_offset);
    assert!(found[1].is_verified());
}

#[test]
fn test_skip_hash_checking_ignores_digest() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let mut buf = flash(8 * 1024, &[(0, &image)]);
    buf[SIGNED_HEADER_SIZE + 100] ^= 0x01;

    let config = VerifyConfig {
        skip_hash_checking: true,
        ..Default::default()
    };
    let reports = scan(&dev_keys(), config, &buf);
    assert!(reports[0].is_verified());
    assert!(!reports[0].checksums.contains(ChecksumMatch::IMG));
}

#[test]
fn test_bad_signature() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let mut buf = flash(8 * 1024, &[(0, &image)]);
    // First signature word; outside the hashed region
    buf[4] ^= 0x80;

    let config = VerifyConfig {
        verbose: true,
        ..Default::default()
    };
    let reports = scan(&dev_keys(), config, &buf);
    let report = &reports[0];
    assert_eq!(report.checksums, ChecksumMatch::all());
    assert_eq!(
        report.disposition,
        Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_SIGNATURE_MISMATCH)
    );
    assert!(!report.unlocked);
    assert!(report.debug_buf.is_some());
    assert!(report.diagnostics.is_some());
}

#[test]
fn test_debug_buf_of_verified_image() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(4 * 1024, &[(0, &image)]);
    let config = VerifyConfig {
        debug_buf: true,
        ..Default::default()
    };
    let reports = scan(&dev_keys(), config, &buf);
    assert!(reports[0].is_verified());

    // A correctly signed image folds into the same buffer every time
    let debug_buf = reports[0].debug_buf.unwrap();
    assert!(debug_buf[..8].iter().all(|&w| w == 0x1010));
    assert_eq!(debug_buf[95], 0x1ffff ^ (0x1000 + 95));
}

#[test]
fn test_short_buffer_is_out_of_bounds() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let reports = scan(&dev_keys(), VerifyConfig::default(), &image[..3000]);

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].kind, ImageKind::Header(ChipFamily::Haven));
    assert_eq!(
        reports[0].disposition,
        Disposition::Skipped(GscError::IMAGE_VERIFIER_ERR_IMAGE_OUT_OF_BOUNDS)
    );
    assert_eq!(
        reports[1].disposition,
        Disposition::Skipped(GscError::IMAGE_VERIFIER_ERR_CANDIDATE_OUT_OF_BOUNDS)
    );
    assert!(candidates(&reports).is_empty());
}

#[test]
fn test_scan_is_idempotent() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(8 * 1024, &[(0, &image)]);
    let keys = dev_keys();
    let scanner = ImageScanner::new(SimulatedOtp::default(), &keys, VerifyConfig::default());

    let first = scanner.scan(&mut ctx(1), &buf, 0);
    let second = scanner.scan(&mut ctx(2), &buf, 0);
    assert_eq!(first, second);
}

#[test]
fn test_warm_boot_on_rescan() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(4 * 1024, &[(0, &image)]);
    let keys = dev_keys();
    let scanner = ImageScanner::new(SimulatedOtp::default(), &keys, VerifyConfig::default());
    let mut ctx = ctx(3);

    let cold = scanner.scan(&mut ctx, &buf, 0);
    assert!(cold[0].is_verified());
    assert!(!cold[0].warm_boot);
    assert!(ctx.warm_boot().is_some());

    let warm = scanner.scan(&mut ctx, &buf, 0);
    assert!(warm[0].is_verified());
    assert!(warm[0].warm_boot);
    assert_eq!(warm[0].key_source, cold[0].key_source);
    assert_eq!(
        warm[0].to_string(),
        "0x00000000: Haven signed header: verified (warm boot), key dev rom (Haven rom)"
    );
}

#[test]
fn test_warm_boot_keeps_header_key_label() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(4 * 1024, &[(0, &image)]);
    let keys = KeyTable::new();
    let scanner = ImageScanner::new(SimulatedOtp::default(), &keys, VerifyConfig::default());
    let mut ctx = ctx(4);

    let cold = scanner.scan(&mut ctx, &buf, 0);
    assert!(cold[0].is_verified());
    assert!(cold[0].unverified_key());

    let warm = scanner.scan(&mut ctx, &buf, 0);
    assert!(warm[0].is_verified());
    assert!(warm[0].warm_boot);
    assert!(warm[0].unverified_key());
    assert_eq!(warm[0].key_source, Some(KeySource::HeaderFallback));
}

#[test]
fn test_strict_keys_after_warm_boot() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(4 * 1024, &[(0, &image)]);
    let keys = KeyTable::new();
    let mut ctx = ctx(5);

    let lenient = ImageScanner::new(SimulatedOtp::default(), &keys, VerifyConfig::default());
    assert!(lenient.scan(&mut ctx, &buf, 0)[0].is_verified());
    assert!(ctx.warm_boot().is_some());

    let config = VerifyConfig {
        strict_keys: true,
        ..Default::default()
    };
    let strict = ImageScanner::new(SimulatedOtp::default(), &keys, config);
    let reports = strict.scan(&mut ctx, &buf, 0);
    assert_eq!(
        reports[0].disposition,
        Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_KEY_NOT_FOUND)
    );
    assert!(!reports[0].warm_boot);
}

#[test]
fn test_header_key_fallback() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(4 * 1024, &[(0, &image)]);

    let reports = scan(&KeyTable::new(), VerifyConfig::default(), &buf);
    assert!(reports[0].is_verified());
    assert!(reports[0].unverified_key());
    assert_eq!(reports[0].key_source, Some(KeySource::HeaderFallback));

    // The fallback always uses exponent 3
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E65537));
    let buf = flash(4 * 1024, &[(0, &image)]);
    let reports = scan(&KeyTable::new(), VerifyConfig::default(), &buf);
    assert_eq!(
        reports[0].disposition,
        Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_SIGNATURE_MISMATCH)
    );
}

#[test]
fn test_strict_keys() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(4 * 1024, &[(0, &image)]);
    let config = VerifyConfig {
        strict_keys: true,
        ..Default::default()
    };

    let reports = scan(&KeyTable::new(), config, &buf);
    assert_eq!(
        reports[0].disposition,
        Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_KEY_NOT_FOUND)
    );

    let reports = scan(&dev_keys(), config, &buf);
    assert!(reports[0].is_verified());
}

#[test]
fn test_manifest_is_unsupported() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let mut manifest = SignedManifest::default();
    manifest
        .set_identifier(ID_ROM_EXT)
        .set_image_size(0x1000)
        .set_code_start(0x400)
        .set_code_end(0x800)
        .set_entry_point(0x400);
    let manifest_offset = round_up_2kb(image.len());
    let buf = flash(
        8 * 1024,
        &[(0, &image), (manifest_offset, manifest.as_bytes())],
    );

    let reports = scan(&dev_keys(), VerifyConfig::default(), &buf);
    let found = candidates(&reports);
    assert_eq!(found.len(), 2);
    assert!(found[0].is_verified());
    assert_eq!(found[1].offset, manifest_offset);
    assert_eq!(found[1].kind, ImageKind::Manifest(ManifestKind::RomExt));
    assert_eq!(
        found[1].disposition,
        Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_MANIFEST_VERIFY_UNSUPPORTED)
    );
    assert_eq!(find_next_candidate(&buf, 1), Some(manifest_offset));
}

#[test]
fn test_scan_start_offset() {
    let image = generate(&image_config(ChipFamily::Haven, &DEV_KEY_3072_E3));
    let buf = flash(16 * 1024, &[(8 * 1024, &image)]);
    let keys = dev_keys();
    let scanner = ImageScanner::new(SimulatedOtp::default(), &keys, VerifyConfig::default());

    let reports = scanner.scan(&mut ctx(4), &buf, 8 * 1024 - 100);
    assert_eq!(reports[0].offset, 8 * 1024);
    assert!(reports[0].is_verified());
    assert_eq!(find_next_candidate(&buf, 0), Some(8 * 1024));
}

#[test]
fn test_node_locked_image() {
    let mut config = image_config(ChipFamily::Haven, &DEV_KEY_3072_E3);
    config.dev_id0 = 0x1234_5678;
    config.dev_id1 = 0x9abc_def0;
    let image = generate(&config);
    let buf = flash(4 * 1024, &[(0, &image)]);
    assert!(scan(&dev_keys(), VerifyConfig::default(), &buf)[0].is_verified());
}

#[test]
fn test_fusemap_selected_image() {
    let mut config = image_config(ChipFamily::Haven, &DEV_KEY_3072_E3);
    config.fusemap[0] = 1 << 6 | 1 << 7;
    config.fusemap[2] = 1 << 3;
    config.dev_id0 = 0x0bad_f00d;
    let image = generate(&config);
    let buf = flash(4 * 1024, &[(0, &image)]);
    assert!(scan(&dev_keys(), VerifyConfig::default(), &buf)[0].is_verified());
}

#[test]
fn test_infomap_selects_info_bank() {
    let mut words = [0xffff_ffffu32; INFO_MAX];
    words[3] = 0x0000_0042;
    let info = InfoBank::new(words);

    let mut config = image_config(ChipFamily::Haven, &DEV_KEY_3072_E3);
    config.infomap[0] = 1 << 3;
    config.info_bank = info.clone();
    let image = generate(&config);
    let buf = flash(4 * 1024, &[(0, &image)]);
    let keys = dev_keys();

    let scanner = ImageScanner::new(SimulatedOtp::new(info), &keys, VerifyConfig::default());
    assert!(scanner.scan(&mut ctx(5), &buf, 0)[0].is_verified());

    // An erased info bank senses differently
    let scanner = ImageScanner::new(SimulatedOtp::default(), &keys, VerifyConfig::default());
    let reports = scanner.scan(&mut ctx(5), &buf, 0);
    assert_eq!(
        reports[0].disposition,
        Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_INFO_CHECKSUM_MISMATCH)
    );
    assert_eq!(
        reports[0].checksums,
        ChecksumMatch::IMG | ChecksumMatch::FUSES
    );
}

#[test]
fn test_erased_flash_has_no_candidates() {
    let reports = scan(&dev_keys(), VerifyConfig::default(), &[0xffu8; 8 * 1024]);
    assert_eq!(reports.len(), 4);
    assert!(candidates(&reports).is_empty());
    assert!(reports.iter().all(|r| matches!(
        r.disposition,
        Disposition::Skipped(GscError::IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_RESERVED_BITS)
    )));
}
