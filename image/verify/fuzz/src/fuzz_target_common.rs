// Licensed under the Apache-2.0 license

use gsc_image_types::*;
use gsc_image_verify::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn harness(data: &[u8]) {
    // The first byte selects the options, the rest is flash
    let Some((&options, flash)) = data.split_first() else {
        return;
    };
    let config = VerifyConfig {
        skip_hash_checking: options & 1 != 0,
        verbose: options & 2 != 0,
        debug_buf: options & 4 != 0,
        strict_keys: options & 8 != 0,
    };

    let keys = KeyTable::new();
    let scanner = ImageScanner::new(SimulatedOtp::default(), &keys, config);
    let mut ctx = VerifierContext::new(StdRng::seed_from_u64(u64::from(options)));
    let reports = scanner.scan(&mut ctx, flash, 0);

    assert_eq!(reports.len(), flash.len().div_ceil(CANDIDATE_ALIGNMENT));
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.offset, i * CANDIDATE_ALIGNMENT);
        if report.is_candidate() {
            assert!(report.offset + SIGNED_HEADER_SIZE <= flash.len());
        }
        if config.strict_keys {
            assert!(!report.is_verified() || report.warm_boot);
        }
    }
}
