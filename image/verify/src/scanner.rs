/*++

Licensed under the Apache-2.0 license.

File Name:

    scanner.rs

Abstract:

    Walks a flash image on 2KB boundaries looking for signed images.

--*/

use log::debug;
use rand::RngCore;

use crate::*;

/// Signed images start on 2KB boundaries
pub const CANDIDATE_ALIGNMENT: usize = 2 * 1024;

/// Round an offset up to the next 2KB boundary if not on one already
pub fn round_up_2kb(offset: usize) -> usize {
    let mask = CANDIDATE_ALIGNMENT - 1;
    offset.saturating_add(mask) & !mask
}

/// Find the first structurally valid header or manifest at or after `offset`
pub fn find_next_candidate(buf: &[u8], offset: usize) -> Option<usize> {
    let mut offset = round_up_2kb(offset);
    while offset < buf.len() {
        if parse_candidate(buf, offset).is_ok() {
            return Some(offset);
        }
        offset = round_up_2kb(offset + 1);
    }
    None
}

/// Image Scanner
pub struct ImageScanner<'a, Env: ImageVerificationEnv> {
    verifier: ImageVerifier<'a, Env>,
}

impl<'a, Env: ImageVerificationEnv> ImageScanner<'a, Env> {
    /// Create a new instance `ImageScanner`
    ///
    /// # Arguments
    ///
    /// * `env`    - Environment
    /// * `keys`   - Known signing keys
    /// * `config` - Verification options
    pub fn new(env: Env, keys: &'a KeyTable, config: VerifyConfig) -> Self {
        Self {
            verifier: ImageVerifier::new(env, keys, config),
        }
    }

    /// Scan a buffer
    ///
    /// # Arguments
    ///
    /// * `ctx`   - Verifier context shared across scans
    /// * `buf`   - Flash image
    /// * `start` - Offset to start at, rounded up to a 2KB boundary
    ///
    /// # Returns
    ///
    /// * One report per 2KB boundary in `[round_up_2kb(start), buf.len())`
    pub fn scan<R: RngCore>(
        &self,
        ctx: &mut VerifierContext<R>,
        buf: &[u8],
        start: usize,
    ) -> Vec<CandidateReport> {
        let mut reports = Vec::new();
        let mut offset = round_up_2kb(start);

        while offset < buf.len() {
            let report = self.verifier.verify_candidate(ctx, buf, offset);
            if report.is_candidate() {
                debug!("{report}");
            }
            reports.push(report);
            offset = round_up_2kb(offset + 1);
        }

        reports
    }
}
