/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    GSC Image Verification library.

--*/

mod hash_chain;
mod keys;
mod reports;
mod scanner;
mod validator;
mod verifier;

use gsc_drivers::*;
use gsc_image_types::*;
use serde::Deserialize;

pub use hash_chain::{ChecksumMatch, HashTriple};
pub use keys::{KeyEntry, KeyRole, KeySource, KeyTable, ResolvedKey};
pub use reports::{CandidateReport, Diagnostics, Disposition, HashHeads, ImageKind};
pub use scanner::{find_next_candidate, round_up_2kb, ImageScanner, CANDIDATE_ALIGNMENT};
pub use validator::{
    check_header, check_manifest, parse_candidate, valid_header, valid_manifest, Candidate,
};
pub use verifier::{ImageVerifier, VerifierContext, UNLOCK_SENTINEL, WARMBOOT_HASH};

/// Verification options
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Ignore checksum mismatches and leave the digest out of the signature fold
    pub skip_hash_checking: bool,

    /// Record full digests, and the decrypted buffer of failed images
    pub verbose: bool,

    /// Record the decrypted buffer of every image
    pub debug_buf: bool,

    /// Reject images whose key id is not in the key table instead of
    /// falling back to the header key
    pub strict_keys: bool,
}

/// Image Verification Environment
pub trait ImageVerificationEnv {
    /// Fuse bank the chip running this header would sense
    fn fuse_bank(&self, header: &SignedHeader) -> FuseBank;

    /// Info bank the chip running this header would sense
    fn info_bank(&self, header: &SignedHeader) -> InfoBank;
}

/// Simulated one-time-programmable memory
#[derive(Debug, Default, Clone)]
pub struct SimulatedOtp {
    info: InfoBank,
}

impl SimulatedOtp {
    pub fn new(info: InfoBank) -> Self {
        Self { info }
    }
}

impl ImageVerificationEnv for SimulatedOtp {
    fn fuse_bank(&self, header: &SignedHeader) -> FuseBank {
        FuseBank::for_header(header)
    }

    fn info_bank(&self, _header: &SignedHeader) -> InfoBank {
        self.info.clone()
    }
}
