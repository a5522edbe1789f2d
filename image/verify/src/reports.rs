/*++

Licensed under the Apache-2.0 license.

File Name:

    reports.rs

Abstract:

    Per candidate verification reports.

--*/

use std::fmt;

use gsc_error::GscError;
use gsc_image_types::*;

use crate::{ChecksumMatch, HashTriple, KeySource};

/// Structure found at a candidate offset
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageKind {
    /// Nothing structurally valid
    Unknown,

    Header(ChipFamily),

    Manifest(ManifestKind),
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Header(family) => write!(f, "{family} signed header"),
            Self::Manifest(ManifestKind::RomExt) => f.write_str("OpenTitan ROM_EXT manifest"),
            Self::Manifest(ManifestKind::OwnerFw) => f.write_str("OpenTitan owner manifest"),
        }
    }
}

/// Terminal state of a candidate
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Disposition {
    /// Not a structurally valid image
    Skipped(GscError),

    /// Valid structure that failed a checksum or the signature
    Rejected(GscError),

    Verified,
}

impl Disposition {
    pub fn error(&self) -> Option<GscError> {
        match self {
            Self::Skipped(err) | Self::Rejected(err) => Some(*err),
            Self::Verified => None,
        }
    }
}

/// First word of each computed digest
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HashHeads {
    pub img: u32,
    pub fuses: u32,
    pub info: u32,
}

impl From<&HashTriple> for HashHeads {
    fn from(hashes: &HashTriple) -> Self {
        Self {
            img: hashes.img_hash[0],
            fuses: hashes.fuses_hash[0],
            info: hashes.info_hash[0],
        }
    }
}

/// Full digests, recorded in verbose mode
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Diagnostics {
    pub hashes: HashTriple,
}

/// Outcome for one 2KB aligned offset
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CandidateReport {
    pub offset: usize,

    pub kind: ImageKind,

    pub disposition: Disposition,

    pub hash_heads: Option<HashHeads>,

    pub checksums: ChecksumMatch,

    pub unlocked: bool,

    pub key_source: Option<KeySource>,

    /// Unlocked through the warm boot digest without RSA
    pub warm_boot: bool,

    pub diagnostics: Option<Diagnostics>,

    /// Signature buffer after recovery and folding
    pub debug_buf: Option<RsaWords>,
}

impl CandidateReport {
    pub fn new(offset: usize, kind: ImageKind, disposition: Disposition) -> Self {
        Self {
            offset,
            kind,
            disposition,
            hash_heads: None,
            checksums: ChecksumMatch::empty(),
            unlocked: false,
            key_source: None,
            warm_boot: false,
            diagnostics: None,
            debug_buf: None,
        }
    }

    pub fn skipped(offset: usize, err: GscError) -> Self {
        Self::new(offset, ImageKind::Unknown, Disposition::Skipped(err))
    }

    pub fn is_candidate(&self) -> bool {
        !matches!(self.disposition, Disposition::Skipped(_))
    }

    pub fn is_verified(&self) -> bool {
        self.disposition == Disposition::Verified
    }

    /// Verified only against the key the image carries itself
    pub fn unverified_key(&self) -> bool {
        self.key_source
            .as_ref()
            .is_some_and(|source| source.is_unverified())
    }
}

impl fmt::Display for CandidateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}: {}: ", self.offset, self.kind)?;
        match self.disposition {
            Disposition::Verified if self.warm_boot => f.write_str("verified (warm boot)")?,
            Disposition::Verified => f.write_str("verified")?,
            Disposition::Rejected(err) => write!(f, "rejected, {err}")?,
            Disposition::Skipped(err) => write!(f, "skipped, {err}")?,
        }
        if let Some(source) = &self.key_source {
            write!(f, ", key {source}")?;
        }
        Ok(())
    }
}
