/*++

Licensed under the Apache-2.0 license.

File Name:

    hash_chain.rs

Abstract:

    Image, fuse and info digests bound together by the signature.

--*/

use gsc_drivers::Sha256;
use gsc_error::{GscError, GscResult};
use gsc_image_types::*;
use zerocopy::IntoBytes;

use crate::ImageVerificationEnv;

bitflags::bitflags! {
    /// Header checksums that agree with the recomputed digests
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct ChecksumMatch : u32 {
        const IMG = 0b001;
        const FUSES = 0b010;
        const INFO = 0b100;
    }
}

/// Digests computed for one signed header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HashTriple {
    pub img_hash: ImageDigest,
    pub fuses_hash: ImageDigest,
    pub info_hash: ImageDigest,
    pub final_hash: ImageDigest,
}

impl HashTriple {
    /// Compute the digests for a header.
    ///
    /// # Arguments
    ///
    /// * `env`    - Source of the fuse and info banks
    /// * `header` - Validated signed header
    /// * `image`  - The image bytes, starting at the header; must hold at
    ///              least `image_size` bytes
    pub fn compute<Env: ImageVerificationEnv>(
        env: &Env,
        header: &SignedHeader,
        image: &[u8],
    ) -> GscResult<Self> {
        let signed = image
            .get(header.img_hash_range())
            .ok_or(GscError::IMAGE_VERIFIER_ERR_IMAGE_OUT_OF_BOUNDS)?;
        let img_hash = Sha256::digest(signed);

        let fuses = env.fuse_bank(header).sense(header);
        let fuses_hash = Sha256::digest_words(&fuses);

        let info = env.info_bank(header).sense(header);
        let info_hash = Sha256::digest_words(&info);

        let mut op = Sha256::new();
        op.update(img_hash.as_bytes());
        op.update(fuses_hash.as_bytes());
        op.update(info_hash.as_bytes());
        let final_hash = op.finalize();

        Ok(Self {
            img_hash,
            fuses_hash,
            info_hash,
            final_hash,
        })
    }

    /// Compare the header checksums with the first word of each digest
    pub fn checksums(&self, header: &SignedHeader) -> ChecksumMatch {
        let mut matched = ChecksumMatch::empty();
        matched.set(ChecksumMatch::IMG, header.img_chk() == self.img_hash[0]);
        matched.set(ChecksumMatch::FUSES, header.fuses_chk() == self.fuses_hash[0]);
        matched.set(ChecksumMatch::INFO, header.info_chk() == self.info_hash[0]);
        matched
    }

    /// Fail on the first mismatching checksum
    pub fn check(&self, header: &SignedHeader) -> GscResult<()> {
        let matched = self.checksums(header);
        if !matched.contains(ChecksumMatch::IMG) {
            Err(GscError::IMAGE_VERIFIER_ERR_IMG_CHECKSUM_MISMATCH)?;
        }
        if !matched.contains(ChecksumMatch::FUSES) {
            Err(GscError::IMAGE_VERIFIER_ERR_FUSES_CHECKSUM_MISMATCH)?;
        }
        if !matched.contains(ChecksumMatch::INFO) {
            Err(GscError::IMAGE_VERIFIER_ERR_INFO_CHECKSUM_MISMATCH)?;
        }
        Ok(())
    }
}
