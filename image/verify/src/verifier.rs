/*++

Licensed under the Apache-2.0 license.

File Name:

    verifier.rs

Abstract:

    This file is the main implementation of the GSC Image Verifier.

--*/

use gsc_drivers::*;
use gsc_image_types::*;
use log::{debug, info, warn};
use rand::{Rng, RngCore};

use crate::*;

/// Digest of the folded buffer of every correctly signed image
pub const UNLOCK_SENTINEL: ImageDigest = [
    0xE303EC7A, 0x68A03A27, 0xDD18053E, 0x39F8DBBD, 0x9B553578, 0xB4598244, 0xC59F62D1, 0x61B8509E,
];

/// Constant mixed into the warm boot ladder
pub const WARMBOOT_HASH: ImageDigest = [
    0xad2d98d3, 0xa95acac6, 0x0d247c19, 0xb5f0a100, 0x12044f20, 0xa8c2f5fd, 0x7f9bb2ce, 0xaab9ab98,
];

/// Fold stride; coprime with both the buffer and digest lengths so every
/// word is visited exactly once.
const FOLD_STEP: usize = 5;

/// Cross-candidate verifier state
pub struct VerifierContext<R: RngCore> {
    rng: R,

    /// Session secret XORed into the final digest on the warm path
    ladder: ImageDigest,

    /// Register value recorded after the last successful RSA verification
    warm_boot: Option<ImageDigest>,
}

impl<R: RngCore> VerifierContext<R> {
    /// Create a context, seeding the warm boot ladder from `rng`.
    pub fn new(mut rng: R) -> Self {
        let mut seed = [0u32; SHA256_DIGEST_WORD_SIZE];
        for word in seed.iter_mut() {
            *word = rng.next_u32();
        }

        let mut op = Sha256::new();
        op.update_words(&seed);
        op.update_words(&WARMBOOT_HASH);

        Self {
            rng,
            ladder: op.finalize(),
            warm_boot: None,
        }
    }

    pub fn ladder(&self) -> &ImageDigest {
        &self.ladder
    }

    pub fn warm_boot(&self) -> Option<&ImageDigest> {
        self.warm_boot.as_ref()
    }

    /// Unlock iff the register holds the sentinel or the warm boot digest.
    pub fn unlocked(&self, register: &ImageDigest) -> bool {
        *register == UNLOCK_SENTINEL || self.warm_boot.as_ref() == Some(register)
    }

    /// Try to unlock a previously verified image without RSA.
    pub fn warm_unlock(&self, final_hash: &ImageDigest) -> bool {
        self.unlocked(&self.warm_register(final_hash))
    }

    pub fn record_warm_boot(&mut self, final_hash: &ImageDigest) {
        self.warm_boot = Some(self.warm_register(final_hash));
    }

    fn warm_register(&self, final_hash: &ImageDigest) -> ImageDigest {
        let mut register = *final_hash;
        for (word, ladder) in register.iter_mut().zip(self.ladder.iter()) {
            *word ^= ladder;
        }
        register
    }

    /// Recover the signed message and fold the expected digest into it.
    ///
    /// # Arguments
    ///
    /// * `key`        - Resolved public key
    /// * `signature`  - Signature in Montgomery form
    /// * `final_hash` - Digest the signature must cover
    /// * `skip_hash`  - Fold a constant instead of `final_hash`
    ///
    /// # Returns
    ///
    /// * The folded buffer
    pub fn recover(
        &mut self,
        key: &RsaPubKey,
        signature: &RsaWords,
        final_hash: &ImageDigest,
        skip_hash: bool,
    ) -> RsaWords {
        let mut buf = key.modpow(signature);

        // Lift a 2048-bit encoding into the 3072-bit padding layout
        if key.is_legacy_2048() {
            buf[95] ^= buf[63];
            buf[63] ^= 0x1ffff;
            for word in buf[63..95].iter_mut() {
                *word ^= u32::MAX;
            }
        }

        let mut offset = self.rng.gen_range(0..RSA_NUM_WORDS);
        for _ in 0..RSA_NUM_WORDS {
            buf[offset] ^= 0x1000 + offset as u32;
            offset = (offset + FOLD_STEP) % RSA_NUM_WORDS;
        }

        // Every word ends up as 0x1010 iff the digest matches
        let mut offset = self.rng.gen_range(0..SHA256_DIGEST_WORD_SIZE);
        for _ in 0..SHA256_DIGEST_WORD_SIZE {
            if skip_hash {
                buf[offset] = 0x1010;
            } else {
                buf[offset] ^= final_hash[SHA256_DIGEST_WORD_SIZE - 1 - offset].swap_bytes()
                    ^ (offset as u32 + 0x10);
            }
            offset = (offset + FOLD_STEP) % SHA256_DIGEST_WORD_SIZE;
        }

        buf
    }

    /// Run the signature through the unlock oracle.
    ///
    /// # Returns
    ///
    /// * Whether the image unlocked, and the folded buffer
    pub fn verify_signature(
        &mut self,
        key: &RsaPubKey,
        signature: &RsaWords,
        final_hash: &ImageDigest,
        skip_hash: bool,
    ) -> (bool, RsaWords) {
        let buf = self.recover(key, signature, final_hash, skip_hash);
        let register = Sha256::digest_words(&buf);
        (self.unlocked(&register), buf)
    }
}

/// Image Verifier
pub struct ImageVerifier<'a, Env: ImageVerificationEnv> {
    /// Verification Environment
    env: Env,

    keys: &'a KeyTable,

    config: VerifyConfig,
}

impl<'a, Env: ImageVerificationEnv> ImageVerifier<'a, Env> {
    /// Create a new instance `ImageVerifier`
    ///
    /// # Arguments
    ///
    /// * `env`    - Environment
    /// * `keys`   - Known signing keys
    /// * `config` - Verification options
    pub fn new(env: Env, keys: &'a KeyTable, config: VerifyConfig) -> Self {
        Self { env, keys, config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Verify the structure at `offset`
    ///
    /// # Returns
    ///
    /// * `CandidateReport` - Report; structural failures are `Skipped`
    pub fn verify_candidate<R: RngCore>(
        &self,
        ctx: &mut VerifierContext<R>,
        buf: &[u8],
        offset: usize,
    ) -> CandidateReport {
        match parse_candidate(buf, offset) {
            Ok(Candidate::Header(header)) => self.verify_header(ctx, buf, offset, &header),
            Ok(Candidate::Manifest(manifest)) => self.verify_manifest(offset, &manifest),
            Err(err) => CandidateReport::skipped(offset, err),
        }
    }

    /// Verify a signed header
    fn verify_header<R: RngCore>(
        &self,
        ctx: &mut VerifierContext<R>,
        buf: &[u8],
        offset: usize,
        header: &SignedHeader,
    ) -> CandidateReport {
        let Some(family) = header.family() else {
            let err = GscError::IMAGE_VERIFIER_ERR_HEADER_MAGIC_INVALID;
            return CandidateReport::skipped(offset, err);
        };
        let kind = ImageKind::Header(family);

        let image = offset
            .checked_add(header.image_size() as usize)
            .and_then(|end| buf.get(offset..end));
        let hashes = match image.map(|image| HashTriple::compute(&self.env, header, image)) {
            Some(Ok(hashes)) => hashes,
            Some(Err(err)) => return CandidateReport::new(offset, kind, Disposition::Skipped(err)),
            None => {
                warn!(
                    "Image at offset {offset:#x} of size {:#x} runs past the buffer end",
                    header.image_size()
                );
                return CandidateReport::new(
                    offset,
                    kind,
                    Disposition::Skipped(GscError::IMAGE_VERIFIER_ERR_IMAGE_OUT_OF_BOUNDS),
                );
            }
        };

        let mut report = CandidateReport::new(offset, kind, Disposition::Verified);
        report.hash_heads = Some(HashHeads::from(&hashes));
        report.checksums = hashes.checksums(header);
        if self.config.verbose {
            report.diagnostics = Some(Diagnostics { hashes });
        }

        debug!(
            "Himg ={:08X}..{:08X} : {}",
            hashes.img_hash[0],
            hashes.img_hash[7],
            report.checksums.contains(ChecksumMatch::IMG)
        );
        debug!(
            "Hfss ={:08X}..{:08X} : {}",
            hashes.fuses_hash[0],
            hashes.fuses_hash[7],
            report.checksums.contains(ChecksumMatch::FUSES)
        );
        debug!(
            "Hinf ={:08X}..{:08X} : {}",
            hashes.info_hash[0],
            hashes.info_hash[7],
            report.checksums.contains(ChecksumMatch::INFO)
        );

        if !self.config.skip_hash_checking {
            if let Err(err) = hashes.check(header) {
                warn!("Image at offset {offset:#x} has invalid checksums");
                report.disposition = Disposition::Rejected(err);
                return report;
            }
        }

        let resolved = self.keys.resolve(header);
        if resolved.source.is_unverified() {
            if self.config.strict_keys {
                warn!(
                    "Image at offset {offset:#x} uses unknown key id {:#010x}",
                    header.keyid()
                );
                report.disposition =
                    Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_KEY_NOT_FOUND);
                return report;
            }
            warn!(
                "No known key with id {:#010x}, using the header key for offset {offset:#x}",
                header.keyid()
            );
        }
        report.key_source = Some(resolved.source);

        if ctx.warm_unlock(&hashes.final_hash) {
            info!("Image at offset {offset:#x} is verified (warm boot)");
            report.unlocked = true;
            report.warm_boot = true;
            return report;
        }

        let (unlocked, folded) = ctx.verify_signature(
            &resolved.key,
            header.signature(),
            &hashes.final_hash,
            self.config.skip_hash_checking,
        );
        report.unlocked = unlocked;

        if self.config.debug_buf || (self.config.verbose && !unlocked) {
            debug!("Calculated buf: {}", format_words(&folded));
            report.debug_buf = Some(folded);
        }

        if unlocked {
            ctx.record_warm_boot(&hashes.final_hash);
            info!("Image at offset {offset:#x} is verified");
        } else {
            warn!("Image at offset {offset:#x} contains an invalid signature");
            report.disposition =
                Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_SIGNATURE_MISMATCH);
        }

        report
    }

    /// Signed manifests are located and validated but have no signature path
    fn verify_manifest(&self, offset: usize, manifest: &SignedManifest) -> CandidateReport {
        let kind = match manifest.kind() {
            Some(kind) => ImageKind::Manifest(kind),
            None => ImageKind::Unknown,
        };
        warn!("Manifest at offset {offset:#x} cannot be verified");
        CandidateReport::new(
            offset,
            kind,
            Disposition::Rejected(GscError::IMAGE_VERIFIER_ERR_MANIFEST_VERIFY_UNSUPPORTED),
        )
    }
}

fn format_words(words: &[u32]) -> String {
    words
        .iter()
        .map(|word| format!("{word:08x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
