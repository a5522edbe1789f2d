/*++

Licensed under the Apache-2.0 license.

File Name:

    sha256.rs

Abstract:

    File contains API for SHA-256 digests expressed as little-endian words.

--*/

use gsc_image_types::{ImageDigest, SHA256_DIGEST_WORD_SIZE};
use sha2::Digest;
use zerocopy::IntoBytes;

/// Multi step SHA-256 digest operation
#[derive(Default, Clone)]
pub struct Sha256 {
    hasher: sha2::Sha256,
}

impl Sha256 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate the digest of the buffer
    pub fn digest(data: &[u8]) -> ImageDigest {
        let mut op = Self::new();
        op.update(data);
        op.finalize()
    }

    /// Calculate the digest of words serialized in little-endian order
    pub fn digest_words(words: &[u32]) -> ImageDigest {
        let mut op = Self::new();
        op.update_words(words);
        op.finalize()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn update_words(&mut self, words: &[u32]) {
        for word in words {
            self.hasher.update(word.to_le_bytes());
        }
    }

    /// Finalize the digest; word `i` holds digest bytes `4i..4i+4` read little-endian.
    pub fn finalize(self) -> ImageDigest {
        let bytes = self.hasher.finalize();
        let mut digest = [0u32; SHA256_DIGEST_WORD_SIZE];
        digest.as_mut_bytes().copy_from_slice(bytes.as_slice());
        for word in digest.iter_mut() {
            *word = u32::from_le(*word);
        }
        digest
    }
}
