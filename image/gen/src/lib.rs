/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data strucutres for the GSC signed image generator.

--*/

mod generator;

pub use generator::ImageGenerator;

use gsc_drivers::{InfoBank, PubExponent};
use gsc_image_types::*;

/// DER prefix of a PKCS#1 v1.5 SHA-256 DigestInfo
pub const SHA256_DIGEST_INFO: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];

pub trait ImageGeneratorHasher {
    type Output: Copy;

    fn update(&mut self, data: &[u8]);

    fn finish(self) -> Self::Output;
}

/// Image Generator Crypto Trait
pub trait ImageGeneratorCrypto {
    type Sha256Hasher: ImageGeneratorHasher<Output = ImageDigest>;

    fn sha256_start(&self) -> Self::Sha256Hasher;

    /// Calculate SHA-256 digest
    fn sha256_digest(&self, data: &[u8]) -> anyhow::Result<ImageDigest> {
        let mut hasher = self.sha256_start();
        hasher.update(data);
        Ok(hasher.finish())
    }

    /// Calculate an RSA signature of an encoded message
    ///
    /// # Arguments
    ///
    /// * `msg`      - Encoded message as little-endian words
    /// * `modulus`  - Public modulus
    /// * `priv_key` - Private exponent
    ///
    /// # Returns
    ///
    /// * Signature in Montgomery form, as the boot ROM consumes it
    fn rsa_sign(
        &self,
        msg: &RsaWords,
        modulus: &RsaWords,
        priv_key: &RsaWords,
    ) -> anyhow::Result<RsaWords>;
}

/// Image Generator Key Configuration
#[derive(Debug, Clone)]
pub struct ImageGeneratorKeyConfig {
    /// Key id, the Montgomery inverse of the modulus
    pub keyid: u32,

    pub modulus: RsaWords,

    pub exponent: PubExponent,

    /// Private exponent; images are left unsigned without one
    pub priv_key: Option<RsaWords>,
}

impl ImageGeneratorKeyConfig {
    pub fn is_legacy_2048(&self) -> bool {
        self.modulus[RSA_NUM_WORDS - 1] == 0
    }
}

/// Image Generator Configuration
#[derive(Debug, Clone)]
pub struct ImageGeneratorConfig {
    pub family: ChipFamily,

    pub key: ImageGeneratorKeyConfig,

    /// Content following the signed header
    pub payload: Vec<u8>,

    pub ro_base: u32,

    pub ro_max: u32,

    pub rx_max: u32,

    pub epoch: u32,

    pub major: u32,

    pub minor: u32,

    pub timestamp: u64,

    pub fusemap: [u32; FUSE_MAX / 32],

    pub infomap: [u32; INFO_MAX / 32],

    pub dev_id0: u32,

    pub dev_id1: u32,

    pub board_id: BoardId,

    pub rw_product_family: u32,

    pub config1: u32,

    /// Info bank the image checksum is computed against
    pub info_bank: InfoBank,
}

impl ImageGeneratorConfig {
    /// Create a configuration for an RW_A image of the given family
    pub fn new(family: ChipFamily, key: ImageGeneratorKeyConfig, payload: Vec<u8>) -> Self {
        let ro_base = match family {
            ChipFamily::Haven | ChipFamily::Citadel => 0x44000,
            ChipFamily::Dauntless => 0x84000,
        };
        let image_size = (SIGNED_HEADER_SIZE + payload.len()) as u32;

        Self {
            family,
            key,
            payload,
            ro_base,
            ro_max: ro_base.wrapping_add(image_size),
            rx_max: ro_base.wrapping_add(image_size),
            epoch: 0,
            major: 0,
            minor: 0,
            timestamp: 0,
            fusemap: [0; FUSE_MAX / 32],
            infomap: [0; INFO_MAX / 32],
            dev_id0: 0,
            dev_id1: 0,
            board_id: BoardId::default(),
            rw_product_family: 0,
            config1: 0,
            info_bank: InfoBank::default(),
        }
    }
}

/// Generated image
#[derive(Debug)]
pub struct ImageBundle {
    pub header: SignedHeader,

    pub payload: Vec<u8>,

    /// Digest the signature covers
    pub final_hash: ImageDigest,
}

impl ImageBundle {
    pub fn to_bytes(&self) -> Vec<u8> {
        use zerocopy::IntoBytes;

        let mut bytes = self.header.as_bytes().to_vec();
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// Encode a SHA-256 digest with PKCS#1 v1.5 padding.
///
/// The digest bytes occupy the low end of the big-endian message, which is
/// returned as little-endian words. Legacy 2048-bit keys get a 256 byte
/// encoding with the upper words left zero.
pub fn pkcs1_sha256_encode(digest: &ImageDigest, legacy_2048: bool) -> RsaWords {
    let len = if legacy_2048 { 256 } else { RSA_NUM_BYTES };

    let mut em = vec![0xffu8; len];
    em[0] = 0x00;
    em[1] = 0x01;
    let di_start = len - SHA256_DIGEST_BYTE_SIZE - SHA256_DIGEST_INFO.len();
    em[di_start - 1] = 0x00;
    em[di_start..di_start + SHA256_DIGEST_INFO.len()].copy_from_slice(&SHA256_DIGEST_INFO);
    for (i, word) in digest.iter().enumerate() {
        let start = len - SHA256_DIGEST_BYTE_SIZE + i * 4;
        em[start..start + 4].copy_from_slice(&word.to_le_bytes());
    }

    let mut words = [0u32; RSA_NUM_WORDS];
    for (word, chunk) in words.iter_mut().zip(em.rchunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkcs1_encoding_3072() {
        let digest = [0x0302_0100, 0, 0, 0, 0, 0, 0, 0x1f1e_1d1c];
        let words = pkcs1_sha256_encode(&digest, false);
        assert_eq!(words[95], 0x0001_ffff);
        assert_eq!(words[94], 0xffff_ffff);
        assert_eq!(words[0], 0x1c1d_1e1f);
        assert_eq!(words[7], 0x0001_0203);
        // 00 || DigestInfo, then the digest
        assert_eq!(words[8], 0x0500_0420);
        assert_eq!(words[12], 0x0030_3130);
        assert_eq!(words[13], 0xffff_ffff);
    }

    #[test]
    fn test_pkcs1_encoding_2048() {
        let words = pkcs1_sha256_encode(&[0; 8], true);
        assert_eq!(words[63], 0x0001_ffff);
        assert_eq!(words[62], 0xffff_ffff);
        assert!(words[64..].iter().all(|&w| w == 0));
    }
}
