/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains crypto utilities needed to generate signed images.

--*/

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use gsc_drivers::{mont_inverse, PubExponent};
use gsc_image_gen::{ImageGeneratorCrypto, ImageGeneratorHasher, ImageGeneratorKeyConfig};
use gsc_image_types::*;
use openssl::bn::{BigNum, BigNumContext, BigNumRef};
use openssl::rsa::Rsa;
use openssl::sha::Sha256;

#[derive(Default)]
pub struct OsslCrypto {}

pub struct OsslSha256Hasher(Sha256);

impl ImageGeneratorHasher for OsslSha256Hasher {
    type Output = ImageDigest;

    fn update(&mut self, data: &[u8]) {
        self.0.update(data)
    }

    fn finish(self) -> Self::Output {
        let bytes = self.0.finish();
        let mut digest = [0u32; SHA256_DIGEST_WORD_SIZE];
        for (word, chunk) in digest.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        digest
    }
}

impl ImageGeneratorCrypto for OsslCrypto {
    type Sha256Hasher = OsslSha256Hasher;

    fn sha256_start(&self) -> Self::Sha256Hasher {
        OsslSha256Hasher(Sha256::new())
    }

    /// Calculate RSA Signature
    fn rsa_sign(
        &self,
        msg: &RsaWords,
        modulus: &RsaWords,
        priv_key: &RsaWords,
    ) -> anyhow::Result<RsaWords> {
        let mut ctx = BigNumContext::new()?;
        let n = from_hw_format(modulus)?;
        let d = from_hw_format(priv_key)?;
        let m = from_hw_format(msg)?;

        if m >= n {
            bail!("Encoded message does not fit the modulus");
        }

        let mut sig = BigNum::new()?;
        sig.mod_exp(&m, &d, &n, &mut ctx)?;

        // The boot ROM expects the signature premultiplied by R = 2^3072.
        let mut r = BigNum::new()?;
        r.set_bit(RSA_NUM_WORDS as i32 * 32)?;
        let mut sig_r = BigNum::new()?;
        sig_r.mod_mul(&sig, &r, &n, &mut ctx)?;

        to_hw_format(&sig_r)
    }
}

/// Read an RSA public key from a PEM file
pub fn rsa_pub_key_from_pem(path: &Path) -> anyhow::Result<ImageGeneratorKeyConfig> {
    let key_bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read public key PEM file {}", path.display()))?;
    let key = Rsa::public_key_from_pem(&key_bytes)
        .with_context(|| format!("Failed to parse public key PEM file {}", path.display()))?;
    key_config(key.n(), key.e(), None)
}

/// Read an RSA private key from a PEM file
pub fn rsa_priv_key_from_pem(path: &Path) -> anyhow::Result<ImageGeneratorKeyConfig> {
    let key_bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read private key PEM file {}", path.display()))?;
    let key = Rsa::private_key_from_pem(&key_bytes)
        .with_context(|| format!("Failed to parse private key PEM file {}", path.display()))?;
    key_config(key.n(), key.e(), Some(to_hw_format(key.d())?))
}

fn key_config(
    n: &BigNumRef,
    e: &BigNumRef,
    priv_key: Option<RsaWords>,
) -> anyhow::Result<ImageGeneratorKeyConfig> {
    if n.num_bits() > RSA_NUM_WORDS as i32 * 32 {
        bail!("Modulus is {} bits, at most 3072 supported", n.num_bits());
    }
    let e = e.to_dec_str()?.parse::<u32>()?;
    let exponent = PubExponent::try_from(e).map_err(|err| anyhow!("Exponent {e}: {err}"))?;
    let modulus = to_hw_format(n)?;

    Ok(ImageGeneratorKeyConfig {
        keyid: mont_inverse(modulus[0]),
        modulus,
        exponent,
        priv_key,
    })
}

/// Convert a big number into little-endian words
fn to_hw_format(value: &BigNumRef) -> anyhow::Result<RsaWords> {
    let bytes = value.to_vec_padded(RSA_NUM_BYTES as i32)?;
    let mut words = [0u32; RSA_NUM_WORDS];
    for (word, chunk) in words.iter_mut().zip(bytes.rchunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(words)
}

/// Convert little-endian words into a big number
fn from_hw_format(value: &RsaWords) -> anyhow::Result<BigNum> {
    let bytes: Vec<u8> = value.iter().rev().flat_map(|w| w.to_be_bytes()).collect();
    Ok(BigNum::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsc_drivers::RsaPubKey;
    use gsc_image_fake_keys::{DEV_KEY_2048_E3, DEV_KEY_3072_E3, DEV_KEY_3072_E65537};
    use gsc_image_gen::pkcs1_sha256_encode;

    #[test]
    fn test_sha256_words() {
        let crypto = OsslCrypto::default();
        assert_eq!(
            crypto.sha256_digest(b"abc").unwrap(),
            gsc_drivers::Sha256::digest(b"abc")
        );
    }

    #[test]
    fn test_sign_recovers_message() {
        let crypto = OsslCrypto::default();
        let digest = crypto.sha256_digest(b"signed image").unwrap();

        for key in [DEV_KEY_3072_E3, DEV_KEY_3072_E65537, DEV_KEY_2048_E3] {
            let msg = pkcs1_sha256_encode(&digest, key.is_legacy_2048());
            let sig = crypto
                .rsa_sign(&msg, &key.modulus, key.priv_key.as_ref().unwrap())
                .unwrap();
            let pub_key = RsaPubKey::new(key.keyid, key.modulus, key.exponent).unwrap();
            assert_eq!(pub_key.modpow(&sig), msg);
        }
    }

    #[test]
    fn test_hw_format() {
        let mut words = [0u32; RSA_NUM_WORDS];
        words[0] = 0x0102_0304;
        words[1] = 0x0506_0708;
        let bn = from_hw_format(&words).unwrap();
        assert_eq!(bn.to_vec(), vec![5, 6, 7, 8, 1, 2, 3, 4]);
        assert_eq!(to_hw_format(&bn).unwrap(), words);
    }

    #[test]
    fn test_key_from_generated_pem() {
        let rsa = Rsa::generate_with_e(2048, &BigNum::from_u32(65537).unwrap()).unwrap();
        let dir = std::env::temp_dir().join(format!("gsc-openssl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("key.pem");
        std::fs::write(&path, rsa.private_key_to_pem().unwrap()).unwrap();

        let key = rsa_priv_key_from_pem(&path).unwrap();
        assert!(key.is_legacy_2048());
        assert_eq!(key.exponent, PubExponent::E65537);
        assert_eq!(key.keyid.wrapping_mul(key.modulus[0]), u32::MAX);
        assert!(key.priv_key.is_some());

        std::fs::write(&path, rsa.public_key_to_pem().unwrap()).unwrap();
        let pub_key = rsa_pub_key_from_pem(&path).unwrap();
        assert_eq!(pub_key.modulus, key.modulus);
        assert!(pub_key.priv_key.is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
