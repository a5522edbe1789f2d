/*++

Licensed under the Apache-2.0 license.

File Name:

    mont.rs

Abstract:

    File contains the division free Montgomery engine used for RSA signature recovery.

--*/

use gsc_error::{GscError, GscResult};
use gsc_image_types::{RsaWords, RSA_NUM_WORDS};

/// RSA public exponent supported by the boot ROM
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PubExponent {
    E3,
    E65537,
}

impl PubExponent {
    pub fn value(&self) -> u32 {
        match self {
            Self::E3 => 3,
            Self::E65537 => 65537,
        }
    }
}

impl TryFrom<u32> for PubExponent {
    type Error = GscError;

    fn try_from(value: u32) -> GscResult<Self> {
        match value {
            3 => Ok(Self::E3),
            65537 => Ok(Self::E65537),
            _ => Err(GscError::DRIVER_MONT_UNSUPPORTED_EXPONENT),
        }
    }
}

/// Compute `-1/n0 mod 2^32`, the Montgomery inverse a GSC key id carries.
pub fn mont_inverse(n0: u32) -> u32 {
    // Newton iteration doubles the number of correct low bits each round.
    let mut inv: u32 = 1;
    for _ in 0..5 {
        inv = inv.wrapping_mul(2u32.wrapping_sub(n0.wrapping_mul(inv)));
    }
    inv.wrapping_neg()
}

/// RSA public key in the GSC layout: a key id, which is the Montgomery
/// inverse of the modulus, followed by the modulus as little-endian words.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RsaPubKey {
    n0inv: u32,
    modulus: RsaWords,
    exponent: PubExponent,
}

impl RsaPubKey {
    /// Create a key, checking that the modulus is odd and `n0inv` is its inverse.
    pub fn new(n0inv: u32, modulus: RsaWords, exponent: PubExponent) -> GscResult<Self> {
        if modulus[0] & 1 == 0 {
            Err(GscError::DRIVER_MONT_MODULUS_EVEN)?;
        }
        if n0inv.wrapping_mul(modulus[0]) != u32::MAX {
            Err(GscError::DRIVER_MONT_INVERSE_MISMATCH)?;
        }
        Ok(Self {
            n0inv,
            modulus,
            exponent,
        })
    }

    /// Create a key from untrusted header words. The result is only meaningful
    /// when the words happen to describe a consistent key.
    pub fn from_raw(n0inv: u32, modulus: RsaWords, exponent: PubExponent) -> Self {
        Self {
            n0inv,
            modulus,
            exponent,
        }
    }

    pub fn n0inv(&self) -> u32 {
        self.n0inv
    }

    pub fn modulus(&self) -> &RsaWords {
        &self.modulus
    }

    pub fn exponent(&self) -> PubExponent {
        self.exponent
    }

    /// Legacy 2048-bit keys leave the top modulus word empty.
    pub fn is_legacy_2048(&self) -> bool {
        self.modulus[RSA_NUM_WORDS - 1] == 0
    }

    /// `d = (d + a * b) / R mod n`, reduced by one subtraction on carry out.
    pub fn mont_mul_add(&self, d: &mut RsaWords, a: u32, b: &RsaWords) {
        let n = &self.modulus;
        let a = a as u64;

        let mut acc_a = a * b[0] as u64 + d[0] as u64;
        let d0 = (acc_a as u32).wrapping_mul(self.n0inv) as u64;
        let mut acc_b = d0 * n[0] as u64 + (acc_a as u32) as u64;
        acc_a >>= 32;
        acc_b >>= 32;

        for i in 1..RSA_NUM_WORDS {
            acc_a += a * b[i] as u64 + d[i] as u64;
            acc_b += d0 * n[i] as u64 + (acc_a as u32) as u64;
            d[i - 1] = acc_b as u32;
            acc_a >>= 32;
            acc_b >>= 32;
        }

        acc_a += acc_b;
        d[RSA_NUM_WORDS - 1] = acc_a as u32;

        if acc_a >> 32 != 0 {
            self.sub_m(d);
        }
    }

    /// `c = a * b / R mod n`
    pub fn mont_mul(&self, c: &mut RsaWords, a: &RsaWords, b: &RsaWords) {
        c.fill(0);
        for &word in a.iter() {
            self.mont_mul_add(c, word, b);
        }
    }

    /// `c = a / R mod n`, fully reduced below `n`.
    pub fn mont_mul1(&self, c: &mut RsaWords, a: &RsaWords) {
        c.fill(0);
        self.mont_mul_add(c, 1, a);
        for _ in 1..RSA_NUM_WORDS {
            self.mont_mul_add(c, 0, a);
        }
        if self.ge_m(c) {
            self.sub_m(c);
        }
    }

    /// Raise a Montgomery form signature to the public exponent.
    ///
    /// # Arguments
    ///
    /// * `signature` - `s * R mod n`
    ///
    /// # Returns
    ///
    /// * `s^e mod n` in normal form
    pub fn modpow(&self, signature: &RsaWords) -> RsaWords {
        let mut aa_r = [0u32; RSA_NUM_WORDS];
        let mut aaa_r = [0u32; RSA_NUM_WORDS];
        let mut out = [0u32; RSA_NUM_WORDS];

        match self.exponent {
            PubExponent::E3 => {
                self.mont_mul(&mut aa_r, signature, signature);
                self.mont_mul(&mut aaa_r, &aa_r, signature);
            }
            PubExponent::E65537 => {
                self.mont_mul(&mut aa_r, signature, signature);
                for _ in 0..7 {
                    self.mont_mul(&mut aaa_r, &aa_r, &aa_r);
                    self.mont_mul(&mut aa_r, &aaa_r, &aaa_r);
                }
                self.mont_mul(&mut aaa_r, &aa_r, &aa_r);
                aa_r = aaa_r;
                self.mont_mul(&mut aaa_r, &aa_r, signature);
            }
        }

        self.mont_mul1(&mut out, &aaa_r);
        out
    }

    /// Subtract the modulus, ignoring the final borrow.
    fn sub_m(&self, d: &mut RsaWords) {
        let mut borrow: i64 = 0;
        for (word, n) in d.iter_mut().zip(self.modulus.iter()) {
            borrow += *word as i64 - *n as i64;
            *word = borrow as u32;
            borrow >>= 32;
        }
    }

    fn ge_m(&self, a: &RsaWords) -> bool {
        for (word, n) in a.iter().rev().zip(self.modulus.iter().rev()) {
            if word != n {
                return word > n;
            }
        }
        true
    }
}
