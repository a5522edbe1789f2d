/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the GSC image libraries for error handling

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// GSC Error Type
/// Derives debug, copy, clone, eq, and partial eq
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GscError(pub NonZeroU32);

/// Broad failure classes a verification candidate can end in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorClass {
    /// Magic, range or bounds check failed. The candidate is skipped.
    StructuralInvalid,

    /// A header checksum disagrees with the recomputed digest.
    ChecksumMismatch,

    /// No key table entry matched the header key id.
    KeyNotFound,

    /// The signature did not unlock the image.
    SignatureMismatch,

    /// Key table or configuration content is malformed.
    Config,

    /// Arithmetic engine misuse.
    Driver,
}

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: GscError = GscError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(&'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl GscError {
    /// Create a GSC error; intended to only be used from const contexts, as we don't want
    /// runtime panics if val is zero. The preferred way to get a GscError from a u32 is to
    /// use `GscError::try_from()` from the `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("GscError cannot be 0"),
        }
    }

    define_error_constants![
        (
            DRIVER_MONT_MODULUS_EVEN,
            0x0001_0001,
            "Driver Error: Montgomery modulus must be odd"
        ),
        (
            DRIVER_MONT_INVERSE_MISMATCH,
            0x0001_0002,
            "Driver Error: Montgomery inverse does not match modulus"
        ),
        (
            DRIVER_MONT_UNSUPPORTED_EXPONENT,
            0x0001_0003,
            "Driver Error: Public exponent is neither 3 nor 65537"
        ),
        (
            IMAGE_VERIFIER_ERR_CANDIDATE_OUT_OF_BOUNDS,
            0x000b_0001,
            "Image Verifier Error: Candidate structure extends past the buffer end"
        ),
        (
            IMAGE_VERIFIER_ERR_NO_IMAGE_STRUCTURE,
            0x000b_0002,
            "Image Verifier Error: Neither a signed header nor a signed manifest"
        ),
        (
            IMAGE_VERIFIER_ERR_HEADER_MAGIC_INVALID,
            0x000b_0003,
            "Image Verifier Error: Signed header magic invalid"
        ),
        (
            IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_TOO_SMALL,
            0x000b_0004,
            "Image Verifier Error: Signed header image size below minimum"
        ),
        (
            IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_RESERVED_BITS,
            0x000b_0005,
            "Image Verifier Error: Signed header image size uses cryptolib header bits"
        ),
        (
            IMAGE_VERIFIER_ERR_HEADER_RX_BASE_MISMATCH,
            0x000b_0006,
            "Image Verifier Error: Rx base does not follow the header"
        ),
        (
            IMAGE_VERIFIER_ERR_MANIFEST_IDENTIFIER_INVALID,
            0x000b_0007,
            "Image Verifier Error: Signed manifest identifier invalid"
        ),
        (
            IMAGE_VERIFIER_ERR_MANIFEST_CODE_RANGE_INVALID,
            0x000b_0008,
            "Image Verifier Error: Signed manifest code range invalid"
        ),
        (
            IMAGE_VERIFIER_ERR_MANIFEST_ENTRY_POINT_INVALID,
            0x000b_0009,
            "Image Verifier Error: Signed manifest entry point outside code range"
        ),
        (
            IMAGE_VERIFIER_ERR_IMAGE_OUT_OF_BOUNDS,
            0x000b_000A,
            "Image Verifier Error: Declared image size extends past the buffer end"
        ),
        (
            IMAGE_VERIFIER_ERR_IMG_CHECKSUM_MISMATCH,
            0x000b_0101,
            "Image Verifier Error: Image checksum mismatch"
        ),
        (
            IMAGE_VERIFIER_ERR_FUSES_CHECKSUM_MISMATCH,
            0x000b_0102,
            "Image Verifier Error: Fuses checksum mismatch"
        ),
        (
            IMAGE_VERIFIER_ERR_INFO_CHECKSUM_MISMATCH,
            0x000b_0103,
            "Image Verifier Error: Info checksum mismatch"
        ),
        (
            IMAGE_VERIFIER_ERR_KEY_NOT_FOUND,
            0x000b_0201,
            "Image Verifier Error: Key id not present in the key table"
        ),
        (
            IMAGE_VERIFIER_ERR_SIGNATURE_MISMATCH,
            0x000b_0301,
            "Image Verifier Error: Signature does not unlock the image"
        ),
        (
            IMAGE_VERIFIER_ERR_MANIFEST_VERIFY_UNSUPPORTED,
            0x000b_0302,
            "Image Verifier Error: Signed manifest signatures cannot be verified"
        ),
        (
            KEY_TABLE_ERR_DUPLICATE_KEYID,
            0x000c_0001,
            "Key Table Error: Key id already present"
        ),
        (
            KEY_TABLE_ERR_MODULUS_LENGTH,
            0x000c_0002,
            "Key Table Error: Modulus must be 96 words"
        ),
    ];

    /// Map the error code onto its failure class.
    pub fn class(&self) -> ErrorClass {
        match u32::from(*self) >> 8 {
            0x0001_00 => ErrorClass::Driver,
            0x000b_00 => ErrorClass::StructuralInvalid,
            0x000b_01 => ErrorClass::ChecksumMismatch,
            0x000b_02 => ErrorClass::KeyNotFound,
            0x000b_03 => ErrorClass::SignatureMismatch,
            _ => ErrorClass::Config,
        }
    }
}

impl From<core::num::NonZeroU32> for crate::GscError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::GscError(val)
    }
}

impl From<GscError> for core::num::NonZeroU32 {
    fn from(val: GscError) -> Self {
        val.0
    }
}

impl From<GscError> for u32 {
    fn from(val: GscError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for GscError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(GscError(val)),
            Err(err) => Err(err),
        }
    }
}

impl core::fmt::Display for GscError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GSC error 0x{:08x} ({:?})", u32::from(*self), self.class())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GscError {}

pub type GscResult<T> = Result<T, GscError>;
