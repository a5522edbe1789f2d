/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the GSC verification drivers.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod fuse_bank;
mod mont;
mod sha256;

pub use fuse_bank::{FuseBank, InfoBank, FUSE_NODE_LOCK_WORD, INFO_ERASED};
pub use gsc_error::{GscError, GscResult};
pub use mont::{mont_inverse, PubExponent, RsaPubKey};
pub use sha256::Sha256;
