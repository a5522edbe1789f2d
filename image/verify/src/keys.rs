/*++

Licensed under the Apache-2.0 license.

File Name:

    keys.rs

Abstract:

    Key table mapping GSC key ids onto RSA public keys.

--*/

use std::collections::HashMap;
use std::fmt;

use gsc_drivers::{PubExponent, RsaPubKey};
use gsc_error::{GscError, GscResult};
use gsc_image_types::*;
use serde::{Deserialize, Serialize};

/// Boot stage a signing key authenticates
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Keys baked into the boot ROM, verifying RO images
    Rom,

    /// Keys carried by the RO loader, verifying RW images
    Loader,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rom => "rom",
            Self::Loader => "loader",
        })
    }
}

/// Known signing key
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyEntry {
    name: String,
    family: ChipFamily,
    role: KeyRole,
    key: RsaPubKey,
}

impl KeyEntry {
    /// Create a key table entry
    ///
    /// # Arguments
    ///
    /// * `keyid`    - Key id, which must be the Montgomery inverse of the modulus
    /// * `modulus`  - 96 little-endian words
    /// * `exponent` - 3 or 65537
    pub fn new(
        name: &str,
        family: ChipFamily,
        role: KeyRole,
        keyid: u32,
        modulus: &[u32],
        exponent: u32,
    ) -> GscResult<Self> {
        let modulus: RsaWords = modulus
            .try_into()
            .map_err(|_| GscError::KEY_TABLE_ERR_MODULUS_LENGTH)?;
        let exponent = PubExponent::try_from(exponent)?;
        Ok(Self {
            name: name.to_string(),
            family,
            role,
            key: RsaPubKey::new(keyid, modulus, exponent)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> ChipFamily {
        self.family
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn keyid(&self) -> u32 {
        self.key.n0inv()
    }

    pub fn key(&self) -> &RsaPubKey {
        &self.key
    }
}

/// Where the key used for a candidate came from
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum KeySource {
    Table {
        name: String,
        family: ChipFamily,
        role: KeyRole,
    },

    /// The header's own key id and modulus. Anyone can produce a header that
    /// verifies against itself, so this proves nothing about the signer.
    HeaderFallback,
}

impl KeySource {
    pub fn is_unverified(&self) -> bool {
        matches!(self, Self::HeaderFallback)
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table { name, family, role } => write!(f, "{name} ({family} {role})"),
            Self::HeaderFallback => f.write_str("header key (unverified)"),
        }
    }
}

/// Key selected for a candidate
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedKey {
    pub key: RsaPubKey,
    pub source: KeySource,
}

/// Key id to public key table
#[derive(Debug, Default, Clone)]
pub struct KeyTable {
    entries: HashMap<u32, KeyEntry>,
}

impl KeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; key ids must be unique.
    pub fn insert(&mut self, entry: KeyEntry) -> GscResult<()> {
        if self.entries.contains_key(&entry.keyid()) {
            Err(GscError::KEY_TABLE_ERR_DUPLICATE_KEYID)?;
        }
        self.entries.insert(entry.keyid(), entry);
        Ok(())
    }

    pub fn get(&self, keyid: u32) -> Option<&KeyEntry> {
        self.entries.get(&keyid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyEntry> {
        self.entries.values()
    }

    /// Look up the header key id, falling back to the key the header carries
    /// with exponent 3.
    pub fn resolve(&self, header: &SignedHeader) -> ResolvedKey {
        match self.get(header.keyid()) {
            Some(entry) => ResolvedKey {
                key: entry.key.clone(),
                source: KeySource::Table {
                    name: entry.name.clone(),
                    family: entry.family,
                    role: entry.role,
                },
            },
            None => ResolvedKey {
                key: RsaPubKey::from_raw(header.keyid(), *header.key(), PubExponent::E3),
                source: KeySource::HeaderFallback,
            },
        }
    }
}

impl TryFrom<Vec<KeyEntry>> for KeyTable {
    type Error = GscError;

    fn try_from(entries: Vec<KeyEntry>) -> GscResult<Self> {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry)?;
        }
        Ok(table)
    }
}

/// Public key compiled into the verifier
#[cfg_attr(not(feature = "dev-keys"), allow(dead_code))]
struct BuiltinKey {
    name: &'static str,
    family: ChipFamily,
    role: KeyRole,
    keyid: u32,
    modulus: &'static RsaWords,
    exponent: u32,
}

#[cfg(not(feature = "dev-keys"))]
const BUILTIN_KEYS: &[BuiltinKey] = &[];

#[cfg(feature = "dev-keys")]
const BUILTIN_KEYS: &[BuiltinKey] = {
    use gsc_image_fake_keys::*;
    &[
        BuiltinKey {
            name: "dev rom",
            family: ChipFamily::Haven,
            role: KeyRole::Rom,
            keyid: DEV_KEY_3072_E3_KEYID,
            modulus: &DEV_KEY_3072_E3_MODULUS,
            exponent: 3,
        },
        BuiltinKey {
            name: "dev loader",
            family: ChipFamily::Haven,
            role: KeyRole::Loader,
            keyid: DEV_KEY_3072_E65537_KEYID,
            modulus: &DEV_KEY_3072_E65537_MODULUS,
            exponent: 65537,
        },
        BuiltinKey {
            name: "dev legacy",
            family: ChipFamily::Haven,
            role: KeyRole::Loader,
            keyid: DEV_KEY_2048_E3_KEYID,
            modulus: &DEV_KEY_2048_E3_MODULUS,
            exponent: 3,
        },
    ]
};

impl KeyTable {
    /// Keys compiled into the verifier.
    ///
    /// Empty unless the `dev-keys` feature adds the development keys.
    pub fn builtin() -> GscResult<Self> {
        let mut table = Self::new();
        for key in BUILTIN_KEYS {
            table.insert(KeyEntry::new(
                key.name,
                key.family,
                key.role,
                key.keyid,
                key.modulus,
                key.exponent,
            )?)?;
        }
        Ok(table)
    }
}
