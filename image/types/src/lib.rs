/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures for GSC signed headers and OpenTitan signed manifests.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt;
use core::ops::Range;

use getset::{CopyGetters, Getters, Setters};
use memoffset::offset_of;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

pub const RSA_NUM_WORDS: usize = 96;
pub const RSA_NUM_BYTES: usize = RSA_NUM_WORDS * 4;
pub const SHA256_DIGEST_WORD_SIZE: usize = 8;
pub const SHA256_DIGEST_BYTE_SIZE: usize = 32;
pub const SIGNED_HEADER_SIZE: usize = core::mem::size_of::<SignedHeader>();
pub const SIGNED_MANIFEST_SIZE: usize = core::mem::size_of::<SignedManifest>();

/// Number of words in the fuse bank. Baked in ROM.
pub const FUSE_MAX: usize = 128;
/// Number of words in the info bank. Baked in ROM.
pub const INFO_MAX: usize = 128;
/// Value of a fuse word that was never programmed. Baked in hardware.
pub const FUSE_PADDING: u32 = 0x5555_5555;
/// Default value of header padding words.
pub const SIGNED_HEADER_PADDING: u32 = 0x3333_3333;

pub const MAGIC_HAVEN: u32 = 0xFFFF_FFFF;
pub const MAGIC_CITADEL: u32 = 0xFFFF_FFFE;
pub const MAGIC_DAUNTLESS: u32 = 0xFFFF_FFFD;

/// Manifest identifier "OTRE"
pub const ID_ROM_EXT: u32 = 0x4552_544F;
/// Manifest identifier "OTB0"
pub const ID_OWNER_FW: u32 = 0x3042_544F;

/// Smallest image a signed header can describe.
pub const MIN_IMAGE_SIZE: u32 = 0x800;
/// Image size bits that mark a Dauntless cryptolib header.
pub const CRYPTOLIB_IMAGE_SIZE_BITS: u32 = 0x5000_0000;
/// `config1_` bit selecting the flash trim override trailer on Dauntless.
pub const FLASH_TRIM_CONFIG1_BIT: u32 = 1 << 16;
/// Board id field value meaning "not set".
pub const BOARD_ID_BLANK_FIELD: u32 = 0xFFFF_FFFF;

pub type RsaWords = [u32; RSA_NUM_WORDS];
pub type ImageDigest = [u32; SHA256_DIGEST_WORD_SIZE];

/// GSC chip family, selected by the signed header magic.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ChipFamily {
    /// H1 chips running Cr50
    Haven,

    /// Citadel chips running NuggetOS
    Citadel,

    /// D2 chips running Ti50/Acropora
    Dauntless,
}

impl ChipFamily {
    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            MAGIC_HAVEN => Some(Self::Haven),
            MAGIC_CITADEL => Some(Self::Citadel),
            MAGIC_DAUNTLESS => Some(Self::Dauntless),
            _ => None,
        }
    }

    pub fn magic(&self) -> u32 {
        match self {
            Self::Haven => MAGIC_HAVEN,
            Self::Citadel => MAGIC_CITADEL,
            Self::Dauntless => MAGIC_DAUNTLESS,
        }
    }

    /// Fuse word value used when the fuse map does not select a fuse. Baked in ROM.
    pub fn fuse_ignore(&self) -> u32 {
        match self {
            Self::Haven => 0xa3ba_daac,
            Self::Citadel => 0x3aab_adac,
            Self::Dauntless => 0xdaa3_baca,
        }
    }

    /// Info word value used when the info map does not select a word. Baked in ROM.
    pub fn info_ignore(&self) -> u32 {
        match self {
            Self::Haven => 0xaa3c_55c3,
            Self::Citadel => 0xa5c3_5a3c,
            Self::Dauntless => 0x5a3c_a5c3,
        }
    }

    /// Name the flash section an image with the given RO base is loaded into.
    pub fn section(&self, base: u32) -> ImageSection {
        match self {
            Self::Haven | Self::Citadel => match base {
                0x40000 => ImageSection::RoA,
                0x44000 => ImageSection::RwA,
                0x80000 => ImageSection::RoB,
                0x84000 => ImageSection::RwB,
                _ => ImageSection::Unknown,
            },
            Self::Dauntless => match base {
                0x80000 => ImageSection::RoA,
                0x84000..=0xFFFFF => ImageSection::RwA,
                0x100000 => ImageSection::RoB,
                0x104000..=0x183FFF => ImageSection::RwB,
                _ => ImageSection::Unknown,
            },
        }
    }
}

impl fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Haven => "Haven",
            Self::Citadel => "Citadel",
            Self::Dauntless => "Dauntless",
        })
    }
}

/// Flash section an image lives in
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageSection {
    RoA,
    RwA,
    RoB,
    RwB,
    Unknown,
}

impl fmt::Display for ImageSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RoA => "RO_A",
            Self::RwA => "RW_A",
            Self::RoB => "RO_B",
            Self::RwB => "RW_B",
            Self::Unknown => "??",
        })
    }
}

/// OpenTitan manifest kind
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ManifestKind {
    RomExt,
    OwnerFw,
}

impl ManifestKind {
    pub fn from_identifier(identifier: u32) -> Option<Self> {
        match identifier {
            ID_ROM_EXT => Some(Self::RomExt),
            ID_OWNER_FW => Some(Self::OwnerFw),
            _ => None,
        }
    }
}

/// Board ID binding a firmware image to a hardware SKU
#[repr(C)]
#[derive(
    IntoBytes, FromBytes, Immutable, KnownLayout, Default, Debug, Copy, Clone, Eq, PartialEq,
)]
pub struct BoardId {
    pub id: u32,
    pub mask: u32,
    pub flags: u32,
}

impl BoardId {
    pub fn type_is_blank(&self) -> bool {
        (self.id & self.mask) == BOARD_ID_BLANK_FIELD
    }

    pub fn flags_are_blank(&self) -> bool {
        self.flags == BOARD_ID_BLANK_FIELD
    }

    pub fn is_blank(&self) -> bool {
        self.type_is_blank() && self.flags_are_blank()
    }

    fn xor_padding(&self) -> Self {
        Self {
            id: self.id ^ SIGNED_HEADER_PADDING,
            mask: self.mask ^ SIGNED_HEADER_PADDING,
            flags: self.flags ^ SIGNED_HEADER_PADDING,
        }
    }
}

/// Version triple of a signed header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SignedHeaderVersion {
    pub epoch: u32,
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for SignedHeaderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.epoch, self.major, self.minor)
    }
}

/// Header trailer words, interpreted by chip family and `config1_`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HeaderTrailer {
    /// Second FIPS signature (Cr51/Cr52 RW)
    ExtSig { keyid: u32, r: [u32; 8], s: [u32; 8] },

    /// Flash SMW trim override (Dauntless RO)
    FlashTrim([u32; 8]),
}

/// Signed header prepended to Haven, Citadel and Dauntless firmware sections
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, Getters, Setters, CopyGetters)]
pub struct SignedHeader {
    #[getset(get_copy = "pub", set = "pub")]
    magic: u32,

    /// RSA signature, Montgomery form
    #[getset(get = "pub", set = "pub")]
    signature: RsaWords,

    /// Top 32 bits of expected image hash
    #[getset(get_copy = "pub", set = "pub")]
    img_chk: u32,

    // Everything from here through `image_size` bytes is covered by the image hash.
    #[getset(get = "pub", set = "pub")]
    tag: [u32; 7],

    /// Key id, which is also the Montgomery inverse of the signing key
    #[getset(get_copy = "pub", set = "pub")]
    keyid: u32,

    /// Public key modulus carried in the header
    #[getset(get = "pub", set = "pub")]
    key: RsaWords,

    #[getset(get_copy = "pub", set = "pub")]
    image_size: u32,

    /// Read only region
    #[getset(get_copy = "pub", set = "pub")]
    ro_base: u32,

    #[getset(get_copy = "pub", set = "pub")]
    ro_max: u32,

    /// Executable region
    #[getset(get_copy = "pub", set = "pub")]
    rx_base: u32,

    #[getset(get_copy = "pub", set = "pub")]
    rx_max: u32,

    #[getset(get = "pub", set = "pub")]
    fusemap: [u32; FUSE_MAX / 32],

    #[getset(get = "pub", set = "pub")]
    infomap: [u32; INFO_MAX / 32],

    #[getset(get_copy = "pub", set = "pub")]
    epoch: u32,

    /// Key ladder count
    #[getset(get_copy = "pub", set = "pub")]
    major: u32,

    #[getset(get_copy = "pub", set = "pub")]
    minor: u32,

    /// Time of signing
    #[getset(get_copy = "pub", set = "pub")]
    timestamp: u64,

    #[getset(get_copy = "pub", set = "pub")]
    p4cl: u32,

    /// Bits to AND with FUSE_FW_DEFINED_BROM_APPLYSEC
    #[getset(get_copy = "pub", set = "pub")]
    applysec: u32,

    /// Bits to mesh with FUSE_FW_DEFINED_BROM_CONFIG1
    #[getset(get_copy = "pub", set = "pub")]
    config1: u32,

    /// Bits to OR with FUSE_FW_DEFINED_BROM_ERR_RESPONSE
    #[getset(get_copy = "pub", set = "pub")]
    err_response: u32,

    /// Action to take when expectation is violated
    #[getset(get_copy = "pub", set = "pub")]
    expect_response: u32,

    #[getset(set = "pub")]
    trailer: [u32; 17],

    #[getset(set = "pub")]
    pad: [u32; 5],

    #[getset(get_copy = "pub", set = "pub")]
    swap_mark: u32,

    /// Stored XOR `SIGNED_HEADER_PADDING`
    #[getset(set = "pub")]
    rw_product_family: u32,

    /// Stored XOR `SIGNED_HEADER_PADDING`
    #[getset(set = "pub")]
    board_id: BoardId,

    /// Node id, if locked
    #[getset(get_copy = "pub", set = "pub")]
    dev_id0: u32,

    #[getset(get_copy = "pub", set = "pub")]
    dev_id1: u32,

    /// Top 32 bits of expected fuses hash
    #[getset(get_copy = "pub", set = "pub")]
    fuses_chk: u32,

    /// Top 32 bits of expected info hash
    #[getset(get_copy = "pub", set = "pub")]
    info_chk: u32,
}

impl Default for SignedHeader {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

impl SignedHeader {
    /// Byte offset of the first word covered by the image hash
    pub const HASHED_REGION_OFFSET: usize = offset_of!(SignedHeader, tag);

    pub fn family(&self) -> Option<ChipFamily> {
        ChipFamily::from_magic(self.magic)
    }

    /// Byte range, relative to the header, covered by the image hash
    pub fn img_hash_range(&self) -> Range<usize> {
        Self::HASHED_REGION_OFFSET..self.image_size as usize
    }

    pub fn version(&self) -> SignedHeaderVersion {
        SignedHeaderVersion {
            epoch: self.epoch,
            major: self.major,
            minor: self.minor,
        }
    }

    /// Decoded board id
    pub fn board_id(&self) -> BoardId {
        self.board_id.xor_padding()
    }

    /// Store a decoded board id
    pub fn set_decoded_board_id(&mut self, board_id: BoardId) -> &mut Self {
        self.board_id = board_id.xor_padding();
        self
    }

    /// Decoded RW product family, zero meaning any
    pub fn rw_product_family(&self) -> u32 {
        self.rw_product_family ^ SIGNED_HEADER_PADDING
    }

    /// Returns the mismatched board id bits; zero when the image may run on `device`.
    pub fn board_id_mismatch(&self, device: &BoardId) -> u32 {
        let header = self.board_id();

        // All 1-bits in header board id flags must be present in the device flags
        let mut mismatch = ((header.flags & device.flags) != header.flags) as u32;

        // Masked bits in header board id type must match type and inverse from flash
        if mismatch == 0 && !device.type_is_blank() {
            mismatch = header.id ^ device.id;
            mismatch |= header.id ^ !device.mask;
            mismatch &= header.mask;
        }

        mismatch
    }

    pub fn trailer(&self) -> HeaderTrailer {
        let mut words = [0u32; 8];
        if self.magic == MAGIC_DAUNTLESS && self.config1 & FLASH_TRIM_CONFIG1_BIT != 0 {
            words.copy_from_slice(&self.trailer[..8]);
            return HeaderTrailer::FlashTrim(words);
        }

        let mut s = [0u32; 8];
        words.copy_from_slice(&self.trailer[1..9]);
        s.copy_from_slice(&self.trailer[9..17]);
        HeaderTrailer::ExtSig {
            keyid: self.trailer[0],
            r: words,
            s,
        }
    }

    pub fn swap_mark_size(&self) -> u32 {
        self.swap_mark & 0xFFF
    }

    pub fn swap_mark_offset(&self) -> u32 {
        self.swap_mark >> 12
    }

    /// Node locked images carry a device id that is neither zero nor padding
    pub fn is_node_locked(&self) -> bool {
        Self::dev_id_set(self.dev_id0) || Self::dev_id_set(self.dev_id1)
    }

    pub fn dev_id_set(dev_id: u32) -> bool {
        dev_id != 0 && dev_id != SIGNED_HEADER_PADDING
    }

    /// Prod keys have key id bit 2 set, dev keys have it clear
    pub fn signed_for_prod(&self) -> bool {
        self.keyid & (1 << 2) != 0
    }

    pub fn fuse_selected(&self, index: usize) -> bool {
        self.fusemap[index >> 5] & (1 << (index & 31)) != 0
    }

    pub fn info_selected(&self, index: usize) -> bool {
        self.infomap[index >> 5] & (1 << (index & 31)) != 0
    }

    pub fn mark_fuse(&mut self, index: usize) -> &mut Self {
        self.fusemap[index >> 5] |= 1 << (index & 31);
        self
    }

    pub fn mark_info(&mut self, index: usize) -> &mut Self {
        self.infomap[index >> 5] |= 1 << (index & 31);
        self
    }
}

/// OpenTitan signed manifest
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, Getters, Setters, CopyGetters)]
pub struct SignedManifest {
    /// RSA-3072 or ECDSA signature
    #[getset(get = "pub", set = "pub")]
    signature: RsaWords,

    // Everything below is signed.
    #[getset(get_copy = "pub", set = "pub")]
    constraint_selector_bits: u32,

    #[getset(get = "pub", set = "pub")]
    constraint_device_id: [u32; 8],

    #[getset(get_copy = "pub", set = "pub")]
    constraint_manuf_state_creator: u32,

    #[getset(get_copy = "pub", set = "pub")]
    constraint_manuf_state_owner: u32,

    #[getset(get_copy = "pub", set = "pub")]
    constraint_life_cycle_state: u32,

    /// Modulus of the signing key
    #[getset(get = "pub", set = "pub")]
    key: RsaWords,

    #[getset(get_copy = "pub", set = "pub")]
    address_translation: u32,

    /// `ID_ROM_EXT` or `ID_OWNER_FW`
    #[getset(get_copy = "pub", set = "pub")]
    identifier: u32,

    #[getset(get_copy = "pub", set = "pub")]
    manifest_major: u16,

    #[getset(get_copy = "pub", set = "pub")]
    manifest_minor: u16,

    #[getset(get_copy = "pub", set = "pub")]
    signed_region_end: u32,

    /// Length of the image minus the signature
    #[getset(get_copy = "pub", set = "pub")]
    image_size: u32,

    #[getset(get_copy = "pub", set = "pub")]
    major: u32,

    #[getset(get_copy = "pub", set = "pub")]
    minor: u32,

    /// Anti-rollback security version
    #[getset(get_copy = "pub", set = "pub")]
    security_version: u32,

    #[getset(get_copy = "pub", set = "pub")]
    timestamp: u64,

    #[getset(get = "pub", set = "pub")]
    binding_value: [u32; 8],

    #[getset(get_copy = "pub", set = "pub")]
    max_key_version: u32,

    #[getset(get_copy = "pub", set = "pub")]
    code_start: u32,

    #[getset(get_copy = "pub", set = "pub")]
    code_end: u32,

    /// Offset in the code of the entry function
    #[getset(get_copy = "pub", set = "pub")]
    entry_point: u32,

    #[getset(get = "pub", set = "pub")]
    extensions: [u32; 30],
}

impl Default for SignedManifest {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

impl SignedManifest {
    pub fn kind(&self) -> Option<ManifestKind> {
        ManifestKind::from_identifier(self.identifier)
    }

    /// Key id as displayed by OpenTitan tooling
    pub fn key_id(&self) -> u32 {
        self.key[0].swap_bytes()
    }
}
