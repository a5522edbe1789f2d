/*++

Licensed under the Apache-2.0 license.

File Name:

    fuse_bank.rs

Abstract:

    File contains API for the simulated fuse and info banks sensed during verification.

--*/

use gsc_image_types::{ChipFamily, SignedHeader, FUSE_MAX, FUSE_PADDING, INFO_MAX};

/// Fuse word holding node lock identifiers
pub const FUSE_NODE_LOCK_WORD: usize = FUSE_MAX - 2;
/// Info bank word value of erased flash
pub const INFO_ERASED: u32 = 0xFFFF_FFFF;

/// Simulated fuse bank for a header's chip family
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FuseBank {
    words: [u32; FUSE_MAX],
}

impl FuseBank {
    /// Build the fuse bank a chip of the header's family would sense.
    ///
    /// Unprogrammed fuses read as `FUSE_PADDING`; logical offsets follow each
    /// family's fuse map. Only the Haven B2 layout is modelled.
    pub fn for_header(header: &SignedHeader) -> Self {
        let mut words = [FUSE_PADDING; FUSE_MAX];

        match header.family() {
            Some(ChipFamily::Haven) => {
                words[0x06] = header.dev_id0(); // DEV_ID0
                words[0x07] = header.dev_id1(); // DEV_ID1
                words[0x43] = 0x5555_5555; // FLASH_PERSO_PAGE_LOCK
                words[0x47] = 0x5555_5502; // FW_DEFINED_DATA_BLK0
                words[0x7d] = 0x5555_5540; // FW_DEFINED_DATA_EXTRA_BLK6
                words[0x55] = 0x5555_5137; // FW_DEFINED_BROM_APPLYSEC
            }
            Some(ChipFamily::Citadel) => {
                words[0x14] = header.dev_id0(); // DEV_ID0
                words[0x18] = header.dev_id1(); // DEV_ID1
            }
            Some(ChipFamily::Dauntless) => {
                words[0x08] = 0x5555_5542;
                words[0x35] = 0x5555_5550;
                words[0x3e] = 0x5555_5540;
            }
            None => {}
        }

        Self { words }
    }

    pub fn words(&self) -> &[u32; FUSE_MAX] {
        &self.words
    }

    pub fn read(&self, index: usize) -> u32 {
        self.words[index]
    }

    /// Sense the fuses the header selects into the array that gets hashed.
    ///
    /// Unselected words hold the family ignore value. Node locked images
    /// copy their device id into `FUSE_NODE_LOCK_WORD`; when both ids are set
    /// `dev_id1` wins.
    pub fn sense(&self, header: &SignedHeader) -> [u32; FUSE_MAX] {
        let ignore = sense_family(header).fuse_ignore();
        let mut fuses = [ignore; FUSE_MAX];

        for (i, fuse) in fuses.iter_mut().enumerate() {
            if header.fuse_selected(i) {
                *fuse = self.words[i];
            }
        }

        for dev_id in [header.dev_id0(), header.dev_id1()] {
            if SignedHeader::dev_id_set(dev_id) {
                fuses[FUSE_NODE_LOCK_WORD] = dev_id;
            }
        }

        fuses
    }
}

/// Simulated info bank
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InfoBank {
    words: [u32; INFO_MAX],
}

impl Default for InfoBank {
    fn default() -> Self {
        Self {
            words: [INFO_ERASED; INFO_MAX],
        }
    }
}

impl InfoBank {
    pub fn new(words: [u32; INFO_MAX]) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[u32; INFO_MAX] {
        &self.words
    }

    pub fn read(&self, index: usize) -> u32 {
        self.words[index]
    }

    /// Sense the info words the header selects into the array that gets hashed.
    pub fn sense(&self, header: &SignedHeader) -> [u32; INFO_MAX] {
        let ignore = sense_family(header).info_ignore();
        let mut info = [ignore; INFO_MAX];

        for (i, word) in info.iter_mut().enumerate() {
            if header.info_selected(i) {
                *word ^= self.words[i];
            }
        }

        info
    }
}

/// Headers with an unknown magic sense with the Dauntless values.
fn sense_family(header: &SignedHeader) -> ChipFamily {
    header.family().unwrap_or(ChipFamily::Dauntless)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsc_image_types::{MAGIC_CITADEL, MAGIC_DAUNTLESS, MAGIC_HAVEN, SIGNED_HEADER_PADDING};

    #[test]
    fn test_haven_fuses() {
        let mut header = SignedHeader::default();
        header
            .set_magic(MAGIC_HAVEN)
            .set_dev_id0(0x1111_2222)
            .set_dev_id1(0x3333_4444);
        let bank = FuseBank::for_header(&header);
        assert_eq!(bank.read(0x06), 0x1111_2222);
        assert_eq!(bank.read(0x07), 0x3333_4444);
        assert_eq!(bank.read(0x47), 0x5555_5502);
        assert_eq!(bank.read(0x55), 0x5555_5137);
        assert_eq!(bank.read(0x00), FUSE_PADDING);
    }

    #[test]
    fn test_citadel_and_dauntless_fuses() {
        let mut header = SignedHeader::default();
        header.set_magic(MAGIC_CITADEL).set_dev_id1(0xabcd);
        let bank = FuseBank::for_header(&header);
        assert_eq!(bank.read(0x14), 0);
        assert_eq!(bank.read(0x18), 0xabcd);

        header.set_magic(MAGIC_DAUNTLESS);
        let bank = FuseBank::for_header(&header);
        assert_eq!(bank.read(0x08), 0x5555_5542);
        assert_eq!(bank.read(0x18), FUSE_PADDING);
    }

    #[test]
    fn test_unknown_family_is_all_padding() {
        let header = SignedHeader::default();
        assert!(FuseBank::for_header(&header)
            .words()
            .iter()
            .all(|&w| w == FUSE_PADDING));
    }

    #[test]
    fn test_sense_fuses() {
        let mut header = SignedHeader::default();
        header.set_magic(MAGIC_HAVEN).set_dev_id0(0x1111_2222);
        header.mark_fuse(0x06).mark_fuse(0x47);
        let fuses = FuseBank::for_header(&header).sense(&header);
        assert_eq!(fuses[0x06], 0x1111_2222);
        assert_eq!(fuses[0x47], 0x5555_5502);
        assert_eq!(fuses[0x07], ChipFamily::Haven.fuse_ignore());
        assert_eq!(fuses[FUSE_NODE_LOCK_WORD], 0x1111_2222);
    }

    #[test]
    fn test_sense_fuses_node_lock_prefers_dev_id1() {
        let mut header = SignedHeader::default();
        header
            .set_magic(MAGIC_CITADEL)
            .set_dev_id0(0xaaaa)
            .set_dev_id1(0xbbbb);
        let fuses = FuseBank::for_header(&header).sense(&header);
        assert_eq!(fuses[FUSE_NODE_LOCK_WORD], 0xbbbb);

        header.set_dev_id1(SIGNED_HEADER_PADDING);
        let fuses = FuseBank::for_header(&header).sense(&header);
        assert_eq!(fuses[FUSE_NODE_LOCK_WORD], 0xaaaa);

        header.set_dev_id0(0).set_dev_id1(0);
        let fuses = FuseBank::for_header(&header).sense(&header);
        assert_eq!(
            fuses[FUSE_NODE_LOCK_WORD],
            ChipFamily::Citadel.fuse_ignore()
        );
    }

    #[test]
    fn test_sense_info() {
        let mut header = SignedHeader::default();
        header.set_magic(MAGIC_DAUNTLESS).mark_info(3);
        let mut words = [INFO_ERASED; INFO_MAX];
        words[3] = 0x0000_ffff;
        let info = InfoBank::new(words).sense(&header);
        let ignore = ChipFamily::Dauntless.info_ignore();
        assert_eq!(info[3], ignore ^ 0x0000_ffff);
        assert_eq!(info[4], ignore);
    }

    #[test]
    fn test_info_bank_default_is_erased() {
        assert!(InfoBank::default().words().iter().all(|&w| w == INFO_ERASED));
    }
}
