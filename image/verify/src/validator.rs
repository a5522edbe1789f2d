/*++

Licensed under the Apache-2.0 license.

File Name:

    validator.rs

Abstract:

    Structural checks gating signed headers and signed manifests.

--*/

use gsc_error::{GscError, GscResult};
use gsc_image_types::*;
use zerocopy::FromBytes;

/// Structurally valid image found at a candidate offset
#[derive(Debug)]
pub enum Candidate {
    Header(SignedHeader),
    Manifest(SignedManifest),
}

/// Check a signed header, returning the first violated rule.
pub fn check_header(header: &SignedHeader) -> GscResult<()> {
    if header.family().is_none() {
        Err(GscError::IMAGE_VERIFIER_ERR_HEADER_MAGIC_INVALID)?;
    }

    if header.image_size() < MIN_IMAGE_SIZE {
        Err(GscError::IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_TOO_SMALL)?;
    }

    // Dauntless cryptolib headers are not firmware images
    if header.image_size() & CRYPTOLIB_IMAGE_SIZE_BITS != 0 {
        Err(GscError::IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_RESERVED_BITS)?;
    }

    // The executable region starts right after the header
    if header.rx_base() != header.ro_base().wrapping_add(SIGNED_HEADER_SIZE as u32) {
        Err(GscError::IMAGE_VERIFIER_ERR_HEADER_RX_BASE_MISMATCH)?;
    }

    Ok(())
}

/// Check a signed manifest, returning the first violated rule.
pub fn check_manifest(manifest: &SignedManifest) -> GscResult<()> {
    if manifest.kind().is_none() {
        Err(GscError::IMAGE_VERIFIER_ERR_MANIFEST_IDENTIFIER_INVALID)?;
    }

    if manifest.code_start() > manifest.code_end()
        || manifest.code_start() > manifest.image_size()
        || manifest.code_end() > manifest.image_size()
    {
        Err(GscError::IMAGE_VERIFIER_ERR_MANIFEST_CODE_RANGE_INVALID)?;
    }

    if manifest.entry_point() > manifest.code_end()
        || manifest.entry_point() < manifest.code_start()
    {
        Err(GscError::IMAGE_VERIFIER_ERR_MANIFEST_ENTRY_POINT_INVALID)?;
    }

    Ok(())
}

pub fn valid_header(header: &SignedHeader) -> bool {
    check_header(header).is_ok()
}

pub fn valid_manifest(manifest: &SignedManifest) -> bool {
    check_manifest(manifest).is_ok()
}

/// Read the structure at `offset`, trying the signed header shape first.
///
/// Nothing is read unless a full 1024 byte structure fits in `buf`.
pub fn parse_candidate(buf: &[u8], offset: usize) -> GscResult<Candidate> {
    let bytes = offset
        .checked_add(SIGNED_HEADER_SIZE)
        .and_then(|end| buf.get(offset..end))
        .ok_or(GscError::IMAGE_VERIFIER_ERR_CANDIDATE_OUT_OF_BOUNDS)?;

    let (header, _) = SignedHeader::read_from_prefix(bytes)
        .map_err(|_| GscError::IMAGE_VERIFIER_ERR_CANDIDATE_OUT_OF_BOUNDS)?;
    let header_err = match check_header(&header) {
        Ok(()) => return Ok(Candidate::Header(header)),
        Err(err) => err,
    };

    let (manifest, _) = SignedManifest::read_from_prefix(bytes)
        .map_err(|_| GscError::IMAGE_VERIFIER_ERR_CANDIDATE_OUT_OF_BOUNDS)?;
    let manifest_err = match check_manifest(&manifest) {
        Ok(()) => return Ok(Candidate::Manifest(manifest)),
        Err(err) => err,
    };

    // Report the rule that failed for whichever shape the magic claims
    Err(match (header.family(), manifest.kind()) {
        (Some(_), _) => header_err,
        (None, Some(_)) => manifest_err,
        (None, None) => GscError::IMAGE_VERIFIER_ERR_NO_IMAGE_STRUCTURE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    fn header(image_size: u32, rx_offset: u32) -> SignedHeader {
        let mut header = SignedHeader::default();
        header
            .set_magic(MAGIC_HAVEN)
            .set_image_size(image_size)
            .set_ro_base(0x44000)
            .set_rx_base(0x44000 + rx_offset);
        header
    }

    fn manifest(code_start: u32, code_end: u32, entry_point: u32, image_size: u32) -> SignedManifest {
        let mut manifest = SignedManifest::default();
        manifest
            .set_identifier(ID_ROM_EXT)
            .set_code_start(code_start)
            .set_code_end(code_end)
            .set_entry_point(entry_point)
            .set_image_size(image_size);
        manifest
    }

    #[test]
    fn test_valid_header() {
        assert!(valid_header(&header(0x800, 1024)));
        assert_eq!(
            check_header(&header(0x800, 1023)),
            Err(GscError::IMAGE_VERIFIER_ERR_HEADER_RX_BASE_MISMATCH)
        );
        assert_eq!(
            check_header(&header(0x7FF, 1024)),
            Err(GscError::IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_TOO_SMALL)
        );
        assert_eq!(
            check_header(&header(0x1000_0800, 1024)),
            Err(GscError::IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_RESERVED_BITS)
        );

        let mut bad_magic = header(0x800, 1024);
        bad_magic.set_magic(0x1234_5678);
        assert_eq!(
            check_header(&bad_magic),
            Err(GscError::IMAGE_VERIFIER_ERR_HEADER_MAGIC_INVALID)
        );
    }

    #[test]
    fn test_rx_base_wraps() {
        let mut header = header(0x800, 0);
        header
            .set_ro_base(0xFFFF_FF00)
            .set_rx_base(0xFFFF_FF00u32.wrapping_add(1024));
        assert!(valid_header(&header));
    }

    #[test]
    fn test_valid_manifest() {
        assert!(valid_manifest(&manifest(0x100, 0x200, 0x150, 0x300)));
        assert_eq!(
            check_manifest(&manifest(0x100, 0x200, 0x90, 0x300)),
            Err(GscError::IMAGE_VERIFIER_ERR_MANIFEST_ENTRY_POINT_INVALID)
        );
        assert_eq!(
            check_manifest(&manifest(0x100, 0x400, 0x150, 0x300)),
            Err(GscError::IMAGE_VERIFIER_ERR_MANIFEST_CODE_RANGE_INVALID)
        );
        assert_eq!(
            check_manifest(&manifest(0x200, 0x100, 0x150, 0x300)),
            Err(GscError::IMAGE_VERIFIER_ERR_MANIFEST_CODE_RANGE_INVALID)
        );

        let mut owner = manifest(0, 0, 0, 0);
        owner.set_identifier(ID_OWNER_FW);
        assert!(valid_manifest(&owner));
        owner.set_identifier(0);
        assert_eq!(
            check_manifest(&owner),
            Err(GscError::IMAGE_VERIFIER_ERR_MANIFEST_IDENTIFIER_INVALID)
        );
    }

    #[test]
    fn test_parse_candidate() {
        let mut buf = vec![0u8; 4096];
        buf[..SIGNED_HEADER_SIZE].copy_from_slice(header(0x800, 1024).as_bytes());
        buf[2048..2048 + SIGNED_MANIFEST_SIZE]
            .copy_from_slice(manifest(0x100, 0x200, 0x150, 0x300).as_bytes());

        assert!(matches!(parse_candidate(&buf, 0), Ok(Candidate::Header(_))));
        assert!(matches!(
            parse_candidate(&buf, 2048),
            Ok(Candidate::Manifest(_))
        ));
        assert_eq!(
            parse_candidate(&buf, 1024).err(),
            Some(GscError::IMAGE_VERIFIER_ERR_NO_IMAGE_STRUCTURE)
        );
        assert_eq!(
            parse_candidate(&buf, 3584).err(),
            Some(GscError::IMAGE_VERIFIER_ERR_CANDIDATE_OUT_OF_BOUNDS)
        );
        assert_eq!(
            parse_candidate(&buf, usize::MAX).err(),
            Some(GscError::IMAGE_VERIFIER_ERR_CANDIDATE_OUT_OF_BOUNDS)
        );
    }

    #[test]
    fn test_parse_candidate_reports_header_rule() {
        let mut buf = vec![0u8; 2048];
        buf[..SIGNED_HEADER_SIZE].copy_from_slice(header(0x400, 1024).as_bytes());
        assert_eq!(
            parse_candidate(&buf, 0).err(),
            Some(GscError::IMAGE_VERIFIER_ERR_HEADER_IMAGE_SIZE_TOO_SMALL)
        );
    }
}
