/*++

Licensed under the Apache-2.0 license.

File Name:

   generator.rs

Abstract:

    GSC signed image generator

--*/
use anyhow::bail;
use gsc_drivers::FuseBank;
use gsc_image_types::*;
use zerocopy::IntoBytes;

use crate::*;

/// Image generator
pub struct ImageGenerator<Crypto: ImageGeneratorCrypto> {
    crypto: Crypto,
}

impl<Crypto: ImageGeneratorCrypto> ImageGenerator<Crypto> {
    /// Create an instance `ImageGenerator`
    pub fn new(crypto: Crypto) -> Self {
        Self { crypto }
    }

    /// Generate image
    ///
    /// # Arguments
    ///
    /// * `config` - Image generator configuration
    ///
    /// # Returns
    ///
    /// * `ImageBundle` - Signed header and payload
    pub fn generate(&self, config: &ImageGeneratorConfig) -> anyhow::Result<ImageBundle> {
        let image_size = SIGNED_HEADER_SIZE + config.payload.len();
        if image_size < MIN_IMAGE_SIZE as usize {
            bail!("Image smaller than {MIN_IMAGE_SIZE} bytes");
        }
        let Ok(image_size) = u32::try_from(image_size) else {
            bail!("Image larger than {} bytes", u32::MAX);
        };
        if image_size & CRYPTOLIB_IMAGE_SIZE_BITS != 0 {
            bail!("Image size {image_size:#x} collides with cryptolib header bits");
        }

        let mut header = self.gen_header(config, image_size);

        // Fuse and info checksums live inside the hashed region, so they go first.
        let fuses = FuseBank::for_header(&header).sense(&header);
        let fuses_hash = self.crypto.sha256_digest(fuses.as_bytes())?;
        let info = config.info_bank.sense(&header);
        let info_hash = self.crypto.sha256_digest(info.as_bytes())?;
        header
            .set_fuses_chk(fuses_hash[0])
            .set_info_chk(info_hash[0]);

        let img_hash = self.img_digest(&header, &config.payload)?;
        header.set_img_chk(img_hash[0]);

        let final_hash = self.final_digest(&img_hash, &fuses_hash, &info_hash)?;

        if let Some(priv_key) = &config.key.priv_key {
            let msg = pkcs1_sha256_encode(&final_hash, config.key.is_legacy_2048());
            let signature = self
                .crypto
                .rsa_sign(&msg, &config.key.modulus, priv_key)?;
            header.set_signature(signature);
        }

        Ok(ImageBundle {
            header,
            payload: config.payload.clone(),
            final_hash,
        })
    }

    /// Create header
    fn gen_header(&self, config: &ImageGeneratorConfig, image_size: u32) -> SignedHeader {
        let mut header = SignedHeader::default();
        header
            .set_magic(config.family.magic())
            .set_keyid(config.key.keyid)
            .set_key(config.key.modulus)
            .set_image_size(image_size)
            .set_ro_base(config.ro_base)
            .set_ro_max(config.ro_max)
            .set_rx_base(config.ro_base.wrapping_add(SIGNED_HEADER_SIZE as u32))
            .set_rx_max(config.rx_max)
            .set_fusemap(config.fusemap)
            .set_infomap(config.infomap)
            .set_epoch(config.epoch)
            .set_major(config.major)
            .set_minor(config.minor)
            .set_timestamp(config.timestamp)
            .set_config1(config.config1)
            .set_trailer([SIGNED_HEADER_PADDING; 17])
            .set_pad([SIGNED_HEADER_PADDING; 5])
            .set_rw_product_family(config.rw_product_family ^ SIGNED_HEADER_PADDING)
            .set_decoded_board_id(config.board_id)
            .set_dev_id0(config.dev_id0)
            .set_dev_id1(config.dev_id1);
        header
    }

    /// Digest of the header from `tag` onwards followed by the payload
    pub fn img_digest(&self, header: &SignedHeader, payload: &[u8]) -> anyhow::Result<ImageDigest> {
        let mut hasher = self.crypto.sha256_start();
        hasher.update(&header.as_bytes()[SignedHeader::HASHED_REGION_OFFSET..]);
        hasher.update(payload);
        Ok(hasher.finish())
    }

    /// Digest of the concatenated image, fuses and info digests
    pub fn final_digest(
        &self,
        img_hash: &ImageDigest,
        fuses_hash: &ImageDigest,
        info_hash: &ImageDigest,
    ) -> anyhow::Result<ImageDigest> {
        let mut hasher = self.crypto.sha256_start();
        hasher.update(img_hash.as_bytes());
        hasher.update(fuses_hash.as_bytes());
        hasher.update(info_hash.as_bytes());
        Ok(hasher.finish())
    }
}
