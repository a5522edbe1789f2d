/*++

Licensed under the Apache-2.0 license.

File Name:

   config.rs

Abstract:

    File contains utilities for parsing configuration files

--*/

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use gsc_image_openssl::rsa_pub_key_from_pem;
use gsc_image_types::ChipFamily;
use gsc_image_verify::{KeyEntry, KeyRole, KeyTable, VerifyConfig};
use serde_derive::{Deserialize, Serialize};

/// Signing key configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct KeyConfig {
    pub name: String,

    pub family: ChipFamily,

    pub role: KeyRole,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyid: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modulus: Option<Vec<u32>>,

    /// PEM public key, in place of `keyid`, `exponent` and `modulus`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pem: Option<PathBuf>,
}

impl KeyConfig {
    /// Resolve into a key table entry. Relative PEM paths are taken from `base_dir`.
    pub(crate) fn to_entry(&self, base_dir: &Path) -> anyhow::Result<KeyEntry> {
        let (keyid, modulus, exponent) = match (&self.pem, &self.modulus) {
            (Some(pem), None) => {
                if self.keyid.is_some() || self.exponent.is_some() {
                    bail!("`pem` replaces `keyid` and `exponent`");
                }
                let key = rsa_pub_key_from_pem(&base_dir.join(pem))?;
                (key.keyid, key.modulus.to_vec(), key.exponent.value())
            }
            (None, Some(modulus)) => {
                let keyid = self.keyid.context("Missing `keyid`")?;
                (keyid, modulus.clone(), self.exponent.unwrap_or(3))
            }
            (Some(_), Some(_)) => bail!("Both `pem` and `modulus` given"),
            (None, None) => bail!("One of `pem` or `modulus` is required"),
        };

        KeyEntry::new(&self.name, self.family, self.role, keyid, &modulus, exponent)
            .map_err(|err| anyhow!("{err}"))
    }
}

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct AppConfig {
    #[serde(default, skip_serializing)]
    pub verify: VerifyConfig,

    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

impl AppConfig {
    /// Build the key table
    pub(crate) fn key_table(&self, base_dir: &Path) -> anyhow::Result<KeyTable> {
        let mut table = KeyTable::new();
        for key in &self.keys {
            let entry = key
                .to_entry(base_dir)
                .with_context(|| format!("Invalid key \"{}\"", key.name))?;
            table
                .insert(entry)
                .map_err(|err| anyhow!("Key \"{}\": {err}", key.name))?;
        }
        Ok(table)
    }
}

/// Load the application configuration from file
pub(crate) fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read the config file {}", path.display()))?;

    let config: AppConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsc_image_fake_keys::DEV_KEY_3072_E3;

    fn dev_key_toml() -> String {
        let modulus = DEV_KEY_3072_E3
            .modulus
            .iter()
            .map(|w| format!("{w:#x}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "[verify]\nverbose = true\n\n[[keys]]\nname = \"dev\"\nfamily = \"haven\"\n\
             role = \"rom\"\nkeyid = {:#x}\nexponent = 3\nmodulus = [{modulus}]\n",
            DEV_KEY_3072_E3.keyid
        )
    }

    #[test]
    fn test_parse_config() {
        let config: AppConfig = toml::from_str(&dev_key_toml()).unwrap();
        assert!(config.verify.verbose);
        assert!(!config.verify.skip_hash_checking);

        let table = config.key_table(Path::new(".")).unwrap();
        let entry = table.get(DEV_KEY_3072_E3.keyid).unwrap();
        assert_eq!(entry.name(), "dev");
        assert_eq!(entry.family(), ChipFamily::Haven);
        assert_eq!(entry.role(), KeyRole::Rom);
    }

    #[test]
    fn test_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.verify, VerifyConfig::default());
        assert!(config.key_table(Path::new(".")).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_keys() {
        let e5 = dev_key_toml().replace("exponent = 3", "exponent = 5");
        let config: AppConfig = toml::from_str(&e5).unwrap();
        assert!(config.key_table(Path::new(".")).is_err());

        let again = dev_key_toml().replace("[verify]\nverbose = true\n", "");
        let twice = format!("{}\n{again}", dev_key_toml());
        let config: AppConfig = toml::from_str(&twice).unwrap();
        assert!(config.key_table(Path::new(".")).is_err());

        let unknown = "[verify]\nfast = true\n";
        assert!(toml::from_str::<AppConfig>(unknown).is_err());

        let missing = "[[keys]]\nname = \"k\"\nfamily = \"citadel\"\nrole = \"loader\"\n";
        let config: AppConfig = toml::from_str(missing).unwrap();
        assert!(config.key_table(Path::new(".")).is_err());
    }
}
