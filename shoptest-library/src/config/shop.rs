//! Facts about the shop installation under test.

use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Name of the shop's main configuration file, relative to the shop directory.
pub const SHOP_CONFIG_FILE: &str = "config.inc.php";

/// Name of the legacy edition marker file, relative to the shop directory.
pub const VERSION_DEFINE_FILE: &str = "_version_define.php";

/// Identifier of the base shop in non-enterprise editions.
pub const BASE_SHOP_ID: &str = "oxbaseshop";

#[expect(clippy::expect_used, reason = "pattern is a literal")]
static EDITION_DEFINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"define\s*\(\s*['"]OXID_VERSION_(EE|PE)['"]\s*,\s*(?i:true|1)\s*\)"#)
        .expect("valid edition define pattern")
});

#[expect(clippy::expect_used, reason = "pattern is a literal")]
static SHOP_URL_ASSIGNMENT_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"\$this->sShopURL\s*=\s*(?:'([^']*)'|"([^"]*)")\s*;"#)
        .expect("valid shop url pattern")
});

/// Edition of the shop under test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ShopEdition {
    /// Community edition.
    #[default]
    #[serde(rename = "CE")]
    Community,
    /// Professional edition.
    #[serde(rename = "PE")]
    Professional,
    /// Enterprise edition.
    #[serde(rename = "EE")]
    Enterprise,
}

impl FromStr for ShopEdition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CE" => Ok(Self::Community),
            "PE" => Ok(Self::Professional),
            "EE" => Ok(Self::Enterprise),
            _ => Err(Error::UnknownShopEdition(s.to_owned())),
        }
    }
}

impl Display for ShopEdition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Community => write!(f, "CE"),
            Self::Professional => write!(f, "PE"),
            Self::Enterprise => write!(f, "EE"),
        }
    }
}

/// Identifier of the shop that tests run against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopId {
    /// The single base shop of community and professional editions.
    BaseShop,
    /// A numbered enterprise shop; 1 is the main shop.
    Numbered(u32),
}

impl ShopId {
    /// Returns whether this identifies an enterprise subshop.
    pub const fn is_sub_shop(self) -> bool {
        matches!(self, Self::Numbered(id) if id > 1)
    }
}

impl Display for ShopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseShop => write!(f, "{BASE_SHOP_ID}"),
            Self::Numbered(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for ShopId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::BaseShop => serializer.serialize_str(BASE_SHOP_ID),
            Self::Numbered(id) => serializer.serialize_u32(*id),
        }
    }
}

/// Detects the shop edition from the legacy edition marker file, if present.
pub fn detect_edition(shop_path: &Path) -> Result<Option<ShopEdition>> {
    let marker = shop_path.join(VERSION_DEFINE_FILE);
    if !marker.is_file() {
        return Ok(None);
    }

    let content =
        std::fs::read_to_string(&marker).map_err(|e| Error::ConfigFileRead(marker.clone(), e))?;

    let edition = active_php_lines(&content)
        .filter_map(|line| EDITION_DEFINE_RE.captures(line))
        .find_map(|captures| captures.get(1))
        .map(|m| match m.as_str() {
            "EE" => ShopEdition::Enterprise,
            _ => ShopEdition::Professional,
        });

    Ok(edition.or(Some(ShopEdition::Community)))
}

/// Reads the shop URL assigned in the shop's `config.inc.php`.
///
/// The last uncommented assignment wins, as it would when the file is executed.
pub fn read_config_shop_url(shop_path: &Path) -> Result<Option<String>> {
    let config_file = shop_path.join(SHOP_CONFIG_FILE);
    let content = std::fs::read_to_string(&config_file)
        .map_err(|e| Error::ConfigFileRead(config_file.clone(), e))?;

    let url = active_php_lines(&content)
        .filter_map(|line| SHOP_URL_ASSIGNMENT_RE.captures(line))
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|m| m.as_str().to_owned())
        .last();

    Ok(url)
}

fn active_php_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().map(str::trim_start).filter(|line| {
        !(line.starts_with("//") || line.starts_with('#') || line.starts_with('*'))
    })
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::{assert_eq, assert_matches};

    #[test]
    fn parse_edition() -> Result<()> {
        assert_eq!("ee".parse::<ShopEdition>()?, ShopEdition::Enterprise);
        assert_eq!(" PE ".parse::<ShopEdition>()?, ShopEdition::Professional);
        assert_eq!("CE".parse::<ShopEdition>()?, ShopEdition::Community);
        assert_matches!("XE".parse::<ShopEdition>(), Err(Error::UnknownShopEdition(s)) if s == "XE");
        Ok(())
    }

    #[test]
    fn shop_id_display() {
        assert_eq!(ShopId::BaseShop.to_string(), "oxbaseshop");
        assert_eq!(ShopId::Numbered(2).to_string(), "2");
        assert!(ShopId::Numbered(2).is_sub_shop());
        assert!(!ShopId::Numbered(1).is_sub_shop());
        assert!(!ShopId::BaseShop.is_sub_shop());
    }

    #[test]
    fn detect_edition_from_marker_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(detect_edition(dir.path())?, None);

        std::fs::write(
            dir.path().join(VERSION_DEFINE_FILE),
            "<?php\n// define('OXID_VERSION_PE', true);\ndefine( 'OXID_VERSION_EE', true );\n",
        )?;
        assert_eq!(detect_edition(dir.path())?, Some(ShopEdition::Enterprise));

        std::fs::write(dir.path().join(VERSION_DEFINE_FILE), "<?php\n")?;
        assert_eq!(detect_edition(dir.path())?, Some(ShopEdition::Community));

        Ok(())
    }

    #[test]
    fn read_shop_url_from_config_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join(SHOP_CONFIG_FILE),
            r#"<?php
    $this->dbHost = 'localhost';
    // $this->sShopURL = 'http://commented.example';
    $this->sShopURL = 'http://first.example';
    $this->sShopURL   =  "http://shop.example/";
"#,
        )?;

        assert_eq!(
            read_config_shop_url(dir.path())?.as_deref(),
            Some("http://shop.example/")
        );

        Ok(())
    }

    #[test]
    fn read_shop_url_without_assignment() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(SHOP_CONFIG_FILE), "<?php\n")?;
        assert_eq!(read_config_shop_url(dir.path())?, None);
        Ok(())
    }
}
