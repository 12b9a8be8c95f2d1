//! Scraper configuration.
//!
//! Every key is optional; a config file only needs the values it changes:
//! ```toml
//! delay_ms = 500
//! timeout_secs = 30
//! skip_missing = true
//! ```

use crate::error::{Mr3Error, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://monster-rancher.fandom.com/wiki/";
pub const DEFAULT_INDEX_PAGE: &str = "Monster_Rancher_3_Encyclopedia";
pub const DEFAULT_GAME_TITLE: &str = "Monster Rancher 3";
pub const DEFAULT_DELAY_MS: u64 = 150;

/// Settings for the fandom wiki scraper.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScraperConfig {
    /// Wiki article prefix; page slugs are appended to it.
    pub base_url: String,
    /// Slug of the encyclopedia page listing every monster.
    pub index_page: String,
    /// Link title that marks this game's row in a monster's summary table.
    pub game_title: String,
    /// Pause before each per-monster lookup.
    pub delay_ms: u64,
    pub user_agent: String,
    /// No timeout when unset.
    pub timeout_secs: Option<u64>,
    /// Skip monsters whose page can't be resolved instead of failing the run.
    pub skip_missing: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            index_page: DEFAULT_INDEX_PAGE.to_string(),
            game_title: DEFAULT_GAME_TITLE.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            user_agent: concat!("mr3-sql/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
            skip_missing: false,
        }
    }
}

impl ScraperConfig {
    /// Load scraper configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Mr3Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read scraper config from {:?}: {}", path, e),
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse scraper configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Mr3Error::Config(format!("Failed to parse scraper config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Mr3Error::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.index_page.is_empty() {
            return Err(Mr3Error::Config("index_page must not be empty".to_string()));
        }
        Ok(())
    }

    /// Full URL of a wiki page given its slug.
    pub fn page_url(&self, slug: &str) -> String {
        format!("{}{}", self.base_url, slug)
    }

    /// Full URL of the encyclopedia page.
    pub fn index_url(&self) -> String {
        self.page_url(&self.index_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(ScraperConfig::from_toml("").unwrap(), ScraperConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ScraperConfig::from_toml("delay_ms = 0\nskip_missing = true\ntimeout_secs = 20\n").unwrap();
        assert_eq!(config.delay_ms, 0);
        assert!(config.skip_missing);
        assert_eq!(config.timeout_secs, Some(20));
        assert_eq!(config.game_title, "Monster Rancher 3");
        assert_eq!(
            config.index_url(),
            "https://monster-rancher.fandom.com/wiki/Monster_Rancher_3_Encyclopedia"
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            ScraperConfig::from_toml("delay = 3"),
            Err(Mr3Error::Config(_))
        ));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        assert!(ScraperConfig::from_toml("base_url = \"ftp://wiki\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.toml");
        std::fs::write(&path, "user_agent = \"tester\"\n").unwrap();
        let config = ScraperConfig::from_file(&path).unwrap();
        assert_eq!(config.user_agent, "tester");

        assert!(ScraperConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
