//! Configuration loading and validation.
//!
//! Configuration merges three layers, weakest first: built-in defaults, a
//! TOML file (the platform config directory by default), and
//! `VITRINE_`-prefixed environment variables. Validation runs after the
//! merge, so a bad value is rejected no matter which layer it came from.
//!
//! ```toml
//! [database]
//! path = "/var/lib/vitrine/records.db"
//!
//! [store]
//! root = "/var/www/fragments"
//!
//! [[categories]]
//! name = "Network Links"
//! page_size = 12
//!
//! [[categories]]
//! name = "Curated Exhibits"
//! slug = "exhibits"
//! page_size = 6
//! home_count = 2
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use rslug::slugify;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use vitrine_pages::CategorySettings;

const ENV_PREFIX: &str = "VITRINE_";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// Record database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: data_dir().join("records.db") }
    }
}

/// Fragment store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub root: PathBuf,
}
impl Default for StoreConfig {
    fn default() -> Self {
        Self { root: data_dir().join("fragments") }
    }
}

/// Read-side behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// How long a reader waits behind an in-flight regeneration before
    /// giving up, in milliseconds.
    pub lock_timeout_ms: u64,
}
impl Default for ReaderConfig {
    fn default() -> Self {
        Self { lock_timeout_ms: 5_000 }
    }
}
impl ReaderConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// One category of submitted records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Display name (e.g. `"Network Links"`).
    pub name: String,
    /// Identifier used for the lock, the record store, and the fragment
    /// directory. Defaults to the slugified display name.
    #[serde(default)]
    pub slug: Option<String>,
    /// Records per listing page.
    #[serde(default = "defaults::page_size")]
    pub page_size: u64,
    /// Records in the front-page preview.
    #[serde(default = "defaults::home_count")]
    pub home_count: u64,
}

impl CategoryConfig {
    /// The effective category identifier.
    pub fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify!(&self.name))
    }

    /// The per-category settings the page cache consumes.
    pub fn settings(&self) -> CategorySettings {
        CategorySettings::new(self.slug(), self.page_size, self.home_count)
    }
}

mod defaults {
    pub(crate) fn page_size() -> u64 {
        6
    }
    pub(crate) fn home_count() -> u64 {
        2
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file, and the
    /// environment.
    ///
    /// When `path` is `None`, the platform config location is consulted
    /// (and silently skipped if absent). Environment variables use the
    /// `VITRINE_` prefix with `__` as the section separator, e.g.
    /// `VITRINE_READER__LOCK_TIMEOUT_MS=250`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = path.map(Path::to_path_buf).or_else(default_config_path);
        if let Some(file) = file {
            debug!(path = %file.display(), "merging configuration file");
            figment = figment.merge(Toml::file(file));
        }
        let config: Config =
            figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// The per-category settings list the page cache consumes.
    pub fn category_settings(&self) -> Vec<CategorySettings> {
        self.categories.iter().map(CategoryConfig::settings).collect()
    }

    /// Reject values no layer should have been able to set.
    fn validate(&self) -> Result<()> {
        let mut slugs = HashSet::new();
        for category in &self.categories {
            let slug = category.slug();
            if slug.is_empty() {
                exn::bail!(ErrorKind::Invalid(format!("category `{}` produces an empty slug", category.name)));
            }
            if category.page_size == 0 {
                exn::bail!(ErrorKind::Invalid(format!("category `{slug}`: page_size must be at least 1")));
            }
            if category.home_count == 0 {
                exn::bail!(ErrorKind::Invalid(format!("category `{slug}`: home_count must be at least 1")));
            }
            if !slugs.insert(slug.clone()) {
                exn::bail!(ErrorKind::Invalid(format!("duplicate category slug `{slug}`")));
            }
        }
        Ok(())
    }
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "vitrine", "vitrine")
        .map(|dirs| dirs.data_dir().to_path_buf())
        // No resolvable home directory; fall back to the working directory.
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "vitrine", "vitrine")
        .map(|dirs| dirs.config_dir().join("vitrine.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn load_toml(toml: &str) -> Result<Config> {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(toml.as_bytes()).unwrap();
        Config::load(Some(file.path()))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = load_toml("").unwrap();
        assert!(config.categories.is_empty());
        assert_eq!(config.reader.lock_timeout(), Duration::from_millis(5_000));
        assert!(config.database.path.ends_with("records.db"));
        assert!(config.store.root.ends_with("fragments"));
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let config = load_toml(
            r#"
            [database]
            path = "/srv/vitrine/records.db"

            [reader]
            lock_timeout_ms = 250

            [[categories]]
            name = "Network Links"
            page_size = 12

            [[categories]]
            name = "Curated Exhibits"
            slug = "exhibits"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/srv/vitrine/records.db"));
        assert_eq!(config.reader.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.categories.len(), 2);
        // Explicit slug wins; otherwise the name is slugified.
        assert_eq!(config.categories[0].slug(), "network-links");
        assert_eq!(config.categories[1].slug(), "exhibits");
        // Unset fields keep their per-category defaults.
        assert_eq!(config.categories[0].page_size, 12);
        assert_eq!(config.categories[1].page_size, 6);
        assert_eq!(config.categories[1].home_count, 2);
    }

    #[test]
    fn test_category_settings_conversion() {
        let config = load_toml(
            r#"
            [[categories]]
            name = "Code Examples"
            page_size = 8
            home_count = 1
            "#,
        )
        .unwrap();
        let settings = config.category_settings();
        assert_eq!(settings, vec![CategorySettings::new("code-examples", 8, 1)]);
    }

    #[rstest]
    #[case("page_size = 0")]
    #[case("home_count = 0")]
    fn test_zero_sizes_are_rejected(#[case] field: &str) {
        let toml = format!("[[categories]]\nname = \"Links\"\n{field}\n");
        let err = load_toml(&toml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_duplicate_slugs_are_rejected() {
        let err = load_toml(
            r#"
            [[categories]]
            name = "Network Links"

            [[categories]]
            name = "network links"
            "#,
        )
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = load_toml("this is not toml [").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse));
    }
}
