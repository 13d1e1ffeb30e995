//! Lookup of adapters by id.

use std::sync::Arc;

use tracing::debug;

use super::{AsuraSource, MangaLifeSource, MangaSource, ManhuaFastSource, asura, mangalife, manhuafast};
use crate::config::Settings;
use crate::model::SourceInfo;
use crate::{Result, TankobonError};

/// The set of available adapters, in registration order.
///
/// Built once and then only read; adapters are shared as `Arc`s so callers
/// can move them into concurrent tasks.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn MangaSource>>,
}

impl SourceRegistry {
    /// Registers every built-in adapter with default transport settings.
    pub fn new() -> Result<Self> {
        Self::with_settings(&Settings::default())
    }

    /// Registers every built-in adapter with the given settings applied.
    pub fn with_settings(settings: &Settings) -> Result<Self> {
        let config = settings.fetch_config();
        let base = |id: &str, default: &'static str| settings.base_url(id).unwrap_or(default).to_string();

        let mut registry = Self::empty();
        registry.register(Arc::new(AsuraSource::with_base_url(
            &base(asura::ID, asura::BASE_URL),
            config.clone(),
        )?));
        registry.register(Arc::new(ManhuaFastSource::with_base_url(
            &base(manhuafast::ID, manhuafast::BASE_URL),
            config.clone(),
        )?));
        registry.register(Arc::new(MangaLifeSource::with_base_url(
            &base(mangalife::ID, mangalife::BASE_URL),
            config,
        )?));

        Ok(registry)
    }

    /// A registry with no adapters.
    pub fn empty() -> Self {
        Self { sources: Vec::new() }
    }

    /// Adds an adapter, replacing any already registered under the same id.
    pub fn register(&mut self, source: Arc<dyn MangaSource>) {
        let id = source.info().id;
        debug!(source = %id, "registering source");
        self.sources.retain(|existing| existing.info().id != id);
        self.sources.push(source);
    }

    /// Looks up an adapter by id, ignoring case and surrounding whitespace.
    ///
    /// ```rust
    /// use tankobon_core::SourceRegistry;
    ///
    /// let registry = SourceRegistry::new().unwrap();
    /// assert_eq!(registry.get(" Asura ").unwrap().info().id, "asura");
    /// assert!(registry.get("unknown").is_err());
    /// ```
    pub fn get(&self, id: &str) -> Result<Arc<dyn MangaSource>> {
        let wanted = id.trim().to_lowercase();

        self.sources
            .iter()
            .find(|source| source.info().id == wanted)
            .cloned()
            .ok_or_else(|| TankobonError::UnknownSource { id: id.to_string(), available: self.ids().join(", ") })
    }

    /// Descriptions of all registered adapters.
    pub fn list(&self) -> Vec<SourceInfo> {
        self.sources.iter().map(|source| source.info()).collect()
    }

    /// Registered ids.
    pub fn ids(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.info().id).collect()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry").field("sources", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;

    #[test]
    fn test_registration_order() {
        let registry = SourceRegistry::new().unwrap();
        assert_eq!(registry.ids(), vec!["asura", "manhuafast", "mangalife"]);
    }

    #[test]
    fn test_list_reports_origins() {
        let registry = SourceRegistry::new().unwrap();
        let list = registry.list();

        assert_eq!(list[0].name, "Asura Scans");
        assert_eq!(list[0].base_url, "https://asuracomic.net");
        assert_eq!(list[2].base_url, "https://manga4life.com");
    }

    #[test]
    fn test_unknown_source_lists_available() {
        let registry = SourceRegistry::new().unwrap();

        let err = registry.get("foo").err().unwrap();

        assert_eq!(
            err.to_string(),
            "Source \"foo\" not found. Available sources: asura, manhuafast, mangalife"
        );
    }

    #[test]
    fn test_settings_override_base_url() {
        let settings = Settings::parse_str("base_url(manhuafast): http://127.0.0.1:4000\ntimeout: 3").unwrap();

        let registry = SourceRegistry::with_settings(&settings).unwrap();

        assert_eq!(registry.get("manhuafast").unwrap().info().base_url, "http://127.0.0.1:4000");
        assert_eq!(registry.get("asura").unwrap().info().base_url, "https://asuracomic.net");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let settings = Settings::parse_str("base_url(asura): ftp://nope").unwrap();
        assert!(matches!(SourceRegistry::with_settings(&settings), Err(TankobonError::InvalidUrl(_))));
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = SourceRegistry::empty();
        let config = FetchConfig::default();
        registry.register(Arc::new(AsuraSource::new(config.clone()).unwrap()));
        registry.register(Arc::new(AsuraSource::with_base_url("http://localhost:1", config).unwrap()));

        assert_eq!(registry.ids(), vec!["asura"]);
        assert_eq!(registry.get("asura").unwrap().info().base_url, "http://localhost:1");
    }
}
