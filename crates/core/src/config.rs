//! Settings file parsing and loading.
//!
//! Settings use a line-oriented directive format:
//!
//! ```text
//! # comments and blank lines are ignored
//! timeout: 15
//! user_agent: Mozilla/5.0 (X11; Linux x86_64)
//! accept_language: fr-FR,fr;q=0.8
//! base_url(asura): https://asura.mirror.example
//! ```
//!
//! [`SettingsLoader`] reads `config.txt` from a custom directory and from the
//! standard per-user directory; values in the custom file win.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TankobonError};
use crate::fetch::FetchConfig;

/// File name looked up in each settings directory.
pub const SETTINGS_FILE: &str = "config.txt";

/// One parsed settings line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Timeout(u64),
    UserAgent(String),
    AcceptLanguage(String),
    /// Origin override for one source id.
    BaseUrl { source: String, url: String },
}

/// Parses a single non-comment settings line.
///
/// ```rust
/// use tankobon_core::config::{Directive, parse_directive};
///
/// assert_eq!(parse_directive("timeout: 10").unwrap(), Directive::Timeout(10));
/// assert_eq!(
///     parse_directive("base_url(asura): http://127.0.0.1:8080").unwrap(),
///     Directive::BaseUrl { source: "asura".to_string(), url: "http://127.0.0.1:8080".to_string() }
/// );
/// ```
pub fn parse_directive(line: &str) -> Result<Directive> {
    let Some((key, value)) = line.trim().split_once(':') else {
        return Err(TankobonError::ConfigError(format!("Expected `key: value`, got: {}", line.trim())));
    };

    let key = key.trim();
    let value = value.trim();
    if value.is_empty() {
        return Err(TankobonError::ConfigError(format!("Missing value for {}", key)));
    }

    match key {
        "timeout" => value
            .parse()
            .map(Directive::Timeout)
            .map_err(|_| TankobonError::ConfigError(format!("Invalid timeout: {}", value))),
        "user_agent" => Ok(Directive::UserAgent(value.to_string())),
        "accept_language" => Ok(Directive::AcceptLanguage(value.to_string())),
        _ => {
            if let Some(source) = key.strip_prefix("base_url(").and_then(|rest| rest.strip_suffix(')')) {
                let source = source.trim().to_lowercase();
                if source.is_empty() {
                    return Err(TankobonError::ConfigError("base_url needs a source id".to_string()));
                }
                return Ok(Directive::BaseUrl { source, url: value.to_string() });
            }
            Err(TankobonError::ConfigError(format!("Unknown directive: {}", key)))
        }
    }
}

/// Settings assembled from one or more directive files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub timeout: Option<u64>,
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    /// Per-source origin overrides, keyed by lowercase source id.
    pub base_urls: HashMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Timeout(secs) => self.timeout = Some(secs),
            Directive::UserAgent(ua) => self.user_agent = Some(ua),
            Directive::AcceptLanguage(lang) => self.accept_language = Some(lang),
            Directive::BaseUrl { source, url } => {
                self.base_urls.insert(source, url);
            }
        }
    }

    /// Parses settings from a file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::open(&path).map_err(|e| {
            TankobonError::ConfigError(format!("Cannot open file {}: {}", path.as_ref().display(), e))
        })?;

        Self::parse_reader(BufReader::new(file))
    }

    /// Parses settings from a reader.
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut settings = Self::new();

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line =
                line.map_err(|e| TankobonError::ConfigError(format!("Read error at line {}: {}", line_number, e)))?;
            settings.parse_line(&line, line_number)?;
        }

        Ok(settings)
    }

    /// Parses settings from a string.
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut settings = Self::new();

        for (index, line) in content.lines().enumerate() {
            settings.parse_line(line, index + 1)?;
        }

        Ok(settings)
    }

    fn parse_line(&mut self, line: &str, line_number: usize) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        match parse_directive(line) {
            Ok(directive) => {
                self.apply(directive);
                Ok(())
            }
            Err(e) => Err(TankobonError::ConfigError(format!("Parse error at line {}: {}", line_number, e))),
        }
    }

    /// Overlays `other` on top of `self`; values set in `other` win.
    pub fn merge(&mut self, other: &Settings) {
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.user_agent.is_some() {
            self.user_agent.clone_from(&other.user_agent);
        }
        if other.accept_language.is_some() {
            self.accept_language.clone_from(&other.accept_language);
        }
        for (source, url) in &other.base_urls {
            self.base_urls.insert(source.clone(), url.clone());
        }
    }

    /// Transport settings with these overrides applied to the defaults.
    pub fn fetch_config(&self) -> FetchConfig {
        let mut builder = FetchConfig::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ua) = &self.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        if let Some(lang) = &self.accept_language {
            builder = builder.accept_language(lang.clone());
        }

        builder.build()
    }

    /// Origin override for a source id, if any.
    pub fn base_url(&self, source: &str) -> Option<&str> {
        self.base_urls.get(&source.to_lowercase()).map(String::as_str)
    }
}

/// Locates and merges settings files.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    /// Highest-priority directory, usually from the command line.
    custom_dir: Option<PathBuf>,
    /// Per-user directory.
    standard_dir: Option<PathBuf>,
}

impl SettingsLoader {
    /// A loader that looks nowhere until directories are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader over the per-user directory (`<config dir>/tankobon`).
    pub fn standard() -> Self {
        Self { custom_dir: None, standard_dir: Self::default_standard_dir() }
    }

    pub fn custom_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.custom_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn standard_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.standard_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Loads the standard file, then the custom file over it.
    ///
    /// Missing files are skipped; a file that exists but does not parse is an error.
    pub fn load(&self) -> Result<Settings> {
        let mut settings = Settings::new();

        for dir in [&self.standard_dir, &self.custom_dir].into_iter().flatten() {
            let path = dir.join(SETTINGS_FILE);
            if !path.is_file() {
                debug!(path = %path.display(), "no settings file");
                continue;
            }

            debug!(path = %path.display(), "loading settings");
            settings.merge(&Settings::parse_file(&path)?);
        }

        Ok(settings)
    }

    fn default_standard_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tankobon"))
    }
}
