use crate::cache::CacheConfig;
use crate::error::Result;
use crate::network::session::Language;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use getset::Getters;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

const ENV_PREFIX: &str = "MOVIE_INFO_";

fn default_user_agent() -> String {
    format!("movie-info/{}", env!("CARGO_PKG_VERSION"))
}

/// Retention of the two shared caches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub genres: CacheConfig,
    pub images: CacheConfig,
}

/// Client settings.
///
/// Loaded from an optional YAML file, then overridden by `MOVIE_INFO_*`
/// environment variables. Nested keys use a double underscore, e.g.
/// `MOVIE_INFO_CACHE__IMAGES__MAX_ENTRIES=200`.
#[derive(Clone, Deserialize, Getters)]
#[get = "pub"]
pub struct ClientConfig {
    api_key: String,
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default)]
    language: Language,
    #[serde(default)]
    cache: CacheSettings,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_agent: default_user_agent(),
            language: Language::default(),
            cache: CacheSettings::default(),
        }
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        log::debug!("Loaded configuration {:?}", config);
        Ok(config)
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_cache(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("user_agent", &self.user_agent)
            .field("language", &self.language)
            .field("cache", &self.cache)
            .finish()
    }
}
