use crate::error::{Error, Result};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

lazy_static! {
    // ISO 639-1 language followed by an ISO 3166-1 region
    static ref LANGUAGE_TAG: Regex = Regex::new(r"^([a-z]{2})-([A-Z]{2})$").unwrap();
}

/// Language the API translates its fields to, e.g. `en-US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if LANGUAGE_TAG.is_match(&tag) {
            Ok(Self(tag))
        } else {
            Err(Error::InvalidLanguage(tag))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language part of the tag, `en` for `en-US`
    pub fn code(&self) -> &str {
        &self.0[..2]
    }

    /// Region part of the tag, `US` for `en-US`
    pub fn region(&self) -> &str {
        &self.0[3..]
    }
}

impl Default for Language {
    fn default() -> Self {
        Self("en-US".to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Language {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

/// Credentials and preferences every request is built with.
///
/// Cloning shares the same session, so a language change is seen by every
/// service holding it from the next request on.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api_key: RwLock<String>,
    language: RwLock<Language>,
    user_agent: String,
}

impl Session {
    pub fn new(api_key: impl Into<String>, user_agent: impl Into<String>, language: Language) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api_key: RwLock::new(api_key.into()),
                language: RwLock::new(language),
                user_agent: user_agent.into(),
            }),
        }
    }

    pub fn api_key(&self) -> String {
        self.inner.api_key.read().clone()
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        *self.inner.api_key.write() = api_key.into();
        log::info!("API key updated");
    }

    pub fn language(&self) -> Language {
        self.inner.language.read().clone()
    }

    pub fn set_language(&self, language: Language) {
        log::info!("Language changed to {}", language);
        *self.inner.language.write() = language;
    }

    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &"***")
            .field("language", &self.language())
            .field("user_agent", &self.inner.user_agent)
            .finish()
    }
}
