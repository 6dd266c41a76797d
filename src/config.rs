//! Client configuration.
//!
//! Read from a TOML file (by default `~/.config/allpoetry/config.toml`).
//! Every field is optional; missing fields fall back to [`ClientConfig::default`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::{PoetryError, Result};

pub const DEFAULT_BASE_URL: &str = "https://allpoetry.com";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Which hidden `<input>` fields of the login form are forwarded with the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenFieldRule {
    /// The first `n` hidden inputs in document order.
    FirstN(usize),
    /// The hidden inputs carrying these names, in the given order.
    Named(Vec<String>),
}

impl Default for HiddenFieldRule {
    fn default() -> Self {
        // authenticity token, utf8 marker
        Self::FirstN(2)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Site root every derived URL hangs off.
    pub base_url: String,

    pub user_agent: String,

    /// Request timeout in seconds. `None` keeps the HTTP client default.
    pub timeout_secs: Option<u64>,

    /// Read the author from the bio link when fetching a poem.
    pub include_author: bool,

    pub login_fields: HiddenFieldRule,

    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
            include_author: true,
            login_fields: HiddenFieldRule::default(),
            username: None,
            password: None,
        }
    }
}

impl ClientConfig {
    /// Load from an explicit path, or from the default path if it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `~/.config/allpoetry/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("allpoetry").join("config.toml"))
    }

    /// Credentials, if both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    pub fn base(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    pub fn login_url(&self) -> Result<String> {
        Ok(self.base()?.join("login")?.to_string())
    }

    /// The n-th page of a user's poem index, not a poem itself.
    pub fn links_page_url(&self, username: &str, page: usize) -> Result<String> {
        let mut url = self.profile_url(username)?;
        url.query_pairs_mut()
            .append_pair("links", "1")
            .append_pair("page", &page.to_string());
        Ok(url.to_string())
    }

    /// Comment page `page` of a poem; relative poem locations resolve against the base.
    pub fn comment_page_url(&self, poem_url: &str, page: usize) -> Result<String> {
        let mut url = self.base()?.join(poem_url)?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url.to_string())
    }

    pub fn profile_url(&self, username: &str) -> Result<Url> {
        Ok(self.base()?.join(username)?)
    }

    fn validate(&self) -> Result<()> {
        let base = self.base()?;
        if base.cannot_be_a_base() {
            return Err(PoetryError::Config(format!(
                "base_url cannot be used as a base: {}",
                self.base_url
            )));
        }
        if let HiddenFieldRule::Named(names) = &self.login_fields {
            if names.is_empty() {
                return Err(PoetryError::Config(
                    "login_fields.named needs at least one field name".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.include_author);
        assert_eq!(config.login_fields, HiddenFieldRule::FirstN(2));
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml("include_author = false\ntimeout_secs = 5\n").unwrap();
        assert!(!config.include_author);
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_named_login_fields() {
        let config = ClientConfig::from_toml(
            "[login_fields]\nnamed = [\"authenticity_token\", \"utf8\"]\n",
        )
        .unwrap();
        assert_eq!(
            config.login_fields,
            HiddenFieldRule::Named(vec!["authenticity_token".into(), "utf8".into()])
        );
    }

    #[test]
    fn test_empty_named_login_fields_rejected() {
        let err = ClientConfig::from_toml("[login_fields]\nnamed = []\n").unwrap_err();
        assert!(matches!(err, PoetryError::Config(_)));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let err = ClientConfig::from_toml("base_url = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, PoetryError::InvalidUrl(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username = \"bard\"\npassword = \"secret\"").unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.credentials(), Some(("bard", "secret")));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, PoetryError::Io(_)));
    }

    #[test]
    fn test_derived_urls() {
        let config = ClientConfig::default();
        assert_eq!(config.login_url().unwrap(), "https://allpoetry.com/login");
        assert_eq!(
            config.links_page_url("bard", 3).unwrap(),
            "https://allpoetry.com/bard?links=1&page=3"
        );
        assert_eq!(
            config.profile_url("bard").unwrap().as_str(),
            "https://allpoetry.com/bard"
        );
        assert_eq!(
            config.comment_page_url("https://allpoetry.com/poem/7-dusk", 2).unwrap(),
            "https://allpoetry.com/poem/7-dusk?page=2"
        );
        assert_eq!(
            config.comment_page_url("/poem/7-dusk", 1).unwrap(),
            "https://allpoetry.com/poem/7-dusk?page=1"
        );
    }
}
