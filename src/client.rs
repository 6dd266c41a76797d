use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::crawler::{datascraper, Crawler};
use crate::domain::{Comment, Poem, PoemLinks};
use crate::error::{PoetryError, Result};
use crate::session::{self, HttpSession, PageFetcher};

/// What to read besides the poem itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub include_author: bool,
    pub include_comments: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            include_author: true,
            include_comments: false,
        }
    }
}

/// A downloaded profile picture.
#[derive(Debug, Clone)]
pub struct Picture {
    pub url: Url,
    pub bytes: Vec<u8>,
}

/// Client for poems on allpoetry.com.
///
/// Owns one session; once [`AllPoetry::login`] succeeds every later request
/// is authenticated. Logging in is needed to page past the 15th page of a
/// user's poem index.
pub struct AllPoetry<F: PageFetcher = HttpSession> {
    fetcher: F,
    config: ClientConfig,
}

impl AllPoetry<HttpSession> {
    /// Build an HTTP-backed client, logging in when the config carries credentials.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let session = HttpSession::new(&config)?;
        let client = Self::with_fetcher(session, config);
        if let Some((username, password)) = client.config.credentials() {
            client.login(username, password).await?;
        }
        Ok(client)
    }
}

impl<F: PageFetcher> AllPoetry<F> {
    pub fn with_fetcher(fetcher: F, config: ClientConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let login_url = self.config.login_url()?;
        session::login(
            &self.fetcher,
            &login_url,
            &self.config.login_fields,
            username,
            password,
        )
        .await
    }

    /// Fetch a poem, reading the author as configured.
    pub async fn fetch_poem(&self, location: &str, include_comments: bool) -> Result<Poem> {
        let options = FetchOptions {
            include_author: self.config.include_author,
            include_comments,
        };
        self.fetch_poem_with(location, options).await
    }

    pub async fn fetch_poem_with(&self, location: &str, options: FetchOptions) -> Result<Poem> {
        let html = self.fetcher.get(location).await?;
        let mut poem = datascraper::parse_poem_page(&html, location, options.include_author)?;
        debug!(location, title = %poem.title, "parsed poem");

        if options.include_comments {
            poem.comments = Some(self.fetch_comments(location, 1).await?);
        }
        Ok(poem)
    }

    /// Comment threads of a poem, read from comment page `page` onwards.
    pub async fn fetch_comments(&self, location: &str, page: usize) -> Result<Vec<Comment>> {
        self.crawler().fetch_comments(location, page).await
    }

    pub async fn collect_poem_links(&self, username: &str, at_least: Option<usize>) -> Result<PoemLinks> {
        self.crawler().collect_poem_links(username, at_least).await
    }

    pub async fn fetch_user_picture(&self, username: &str) -> Result<Picture> {
        let profile_url = self.config.profile_url(username)?;
        let html = self.fetcher.get(profile_url.as_str()).await?;
        let url = datascraper::extract_picture_url(&html, &profile_url)?;
        let bytes = self.fetcher.get_bytes(url.as_str()).await?;
        if bytes.is_empty() {
            return Err(PoetryError::MissingElement("profile picture data"));
        }
        Ok(Picture { url, bytes })
    }

    fn crawler(&self) -> Crawler<'_> {
        Crawler::new(&self.fetcher, &self.config)
    }
}
