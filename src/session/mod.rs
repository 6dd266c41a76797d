//! HTTP session shared by every request a client makes.
//!
//! Cookies persist across calls, so once [`login`] succeeds every later
//! fetch on the same session is authenticated.

mod login;

pub use login::{build_login_form, login};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::Result;

/// Fetches raw pages. The reqwest-backed [`HttpSession`] is the real one;
/// tests swap in canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<String>;

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_store(true);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn read_text(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            warn!(url = %response.url(), %status, "unexpected status, parsing body anyway");
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpSession {
    async fn get(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        Self::read_text(response).await
    }

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<String> {
        debug!(url, fields = form.len(), "POST");
        let response = self.client.post(url).form(form).send().await?;
        Self::read_text(response).await
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "GET bytes");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fetcher serving canned pages.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        pages: HashMap<String, String>,
        pub(crate) requested: Mutex<Vec<String>>,
        pub(crate) posted: Mutex<Vec<(String, Vec<(String, String)>)>>,
        post_response: String,
    }

    impl FakeFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn page(mut self, url: &str, html: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), html.into());
            self
        }

        pub(crate) fn post_response(mut self, html: impl Into<String>) -> Self {
            self.post_response = html.into();
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn get(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            // unknown pages render as an empty document
            Ok(self.pages.get(url).cloned().unwrap_or_default())
        }

        async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<String> {
            self.posted
                .lock()
                .unwrap()
                .push((url.to_string(), form.to_vec()));
            Ok(self.post_response.clone())
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self
                .pages
                .get(url)
                .map(|body| body.as_bytes().to_vec())
                .unwrap_or_default())
        }
    }
}
