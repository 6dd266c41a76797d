//! # allpoetry
//!
//! Reads poems, their metadata and their comment threads from allpoetry.com.
//!
//! ```text
//! Session (cookies, login) → Crawler (pagination) → datascraper (HTML) → Poem / Comment
//! ```
//!
//! ```rust,ignore
//! use allpoetry::{AllPoetry, ClientConfig};
//!
//! let client = AllPoetry::connect(ClientConfig::default()).await?;
//! let links = client.collect_poem_links("some_user", Some(20)).await?;
//! for (_title, url) in links.iter() {
//!     let poem = client.fetch_poem(url, true).await?;
//!     println!("{} ({} words, {} comments)", poem.title, poem.word_count(), poem.num_comments());
//! }
//! ```

/// The [`AllPoetry`] client.
pub mod client;

/// Client configuration loaded from TOML.
pub mod config;

/// Pagination over poem indexes and comment pages, plus page extraction.
pub mod crawler;

/// [`Poem`], [`Comment`] and [`PoemLinks`].
pub mod domain;

pub mod error;

/// HTTP session, the [`PageFetcher`](session::PageFetcher) seam and login.
pub mod session;

pub use client::{AllPoetry, FetchOptions, Picture};
pub use config::{ClientConfig, HiddenFieldRule};
pub use domain::{Comment, Poem, PoemLinks};
pub use error::{PoetryError, Result};
