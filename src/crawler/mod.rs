// src/crawler/mod.rs

//! Paginated collection: a user's poem index and a poem's comment pages.
//!
//! Both walkers request one page at a time and stop at the first page that
//! yields nothing.

use tracing::{debug, info};
use url::Url;

pub mod datascraper;
use datascraper::CommentEntry;

use crate::config::ClientConfig;
use crate::domain::{Comment, PoemLinks};
use crate::error::{PoetryError, Result};
use crate::session::PageFetcher;

/// Walks paginated listings through a single session.
pub struct Crawler<'a> {
    fetcher: &'a dyn PageFetcher,
    config: &'a ClientConfig,
}

impl<'a> Crawler<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, config: &'a ClientConfig) -> Self {
        Self { fetcher, config }
    }

    /// Collect a user's poem titles and locations, newest first.
    ///
    /// With `at_least`, stops as soon as that many titles are known; the
    /// last page is kept whole, so the result may be a little larger.
    pub async fn collect_poem_links(&self, username: &str, at_least: Option<usize>) -> Result<PoemLinks> {
        let mut links = PoemLinks::new();
        let mut page = 1;

        loop {
            let page_url = self.config.links_page_url(username, page)?;
            let html = self.fetcher.get(&page_url).await?;
            let rows = datascraper::parse_link_rows(&html, &Url::parse(&page_url)?)?;
            debug!(username, page, found = rows.len(), "links page");

            if rows.is_empty() {
                break;
            }
            for (title, location) in rows {
                links.insert(title, location);
            }
            if at_least.is_some_and(|wanted| links.len() >= wanted) {
                break;
            }
            page += 1;
        }

        info!(username, count = links.len(), "collected poem links");
        Ok(links)
    }

    /// Fetch the comment threads of a poem, starting at comment page `page`.
    ///
    /// A thread may run over onto the next page, so the open branch is
    /// carried from one page to the next.
    pub async fn fetch_comments(&self, poem_url: &str, page: usize) -> Result<Vec<Comment>> {
        let mut threads = ThreadBuilder::new();
        let mut page = page;

        loop {
            let html = self.fetcher.get(&self.config.comment_page_url(poem_url, page)?).await?;
            let entries = datascraper::parse_comment_entries(&html)?;
            debug!(poem_url, page, found = entries.len(), "comments page");

            if entries.is_empty() {
                break;
            }
            for entry in entries {
                threads.push(entry)?;
            }
            page += 1;
        }

        Ok(threads.finish())
    }
}

/// Rebuilds comment threads from the flat, depth-tagged entries of the
/// comment pages.
///
/// `open` is the branch currently being read: `open[d]` is the latest
/// comment seen at depth `d`. A new entry at depth `d` closes everything at
/// `d` and below, attaching each closed comment to its parent.
#[derive(Debug, Default)]
pub struct ThreadBuilder {
    roots: Vec<Comment>,
    open: Vec<Comment>,
}

impl ThreadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CommentEntry) -> Result<()> {
        if entry.depth > self.open.len() {
            return Err(PoetryError::OrphanComment { depth: entry.depth });
        }
        self.close_to(entry.depth);
        self.open.push(Comment::new(entry.user, entry.date, entry.text));
        Ok(())
    }

    /// Top-level comments, replies nested in page order.
    pub fn finish(mut self) -> Vec<Comment> {
        self.close_to(0);
        self.roots
    }

    fn close_to(&mut self, depth: usize) {
        while self.open.len() > depth {
            let Some(closed) = self.open.pop() else { break };
            match self.open.last_mut() {
                Some(parent) => parent.replies.push(closed),
                None => self.roots.push(closed),
            }
        }
    }
}
