use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::Comment;

/// A poem with the metadata shown on its page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poem {
    pub title: String,
    /// Username of the author, when the author was requested and the bio link exists.
    pub author: Option<String>,
    pub body: Vec<String>,
    /// Copyright line and the author's trailing notes.
    pub meta: String,
    pub url: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub count_likes: Option<u64>,
    /// May be rounded, the site abbreviates large counts ("541.7k").
    pub count_views: Option<i64>,
    pub categories: Option<Vec<String>>,
    /// Top-level comments; replies hang off each one.
    pub comments: Option<Vec<Comment>>,
}

impl Poem {
    /// Whitespace-separated words across the body.
    pub fn word_count(&self) -> usize {
        self.body
            .iter()
            .map(|line| line.split_whitespace().count())
            .sum()
    }

    /// Every comment, replies included.
    pub fn num_comments(&self) -> usize {
        self.comments
            .as_deref()
            .map_or(0, |comments| comments.iter().map(|c| c.num_replies() + 1).sum())
    }

    pub fn num_comment_threads(&self) -> usize {
        self.comments.as_ref().map_or(0, Vec::len)
    }
}
