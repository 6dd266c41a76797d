use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A comment and, nested beneath it, every reply made to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub user: String,
    pub date: DateTime<FixedOffset>,
    pub text: String,
    /// Direct replies only, in page order.
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(user: impl Into<String>, date: DateTime<FixedOffset>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            date,
            text: text.into(),
            replies: Vec::new(),
        }
    }

    /// Number of replies beneath this comment at any depth.
    pub fn num_replies(&self) -> usize {
        let mut pending: Vec<&Comment> = self.replies.iter().collect();
        let mut count = 0;
        while let Some(reply) = pending.pop() {
            count += 1;
            pending.extend(reply.replies.iter());
        }
        count
    }
}
