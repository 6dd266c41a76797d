use std::collections::HashMap;

use serde::ser::{Serialize, Serializer};

/// Poem titles mapped to their locations, in the order they were discovered.
///
/// Titles are not unique on the site; inserting a title again replaces its
/// location but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoemLinks {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl PoemLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title: String, location: String) {
        match self.index.get(&title) {
            Some(&pos) => self.entries[pos].1 = location,
            None => {
                self.index.insert(title.clone(), self.entries.len());
                self.entries.push((title, location));
            }
        }
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.index
            .get(title)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, l)| (t.as_str(), l.as_str()))
    }
}

impl Serialize for PoemLinks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_title_overwrites_in_place() {
        let mut links = PoemLinks::new();
        links.insert("Rain".into(), "/poem/1".into());
        links.insert("Sun".into(), "/poem/2".into());
        links.insert("Rain".into(), "/poem/3".into());

        assert_eq!(links.len(), 2);
        assert_eq!(links.get("Rain"), Some("/poem/3"));
        let titles: Vec<&str> = links.iter().map(|(t, _)| t).collect();
        assert_eq!(titles, ["Rain", "Sun"]);
    }

    #[test]
    fn test_serializes_in_discovery_order() {
        let mut links = PoemLinks::new();
        links.insert("b".into(), "2".into());
        links.insert("a".into(), "1".into());
        assert_eq!(serde_json::to_string(&links).unwrap(), r#"{"b":"2","a":"1"}"#);
    }
}
