//! Prompt texts rejected by the generation engine
//!
//! Append-only for the session, insertion-ordered, no eviction.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredPromptSet {
    texts: Vec<String>,
}

impl FilteredPromptSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `text`; returns false if it was already present
    pub fn insert(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.contains(&text) {
            return false;
        }
        self.texts.push(text);
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.texts.iter().any(|t| t == text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
