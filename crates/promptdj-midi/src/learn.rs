//! MIDI learn arbitration
//!
//! At most one knob holds the learn token. Handing it to another knob takes
//! it from the previous holder; there is no queue.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnArbiter {
    holder: Option<String>,
}

impl LearnArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the token to `prompt_id`
    ///
    /// Returns the knob that lost it, if a different one held it.
    pub fn begin(&mut self, prompt_id: &str) -> Option<String> {
        let previous = self.holder.replace(prompt_id.to_string());
        match previous {
            Some(ref prev) if prev == prompt_id => None,
            other => {
                if let Some(ref prev) = other {
                    log::debug!("learn: '{}' pre-empted by '{}'", prev, prompt_id);
                }
                other
            }
        }
    }

    /// Toggle learn for `prompt_id`; returns whether it is learning afterwards
    pub fn toggle(&mut self, prompt_id: &str) -> bool {
        if self.is_learning(prompt_id) {
            self.holder = None;
            false
        } else {
            self.begin(prompt_id);
            true
        }
    }

    /// Clear learn mode; returns the knob that held it
    pub fn cancel(&mut self) -> Option<String> {
        self.holder.take()
    }

    pub fn is_learning(&self, prompt_id: &str) -> bool {
        self.holder.as_deref() == Some(prompt_id)
    }

    pub fn holder(&self) -> Option<&str> {
        self.holder.as_deref()
    }

    /// Consume the token if `prompt_id` holds it
    pub fn complete(&mut self, prompt_id: &str) -> bool {
        if self.is_learning(prompt_id) {
            self.holder = None;
            true
        } else {
            false
        }
    }
}
