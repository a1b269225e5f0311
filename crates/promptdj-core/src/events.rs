//! Typed session events
//!
//! Every state mutation emits exactly one event, delivered to every
//! subscriber in emission order. Subscribers receive through a flume
//! channel so the generation engine and UI can drain on their own tick.

use crate::prompt::Prompt;
use flume::{Receiver, Sender};

/// Event emitted by the registry, preset store or session
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Full ordered registry state after a mutation (never a diff)
    RegistryChanged { prompts: Vec<Prompt> },
    /// A preset became active
    PresetSwitched { name: String },
    /// The set of preset names changed (save/delete)
    PresetsChanged { names: Vec<String> },
    /// The generation engine rejected a prompt
    PromptFiltered { text: String, reason: String },
    /// Recoverable failure the user should hear about
    Notice { message: String },
}

/// Fan-out of events to any number of subscribers
///
/// Disconnected subscribers are pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Receiver<Event> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to all live subscribers
    pub fn emit(&mut self, event: Event) {
        log::trace!("event: {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last emit)
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_preserves_order() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.emit(Event::PresetSwitched { name: "one".into() });
        bus.emit(Event::PresetSwitched { name: "two".into() });

        for rx in [a, b] {
            let names: Vec<_> = rx
                .try_iter()
                .map(|e| match e {
                    Event::PresetSwitched { name } => name,
                    other => panic!("unexpected {:?}", other),
                })
                .collect();
            assert_eq!(names, vec!["one", "two"]);
        }
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        drop(bus.subscribe());

        bus.emit(Event::Notice { message: "hi".into() });
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(rx.len(), 1);
    }
}
