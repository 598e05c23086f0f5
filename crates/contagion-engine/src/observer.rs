//! Change notifications delivered to registered observers.
//!
//! Observers are either callbacks run synchronously on the stepping thread
//! or crossbeam channels drained by another thread. Each observer receives
//! exactly one [`FieldEvent`] per completed tick and one per committed
//! configuration change. Channel observers whose receiver has been dropped
//! are pruned on the next delivery; events that find a bounded channel full
//! are dropped and counted.

use contagion_core::{ObserverId, StatusCounts, TickId};
use crossbeam_channel::Sender;
use indexmap::IndexMap;
use tracing::trace;

/// A state change observers are told about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldEvent {
    /// One simulation step finished.
    TickCompleted {
        /// Tick that was simulated.
        tick: TickId,
        /// Population counts after the step.
        counts: StatusCounts,
    },
    /// A configuration change was committed or the field was
    /// reinitialized.
    ConfigurationChanged {
        /// Whether the population was rebuilt.
        reinitialized: bool,
    },
}

/// Callback observer.
pub type Callback = Box<dyn FnMut(&FieldEvent) + Send>;

enum Subscriber {
    Callback(Callback),
    Channel(Sender<FieldEvent>),
}

/// Registry of observers, notified in subscription order.
#[derive(Default)]
pub struct Observers {
    subscribers: IndexMap<ObserverId, Subscriber>,
    next_id: u64,
    dropped: u64,
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl Observers {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&FieldEvent) + Send + 'static,
    {
        self.insert(Subscriber::Callback(Box::new(callback)))
    }

    /// Register a channel. Events are sent without blocking on unbounded
    /// channels; a bounded channel that is full drops the event.
    pub fn subscribe_channel(&mut self, sender: Sender<FieldEvent>) -> ObserverId {
        self.insert(Subscriber::Channel(sender))
    }

    /// Remove an observer. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.subscribers.shift_remove(&id).is_some()
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Events dropped so far because a bounded channel was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped
    }

    /// Deliver `event` to every observer.
    pub fn notify(&mut self, event: &FieldEvent) {
        let dropped = &mut self.dropped;
        self.subscribers.retain(|id, subscriber| match subscriber {
            Subscriber::Callback(callback) => {
                callback(event);
                true
            }
            Subscriber::Channel(sender) => match sender.try_send(*event) {
                Ok(()) => true,
                Err(crossbeam_channel::TrySendError::Full(_)) => {
                    *dropped += 1;
                    trace!(observer = id.0, ?event, "Observer channel full, event dropped");
                    true
                }
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                    trace!(observer = id.0, "Observer channel disconnected, pruned");
                    false
                }
            },
        });
    }

    fn insert(&mut self, subscriber: Subscriber) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(id, subscriber);
        id
    }
}
