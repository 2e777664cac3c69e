use std::sync::Arc;

/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command)` produces events without mutation.
/// 2. **Evolve**: each event is applied in order.
///
/// A rejected command leaves the aggregate untouched.
pub fn execute<A>(
    aggregate: &mut A,
    command: &A::Command,
) -> Result<Vec<A::Event>, A::Error>
where
    A: purchreq_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}

/// Observer notified after state changes.
pub trait Subscriber<M>: Send + Sync {
    fn notify(&self, message: &M);
}

/// Registration list of observers, notified in registration order.
pub struct SubscriberList<M> {
    subscribers: Vec<Arc<dyn Subscriber<M>>>,
}

impl<M> Default for SubscriberList<M> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<M> SubscriberList<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, subscriber: Arc<dyn Subscriber<M>>) {
        self.subscribers.push(subscriber);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn publish(&self, message: &M) {
        tracing::trace!(subscribers = self.subscribers.len(), "publishing view update");
        for s in &self.subscribers {
            s.notify(message);
        }
    }
}
