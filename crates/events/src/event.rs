/// A domain-agnostic event.
///
/// Events are **immutable** facts about an accepted change. They are never
/// persisted here; they exist so state changes and view refreshes derive from
/// one place.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "forms.item.added").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;
}
