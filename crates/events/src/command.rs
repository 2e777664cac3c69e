use purchreq_core::FormSlot;

/// A command targets exactly one invoice slot.
///
/// Commands represent **intent** (e.g. "add a row to form 3"). They are
/// rejected if invalid and otherwise turned into events. Because every command
/// names its slot, recomputation triggered by a command never leaks into
/// another form.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_slot(&self) -> FormSlot;
}
