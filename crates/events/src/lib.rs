//! Commands, events and observers shared by the form aggregates.

pub mod command;
pub mod event;
pub mod handler;

pub use command::Command;
pub use event::Event;
pub use handler::{Subscriber, SubscriberList, execute};
