//! Session subsystem
//!
//! The explicit application-state container. Collaborator events go in,
//! replies with the recomputed view and any notifications come out.

mod events;
mod notify;
mod state;

pub use events::{FilePayload, SessionEvent};
pub use notify::{Notification, NotificationLevel};
pub use state::{Session, SessionOptions, SessionReply, DEFAULT_PAGE_SIZE};
