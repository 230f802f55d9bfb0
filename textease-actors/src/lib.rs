//! Per-user conversation sessions for TextEase.
//!
//! A transport decodes user input into an [`Action`] once and hands it to the
//! [`SessionHub`] together with the user's id. The hub keeps one
//! [`hub::SessionActor`] per user; its mailbox serialises that user's actions
//! while other users proceed independently. Each reply carries the messages to
//! show and the actions worth offering next.
pub mod action;
pub mod actor;
pub mod hub;
pub mod registry;
mod render;
pub mod session;

pub use action::{Action, ClaimRef, ExtractionId, Outcome, Reply, SessionView};
pub use hub::{HubSettings, SessionHub, UserId};
pub use session::{Session, SessionLimits};
