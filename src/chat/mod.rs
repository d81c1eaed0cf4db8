//! Session & polling state machine
//!
//! Layering, leaves first: [`state`] holds the context object and its
//! transitions, [`poller`] drives the repeating status fetch, [`directory`]
//! syncs the cached session list, and [`controller`] orchestrates all of it
//! behind the busy-flag mutual exclusion.

pub mod controller;
pub mod directory;
pub mod poller;
pub mod state;

pub use controller::ChatController;
pub use poller::PollHandle;
pub use state::ChatState;
