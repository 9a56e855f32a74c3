//! Polling loop and command routing.

pub mod poller;
pub mod router;

pub use poller::Poller;
pub use router::{Command, Router};
