//! Progress reporting for background jobs.
//!
//! Every job owns one channel. Producers hold a cloneable
//! [`ProgressSender`]; a single viewer at a time drains the
//! [`ProgressReceiver`] through the [`ProgressHub`].

mod channel;
mod hub;
mod types;

pub use channel::{channel, ProgressReceiver, ProgressSender, Received};
pub use hub::{AttachError, ProgressHub, ReceiverLease};
pub use types::*;
