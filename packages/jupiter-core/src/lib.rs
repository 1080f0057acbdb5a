#![forbid(unsafe_code)]
//! Client-side concurrency control for a collaboratively edited text document.
//! A [`Session`] applies local edits optimistically, keeps at most one of them in
//! flight to the sequencer, and transforms concurrent remote edits so every
//! participant converges. The document log and transport are pluggable through
//! the traits defined here.

pub mod codec;
pub mod error;
pub mod ids;
pub mod ops;
pub mod session;
pub mod slot;
pub mod text;
pub mod traits;

pub use codec::{decode, encode};
pub use error::{Error, LogAppendError, Result};
pub use ids::{ClientId, ContentHash, LogIndex};
pub use ops::{compose, xform, Operation};
pub use session::Session;
pub use slot::{Document, Slot};
pub use text::{Component, TextOp};
pub use traits::{Callbacks, DocumentLog, MemoryLog, Transport};
