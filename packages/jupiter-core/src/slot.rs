//! Ownership-tagged storage for the session's buffered and in-flight operations.

use crate::error::{Error, Result};
use crate::ids::LogIndex;
use crate::ops::Operation;
use crate::traits::DocumentLog;

/// An operation held by a session slot.
///
/// `Logged` points at an entry of the document log; the log owns it and it is
/// never released through the slot. `Owned` is a value produced by composition
/// or transform that exists nowhere else and is dropped when the slot is replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    Logged(LogIndex),
    Owned(Operation),
}

impl Slot {
    pub fn is_owned(&self) -> bool {
        matches!(self, Slot::Owned(_))
    }

    /// The operation this slot stands for. `None` only if a `Logged` index does not
    /// exist in `log`.
    pub fn resolve<'a, L: DocumentLog>(&'a self, log: Option<&'a L>) -> Option<&'a Operation> {
        match self {
            Slot::Owned(op) => Some(op),
            Slot::Logged(index) => log.and_then(|log| log.get(*index)),
        }
    }
}

/// Lifecycle of the session's document log. A session moves from `Unopened` to
/// `Open` exactly once.
#[derive(Debug, Default)]
pub enum Document<L> {
    #[default]
    Unopened,
    Open(L),
}

impl<L: DocumentLog> Document<L> {
    /// Attach an existing log.
    pub fn open(&mut self, log: L) -> Result<&mut L> {
        if let Document::Open(_) = self {
            return Err(Error::AlreadyOpen);
        }
        *self = Document::Open(log);
        let Document::Open(log) = self else {
            unreachable!("document was opened above");
        };
        Ok(log)
    }

    /// The open log, creating an empty one if nothing was attached yet.
    pub fn ensure_open(&mut self) -> &mut L
    where
        L: Default,
    {
        if let Document::Unopened = self {
            log::debug!("opening empty document");
            *self = Document::Open(L::default());
        }
        let Document::Open(log) = self else {
            unreachable!("document was opened above");
        };
        log
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Document::Open(_))
    }

    pub fn get(&self) -> Option<&L> {
        match self {
            Document::Open(log) => Some(log),
            Document::Unopened => None,
        }
    }

    pub fn into_inner(self) -> Option<L> {
        match self {
            Document::Open(log) => Some(log),
            Document::Unopened => None,
        }
    }
}
