use crate::error::{Error, Result};
use crate::ids::{ClientId, ContentHash};
use crate::text::TextOp;

/// Full operation envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    /// Author of the edit.
    pub client_id: ClientId,
    /// Digest of the document state the edit was generated against.
    pub hash: ContentHash,
    pub payload: TextOp,
}

impl Operation {
    pub fn new(client_id: ClientId, hash: ContentHash, payload: TextOp) -> Self {
        Self {
            client_id,
            hash,
            payload,
        }
    }

    /// Same edit, generated against `hash` instead.
    pub fn rebased(mut self, hash: ContentHash) -> Self {
        self.hash = hash;
        self
    }
}

/// One operation with the effect of `a` followed by `b`.
///
/// The result keeps `a`'s author and hash: it applies to the state `a` was
/// generated against. `None` when `b` does not apply to what `a` produces.
pub fn compose(a: &Operation, b: &Operation) -> Option<Operation> {
    let payload = a.payload.compose(&b.payload)?;
    Some(Operation::new(a.client_id, a.hash, payload))
}

/// Transform two concurrent operations against each other.
///
/// An absent `a` is the identity: nothing to adjust, and `b` passes through
/// unchanged. `b` is the side the sequencer has already ordered, so it wins ties
/// between inserts at the same position. Each result keeps its author and hash.
pub fn xform(a: Option<&Operation>, b: &Operation) -> Result<(Option<Operation>, Operation)> {
    let Some(a) = a else {
        return Ok((None, b.clone()));
    };
    let (a_payload, b_payload) = TextOp::transform(&a.payload, &b.payload).ok_or_else(|| {
        Error::Transform(format!(
            "operations are not concurrent: {} chars vs {} chars",
            a.payload.base_len(),
            b.payload.base_len()
        ))
    })?;
    Ok((
        Some(Operation::new(a.client_id, a.hash, a_payload)),
        Operation::new(b.client_id, b.hash, b_payload),
    ))
}
