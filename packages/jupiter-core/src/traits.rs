use crate::error::LogAppendError;
use crate::ids::{ContentHash, LogIndex};
use crate::ops::Operation;

/// Append-only, validated record of the operations that make up a document.
pub trait DocumentLog {
    /// Validate `op` against the current head and record it.
    fn append(&mut self, op: Operation) -> Result<LogIndex, LogAppendError>;
    fn get(&self, index: LogIndex) -> Option<&Operation>;
    /// Digest of the current document state.
    fn head(&self) -> ContentHash;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outbound side of a session.
pub trait Transport {
    /// Hand an encoded operation to the network.
    fn send(&mut self, bytes: Vec<u8>);
    /// Observe an operation committed to the document on behalf of a remote author.
    fn notify(&mut self, op: &Operation);
}

/// Adapts a pair of closures to [`Transport`].
pub struct Callbacks<S, N> {
    send: S,
    notify: N,
}

impl<S, N> Callbacks<S, N>
where
    S: FnMut(Vec<u8>),
    N: FnMut(&Operation),
{
    pub fn new(send: S, notify: N) -> Self {
        Self { send, notify }
    }
}

impl<S, N> Transport for Callbacks<S, N>
where
    S: FnMut(Vec<u8>),
    N: FnMut(&Operation),
{
    fn send(&mut self, bytes: Vec<u8>) {
        (self.send)(bytes)
    }

    fn notify(&mut self, op: &Operation) {
        (self.notify)(op)
    }
}

/// In-memory log that materializes the document text as operations arrive.
#[derive(Clone, Debug, Default)]
pub struct MemoryLog {
    ops: Vec<Operation>,
    content: String,
    len_chars: usize,
    head: ContentHash,
}

impl MemoryLog {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }
}

impl DocumentLog for MemoryLog {
    fn append(&mut self, op: Operation) -> Result<LogIndex, LogAppendError> {
        if op.hash != self.head {
            return Err(LogAppendError::HashMismatch {
                expected: self.head,
                found: op.hash,
            });
        }
        let content = op
            .payload
            .apply(&self.content)
            .ok_or(LogAppendError::LengthMismatch {
                expected: self.len_chars,
                found: op.payload.base_len(),
            })?;
        self.len_chars = op.payload.target_len();
        self.head = ContentHash::of(&content);
        self.content = content;
        self.ops.push(op);
        Ok(LogIndex(self.ops.len() - 1))
    }

    fn get(&self, index: LogIndex) -> Option<&Operation> {
        self.ops.get(index.0)
    }

    fn head(&self) -> ContentHash {
        self.head
    }

    fn len(&self) -> usize {
        self.ops.len()
    }
}
