//! Client side of the Jupiter protocol for a single document.
//!
//! Local edits are committed to the document immediately and queued in the
//! buffer. At most one operation is in flight: the buffer is sent only when no
//! acknowledgment is pending, at which point it becomes the anticipated op.
//! The sequencer echoes every operation it orders; an echo of our own op is the
//! acknowledgment, anything else is a foreign edit that gets transformed first
//! against the in-flight op and then against the buffer before it lands.

use crate::codec;
use crate::error::{Error, Result};
use crate::ids::{ClientId, LogIndex};
use crate::ops::{compose, xform, Operation};
use crate::slot::{Document, Slot};
use crate::text::TextOp;
use crate::traits::{Callbacks, DocumentLog, MemoryLog, Transport};

pub struct Session<T, L = MemoryLog> {
    client_id: ClientId,
    transport: T,
    document: Document<L>,
    /// Local edits not yet sent.
    buffer: Option<Slot>,
    /// Sent and awaiting acknowledgment.
    anticipated: Option<Slot>,
    ack_required: bool,
}

impl<S, N, L> Session<Callbacks<S, N>, L>
where
    S: FnMut(Vec<u8>),
    N: FnMut(&Operation),
    L: DocumentLog + Default,
{
    pub fn new(send: S, notify: N, client_id: ClientId) -> Self {
        Self::with_transport(Callbacks::new(send, notify), client_id)
    }
}

impl<T, L> Session<T, L>
where
    T: Transport,
    L: DocumentLog + Default,
{
    pub fn with_transport(transport: T, client_id: ClientId) -> Self {
        Self {
            client_id,
            transport,
            document: Document::Unopened,
            buffer: None,
            anticipated: None,
            ack_required: false,
        }
    }

    /// Attach an existing document log. Fails if one is already open.
    pub fn open(&mut self, log: L) -> Result<()> {
        self.document.open(log).map(|_| ())
    }

    /// The document log, opened empty if none was attached.
    pub fn ensure_open(&mut self) -> &mut L {
        self.document.ensure_open()
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Whether an operation has been sent and not yet acknowledged.
    pub fn ack_required(&self) -> bool {
        self.ack_required
    }

    pub fn document(&self) -> Option<&L> {
        self.document.get()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn buffer(&self) -> Option<&Operation> {
        self.buffer.as_ref().and_then(|slot| slot.resolve(self.document.get()))
    }

    pub fn anticipated(&self) -> Option<&Operation> {
        self.anticipated
            .as_ref()
            .and_then(|slot| slot.resolve(self.document.get()))
    }

    pub fn buffer_slot(&self) -> Option<&Slot> {
        self.buffer.as_ref()
    }

    pub fn anticipated_slot(&self) -> Option<&Slot> {
        self.anticipated.as_ref()
    }

    /// Author `payload` against the current document head and apply it.
    pub fn edit(&mut self, payload: TextOp) -> Result<()> {
        let head = self.document.ensure_open().head();
        self.apply(Operation::new(self.client_id, head, payload))
    }

    /// Commit a local operation, queue it and send it if nothing is in flight.
    ///
    /// The document is authoritative: if the op cannot be merged into the buffer
    /// it stays appended and `Error::BufferCompose` is returned with the previous
    /// buffer intact.
    pub fn apply(&mut self, op: Operation) -> Result<()> {
        let index = self.document.ensure_open().append(op)?;
        if let Err(err) = self.buffer_op(index) {
            log::warn!("client {} could not buffer local op: {err}", self.client_id);
            return Err(err);
        }
        if !self.ack_required {
            self.flush()?;
        }
        Ok(())
    }

    /// Handle a message from the sequencer.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<()> {
        log::debug!(
            "client {} received op: {}",
            self.client_id,
            String::from_utf8_lossy(bytes)
        );
        let remote = codec::decode(bytes)?;

        if remote.client_id == self.client_id {
            log::debug!("op {} was acknowledged", remote.hash);
            self.ack_required = false;
            self.anticipated = None;
            return self.flush();
        }

        // In-flight op first, then the buffer: the buffer was generated on top of
        // the anticipated op, so it must meet the remote op after that op has.
        let (anticipated, remote) = xform(self.resolve(&self.anticipated)?, &remote)?;
        let (buffer, remote) = xform(self.resolve(&self.buffer)?, &remote)?;

        // The transformed op applies to our document, so it is recorded against our head.
        let log = self.document.ensure_open();
        let remote = remote.rebased(log.head());
        let index = log.append(remote)?;

        self.anticipated = anticipated.map(Slot::Owned);
        self.buffer = buffer.map(Slot::Owned);

        if let Some(op) = self.document.get().and_then(|log| log.get(index)) {
            self.transport.notify(op);
        }
        Ok(())
    }

    /// Tear the session down, handing back the document log if one was opened.
    pub fn close(self) -> Option<L> {
        self.document.into_inner()
    }

    fn resolve<'a>(&'a self, slot: &'a Option<Slot>) -> Result<Option<&'a Operation>> {
        match slot {
            None => Ok(None),
            Some(slot) => slot.resolve(self.document.get()).map(Some).ok_or_else(|| {
                Error::InconsistentState("slot refers to an operation missing from the log".into())
            }),
        }
    }

    fn buffer_op(&mut self, index: LogIndex) -> Result<()> {
        if self.buffer.is_none() {
            self.buffer = Some(Slot::Logged(index));
            return Ok(());
        }
        let op = self
            .document
            .get()
            .and_then(|log| log.get(index))
            .ok_or_else(|| Error::InconsistentState("appended operation not found".into()))?;
        let composed = match self.resolve(&self.buffer)? {
            Some(buffer) => compose(buffer, op).ok_or(Error::BufferCompose)?,
            None => return Err(Error::InconsistentState("buffer vanished".into())),
        };
        log::debug!(
            "client {} buffer is now: {}",
            self.client_id,
            String::from_utf8_lossy(&codec::encode(&composed))
        );
        // Replacing an owned buffer drops it; a logged one stays with the log.
        self.buffer = Some(Slot::Owned(composed));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let Some(buffer) = self.buffer.take() else {
            return Ok(());
        };
        let Some(bytes) = buffer.resolve(self.document.get()).map(codec::encode) else {
            self.buffer = Some(buffer);
            return Err(Error::InconsistentState(
                "buffered operation missing from the log".into(),
            ));
        };
        self.transport.send(bytes);
        self.ack_required = true;
        // The slot moves as is: a logged buffer stays logged, a composed one stays owned.
        self.anticipated = Some(buffer);
        Ok(())
    }
}
