#![forbid(unsafe_code)]
//! Shared harness for exercising [`Session`]s against a central sequencer.
//!
//! [`Sequencer`] is a minimal Jupiter server: it orders client operations,
//! transforms each one past whatever the sender had not yet seen, and echoes the
//! result to everybody. [`Network`] wires several sessions to one sequencer over
//! FIFO queues whose delivery order the test controls.

use std::collections::VecDeque;

use jupiter_core::{
    decode, encode, xform, ClientId, ContentHash, Error, MemoryLog, Operation, Result, Session,
    TextOp, Transport,
};

/// Transport that keeps everything handed to it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<Vec<u8>>,
    pub notified: Vec<Operation>,
}

impl RecordingTransport {
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, bytes: Vec<u8>) {
        self.sent.push(bytes);
    }

    fn notify(&mut self, op: &Operation) {
        self.notified.push(op.clone());
    }
}

/// Reference central server.
#[derive(Debug, Default)]
pub struct Sequencer {
    history: Vec<Operation>,
    content: String,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of operations sequenced so far.
    pub fn revision(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[Operation] {
        &self.history
    }

    /// Order an operation that was generated after the sender had processed
    /// `revision` broadcasts. Returns the frame to broadcast to every client.
    pub fn submit(&mut self, revision: usize, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut op = decode(bytes)?;
        let concurrent = self.history.get(revision..).ok_or_else(|| {
            Error::InconsistentState(format!(
                "client claims revision {revision}, sequencer is at {}",
                self.history.len()
            ))
        })?;
        for sequenced in concurrent {
            if let (Some(transformed), _) = xform(Some(&op), sequenced)? {
                op = transformed;
            }
        }
        let content = op.payload.apply(&self.content).ok_or_else(|| {
            Error::InconsistentState(format!(
                "op spans {} chars, server document has {}",
                op.payload.base_len(),
                self.content.chars().count()
            ))
        })?;
        let op = op.rebased(ContentHash::of(&self.content));
        self.content = content;
        let frame = encode(&op);
        self.history.push(op);
        Ok(frame)
    }
}

struct Peer {
    session: Session<RecordingTransport>,
    /// Broadcasts waiting to be received, oldest first.
    inbox: VecDeque<Vec<u8>>,
    /// Frames on their way to the sequencer, tagged with the sender's revision.
    outbox: VecDeque<(usize, Vec<u8>)>,
    /// Broadcasts this peer has processed.
    seen: usize,
}

impl Peer {
    fn collect_sent(&mut self) {
        let seen = self.seen;
        let sent = self.session.transport_mut().take_sent();
        self.outbox.extend(sent.into_iter().map(|bytes| (seen, bytes)));
    }
}

/// Deterministic simulation of sessions talking to one sequencer.
pub struct Network {
    sequencer: Sequencer,
    peers: Vec<Peer>,
}

impl Network {
    /// `clients` sessions with ids `1..=clients`, all starting from an empty document.
    pub fn new(clients: u32) -> Self {
        let peers = (1..=clients)
            .map(|id| Peer {
                session: Session::with_transport(RecordingTransport::default(), ClientId(id)),
                inbox: VecDeque::new(),
                outbox: VecDeque::new(),
                seen: 0,
            })
            .collect();
        Self {
            sequencer: Sequencer::new(),
            peers,
        }
    }

    pub fn clients(&self) -> usize {
        self.peers.len()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn session(&self, client: usize) -> &Session<RecordingTransport> {
        &self.peers[client].session
    }

    pub fn content(&self, client: usize) -> &str {
        self.peers[client]
            .session
            .document()
            .map(MemoryLog::content)
            .unwrap_or("")
    }

    /// Apply a local edit on `client`.
    pub fn edit(&mut self, client: usize, payload: TextOp) -> Result<()> {
        let peer = &mut self.peers[client];
        let result = peer.session.edit(payload);
        peer.collect_sent();
        result
    }

    /// Move the oldest frame from `client` to the sequencer and broadcast the
    /// result. Returns `false` if nothing was queued.
    pub fn deliver_to_server(&mut self, client: usize) -> Result<bool> {
        let Some((revision, bytes)) = self.peers[client].outbox.pop_front() else {
            return Ok(false);
        };
        let frame = self.sequencer.submit(revision, &bytes)?;
        for peer in &mut self.peers {
            peer.inbox.push_back(frame.clone());
        }
        Ok(true)
    }

    /// Hand the oldest broadcast to `client`. Returns `false` if its inbox is empty.
    pub fn deliver_to_client(&mut self, client: usize) -> Result<bool> {
        let peer = &mut self.peers[client];
        let Some(bytes) = peer.inbox.pop_front() else {
            return Ok(false);
        };
        peer.seen += 1;
        let result = peer.session.receive(&bytes);
        peer.collect_sent();
        result.map(|()| true)
    }

    /// Deliver everything until all queues are empty.
    pub fn settle(&mut self) -> Result<()> {
        loop {
            let mut progressed = false;
            for client in 0..self.peers.len() {
                while self.deliver_to_server(client)? {
                    progressed = true;
                }
                while self.deliver_to_client(client)? {
                    progressed = true;
                }
            }
            if !progressed {
                return Ok(());
            }
        }
    }
}

/// Build a valid edit for `content` from arbitrary numbers: `kind` picks insert,
/// delete or replace, `pos` and `len` are clamped to the document.
pub fn edit_for(content: &str, kind: u8, pos: usize, len: usize, text: &str) -> TextOp {
    let total = content.chars().count();
    let pos = if total == 0 { 0 } else { pos % (total + 1) };
    let len = len.min(total - pos);
    let op = TextOp::new().retain(pos);
    match kind % 3 {
        0 => op.insert(text).retain(total - pos),
        1 => op.delete(len).retain(total - pos - len),
        _ => op.delete(len).insert(text).retain(total - pos - len),
    }
}
