use std::cell::RefCell;
use std::env;
use std::rc::Rc;
use std::time::Instant;

use jupiter_core::{ClientId, Operation, Session, TextOp};

/// Edits typed per run.
const EDITS: &[usize] = &[100, 1_000, 10_000];

/// How many edits the author types between two deliveries from the sequencer.
const ACK_EVERY: &[usize] = &[1, 4, 16];

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    timestamp: String,
    edits: usize,
    ack_every: usize,
    frames_sent: usize,
    edits_per_frame: f64,
    duration_ms: f64,
    edits_per_sec: f64,
}

/// One author typing `edits` chars at the end of the document while a follower
/// receives every frame. The sequencer answers after every `ack_every` edits,
/// so everything typed in between is composed into the buffer and leaves as a
/// single frame on the next ack.
fn type_with_acks(edits: usize, ack_every: usize) -> Report {
    let wire = Rc::new(RefCell::new(Vec::new()));
    let mut author: Session<_> = Session::new(
        {
            let wire = wire.clone();
            move |bytes: Vec<u8>| wire.borrow_mut().push(bytes)
        },
        |_: &Operation| {},
        ClientId(1),
    );
    let mut follower: Session<_> = Session::new(|_: Vec<u8>| {}, |_: &Operation| {}, ClientId(2));

    let mut frames_sent = 0;
    let start = Instant::now();
    for i in 0..edits {
        author.edit(TextOp::new().retain(i).insert("x")).unwrap();
        if (i + 1) % ack_every == 0 || i + 1 == edits {
            // Acks can flush the buffer, so drain until the author goes quiet.
            loop {
                let frames: Vec<Vec<u8>> = wire.borrow_mut().drain(..).collect();
                if frames.is_empty() {
                    break;
                }
                frames_sent += frames.len();
                for frame in frames {
                    author.receive(&frame).unwrap();
                    follower.receive(&frame).unwrap();
                }
            }
        }
    }
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    assert_eq!(follower.document().map(|log| log.content().len()), Some(edits));

    Report {
        timestamp: chrono::Utc::now().to_rfc3339(),
        edits,
        ack_every,
        frames_sent,
        edits_per_frame: edits as f64 / frames_sent.max(1) as f64,
        duration_ms,
        edits_per_sec: if duration_ms > 0.0 {
            edits as f64 / duration_ms * 1000.0
        } else {
            f64::INFINITY
        },
    }
}

fn main() {
    // `cargo bench -- 1000` limits the run to one document size.
    let only: Option<usize> = env::args().skip(1).find_map(|arg| arg.parse().ok());
    for &edits in EDITS.iter().filter(|&&n| only.map_or(true, |only| only == n)) {
        for &ack_every in ACK_EVERY {
            let report = type_with_acks(edits, ack_every);
            println!("{}", serde_json::to_string(&report).unwrap());
        }
    }
}
