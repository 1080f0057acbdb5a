use std::cell::Cell;
use std::rc::Rc;

use jupiter_core::{
    decode, encode, ClientId, ContentHash, DocumentLog, Error, MemoryLog, Operation, Session,
    TextOp,
};

fn frame(ops: &str) -> String {
    let hash = ContentHash::default().to_hex();
    format!(r#"{{"clientId":2,"hash":"{hash}","ops":{ops}}}"#)
}

#[test]
fn wire_format_is_compact_json() {
    let op = Operation::new(
        ClientId(7),
        ContentHash::of("abc"),
        TextOp::new().retain(2).insert("hi").delete(1),
    );
    let value: serde_json::Value = serde_json::from_slice(&encode(&op)).unwrap();
    assert_eq!(value["clientId"], 7);
    assert_eq!(value["hash"], ContentHash::of("abc").to_hex());
    assert_eq!(value["ops"], serde_json::json!([2, "hi", -1]));
}

#[test]
fn decode_restores_encoded_operation() {
    let op = Operation::new(
        ClientId(3),
        ContentHash::of("añb"),
        TextOp::new().retain(1).delete(1).insert("ü").retain(1),
    );
    assert_eq!(decode(&encode(&op)).unwrap(), op);
}

#[test]
fn decode_normalizes_components() {
    let hash = ContentHash::default().to_hex();
    let bytes = format!(r#"{{"clientId":1,"hash":"{hash}","ops":[1,1,-1,"a"]}}"#);
    let op = decode(bytes.as_bytes()).unwrap();
    assert_eq!(op.payload, TextOp::new().retain(2).insert("a").delete(1));
}

#[test]
fn decode_rejects_malformed_messages() {
    let hash = ContentHash::default().to_hex();
    let cases = [
        "not json".to_string(),
        r#"{"clientId":1,"ops":[]}"#.to_string(),
        r#"{"clientId":1,"hash":"abc","ops":[]}"#.to_string(),
        format!(r#"{{"clientId":1,"hash":"{hash}","ops":[0]}}"#),
        format!(r#"{{"clientId":1,"hash":"{hash}","ops":[""]}}"#),
        format!(r#"{{"clientId":1,"hash":"{hash}","ops":[true]}}"#),
        format!(r#"{{"clientId":-1,"hash":"{hash}","ops":[]}}"#),
    ];
    for case in cases {
        let err = decode(case.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{case}: {err}");
    }
}

#[test]
fn decode_rejects_spans_that_overflow() {
    let max = i64::MAX;
    for ops in [
        format!("[{max}, {max}, \"x\", {max}]"),
        format!("[-{max}, -{max}]"),
        format!("[{max}, -1]"),
        format!("[{}]", i64::MIN),
    ] {
        let err = decode(frame(&ops).as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{ops}: {err}");
    }
}

#[test]
fn largest_delete_keeps_its_sign() {
    let bytes = frame(&format!("[-{}]", i64::MAX));
    let op = decode(bytes.as_bytes()).unwrap();
    assert_eq!(op.payload, TextOp::new().delete(i64::MAX as usize));
    assert_eq!(decode(&encode(&op)).unwrap(), op);
}

#[test]
fn oversized_frame_leaves_session_untouched() {
    let sent = Rc::new(Cell::new(0));
    let notified = Rc::new(Cell::new(0));
    let mut s: Session<_, MemoryLog> = Session::new(
        {
            let sent = sent.clone();
            move |_: Vec<u8>| sent.set(sent.get() + 1)
        },
        {
            let notified = notified.clone();
            move |_: &Operation| notified.set(notified.get() + 1)
        },
        ClientId(1),
    );
    s.edit(TextOp::new().insert("ab")).unwrap();
    let in_flight = s.anticipated().cloned();

    let max = i64::MAX;
    let bytes = frame(&format!("[{max}, {max}, \"x\", {max}]"));
    let err = s.receive(bytes.as_bytes()).unwrap_err();

    assert!(matches!(err, Error::Decode(_)), "{err}");
    assert_eq!(s.document().map(MemoryLog::content), Some("ab"));
    assert_eq!(s.document().map(MemoryLog::len), Some(1));
    assert!(s.ack_required());
    assert_eq!(s.anticipated().cloned(), in_flight);
    assert!(s.buffer().is_none());
    assert_eq!(sent.get(), 1);
    assert_eq!(notified.get(), 0);
}
