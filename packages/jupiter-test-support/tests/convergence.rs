use jupiter_core::TextOp;
use jupiter_test_support::{edit_for, Network};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Step {
    Edit {
        client: usize,
        kind: u8,
        pos: usize,
        len: usize,
        text: String,
    },
    ToServer(usize),
    ToClient(usize),
}

fn arb_step(clients: usize) -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..clients, any::<u8>(), 0usize..32, 0usize..4, "[a-z]{1,3}").prop_map(
            |(client, kind, pos, len, text)| Step::Edit {
                client,
                kind,
                pos,
                len,
                text,
            }
        ),
        (0..clients).prop_map(Step::ToServer),
        (0..clients).prop_map(Step::ToClient),
    ]
}

fn assert_converged(net: &Network) {
    let expected = net.sequencer().content();
    for client in 0..net.clients() {
        let session = net.session(client);
        assert_eq!(net.content(client), expected, "client {client} diverged");
        assert!(!session.ack_required());
        assert!(session.anticipated().is_none());
        assert!(session.buffer().is_none());
        let foreign = net
            .sequencer()
            .history()
            .iter()
            .filter(|op| op.client_id != session.client_id())
            .count();
        assert_eq!(session.transport().notified.len(), foreign);
    }
}

proptest! {
    #[test]
    fn sessions_converge_under_any_delivery_order(
        steps in prop::collection::vec(arb_step(3), 1..60)
    ) {
        let mut net = Network::new(3);
        for step in steps {
            match step {
                Step::Edit { client, kind, pos, len, text } => {
                    let payload = edit_for(net.content(client), kind, pos, len, &text);
                    net.edit(client, payload).unwrap();
                }
                Step::ToServer(client) => {
                    net.deliver_to_server(client).unwrap();
                }
                Step::ToClient(client) => {
                    net.deliver_to_client(client).unwrap();
                }
            }
            for client in 0..net.clients() {
                let session = net.session(client);
                prop_assert_eq!(session.ack_required(), session.anticipated().is_some());
            }
        }
        net.settle().unwrap();
        assert_converged(&net);
    }
}

#[test]
fn concurrent_inserts_at_same_spot_converge() {
    let mut net = Network::new(2);
    net.edit(0, TextOp::new().insert("hi")).unwrap();
    net.edit(1, TextOp::new().insert("yo")).unwrap();
    net.settle().unwrap();
    assert_converged(&net);
    // Client 0 reached the sequencer first, so its text comes first.
    assert_eq!(net.sequencer().content(), "hiyo");
}

#[test]
fn buffered_edits_travel_as_one_operation() {
    let mut net = Network::new(2);
    net.edit(0, TextOp::new().insert("a")).unwrap();
    net.edit(0, TextOp::new().retain(1).insert("b")).unwrap();
    net.edit(0, TextOp::new().retain(2).insert("c")).unwrap();
    net.settle().unwrap();

    assert_converged(&net);
    assert_eq!(net.sequencer().content(), "abc");
    // One op in flight, the other two composed into a single follow-up.
    assert_eq!(net.sequencer().revision(), 2);
    assert_eq!(net.session(1).transport().notified.len(), 2);
}

#[test]
fn remote_edit_lands_between_send_and_ack() {
    let mut net = Network::new(2);
    net.edit(0, TextOp::new().insert("hello")).unwrap();
    net.settle().unwrap();

    // Client 0 deletes "hello" while client 1 appends; client 1 wins the race.
    net.edit(0, TextOp::new().delete(5)).unwrap();
    net.edit(1, TextOp::new().retain(5).insert("!")).unwrap();
    net.deliver_to_server(1).unwrap();
    net.deliver_to_server(0).unwrap();

    net.deliver_to_client(0).unwrap();
    assert_eq!(net.content(0), "!");
    assert!(net.session(0).ack_required());

    net.settle().unwrap();
    assert_converged(&net);
    assert_eq!(net.sequencer().content(), "!");
}

#[test]
fn deletes_of_same_text_apply_once() {
    let mut net = Network::new(3);
    net.edit(0, TextOp::new().insert("abcdef")).unwrap();
    net.settle().unwrap();

    net.edit(0, TextOp::new().retain(1).delete(3).retain(2)).unwrap();
    net.edit(1, TextOp::new().retain(2).delete(3).retain(1)).unwrap();
    net.edit(2, TextOp::new().retain(6).insert("g")).unwrap();
    net.settle().unwrap();

    assert_converged(&net);
    assert_eq!(net.sequencer().content(), "afg");
}
