//! Integration tests covering the six end-to-end scenarios and a
//! malformed-input sweep.

use dnsflow::dns::context::DnsContext;
use dnsflow::dns::events::DnsEvent;
use dnsflow::dns::memcap::MemcapConfig;
use dnsflow::dns::record::RData;
use dnsflow::dns::request::parse_request;
use dnsflow::dns::response::parse_response;
use dnsflow::dns::transaction::{Direction, FlowState};
use dnsflow::dns::DnsError;

fn hex(s: &str) -> Vec<u8> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    (0..cleaned.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&cleaned[i..i + 2], 16).unwrap())
        .collect()
}

// Scenario 1: minimal A query, UDP.
#[test]
fn scenario_one_minimal_a_query() {
    let ctx = DnsContext::default();
    let mut state = FlowState::new();
    let msg = hex(
        "10 32 01 00 00 01 00 00 00 00 00 00 03 77 77 77 07 65 78 61 6d 70 \
         6c 65 03 63 6f 6d 00 00 01 00 01",
    );

    let tx_num = parse_request(&ctx, &mut state, &msg).unwrap();
    let tx = state.transaction(tx_num).unwrap();
    assert_eq!(tx.tx_id, 0x1032);
    assert!(!tx.replied);
    assert_eq!(tx.queries.len(), 1);
    assert_eq!(tx.queries[0].name, "www.example.com");
    assert_eq!(tx.queries[0].rtype.to_u16(), 1);
    assert_eq!(tx.queries[0].class.to_u16(), 1);
}

// Scenario 2: matching A response.
#[test]
fn scenario_two_matching_a_response() {
    let ctx = DnsContext::default();
    let mut state = FlowState::new();
    let request = hex(
        "10 32 01 00 00 01 00 00 00 00 00 00 03 77 77 77 07 65 78 61 6d 70 \
         6c 65 03 63 6f 6d 00 00 01 00 01",
    );
    let response = hex(
        "10 32 81 80 00 01 00 01 00 00 00 00 03 77 77 77 07 65 78 61 6d 70 \
         6c 65 03 63 6f 6d 00 00 01 00 01 c0 0c 00 01 00 01 00 00 00 3c 00 \
         04 5d b8 d8 22",
    );

    parse_request(&ctx, &mut state, &request).unwrap();
    let tx_num = parse_response(&ctx, &mut state, &response).unwrap();

    let tx = state.transaction(tx_num).unwrap();
    assert!(tx.replied);
    assert!(!tx.no_such_name);
    assert_eq!(tx.answers.len(), 1);
    assert_eq!(tx.answers[0].name, "www.example.com");
    assert_eq!(tx.answers[0].rtype.to_u16(), 1);
    match &tx.answers[0].rdata {
        RData::Raw(bytes) => assert_eq!(bytes.as_slice(), &[0x5d, 0xb8, 0xd8, 0x22]),
        other => panic!("expected raw A rdata, got {:?}", other),
    }
}

// Scenario 3: NXDOMAIN response, zero answers.
#[test]
fn scenario_three_nxdomain_response() {
    let ctx = DnsContext::default();
    let mut state = FlowState::new();
    let request = hex(
        "10 32 01 00 00 01 00 00 00 00 00 00 03 77 77 77 07 65 78 61 6d 70 \
         6c 65 03 63 6f 6d 00 00 01 00 01",
    );
    // flags 0x8183: QR=1, RD=1, RA=1, RCODE=3 (NXDOMAIN)
    let response = hex(
        "10 32 81 83 00 01 00 00 00 00 00 00 03 77 77 77 07 65 78 61 6d 70 \
         6c 65 03 63 6f 6d 00 00 01 00 01",
    );

    parse_request(&ctx, &mut state, &request).unwrap();
    let tx_num = parse_response(&ctx, &mut state, &response).unwrap();

    let tx = state.transaction(tx_num).unwrap();
    assert!(tx.replied);
    assert!(tx.no_such_name);
    assert!(tx.answers.is_empty());
}

// Scenario 4: pointer loop, self-referential at the name's own offset.
#[test]
fn scenario_four_pointer_loop_is_malformed() {
    let ctx = DnsContext::default();
    let mut state = FlowState::new();
    let mut msg = hex("10 32 01 00 00 01 00 00 00 00 00 00");
    // name at offset 12 is a pointer to offset 12 (itself): c0 0c
    msg.extend_from_slice(&[0xc0, 0x0c]);
    msg.extend_from_slice(&1u16.to_be_bytes());
    msg.extend_from_slice(&1u16.to_be_bytes());

    let result = parse_request(&ctx, &mut state, &msg);
    assert_eq!(result, Err(DnsError::MalformedData));

    // the transaction was created (header was valid) but holds no query
    let tx_num = state.iter_transactions().next().unwrap().tx_num;
    let tx = state.transaction(tx_num).unwrap();
    assert!(tx.queries.is_empty());
    assert_eq!(tx.events.len(), 1);
}

// Scenario 5: TCP framing split across three arbitrarily-sized chunks.
#[test]
fn scenario_five_tcp_framing_split() {
    let ctx = DnsContext::default();
    let mut state = FlowState::new();
    let payload = hex(
        "10 32 01 00 00 01 00 00 00 00 00 00 03 77 77 77 07 65 78 61 6d 70 \
         6c 65 03 63 6f 6d 00 00 01 00 01",
    );
    assert_eq!(payload.len(), 0x1f);

    let mut wire = vec![0x00, 0x1f];
    wire.extend_from_slice(&payload);

    let (chunk1, rest) = wire.split_at(1);
    let (chunk2, chunk3) = rest.split_at(2);

    let mut dispatched = Vec::new();
    dispatched.extend(state.feed_tcp(&ctx, Direction::ToServer, chunk1));
    assert!(dispatched.is_empty());
    dispatched.extend(state.feed_tcp(&ctx, Direction::ToServer, chunk2));
    assert!(dispatched.is_empty());
    dispatched.extend(state.feed_tcp(&ctx, Direction::ToServer, chunk3));

    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0], payload);

    let tx_num = parse_request(&ctx, &mut state, &dispatched[0]).unwrap();
    let tx = state.transaction(tx_num).unwrap();
    assert_eq!(tx.queries[0].name, "www.example.com");
}

// Scenario 6: 501 distinct unanswered requests raise exactly one Flooded
// event; the 501st is the one that trips it.
#[test]
fn scenario_six_flood_detection() {
    let ctx = DnsContext::default();
    let mut state = FlowState::new();

    for tx_id in 0..500u16 {
        let mut msg = vec![];
        msg.extend_from_slice(&tx_id.to_be_bytes());
        msg.extend_from_slice(&0x0100u16.to_be_bytes());
        msg.extend_from_slice(&1u16.to_be_bytes());
        msg.extend_from_slice(&0u16.to_be_bytes());
        msg.extend_from_slice(&0u16.to_be_bytes());
        msg.extend_from_slice(&0u16.to_be_bytes());
        msg.extend_from_slice(b"\x07example\x03com\x00");
        msg.extend_from_slice(&1u16.to_be_bytes());
        msg.extend_from_slice(&1u16.to_be_bytes());
        parse_request(&ctx, &mut state, &msg).unwrap();
    }
    assert!(!state.givenup);
    assert_eq!(state.transaction_max(), 500);

    let mut msg = vec![];
    msg.extend_from_slice(&500u16.to_be_bytes());
    msg.extend_from_slice(&0x0100u16.to_be_bytes());
    msg.extend_from_slice(&1u16.to_be_bytes());
    msg.extend_from_slice(&0u16.to_be_bytes());
    msg.extend_from_slice(&0u16.to_be_bytes());
    msg.extend_from_slice(&0u16.to_be_bytes());
    msg.extend_from_slice(b"\x07example\x03com\x00");
    msg.extend_from_slice(&1u16.to_be_bytes());
    msg.extend_from_slice(&1u16.to_be_bytes());
    let flooded_tx_num = parse_request(&ctx, &mut state, &msg).unwrap();

    assert!(state.givenup);
    assert_eq!(state.transaction_max(), 501);
    let flooded_tx = state.transaction(flooded_tx_num).unwrap();
    assert!(flooded_tx.queries.is_empty());
    assert_eq!(flooded_tx.events.len(), 1);
}

/// Deterministic sweep over crafted malformed inputs: every one must
/// return `MalformedData` (or a typed error), never panic, and never
/// change the global memcap counter.
#[test]
fn malformed_input_sweep_is_bounded_and_counter_neutral() {
    let ctx = DnsContext::new(MemcapConfig::default());

    let inputs: Vec<Vec<u8>> = vec![
        vec![],
        vec![0u8; 5],                 // truncated header
        vec![0u8; 11],                // one byte short of a full header
        {
            let mut v = hex("10 32 01 00 00 01 00 00 00 00 00 00");
            v.extend_from_slice(&[0xc0, 0x0c, 0, 1, 0, 1]); // self pointer
            v
        },
        {
            let mut v = hex("10 32 01 00 00 01 00 00 00 00 00 00");
            v.extend_from_slice(&[0x40, 0x00, 0, 1, 0, 1]); // reserved label bits
            v
        },
        {
            let mut v = hex("10 32 01 00 00 01 00 00 00 00 00 00");
            v.push(10); // label claims 10 bytes but buffer ends immediately
            v
        },
        {
            // response with an oversized rdlength in its answer section
            let mut v = hex("10 32 81 80 00 00 00 01 00 00 00 00");
            v.extend_from_slice(b"\x07example\x03com\x00");
            v.extend_from_slice(&1u16.to_be_bytes());
            v.extend_from_slice(&1u16.to_be_bytes());
            v.extend_from_slice(&60u32.to_be_bytes());
            v.extend_from_slice(&0xffffu16.to_be_bytes());
            v
        },
    ];

    for input in inputs {
        let before = ctx.memcap.counters().global_in_use;

        let mut state = FlowState::new();
        // try both entry points; neither may panic regardless of content.
        let _ = parse_request(&ctx, &mut state, &input);

        let mut state2 = FlowState::new();
        let _ = parse_response(&ctx, &mut state2, &input);

        let after = ctx.memcap.counters().global_in_use;
        assert_eq!(before, after, "malformed input must not leak memcap accounting");
    }
}

#[test]
fn malformed_header_raises_no_malformed_data_event_without_a_flow() {
    // A header too short to even read QR can't attach to a transaction or
    // even raise a typed event against a flow — parse_request returns the
    // error directly and the flow stays untouched, which is the "drop and
    // raise event" tier's simplest case (spec.md §7 tier 1).
    let ctx = DnsContext::default();
    let mut state = FlowState::new();
    let result = parse_request(&ctx, &mut state, &[0u8; 4]);
    assert_eq!(result, Err(DnsError::MalformedData));
    assert_eq!(state.transaction_max(), 0);
}

#[test]
fn unknown_event_name_pairs_with_flow_level_events_not_transaction() {
    let ctx = DnsContext::default();
    let mut state = FlowState::new();
    // a response with no prior request is unsolicited and attaches to the
    // flow-level ring, since there is no current transaction
    let response = hex(
        "10 32 81 80 00 01 00 00 00 00 00 00 03 77 77 77 07 65 78 61 6d 70 \
         6c 65 03 63 6f 6d 00 00 01 00 01",
    );
    let result = parse_response(&ctx, &mut state, &response);
    assert_eq!(result, Err(DnsError::UnsolicitedResponse));
    assert_eq!(state.events.iter().next().unwrap().event, DnsEvent::UnsolicitedResponse);
}
