//! Request-side parsing (spec.md §4.5): header validation, question
//! decoding, transaction creation, and flood detection.

use super::context::DnsContext;
use super::events::DnsEvent;
use super::record::decode_questions;
use super::transaction::{self, FlowState};
use super::{DnsError, DnsHeader};

/// Parses one to-server DNS message and folds it into `state`.
///
/// On a structurally valid request this always creates a transaction and
/// returns its sequence number, even past the flood threshold — only the
/// *contents* (the question list) are dropped once a flow is flooded, per
/// spec.md §4.5's "parsing continues, but stops accumulating detail".
pub fn parse_request(
    ctx: &DnsContext,
    state: &mut FlowState,
    message: &[u8],
) -> Result<u64, DnsError> {
    let header = DnsHeader::parse(message)?;

    if header.qr {
        state.raise_event(ctx, DnsEvent::NotARequest);
        return Err(DnsError::NotARequest);
    }

    let tx_num = transaction::create(state, header.tx_id);
    state.set_current_tx(Some(tx_num));

    if header.opcode != 0 {
        state.raise_event(ctx, DnsEvent::MalformedData);
    }

    if header.z != 0 {
        state.raise_event(ctx, DnsEvent::ZFlagSet);
    }

    state.unreplied_cnt = state.unreplied_cnt.saturating_add(1);
    if state.unreplied_cnt > ctx.memcap.config().request_flood_threshold {
        if !state.givenup {
            state.givenup = true;
            state.raise_event(ctx, DnsEvent::Flooded);
        }
        return Ok(tx_num);
    }

    let mut cursor = DnsHeader::SIZE;
    let questions = match decode_questions(message, &mut cursor, header.qdcount) {
        Ok(q) => q,
        Err(e) => {
            state.raise_event(ctx, DnsEvent::MalformedData);
            return Err(e);
        }
    };

    for q in questions {
        transaction::append_query(ctx, state, tx_num, q);
    }

    Ok(tx_num)
}
