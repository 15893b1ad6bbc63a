//! Response-side parsing (spec.md §4.6): header validation, transaction
//! pairing, and answer/authority storage.

use super::context::DnsContext;
use super::events::DnsEvent;
use super::record::decode_records;
use super::transaction::{self, FlowState, RecordList};
use super::{DnsError, DnsHeader};

/// Parses one to-client DNS message and, if it pairs with an outstanding
/// request, folds it into that transaction.
///
/// Returns the paired transaction's sequence number. A response with no
/// matching outstanding request raises [`DnsEvent::UnsolicitedResponse`]
/// and returns [`DnsError::UnsolicitedResponse`] without otherwise
/// touching `state` (spec.md §4.6).
pub fn parse_response(
    ctx: &DnsContext,
    state: &mut FlowState,
    message: &[u8],
) -> Result<u64, DnsError> {
    let header = DnsHeader::parse(message)?;

    if !header.qr {
        state.raise_event(ctx, DnsEvent::NotAResponse);
        return Err(DnsError::NotAResponse);
    }

    // A response only pairs with an outstanding request whose question
    // count it still matches; anything else (no match, or a stale/
    // mismatched qdcount) is unsolicited (spec.md §4.6).
    let tx_num = match transaction::find_by_tx_id(state, header.tx_id) {
        Some(tx) if tx.queries.len() as u16 == header.qdcount => tx.tx_num,
        _ => {
            state.set_current_tx(None);
            state.raise_event(ctx, DnsEvent::UnsolicitedResponse);
            return Err(DnsError::UnsolicitedResponse);
        }
    };
    state.set_current_tx(Some(tx_num));

    if header.z != 0 {
        state.raise_event(ctx, DnsEvent::ZFlagSet);
    }

    let mut cursor = DnsHeader::SIZE;

    // From here on, a decode failure is tier-2 "partial acceptance"
    // (spec.md §7): whatever was already appended stays, `MalformedData`
    // is raised, and the transaction is still marked replied using the
    // header-level rcode/ra that did parse successfully.

    // Questions are validated (for section-length sanity) but not
    // re-stored; the request parser already captured them.
    if let Err(e) =
        super::record::decode_questions(message, &mut cursor, header.qdcount)
    {
        state.raise_event(ctx, DnsEvent::MalformedData);
        transaction::mark_replied(state, tx_num, header.rcode, header.ra);
        return Err(e);
    }

    let answers = match decode_records(message, &mut cursor, header.ancount) {
        Ok(recs) => recs,
        Err(e) => {
            state.raise_event(ctx, DnsEvent::MalformedData);
            transaction::mark_replied(state, tx_num, header.rcode, header.ra);
            return Err(e);
        }
    };
    for rec in answers {
        transaction::append_answer(ctx, state, tx_num, RecordList::Answer, rec);
    }

    let authorities = match decode_records(message, &mut cursor, header.nscount) {
        Ok(recs) => recs,
        Err(e) => {
            state.raise_event(ctx, DnsEvent::MalformedData);
            transaction::mark_replied(state, tx_num, header.rcode, header.ra);
            return Err(e);
        }
    };
    for rec in authorities {
        transaction::append_answer(ctx, state, tx_num, RecordList::Authority, rec);
    }

    // Additional-section records are validated for well-formedness only;
    // spec.md §4.6 excludes them from storage (EDNS/OPT handling is a
    // non-goal).
    if let Err(e) = decode_records(message, &mut cursor, header.arcount) {
        state.raise_event(ctx, DnsEvent::MalformedData);
        transaction::mark_replied(state, tx_num, header.rcode, header.ra);
        return Err(e);
    }

    transaction::mark_replied(state, tx_num, header.rcode, header.ra);

    Ok(tx_num)
}
