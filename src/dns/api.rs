//! Read-only iteration API exposed to a downstream detection engine
//! (spec.md §4.9). Everything here only reads `FlowState`; mutation stays
//! in `transaction`, `request`, and `response`.

use super::events::EventRecord;
use super::transaction::{Direction, FlowState, Transaction};

/// How far a transaction has progressed, from the detection engine's point
/// of view. DNS has no partial-progress states beyond request-seen and
/// request-and-response-seen, so this is a plain two-value enum rather
/// than the numeric "progress" scale some app-layer parsers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxProgress {
    RequestSeen,
    Complete,
}

impl TxProgress {
    /// Numeric progress value in the 0..=1 range spec.md §4.9 describes,
    /// for engines that key completion off an integer rather than this
    /// enum directly.
    pub fn as_u8(&self) -> u8 {
        match self {
            TxProgress::RequestSeen => 0,
            TxProgress::Complete => 1,
        }
    }
}

/// Looks up a transaction by its store-assigned sequence number (distinct
/// from the wire transaction id, which is not unique across a flow's
/// lifetime).
pub fn get_tx(state: &FlowState, tx_num: u64) -> Option<&Transaction> {
    state.transaction(tx_num)
}

/// Highest tx_num assigned so far plus one — the exclusive upper bound a
/// caller should iterate `get_tx` up to.
pub fn get_tx_count(state: &FlowState) -> u64 {
    state.transaction_max()
}

/// A transaction's progress is direction-dependent (spec.md §4.9): the
/// to-server direction is complete as soon as the transaction exists (its
/// request has, by construction, already been parsed), while the
/// to-client direction is complete only once it has been replied to, or
/// once the flow gave up waiting and marked it reply-lost ("a lost reply
/// is still a terminal state for detection purposes").
pub fn get_progress(tx: &Transaction, direction: Direction) -> TxProgress {
    match direction {
        Direction::ToServer => TxProgress::Complete,
        Direction::ToClient => {
            if tx.replied || tx.reply_lost {
                TxProgress::Complete
            } else {
                TxProgress::RequestSeen
            }
        }
    }
}

/// The progress value a caller should compare [`get_progress`]'s result
/// against to know a transaction is done in `direction`. Both directions
/// share the same terminal value, so this is a pure function of
/// `direction` alone rather than of any particular transaction.
pub fn completion_status(_direction: Direction) -> u8 {
    TxProgress::Complete.as_u8()
}

/// Iterates the events attached to `tx`, oldest first.
pub fn get_events(tx: &Transaction) -> impl Iterator<Item = &EventRecord> {
    tx.events.iter()
}

pub fn has_events(tx: &Transaction) -> bool {
    !tx.events.is_empty()
}

/// Iterates flow-level events — those raised before any transaction
/// existed to attach to, e.g. an unsolicited response or a malformed
/// message with no decodable header.
pub fn get_flow_events(state: &FlowState) -> impl Iterator<Item = &EventRecord> {
    state.events.iter()
}

/// Releases a transaction the detection engine has finished inspecting.
pub fn free_tx(state: &mut FlowState, tx_num: u64) {
    super::transaction::free(state, tx_num);
}
