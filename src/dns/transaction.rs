//! Transaction store (spec.md §4.4) and the per-flow state container
//! (spec.md §3 "Flow state").

use std::collections::VecDeque;

use super::context::DnsContext;
use super::events::{DnsEvent, EventRecord, EventRing};
use super::record::{query_entry_size, record_entry_size, QueryEntry, RecordEntry};
use super::tcp::TcpFramer;

/// Which section an answer-shaped record is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordList {
    Answer,
    Authority,
}

/// Byte stream direction, relative to the flow's originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToServer,
    ToClient,
}

/// One DNS request/response pairing (spec.md §3 "Transaction").
#[derive(Debug)]
pub struct Transaction {
    pub tx_num: u64,
    pub tx_id: u16,
    pub replied: bool,
    pub reply_lost: bool,
    pub no_such_name: bool,
    pub recursion_desired: bool,
    pub rcode: u8,
    pub queries: Vec<QueryEntry>,
    pub answers: Vec<RecordEntry>,
    pub authorities: Vec<RecordEntry>,
    pub events: EventRing,
    /// Set once a memcap denial has already raised an event for this
    /// transaction, so later denials on the same transaction stay silent
    /// (spec.md §4.3).
    memcap_denied: bool,
}

impl Transaction {
    fn new(tx_num: u64, tx_id: u16) -> Self {
        Transaction {
            tx_num,
            tx_id,
            replied: false,
            reply_lost: false,
            no_such_name: false,
            recursion_desired: false,
            rcode: 0,
            queries: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            events: EventRing::default(),
            memcap_denied: false,
        }
    }
}

/// Per-flow DNS parser state (spec.md §3 "Flow state").
#[derive(Debug)]
pub struct FlowState {
    transactions: VecDeque<Transaction>,
    transaction_max: u64,
    next_tx_num: u64,
    current_tx: Option<u64>,
    pub unreplied_cnt: u32,
    pub givenup: bool,
    mem_in_use: u64,
    pub events: EventRing,
    pub tcp_to_server: TcpFramer,
    pub tcp_to_client: TcpFramer,
}

impl FlowState {
    pub fn new() -> Self {
        FlowState {
            transactions: VecDeque::new(),
            transaction_max: 0,
            next_tx_num: 0,
            current_tx: None,
            unreplied_cnt: 0,
            givenup: false,
            mem_in_use: 0,
            events: EventRing::default(),
            tcp_to_server: TcpFramer::new(),
            tcp_to_client: TcpFramer::new(),
        }
    }

    pub fn mem_in_use(&self) -> u64 {
        self.mem_in_use
    }

    pub fn transaction_max(&self) -> u64 {
        self.transaction_max
    }

    pub fn current_tx_num(&self) -> Option<u64> {
        self.current_tx
    }

    pub fn set_current_tx(&mut self, tx_num: Option<u64>) {
        self.current_tx = tx_num;
    }

    pub fn iter_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    fn transaction_mut(&mut self, tx_num: u64) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|t| t.tx_num == tx_num)
    }

    pub fn transaction(&self, tx_num: u64) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.tx_num == tx_num)
    }

    /// Feeds `chunk` into the direction's TCP framer, raising
    /// `StateMemcapReached` exactly once if this call is the one that
    /// drives the framer into its desynced, drop-everything state
    /// (spec.md §4.7).
    pub fn feed_tcp(&mut self, ctx: &DnsContext, direction: Direction, chunk: &[u8]) -> Vec<Vec<u8>> {
        let result = match direction {
            Direction::ToServer => self.tcp_to_server.feed(ctx, &mut self.mem_in_use, chunk),
            Direction::ToClient => self.tcp_to_client.feed(ctx, &mut self.mem_in_use, chunk),
        };
        if result.just_desynced {
            self.raise_event(ctx, DnsEvent::StateMemcapReached);
        }
        result.messages
    }

    /// Raises `event` against the current transaction if one is set,
    /// otherwise against the flow-level ring (spec.md §4.8).
    pub fn raise_event(&mut self, ctx: &DnsContext, event: DnsEvent) {
        let seq = ctx.next_event_seq();
        let record = EventRecord { seq, event };
        match self.current_tx {
            Some(tx_num) => {
                if let Some(tx) = self.transaction_mut(tx_num) {
                    tx.events.push(record);
                    return;
                }
                self.events.push(record);
            }
            None => self.events.push(record),
        }
    }
}

impl Default for FlowState {
    fn default() -> Self {
        FlowState::new()
    }
}

/// Finds the most recently created, not-yet-replied transaction matching
/// `id` (spec.md §4.4: "most recently created ... that is not yet
/// replied").
pub fn find_by_tx_id(state: &FlowState, id: u16) -> Option<&Transaction> {
    state
        .transactions
        .iter()
        .rev()
        .find(|t| t.tx_id == id && !t.replied)
}

fn find_by_tx_id_num(state: &FlowState, id: u16) -> Option<u64> {
    find_by_tx_id(state, id).map(|t| t.tx_num)
}

/// Creates a new transaction, links it at the tail of the flow's ordered
/// transaction list, and makes it the flow's current transaction.
pub fn create(state: &mut FlowState, id: u16) -> u64 {
    let tx_num = state.next_tx_num;
    state.next_tx_num += 1;
    state.transaction_max = state.next_tx_num;

    state.transactions.push_back(Transaction::new(tx_num, id));
    state.current_tx = Some(tx_num);
    tx_num
}

/// Appends a query entry to `tx_num`'s query list, subject to the memory
/// accountant. No-ops silently if the accountant denies the allocation,
/// except for the first denial on this transaction, which raises
/// `StateMemcapReached`.
pub fn append_query(ctx: &DnsContext, state: &mut FlowState, tx_num: u64, entry: QueryEntry) {
    let size = query_entry_size(&entry);
    if !ctx.memcap.check(state.mem_in_use, size) {
        deny_allocation(ctx, state, tx_num);
        return;
    }

    if let Some(tx) = state.transaction_mut(tx_num) {
        tx.queries.push(entry);
        state.mem_in_use += size;
        ctx.memcap.incr_global(size);
    }
}

/// Appends an answer/authority entry to `tx_num`, subject to the same
/// memcap gate as [`append_query`].
pub fn append_answer(
    ctx: &DnsContext,
    state: &mut FlowState,
    tx_num: u64,
    list: RecordList,
    entry: RecordEntry,
) {
    let size = record_entry_size(&entry);
    if !ctx.memcap.check(state.mem_in_use, size) {
        deny_allocation(ctx, state, tx_num);
        return;
    }

    if let Some(tx) = state.transaction_mut(tx_num) {
        match list {
            RecordList::Answer => tx.answers.push(entry),
            RecordList::Authority => tx.authorities.push(entry),
        }
        state.mem_in_use += size;
        ctx.memcap.incr_global(size);
    }
}

fn deny_allocation(ctx: &DnsContext, state: &mut FlowState, tx_num: u64) {
    let already_denied = state
        .transaction_mut(tx_num)
        .map(|tx| tx.memcap_denied)
        .unwrap_or(true);

    if already_denied {
        return;
    }

    if let Some(tx) = state.transaction_mut(tx_num) {
        tx.memcap_denied = true;
    }
    state.raise_event(ctx, DnsEvent::StateMemcapReached);
}

/// Marks `tx_num` replied, recording the extracted RCODE/no-such-name/
/// recursion-desired flags, and resets the flow's flood-detection counter
/// (spec.md §4.6).
pub fn mark_replied(state: &mut FlowState, tx_num: u64, rcode: u8, recursion_desired: bool) {
    if let Some(tx) = state.transaction_mut(tx_num) {
        tx.replied = true;
        tx.rcode = rcode;
        tx.no_such_name = rcode == 3;
        tx.recursion_desired = recursion_desired;
    }
    state.unreplied_cnt = 0;
    state.givenup = false;
}

/// Removes `tx_num` from the flow's transaction list. Idempotent: freeing
/// an unknown sequence number is a no-op (spec.md §4.4).
pub fn free(state: &mut FlowState, tx_num: u64) {
    if let Some(pos) = state.transactions.iter().position(|t| t.tx_num == tx_num) {
        let removed = state.transactions.remove(pos);
        if let Some(tx) = removed {
            let freed: u64 = tx
                .queries
                .iter()
                .map(query_entry_size)
                .sum::<u64>()
                + tx.answers.iter().map(record_entry_size).sum::<u64>()
                + tx.authorities.iter().map(record_entry_size).sum::<u64>();
            state.mem_in_use = state.mem_in_use.saturating_sub(freed);
        }
    }
    if state.current_tx == Some(tx_num) {
        state.current_tx = None;
    }
}

/// Marks every transaction still not replied as `reply_lost` and current
/// (so detection engines can make one last pass), per spec.md §5's
/// teardown policy. Returns the tx_nums touched.
pub fn mark_unreplied_as_lost(state: &mut FlowState) -> Vec<u64> {
    let mut touched = Vec::new();
    for tx in state.transactions.iter_mut() {
        if !tx.replied {
            tx.reply_lost = true;
            touched.push(tx.tx_num);
        }
    }
    touched
}

pub(crate) fn lookup_unreplied(state: &FlowState, id: u16) -> Option<u64> {
    find_by_tx_id_num(state, id)
}
