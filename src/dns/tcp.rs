//! TCP length-prefix framer (spec.md §4.7): DNS-over-TCP prepends each
//! message with a 2-byte big-endian length, and a single `feed` call's
//! input can split that prefix or the message body anywhere.

use super::context::DnsContext;
use super::memcap::MemcapContext;

const LENGTH_PREFIX_SIZE: usize = 2;

/// Per-direction reassembly buffer. One lives on each side of a flow's
/// `FlowState` (spec.md §3).
#[derive(Debug)]
pub struct TcpFramer {
    buf: Vec<u8>,
    /// Once set, the framer has given up on this direction (memcap denial)
    /// and silently discards further bytes until reset.
    desynced: bool,
}

/// Result of one [`TcpFramer::feed`] call.
#[derive(Debug, Default)]
pub struct TcpFeedResult {
    /// Every complete DNS message now available, in order.
    pub messages: Vec<Vec<u8>>,
    /// True only on the call whose memcap denial transitioned the framer
    /// into its desynced state — the caller raises `StateMemcapReached`
    /// exactly once off this signal, since `TcpFramer` itself has no
    /// access to a `FlowState` to raise events against.
    pub just_desynced: bool,
}

impl TcpFramer {
    pub fn new() -> Self {
        TcpFramer {
            buf: Vec::new(),
            desynced: false,
        }
    }

    /// Appends `chunk` to the reassembly buffer, charging its growth
    /// against the memory accountant. Returns every complete DNS message
    /// now available, in order, leaving any trailing partial message
    /// buffered for the next call.
    pub fn feed(&mut self, ctx: &DnsContext, state_mem_in_use: &mut u64, chunk: &[u8]) -> TcpFeedResult {
        if self.desynced {
            return TcpFeedResult::default();
        }

        if !charge(&ctx.memcap, state_mem_in_use, chunk.len() as u64) {
            self.desynced = true;
            return TcpFeedResult {
                messages: Vec::new(),
                just_desynced: true,
            };
        }
        self.buf.extend_from_slice(chunk);

        let mut out = Vec::new();
        loop {
            if self.buf.len() < LENGTH_PREFIX_SIZE {
                break;
            }
            let msg_len = u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize;
            let frame_len = LENGTH_PREFIX_SIZE + msg_len;
            if self.buf.len() < frame_len {
                break;
            }

            let message = self.buf[LENGTH_PREFIX_SIZE..frame_len].to_vec();
            self.buf.drain(0..frame_len);
            out.push(message);
        }
        TcpFeedResult {
            messages: out,
            just_desynced: false,
        }
    }

    pub fn is_desynced(&self) -> bool {
        self.desynced
    }

    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}

impl Default for TcpFramer {
    fn default() -> Self {
        TcpFramer::new()
    }
}

fn charge(memcap: &MemcapContext, state_mem_in_use: &mut u64, want: u64) -> bool {
    if !memcap.check(*state_mem_in_use, want) {
        return false;
    }
    *state_mem_in_use += want;
    memcap.incr_global(want);
    true
}
