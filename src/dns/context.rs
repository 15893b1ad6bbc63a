//! Process-wide, explicitly-constructed parser context (spec.md §9 design
//! note: "process-wide mutable state... expose as an explicitly
//! constructed context passed into the parser by the calling pipeline").

use std::sync::atomic::{AtomicU64, Ordering};

use super::memcap::{MemcapConfig, MemcapContext};

/// Bundles the memory accountant with the monotone event-sequence counter.
/// Built once by the calling pipeline and passed by reference into every
/// parse call; configuration inside it is written only at startup and read
/// without synchronization thereafter (spec.md §5).
#[derive(Debug)]
pub struct DnsContext {
    pub memcap: MemcapContext,
    event_seq: AtomicU64,
}

impl DnsContext {
    pub fn new(config: MemcapConfig) -> Self {
        DnsContext {
            memcap: MemcapContext::new(config),
            event_seq: AtomicU64::new(0),
        }
    }

    /// Allocates the next monotone event sequence number.
    pub fn next_event_seq(&self) -> u64 {
        self.event_seq.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for DnsContext {
    fn default() -> Self {
        DnsContext::new(MemcapConfig::default())
    }
}
