//! `dnsflow`: a DNS application-layer parser and transaction-tracking
//! core for a network intrusion-detection system.
//!
//! The parser itself ([`dns`]) is synchronous and has no knowledge of
//! sockets, flows, or threads — callers own a [`dns::DnsContext`] and a
//! [`dns::FlowState`] per flow and drive both through [`dns::request`]
//! and [`dns::response`]. The `dnsflow-replay` binary (`src/main.rs`)
//! is one such caller, built on `tokio` and `dashmap` for demonstration.

pub mod config;
pub mod dns;
