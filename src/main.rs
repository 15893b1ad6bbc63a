//! `dnsflow-replay`: feeds a captured, direction-tagged byte stream
//! through the parser core and prints each flow's transactions as JSON.
//!
//! This binary exists to exercise [`dnsflow::dns`] end to end; the real
//! deployment target is a detection engine embedding the library
//! directly, not this replay tool.

mod config;
mod dns;

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dns::context::DnsContext;
use crate::dns::record::{QueryEntry, RData, RecordEntry};
use crate::dns::transaction::{Direction, FlowState, Transaction};

/// One line of the capture file: a single byte run observed on a flow, in
/// a given direction, over a given transport.
#[derive(Debug, Deserialize)]
struct CaptureLine {
    flow: String,
    direction: CaptureDirection,
    transport: Transport,
    /// Hex-encoded payload bytes.
    data: String,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum CaptureDirection {
    ToServer,
    ToClient,
}

impl From<CaptureDirection> for Direction {
    fn from(d: CaptureDirection) -> Self {
        match d {
            CaptureDirection::ToServer => Direction::ToServer,
            CaptureDirection::ToClient => Direction::ToClient,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Transport {
    Udp,
    Tcp,
}

fn decode_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        anyhow::bail!("odd-length hex payload");
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| anyhow::anyhow!("invalid hex byte at offset {}: {}", i, e))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dnsflow=info".into()),
        )
        .init();

    info!("dnsflow-replay v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dnsflow.toml".to_string());
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        warn!("using built-in defaults, could not load '{}': {}", config_path, e);
        Config {
            replay: Default::default(),
            memcap: Default::default(),
        }
    });

    let ctx = Arc::new(DnsContext::new(config.memcap.clone().into()));
    let flows: DashMap<String, FlowState> = DashMap::new();

    let content = std::fs::read_to_string(&config.replay.capture_path)?;
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry: CaptureLine = match serde_json::from_str(line) {
            Ok(e) => e,
            Err(e) => {
                error!("skipping malformed capture line {}: {}", lineno + 1, e);
                continue;
            }
        };

        let payload = match decode_hex(&entry.data) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("skipping capture line {} with bad hex: {}", lineno + 1, e);
                continue;
            }
        };

        let mut state = flows.entry(entry.flow.clone()).or_insert_with(FlowState::new);
        replay_one(&ctx, &mut state, entry.direction.into(), entry.transport, &payload);
    }

    for entry in flows.iter() {
        print_flow(entry.key(), &entry);
    }

    Ok(())
}

fn replay_one(
    ctx: &DnsContext,
    state: &mut FlowState,
    direction: Direction,
    transport: Transport,
    payload: &[u8],
) {
    let messages: Vec<Vec<u8>> = if transport == Transport::Tcp {
        state.feed_tcp(ctx, direction, payload)
    } else {
        vec![payload.to_vec()]
    };

    for message in messages {
        let result = match direction {
            Direction::ToServer => crate::dns::request::parse_request(ctx, state, &message).map(|_| ()),
            Direction::ToClient => crate::dns::response::parse_response(ctx, state, &message).map(|_| ()),
        };
        if let Err(e) = result {
            warn!("dropped a message during replay: {}", e);
        }
    }
}

fn print_flow(flow_id: &str, state: &FlowState) {
    for tx in state.iter_transactions() {
        let value = transaction_json(tx);
        println!("{}", json!({ "flow": flow_id, "tx": value }));
    }
}

fn transaction_json(tx: &Transaction) -> serde_json::Value {
    json!({
        "tx_num": tx.tx_num,
        "tx_id": tx.tx_id,
        "replied": tx.replied,
        "reply_lost": tx.reply_lost,
        "no_such_name": tx.no_such_name,
        "recursion_desired": tx.recursion_desired,
        "rcode": tx.rcode,
        "queries": tx.queries.iter().map(query_json).collect::<Vec<_>>(),
        "answers": tx.answers.iter().map(record_json).collect::<Vec<_>>(),
        "authorities": tx.authorities.iter().map(record_json).collect::<Vec<_>>(),
        "events": tx.events.iter().map(|e| e.event.as_str()).collect::<Vec<_>>(),
    })
}

fn query_json(q: &QueryEntry) -> serde_json::Value {
    json!({
        "name": q.name,
        "type": q.rtype.name(),
        "class": q.class.to_u16(),
    })
}

fn record_json(r: &RecordEntry) -> serde_json::Value {
    json!({
        "name": r.name,
        "type": r.rtype.name(),
        "class": r.class.to_u16(),
        "ttl": r.ttl,
        "rdata": rdata_json(&r.rdata),
    })
}

fn rdata_json(rdata: &RData) -> serde_json::Value {
    match rdata {
        RData::Raw(bytes) => json!({ "raw_len": bytes.len() }),
        RData::Name(name) => json!({ "name": name }),
        RData::Mx { preference, exchange } => json!({ "preference": preference, "exchange": exchange }),
        RData::Soa { mname, rname, serial, refresh, retry, expire, minimum } => json!({
            "mname": mname, "rname": rname, "serial": serial,
            "refresh": refresh, "retry": retry, "expire": expire, "minimum": minimum,
        }),
        RData::Srv { priority, weight, port, target } => json!({
            "priority": priority, "weight": weight, "port": port, "target": target,
        }),
    }
}
