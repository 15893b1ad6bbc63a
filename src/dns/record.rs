//! Question and resource-record decoding (spec.md §4.2).

use super::name::decode_name;
use super::types::{DnsClass, RecordType};
use super::DnsError;

/// A decoded question-section entry.
#[derive(Debug, Clone)]
pub struct QueryEntry {
    pub name: String,
    pub rtype: RecordType,
    pub class: DnsClass,
}

/// Canonicalized rdata. Types that carry an embedded domain name get it
/// decoded and stored in canonical form; binary fields (A/AAAA) and
/// anything else this decoder doesn't further interpret are kept raw.
#[derive(Debug, Clone)]
pub enum RData {
    Raw(Vec<u8>),
    Name(String),
    Mx { preference: u16, exchange: String },
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
}

/// A decoded answer/authority/additional-section entry.
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub name: String,
    pub rtype: RecordType,
    pub class: DnsClass,
    pub ttl: u32,
    pub rdata: RData,
}

/// Approximate heap footprint of one entry, used to charge the memory
/// accountant (spec.md §4.3) — name bytes plus a fixed per-entry overhead
/// roughly covering the enum discriminant and any nested strings/vecs.
pub fn query_entry_size(entry: &QueryEntry) -> u64 {
    (entry.name.len() + 8) as u64
}

pub fn record_entry_size(entry: &RecordEntry) -> u64 {
    let rdata_len = match &entry.rdata {
        RData::Raw(bytes) => bytes.len(),
        RData::Name(name) => name.len(),
        RData::Mx { exchange, .. } => exchange.len() + 2,
        RData::Soa { mname, rname, .. } => mname.len() + rname.len() + 20,
        RData::Srv { target, .. } => target.len() + 6,
    };
    (entry.name.len() + rdata_len + 16) as u64
}

/// Decodes a single question-section entry at `cursor`, advancing it past
/// the name and the 4-byte type/class trailer.
pub fn decode_question(message: &[u8], cursor: &mut usize) -> Result<QueryEntry, DnsError> {
    let mut name = String::new();
    let consumed = decode_name(message, *cursor, &mut name)?;
    let trailer_start = *cursor + consumed;
    if trailer_start + 4 > message.len() {
        return Err(DnsError::MalformedData);
    }

    let rtype = u16::from_be_bytes([message[trailer_start], message[trailer_start + 1]]);
    let class = u16::from_be_bytes([message[trailer_start + 2], message[trailer_start + 3]]);
    *cursor = trailer_start + 4;

    Ok(QueryEntry {
        name,
        rtype: RecordType::from(rtype),
        class: DnsClass::from(class),
    })
}

/// Decodes `count` question-section entries in sequence.
pub fn decode_questions(
    message: &[u8],
    cursor: &mut usize,
    count: u16,
) -> Result<Vec<QueryEntry>, DnsError> {
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(decode_question(message, cursor)?);
    }
    Ok(out)
}

/// Decodes one answer/authority/additional-section record: a name, a
/// 10-byte fixed header (type, class, ttl, rdlength), then `rdlength`
/// octets of rdata.
pub fn decode_record(message: &[u8], cursor: &mut usize) -> Result<RecordEntry, DnsError> {
    let mut name = String::new();
    let consumed = decode_name(message, *cursor, &mut name)?;
    let header_start = *cursor + consumed;
    if header_start + 10 > message.len() {
        return Err(DnsError::MalformedData);
    }

    let rtype_raw = u16::from_be_bytes([message[header_start], message[header_start + 1]]);
    let class_raw = u16::from_be_bytes([message[header_start + 2], message[header_start + 3]]);
    let ttl = u32::from_be_bytes([
        message[header_start + 4],
        message[header_start + 5],
        message[header_start + 6],
        message[header_start + 7],
    ]);
    let rdlength = u16::from_be_bytes([message[header_start + 8], message[header_start + 9]]) as usize;

    let rdata_start = header_start + 10;
    let rdata_end = rdata_start
        .checked_add(rdlength)
        .ok_or(DnsError::MalformedData)?;
    if rdata_end > message.len() {
        return Err(DnsError::MalformedData);
    }

    let rtype = RecordType::from(rtype_raw);
    let rdata = decode_rdata(message, rdata_start, rdlength, &rtype)?;
    *cursor = rdata_end;

    Ok(RecordEntry {
        name,
        rtype,
        class: DnsClass::from(class_raw),
        ttl,
        rdata,
    })
}

/// Decodes `count` records in sequence.
pub fn decode_records(
    message: &[u8],
    cursor: &mut usize,
    count: u16,
) -> Result<Vec<RecordEntry>, DnsError> {
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(decode_record(message, cursor)?);
    }
    Ok(out)
}

fn decode_rdata(
    message: &[u8],
    rdata_start: usize,
    rdlength: usize,
    rtype: &RecordType,
) -> Result<RData, DnsError> {
    let rdata_end = rdata_start + rdlength;

    match rtype {
        RecordType::NS | RecordType::CNAME | RecordType::PTR => {
            let mut name = String::new();
            decode_name(message, rdata_start, &mut name)?;
            Ok(RData::Name(name))
        }
        RecordType::MX => {
            if rdata_start + 2 > rdata_end {
                return Err(DnsError::MalformedData);
            }
            let preference = u16::from_be_bytes([message[rdata_start], message[rdata_start + 1]]);
            let mut exchange = String::new();
            decode_name(message, rdata_start + 2, &mut exchange)?;
            Ok(RData::Mx { preference, exchange })
        }
        RecordType::SOA => {
            let mut mname = String::new();
            let mname_len = decode_name(message, rdata_start, &mut mname)?;
            let mut rname = String::new();
            let rname_off = rdata_start + mname_len;
            let rname_len = decode_name(message, rname_off, &mut rname)?;
            let ints_off = rname_off + rname_len;
            if ints_off + 20 > rdata_end {
                return Err(DnsError::MalformedData);
            }
            let read_u32 = |off: usize| {
                u32::from_be_bytes([
                    message[off],
                    message[off + 1],
                    message[off + 2],
                    message[off + 3],
                ])
            };
            Ok(RData::Soa {
                mname,
                rname,
                serial: read_u32(ints_off),
                refresh: read_u32(ints_off + 4),
                retry: read_u32(ints_off + 8),
                expire: read_u32(ints_off + 12),
                minimum: read_u32(ints_off + 16),
            })
        }
        RecordType::SRV => {
            if rdata_start + 6 > rdata_end {
                return Err(DnsError::MalformedData);
            }
            let priority = u16::from_be_bytes([message[rdata_start], message[rdata_start + 1]]);
            let weight = u16::from_be_bytes([message[rdata_start + 2], message[rdata_start + 3]]);
            let port = u16::from_be_bytes([message[rdata_start + 4], message[rdata_start + 5]]);
            let mut target = String::new();
            decode_name(message, rdata_start + 6, &mut target)?;
            Ok(RData::Srv { priority, weight, port, target })
        }
        // A, AAAA, and every other recognized-but-not-name-bearing type
        // (TXT, NAPTR, DS, RRSIG, NSEC, NSEC3, TKEY, TSIG, ANY) plus
        // anything unrecognized: stored as raw bytes.
        _ => Ok(RData::Raw(message[rdata_start..rdata_end].to_vec())),
    }
}
