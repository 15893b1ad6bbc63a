/// DNS record types this parser knows a symbolic name for. Anything else
/// renders as `TYPE<n>` (spec.md §6 "type-to-string helper").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    NAPTR,
    DS,
    RRSIG,
    NSEC,
    NSEC3,
    TKEY,
    TSIG,
    ANY,
    Unknown(u16),
}

impl From<u16> for RecordType {
    fn from(v: u16) -> Self {
        match v {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            33 => RecordType::SRV,
            35 => RecordType::NAPTR,
            43 => RecordType::DS,
            46 => RecordType::RRSIG,
            47 => RecordType::NSEC,
            50 => RecordType::NSEC3,
            249 => RecordType::TKEY,
            250 => RecordType::TSIG,
            255 => RecordType::ANY,
            other => RecordType::Unknown(other),
        }
    }
}

impl RecordType {
    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::NAPTR => 35,
            RecordType::DS => 43,
            RecordType::RRSIG => 46,
            RecordType::NSEC => 47,
            RecordType::NSEC3 => 50,
            RecordType::TKEY => 249,
            RecordType::TSIG => 250,
            RecordType::ANY => 255,
            RecordType::Unknown(v) => *v,
        }
    }

    /// Symbolic name, or `TYPE<n>` for anything not in spec.md §6's table.
    pub fn name(&self) -> String {
        match self {
            RecordType::A => "A".into(),
            RecordType::NS => "NS".into(),
            RecordType::CNAME => "CNAME".into(),
            RecordType::SOA => "SOA".into(),
            RecordType::PTR => "PTR".into(),
            RecordType::MX => "MX".into(),
            RecordType::TXT => "TXT".into(),
            RecordType::AAAA => "AAAA".into(),
            RecordType::SRV => "SRV".into(),
            RecordType::NAPTR => "NAPTR".into(),
            RecordType::DS => "DS".into(),
            RecordType::RRSIG => "RRSIG".into(),
            RecordType::NSEC => "NSEC".into(),
            RecordType::NSEC3 => "NSEC3".into(),
            RecordType::TKEY => "TKEY".into(),
            RecordType::TSIG => "TSIG".into(),
            RecordType::ANY => "ANY".into(),
            RecordType::Unknown(v) => format!("TYPE{}", v),
        }
    }

    /// Does this type carry an embedded domain name in its rdata that the
    /// record decoder canonicalizes (spec.md §4.2)?
    pub fn carries_embedded_name(&self) -> bool {
        matches!(
            self,
            RecordType::NS
                | RecordType::CNAME
                | RecordType::PTR
                | RecordType::MX
                | RecordType::SOA
                | RecordType::SRV
        )
    }
}

/// DNS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsClass {
    IN,
    CH,
    HS,
    ANY,
    Unknown(u16),
}

impl From<u16> for DnsClass {
    fn from(v: u16) -> Self {
        match v {
            1 => DnsClass::IN,
            3 => DnsClass::CH,
            4 => DnsClass::HS,
            255 => DnsClass::ANY,
            other => DnsClass::Unknown(other),
        }
    }
}

impl DnsClass {
    pub fn to_u16(&self) -> u16 {
        match self {
            DnsClass::IN => 1,
            DnsClass::CH => 3,
            DnsClass::HS => 4,
            DnsClass::ANY => 255,
            DnsClass::Unknown(v) => *v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_types() {
        for (v, name) in [(1u16, "A"), (28, "AAAA"), (43, "DS"), (250, "TSIG")] {
            let rt = RecordType::from(v);
            assert_eq!(rt.to_u16(), v);
            assert_eq!(rt.name(), name);
        }
    }

    #[test]
    fn unknown_type_renders_numeric() {
        let rt = RecordType::from(9999);
        assert_eq!(rt.name(), "TYPE9999");
        assert_eq!(rt.to_u16(), 9999);
    }

    #[test]
    fn embedded_name_flags_match_spec_table() {
        assert!(RecordType::CNAME.carries_embedded_name());
        assert!(RecordType::SOA.carries_embedded_name());
        assert!(!RecordType::A.carries_embedded_name());
        assert!(!RecordType::TXT.carries_embedded_name());
    }
}
