//! Five-tuple flow identity

use std::fmt;
use std::net::Ipv4Addr;

/// (source address, destination address, source port, destination port, protocol)
///
/// Addresses are IPv4 in host byte order. Equality is exact; use [`FiveTuple::matches`]
/// for the bidirectional comparison the flow table performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiveTuple {
    pub source_address: u32,
    pub destination_address: u32,
    pub source_port: u16,
    pub destination_port: u16,
    pub protocol: u8,
}

impl FiveTuple {
    pub const fn new(
        source_address: u32,
        destination_address: u32,
        source_port: u16,
        destination_port: u16,
        protocol: u8,
    ) -> Self {
        Self {
            source_address,
            destination_address,
            source_port,
            destination_port,
            protocol,
        }
    }

    /// Same flow seen from the other endpoint (protocol unchanged)
    #[inline(always)]
    pub const fn reversed(&self) -> Self {
        Self {
            source_address: self.destination_address,
            destination_address: self.source_address,
            source_port: self.destination_port,
            destination_port: self.source_port,
            protocol: self.protocol,
        }
    }

    /// True if `other` is this tuple or its reversal
    #[inline(always)]
    pub fn matches(&self, other: &FiveTuple) -> bool {
        self == other || *self == other.reversed()
    }

    /// Direction-independent representative, usable as a key for bidirectional state
    #[inline]
    pub fn canonical(&self) -> Self {
        let reversed = self.reversed();
        if reversed < *self { reversed } else { *self }
    }

    pub fn source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.source_address)
    }

    pub fn destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.destination_address)
    }
}

impl std::ops::Not for FiveTuple {
    type Output = FiveTuple;

    fn not(self) -> Self::Output {
        self.reversed()
    }
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "proto {} {}:{} -> {}:{}",
            self.protocol,
            self.source(),
            self.source_port,
            self.destination(),
            self.destination_port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TUPLE: FiveTuple = FiveTuple::new(0xc0a8_0000, 0x0808_0808, 12345, 80, 6);

    #[test]
    fn test_reversal_swaps_endpoints_keeps_protocol() {
        let rev = TUPLE.reversed();
        assert_eq!(rev.source_address, TUPLE.destination_address);
        assert_eq!(rev.destination_port, TUPLE.source_port);
        assert_eq!(rev.protocol, 6);
        assert_eq!(rev.reversed(), TUPLE);
        assert_eq!(!TUPLE, rev);
    }

    #[test]
    fn test_matches_both_directions_only() {
        assert!(TUPLE.matches(&TUPLE));
        assert!(TUPLE.matches(&TUPLE.reversed()));

        let other_proto = FiveTuple { protocol: 17, ..TUPLE };
        assert!(!TUPLE.matches(&other_proto));
        assert!(!TUPLE.matches(&other_proto.reversed()));
    }

    #[test]
    fn test_canonical_is_direction_independent() {
        assert_eq!(TUPLE.canonical(), TUPLE.reversed().canonical());

        let symmetric = FiveTuple::new(1, 1, 5, 5, 17);
        assert_eq!(symmetric.canonical(), symmetric);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TUPLE.to_string(),
            "proto 6 192.168.0.0:12345 -> 8.8.8.8:80"
        );
    }
}
