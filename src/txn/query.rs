//! Query payloads carried by query messages
//!
//! The core treats queries as opaque work descriptions: fixed-size
//! access records plus the partitions the transaction touches. Workload
//! generation (key distributions, query mixes) lives outside; only the
//! payload shape is defined here because the codec must round-trip it.

/// How a request touches its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccessType {
    /// Read the row under CC admission
    Read = 0,
    /// Declare write intent, value applied at commit
    Write = 1,
}

impl AccessType {
    /// Convert from the wire byte, `None` for invalid values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AccessType::Read),
            1 => Some(AccessType::Write),
            _ => None,
        }
    }

    /// Convert to the wire byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One fixed-size access record of a key-value transaction.
///
/// Encoded as exactly `WIRE_SIZE` bytes so a request list is a length
/// prefix followed by `count * WIRE_SIZE` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Access mode for this record
    pub access: AccessType,
    /// Primary key of the target row
    pub key: u64,
    /// Value written on commit (ignored for reads)
    pub value: u64,
}

impl Request {
    /// Encoded size of one record: access byte + key + value.
    pub const WIRE_SIZE: usize = 1 + 8 + 8;

    /// A read of `key`.
    pub fn read(key: u64) -> Self {
        Self {
            access: AccessType::Read,
            key,
            value: 0,
        }
    }

    /// A write of `value` to `key`.
    pub fn write(key: u64, value: u64) -> Self {
        Self {
            access: AccessType::Write,
            key,
            value,
        }
    }
}

/// A client transaction's work description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientQuery {
    /// Partitions this transaction touches
    pub partitions: Vec<u64>,
    /// Access records, executed in order
    pub requests: Vec<Request>,
}

impl ClientQuery {
    /// A query over the given partitions and requests.
    pub fn new(partitions: Vec<u64>, requests: Vec<Request>) -> Self {
        Self {
            partitions,
            requests,
        }
    }

    /// Whether every request is a read.
    pub fn is_read_only(&self) -> bool {
        self.requests
            .iter()
            .all(|r| r.access == AccessType::Read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_type_roundtrip() {
        for access in [AccessType::Read, AccessType::Write] {
            assert_eq!(AccessType::from_u8(access.as_u8()), Some(access));
        }
        assert!(AccessType::from_u8(2).is_none());
    }

    #[test]
    fn test_request_constructors() {
        let r = Request::read(10);
        assert_eq!(r.access, AccessType::Read);
        assert_eq!(r.key, 10);
        assert_eq!(r.value, 0);

        let w = Request::write(10, 99);
        assert_eq!(w.access, AccessType::Write);
        assert_eq!(w.value, 99);
    }

    #[test]
    fn test_read_only_detection() {
        let ro = ClientQuery::new(vec![0], vec![Request::read(1), Request::read(2)]);
        assert!(ro.is_read_only());

        let rw = ClientQuery::new(vec![0], vec![Request::read(1), Request::write(2, 5)]);
        assert!(!rw.is_read_only());
    }
}
