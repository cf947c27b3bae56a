//! Replicated log records
//!
//! Server nodes ship redo information to their log replicas inside
//! log-write messages. Each record is self-delimiting and
//! checksum-verified:
//! - Record Length (u32 LE), total length including this field
//! - Record Kind (u8): UPDATE / COMMIT / ABORT
//! - LSN (u64 LE)
//! - Transaction id (u64 LE)
//! - Table id (u32 LE)
//! - Row key (u64 LE)
//! - Image (length-prefixed bytes, post-operation row state)
//! - Checksum (u32 LE) over everything before it

use std::io;

use crate::log::checksum::compute_checksum;

/// Log record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogRecordKind {
    /// Row mutation with its after-image
    Update = 0,
    /// Transaction commit marker
    Commit = 1,
    /// Transaction abort marker
    Abort = 2,
}

impl LogRecordKind {
    /// Convert from u8, returns None for invalid values
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LogRecordKind::Update),
            1 => Some(LogRecordKind::Commit),
            2 => Some(LogRecordKind::Abort),
            _ => None,
        }
    }

    /// Convert to u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One replicated log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Record kind
    pub kind: LogRecordKind,
    /// Log sequence number, monotonic per origin node
    pub lsn: u64,
    /// Transaction the record belongs to
    pub txn_id: u64,
    /// Table of the mutated row
    pub table_id: u32,
    /// Primary key of the mutated row
    pub key: u64,
    /// Post-operation row state (empty for commit/abort markers)
    pub image: Vec<u8>,
}

impl LogRecord {
    /// Create an update record carrying the row's after-image.
    pub fn update(lsn: u64, txn_id: u64, table_id: u32, key: u64, image: Vec<u8>) -> Self {
        Self {
            kind: LogRecordKind::Update,
            lsn,
            txn_id,
            table_id,
            key,
            image,
        }
    }

    /// Create a commit marker.
    pub fn commit(lsn: u64, txn_id: u64) -> Self {
        Self {
            kind: LogRecordKind::Commit,
            lsn,
            txn_id,
            table_id: 0,
            key: 0,
            image: Vec::new(),
        }
    }

    /// Create an abort marker.
    pub fn abort(lsn: u64, txn_id: u64) -> Self {
        Self {
            kind: LogRecordKind::Abort,
            lsn,
            txn_id,
            table_id: 0,
            key: 0,
            image: Vec::new(),
        }
    }

    /// Serialize the record body (everything except length prefix and
    /// checksum). This is part of the data the checksum covers.
    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 8 + 8 + 4 + 8 + 4 + self.image.len());
        buf.push(self.kind.as_u8());
        buf.extend_from_slice(&self.lsn.to_le_bytes());
        buf.extend_from_slice(&self.txn_id.to_le_bytes());
        buf.extend_from_slice(&self.table_id.to_le_bytes());
        buf.extend_from_slice(&self.key.to_le_bytes());
        buf.extend_from_slice(&(self.image.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.image);
        buf
    }

    /// Total encoded size of this record.
    pub fn encoded_size(&self) -> usize {
        4 + 1 + 8 + 8 + 4 + 8 + 4 + self.image.len() + 4
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        // Checksum covers the length field and the body.
        let mut checksum_data = Vec::with_capacity(4 + body.len());
        checksum_data.extend_from_slice(&record_length.to_le_bytes());
        checksum_data.extend_from_slice(&body);
        let checksum = compute_checksum(&checksum_data);

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);
        record.extend_from_slice(&checksum.to_le_bytes());
        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        const MIN_RECORD_SIZE: usize = 4 + 1 + 8 + 8 + 4 + 8 + 4 + 4;

        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "log record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid log record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "log record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);

        let computed_checksum = compute_checksum(&data[0..checksum_offset]);
        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "log record checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let kind_byte = data[4];
        let kind = LogRecordKind::from_u8(kind_byte).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid log record kind: {}", kind_byte),
            )
        })?;

        let lsn = u64::from_le_bytes([
            data[5], data[6], data[7], data[8], data[9], data[10], data[11], data[12],
        ]);
        let txn_id = u64::from_le_bytes([
            data[13], data[14], data[15], data[16], data[17], data[18], data[19], data[20],
        ]);
        let table_id = u32::from_le_bytes([data[21], data[22], data[23], data[24]]);
        let key = u64::from_le_bytes([
            data[25], data[26], data[27], data[28], data[29], data[30], data[31], data[32],
        ]);

        let image_len = u32::from_le_bytes([data[33], data[34], data[35], data[36]]) as usize;
        let image_end = 37 + image_len;
        if image_end != checksum_offset {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "log record image length {} inconsistent with record length {}",
                    image_len, record_length
                ),
            ));
        }
        let image = data[37..image_end].to_vec();

        Ok((
            LogRecord {
                kind,
                lsn,
                txn_id,
                table_id,
                key,
                image,
            },
            record_length,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> LogRecord {
        LogRecord::update(9, 42, 1, 1000, vec![7, 7, 7, 7])
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            LogRecordKind::Update,
            LogRecordKind::Commit,
            LogRecordKind::Abort,
        ] {
            assert_eq!(LogRecordKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert!(LogRecordKind::from_u8(3).is_none());
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample_record();
        let bytes = record.serialize();
        let (back, consumed) = LogRecord::deserialize(&bytes).unwrap();
        assert_eq!(record, back);
        assert_eq!(consumed, bytes.len());
        assert_eq!(consumed, record.encoded_size());
    }

    #[test]
    fn test_marker_records_have_empty_image() {
        for record in [LogRecord::commit(3, 42), LogRecord::abort(4, 42)] {
            let bytes = record.serialize();
            let (back, _) = LogRecord::deserialize(&bytes).unwrap();
            assert!(back.image.is_empty());
            assert_eq!(back.txn_id, 42);
        }
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut bytes = sample_record().serialize();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        let err = LogRecord::deserialize(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_truncated_record_detected() {
        let bytes = sample_record().serialize();
        assert!(LogRecord::deserialize(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn test_deterministic_serialization() {
        let record = sample_record();
        assert_eq!(record.serialize(), record.serialize());
    }
}
