//! Fatal protocol-violation taxonomy
//!
//! The transport guarantees complete frames, and message layouts are
//! fixed by the deployment's protocol configuration. A truncated buffer,
//! an unknown discriminant, or a misrouted batch therefore signals a
//! build/version mismatch or corrupted transport that cannot be locally
//! repaired: the affected operation terminates immediately instead of
//! returning a recoverable error.
//!
//! Commit-time concurrency conflicts are NOT violations; they are
//! ordinary `ReturnCode::Abort` outcomes.

use std::fmt;

use crate::observability::NodeLogger;

/// The closed catalogue of fatal protocol and configuration violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A decoded discriminant byte names no known message kind
    UnknownDiscriminant { tag: u8 },
    /// A field layout requires more bytes than the buffer supplies
    TruncatedBuffer { needed: usize, remaining: usize },
    /// A batch arrived at a node it was not addressed to
    DestinationMismatch { dest: u32, local: u32 },
    /// A field byte decodes to no legal value for its type
    InvalidFieldValue { field: &'static str, value: u64 },
    /// A carried log record failed checksum or structural validation
    CorruptLogRecord { detail: String },
    /// A message/field combination unsupported by the active
    /// CC/workload configuration was requested
    ConfigMismatch { detail: String },
}

impl ProtocolViolation {
    /// Stable violation code for logs and diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolViolation::UnknownDiscriminant { .. } => "QDB_PROTO_UNKNOWN_KIND",
            ProtocolViolation::TruncatedBuffer { .. } => "QDB_PROTO_TRUNCATED",
            ProtocolViolation::DestinationMismatch { .. } => "QDB_PROTO_DEST_MISMATCH",
            ProtocolViolation::InvalidFieldValue { .. } => "QDB_PROTO_BAD_FIELD",
            ProtocolViolation::CorruptLogRecord { .. } => "QDB_LOG_CORRUPTION",
            ProtocolViolation::ConfigMismatch { .. } => "QDB_CONFIG_MISMATCH",
        }
    }

    /// Terminate the affected operation.
    ///
    /// Panics with the violation's diagnostic. Callers that hold a node
    /// logger should prefer `raise_logged` so the FATAL line lands in
    /// the structured log before termination.
    pub fn raise(self) -> ! {
        panic!("{}", self)
    }

    /// Log a FATAL event identifying the node, then terminate.
    pub fn raise_logged(self, logger: &NodeLogger) -> ! {
        let detail = self.to_string();
        logger.fatal(
            "PROTOCOL_VIOLATION",
            &[("code", self.code()), ("detail", detail.as_str())],
        );
        self.raise()
    }
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: ", self.code())?;
        match self {
            ProtocolViolation::UnknownDiscriminant { tag } => {
                write!(f, "unknown message discriminant {}", tag)
            }
            ProtocolViolation::TruncatedBuffer { needed, remaining } => {
                write!(
                    f,
                    "decode requires {} bytes but only {} remain",
                    needed, remaining
                )
            }
            ProtocolViolation::DestinationMismatch { dest, local } => {
                write!(
                    f,
                    "batch addressed to node {} received by node {}",
                    dest, local
                )
            }
            ProtocolViolation::InvalidFieldValue { field, value } => {
                write!(f, "field '{}' has no legal decoding for {}", field, value)
            }
            ProtocolViolation::CorruptLogRecord { detail } => {
                write!(f, "carried log record rejected: {}", detail)
            }
            ProtocolViolation::ConfigMismatch { detail } => {
                write!(f, "{}", detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            ProtocolViolation::UnknownDiscriminant { tag: 99 }.code(),
            "QDB_PROTO_UNKNOWN_KIND"
        );
        assert_eq!(
            ProtocolViolation::TruncatedBuffer {
                needed: 8,
                remaining: 3
            }
            .code(),
            "QDB_PROTO_TRUNCATED"
        );
        assert_eq!(
            ProtocolViolation::DestinationMismatch { dest: 1, local: 0 }.code(),
            "QDB_PROTO_DEST_MISMATCH"
        );
    }

    #[test]
    fn test_display_carries_context() {
        let violation = ProtocolViolation::TruncatedBuffer {
            needed: 8,
            remaining: 3,
        };
        let text = violation.to_string();
        assert!(text.contains("QDB_PROTO_TRUNCATED"));
        assert!(text.contains("8 bytes"));
        assert!(text.contains("3 remain"));
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_UNKNOWN_KIND")]
    fn test_raise_panics_with_code() {
        ProtocolViolation::UnknownDiscriminant { tag: 200 }.raise();
    }
}
