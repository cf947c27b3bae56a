//! Message envelope, discriminant set, and factory
//!
//! Every unit of node-to-node communication is a `Message`: a common
//! envelope (kind, transaction id, batch id, provenance) plus a
//! kind-specific payload. The kind set is closed; decode of a byte
//! outside it is a protocol violation.
//!
//! Construction mirrors the paths a testbed node actually takes:
//! - `create`: blank message of a kind (send path scaffolding)
//! - `from_txn`: snapshot a transaction's fields for the wire
//! - `from_record`: wrap a replicated log record
//! - `from_query`: wrap a client work description
//! - decode (in `codec`): reconstruct from raw bytes
//!
//! `copy_to_txn` is the receive-path dual of `from_txn`.

use crate::config::ProtocolConfig;
use crate::log::LogRecord;
use crate::transport::ProtocolViolation;
use crate::txn::{ClientQuery, Request, ReturnCode, TxnHandle, UNSET_BATCH_ID, UNSET_TXN_ID};

/// The closed set of message kinds.
///
/// The discriminant byte is the first byte of every encoded message and
/// selects the layout of everything after the common prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// Startup barrier: a node finished initialization
    InitDone = 0,
    /// Server-to-server query execution request
    RemoteQuery = 1,
    /// Reply to a remote query
    RemoteQueryResponse = 2,
    /// Commit/abort application on a participant
    RemoteFinish = 3,
    /// Replicated log record shipment
    LogWrite = 4,
    /// Acknowledgment of a log write
    LogWriteResponse = 5,
    /// Notification that shipped records reached durable storage
    LogFlushed = 6,
    /// Acknowledgment of a prepare
    PrepareAck = 7,
    /// Acknowledgment of a finish
    FinishAck = 8,
    /// Client-originated query
    ClientQuery = 9,
    /// Client query re-addressed to its home server
    RemoteTxn = 10,
    /// Two-phase commit prepare
    Prepare = 11,
    /// Coordinated-execution forwarding between participants
    Forward = 12,
    /// Coordinated-execution batch completion
    Done = 13,
    /// Terminal reply to the originating client
    ClientResponse = 14,
}

impl MessageKind {
    /// Convert from the wire byte, `None` for bytes outside the set.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MessageKind::InitDone),
            1 => Some(MessageKind::RemoteQuery),
            2 => Some(MessageKind::RemoteQueryResponse),
            3 => Some(MessageKind::RemoteFinish),
            4 => Some(MessageKind::LogWrite),
            5 => Some(MessageKind::LogWriteResponse),
            6 => Some(MessageKind::LogFlushed),
            7 => Some(MessageKind::PrepareAck),
            8 => Some(MessageKind::FinishAck),
            9 => Some(MessageKind::ClientQuery),
            10 => Some(MessageKind::RemoteTxn),
            11 => Some(MessageKind::Prepare),
            12 => Some(MessageKind::Forward),
            13 => Some(MessageKind::Done),
            14 => Some(MessageKind::ClientResponse),
            _ => None,
        }
    }

    /// Convert to the wire byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this kind carries a client work description.
    pub fn is_query_kind(self) -> bool {
        matches!(self, MessageKind::ClientQuery | MessageKind::RemoteTxn)
    }

    /// Stable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::InitDone => "init_done",
            MessageKind::RemoteQuery => "remote_query",
            MessageKind::RemoteQueryResponse => "remote_query_response",
            MessageKind::RemoteFinish => "remote_finish",
            MessageKind::LogWrite => "log_write",
            MessageKind::LogWriteResponse => "log_write_response",
            MessageKind::LogFlushed => "log_flushed",
            MessageKind::PrepareAck => "prepare_ack",
            MessageKind::FinishAck => "finish_ack",
            MessageKind::ClientQuery => "client_query",
            MessageKind::RemoteTxn => "remote_txn",
            MessageKind::Prepare => "prepare",
            MessageKind::Forward => "forward",
            MessageKind::Done => "done",
            MessageKind::ClientResponse => "client_response",
        }
    }

    /// Every kind, in discriminant order. Used by the `layout` command
    /// and exhaustiveness tests.
    pub fn all() -> [MessageKind; 15] {
        [
            MessageKind::InitDone,
            MessageKind::RemoteQuery,
            MessageKind::RemoteQueryResponse,
            MessageKind::RemoteFinish,
            MessageKind::LogWrite,
            MessageKind::LogWriteResponse,
            MessageKind::LogFlushed,
            MessageKind::PrepareAck,
            MessageKind::FinishAck,
            MessageKind::ClientQuery,
            MessageKind::RemoteTxn,
            MessageKind::Prepare,
            MessageKind::Forward,
            MessageKind::Done,
            MessageKind::ClientResponse,
        ]
    }
}

/// Payload of a client-query or remote-txn message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientQueryBody {
    /// Transaction's logical timestamp
    pub ts: u64,
    /// Client-observed start time, echoed on the response
    pub client_start_ts: u64,
    /// Partitions the transaction touches
    pub partitions: Vec<u64>,
    /// Access records
    pub requests: Vec<Request>,
}

/// Payload of a server-to-server query request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteQueryBody {
    /// Logical timestamp; on the wire only for timestamp-family CC
    pub ts: u64,
    /// Start timestamp; on the wire only for optimistic CC
    pub start_ts: u64,
    /// Access records for the remote partition
    pub requests: Vec<Request>,
}

/// Payload of a remote-query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResponseBody {
    /// Outcome of remote execution
    pub rc: ReturnCode,
}

/// Payload of a remote-finish message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishBody {
    /// Coordinating partition
    pub pid: u64,
    /// Commit or abort decision being applied
    pub rc: ReturnCode,
    /// Whether the transaction was read-only on this participant
    pub read_only: bool,
}

/// Payload of a prepare-ack or finish-ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckBody {
    /// Participant's vote or application outcome
    pub rc: ReturnCode,
}

/// Payload of a client response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientResponseBody {
    /// Echo of the client's start time for latency accounting
    pub client_start_ts: u64,
}

/// Payload of a log-write message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogWriteBody {
    /// The shipped record, checksum-verified on decode
    pub record: LogRecord,
}

/// Kind-specific message payloads.
///
/// `Prepare`, `Forward`, and `Done` carry nothing beyond the envelope
/// (`Forward`/`Done` re-encode the envelope batch id on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// No payload
    InitDone,
    /// Client work description (ClientQuery and RemoteTxn kinds)
    ClientQuery(ClientQueryBody),
    /// Remote execution request
    RemoteQuery(RemoteQueryBody),
    /// Remote execution outcome
    QueryResponse(QueryResponseBody),
    /// Commit/abort application
    Finish(FinishBody),
    /// Prepare/finish acknowledgment (kind disambiguates)
    Ack(AckBody),
    /// No payload
    Prepare,
    /// Envelope batch id only
    Forward,
    /// Envelope batch id only
    Done,
    /// Terminal client reply
    ClientResponse(ClientResponseBody),
    /// Shipped log record
    LogWrite(LogWriteBody),
    /// No payload
    LogWriteResponse,
    /// No payload
    LogFlushed,
}

/// One unit of node-to-node communication.
///
/// A message is exclusively owned by whichever layer currently holds
/// it; handing it to the codec, a queue, or dispatch transfers
/// ownership. Rust's move semantics enforce what the original design
/// documented as a manual free discipline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Discriminant, written first on the wire
    pub kind: MessageKind,
    /// Transaction this message belongs to, `UNSET_TXN_ID` for control
    pub txn_id: u64,
    /// Batch the transaction belongs to, `UNSET_BATCH_ID` until assigned
    pub batch_id: u64,
    /// Node that originated the message; authoritative value comes from
    /// the batch header on the receive path
    pub return_node_id: u32,
    /// Node the message is addressed to
    pub dest_node_id: u32,
    /// Kind-specific payload
    pub body: MessageBody,
}

impl Message {
    /// Allocate a blank message of `kind` under the active
    /// configuration, with identity fields at their sentinels.
    ///
    /// Requesting a query kind under a workload whose payloads this
    /// core does not construct is a fatal configuration mismatch.
    pub fn create(kind: MessageKind, config: &ProtocolConfig) -> Message {
        let body = match kind {
            MessageKind::InitDone => MessageBody::InitDone,
            MessageKind::RemoteQuery => {
                require_ycsb(kind, config);
                MessageBody::RemoteQuery(RemoteQueryBody::default())
            }
            MessageKind::RemoteQueryResponse => MessageBody::QueryResponse(QueryResponseBody {
                rc: ReturnCode::Ok,
            }),
            MessageKind::RemoteFinish => MessageBody::Finish(FinishBody {
                pid: 0,
                rc: ReturnCode::Ok,
                read_only: false,
            }),
            MessageKind::LogWrite => MessageBody::LogWrite(LogWriteBody {
                record: LogRecord::commit(0, UNSET_TXN_ID),
            }),
            MessageKind::LogWriteResponse => MessageBody::LogWriteResponse,
            MessageKind::LogFlushed => MessageBody::LogFlushed,
            MessageKind::PrepareAck | MessageKind::FinishAck => {
                MessageBody::Ack(AckBody { rc: ReturnCode::Ok })
            }
            MessageKind::ClientQuery | MessageKind::RemoteTxn => {
                require_ycsb(kind, config);
                MessageBody::ClientQuery(ClientQueryBody::default())
            }
            MessageKind::Prepare => MessageBody::Prepare,
            MessageKind::Forward => MessageBody::Forward,
            MessageKind::Done => MessageBody::Done,
            MessageKind::ClientResponse => MessageBody::ClientResponse(ClientResponseBody {
                client_start_ts: 0,
            }),
        };
        Message {
            kind,
            txn_id: UNSET_TXN_ID,
            batch_id: UNSET_BATCH_ID,
            return_node_id: 0,
            dest_node_id: 0,
            body,
        }
    }

    /// Snapshot a transaction's fields into a message of `kind`.
    ///
    /// Which timestamp fields are copied follows the active CC
    /// algorithm: the logical timestamp for the timestamp family, the
    /// start timestamp for optimistic CC.
    pub fn from_txn(txn: &TxnHandle, kind: MessageKind, config: &ProtocolConfig) -> Message {
        let mut msg = Message::create(kind, config);
        msg.txn_id = txn.txn_id();
        msg.batch_id = txn.batch_id();

        match &mut msg.body {
            MessageBody::ClientQuery(body) => {
                body.ts = txn.timestamp();
                body.client_start_ts = txn.client_start_ts();
                if let Some(query) = txn.query() {
                    body.partitions = query.partitions.clone();
                    body.requests = query.requests.clone();
                }
            }
            MessageBody::RemoteQuery(body) => {
                if config.cc.carries_timestamp() {
                    body.ts = txn.timestamp();
                }
                if config.cc.carries_start_timestamp() {
                    body.start_ts = txn.start_timestamp();
                }
                if let Some(query) = txn.query() {
                    body.requests = query.requests.clone();
                }
            }
            MessageBody::QueryResponse(body) => body.rc = txn.rc(),
            MessageBody::Finish(body) => {
                body.pid = txn.query().and_then(|q| q.partitions.first().copied()).unwrap_or(0);
                body.rc = txn.rc();
                body.read_only = txn.query().map(|q| q.is_read_only()).unwrap_or(false);
            }
            MessageBody::Ack(body) => body.rc = txn.rc(),
            MessageBody::ClientResponse(body) => body.client_start_ts = txn.client_start_ts(),
            MessageBody::LogWrite(_) => ProtocolViolation::ConfigMismatch {
                detail: "log-write messages are built from records, not transactions".into(),
            }
            .raise(),
            MessageBody::InitDone
            | MessageBody::Prepare
            | MessageBody::Forward
            | MessageBody::Done
            | MessageBody::LogWriteResponse
            | MessageBody::LogFlushed => {}
        }
        msg
    }

    /// Wrap a replicated log record in a log-write message.
    pub fn from_record(record: LogRecord, config: &ProtocolConfig) -> Message {
        let mut msg = Message::create(MessageKind::LogWrite, config);
        msg.txn_id = record.txn_id;
        msg.body = MessageBody::LogWrite(LogWriteBody { record });
        msg
    }

    /// Wrap a client work description in a query message.
    ///
    /// Only query kinds may carry a query; any other kind is a fatal
    /// configuration mismatch caught here, at construction.
    pub fn from_query(query: &ClientQuery, kind: MessageKind, config: &ProtocolConfig) -> Message {
        if !kind.is_query_kind() {
            ProtocolViolation::ConfigMismatch {
                detail: format!("kind '{}' cannot carry a client query", kind.name()),
            }
            .raise();
        }
        let mut msg = Message::create(kind, config);
        if let MessageBody::ClientQuery(body) = &mut msg.body {
            body.partitions = query.partitions.clone();
            body.requests = query.requests.clone();
        }
        msg
    }

    /// Receive-path dual of `from_txn`: push this message's fields back
    /// onto a transaction handle.
    pub fn copy_to_txn(&self, txn: &mut TxnHandle, config: &ProtocolConfig) {
        match &self.body {
            MessageBody::ClientQuery(body) => {
                txn.restore_identity(self.txn_id, body.ts);
                if config.cc.is_coordinated() {
                    txn.set_batch_id(self.batch_id);
                }
                txn.restore_client_start_ts(body.client_start_ts);
                txn.set_client_node_id(self.return_node_id);
                txn.set_query(ClientQuery::new(
                    body.partitions.clone(),
                    body.requests.clone(),
                ));
            }
            MessageBody::RemoteQuery(body) => {
                let ts = if config.cc.carries_timestamp() {
                    body.ts
                } else {
                    txn.timestamp()
                };
                txn.restore_identity(self.txn_id, ts);
                if config.cc.carries_start_timestamp() {
                    txn.restore_start_timestamp(body.start_ts);
                }
                txn.set_client_node_id(self.return_node_id);
                txn.set_query(ClientQuery::new(Vec::new(), body.requests.clone()));
            }
            MessageBody::QueryResponse(body) => txn.set_rc(body.rc),
            MessageBody::Finish(body) => txn.set_rc(body.rc),
            MessageBody::Ack(body) => txn.set_rc(body.rc),
            MessageBody::ClientResponse(body) => {
                txn.restore_client_start_ts(body.client_start_ts)
            }
            MessageBody::Forward | MessageBody::Done => txn.set_batch_id(self.batch_id),
            MessageBody::InitDone
            | MessageBody::Prepare
            | MessageBody::LogWrite(_)
            | MessageBody::LogWriteResponse
            | MessageBody::LogFlushed => {}
        }
    }
}

fn require_ycsb(kind: MessageKind, config: &ProtocolConfig) {
    if config.workload != crate::config::WorkloadKind::Ycsb {
        ProtocolViolation::ConfigMismatch {
            detail: format!(
                "kind '{}' has no payload layout under workload '{}'",
                kind.name(),
                config.workload.as_str()
            ),
        }
        .raise();
    }
}
