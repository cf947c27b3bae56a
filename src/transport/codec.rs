//! Wire codec: per-variant binary layouts
//!
//! `encode` and `decode` are exact inverses for every message variant
//! under a fixed protocol configuration. All integers are little-endian.
//! Layout per message:
//! - common prefix: discriminant (u8), transaction id (u64)
//! - variant suffix in fixed declared order, with conditional fields
//!   decided by the run's `ProtocolConfig` (never per message)
//! - variable-length lists as a u32 count followed by that many
//!   fixed-size elements
//!
//! Decode failures are protocol violations (fatal), not error values:
//! the transport layer guarantees framed messages arrive complete.

use crate::config::ProtocolConfig;
use crate::log::LogRecord;
use crate::transport::cursor::ByteReader;
use crate::transport::message::{
    AckBody, ClientQueryBody, ClientResponseBody, FinishBody, LogWriteBody, Message, MessageBody,
    MessageKind, QueryResponseBody, RemoteQueryBody,
};
use crate::transport::ProtocolViolation;
use crate::txn::{AccessType, Request, ReturnCode, UNSET_BATCH_ID};

/// Encoder/decoder for one protocol configuration.
///
/// Every codec built from the same `ProtocolConfig` agrees on a
/// structurally consistent layout, so a single build can host several
/// differently configured codecs side by side under test.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    config: ProtocolConfig,
}

impl Codec {
    /// Build a codec for the given configuration.
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }

    /// The configuration this codec encodes for.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Append `msg`'s encoding to `buf`, returning bytes written.
    pub fn encode(&self, msg: &Message, buf: &mut Vec<u8>) -> usize {
        let start = buf.len();

        // Common prefix shared by every variant.
        buf.push(msg.kind.as_u8());
        buf.extend_from_slice(&msg.txn_id.to_le_bytes());

        match &msg.body {
            MessageBody::InitDone
            | MessageBody::Prepare
            | MessageBody::LogWriteResponse
            | MessageBody::LogFlushed => {}
            MessageBody::ClientQuery(body) => {
                buf.extend_from_slice(&body.ts.to_le_bytes());
                if self.config.cc.is_coordinated() {
                    buf.extend_from_slice(&msg.batch_id.to_le_bytes());
                }
                buf.extend_from_slice(&body.client_start_ts.to_le_bytes());
                encode_partitions(buf, &body.partitions);
                encode_requests(buf, &body.requests);
            }
            MessageBody::RemoteQuery(body) => {
                if self.config.cc.carries_timestamp() {
                    buf.extend_from_slice(&body.ts.to_le_bytes());
                }
                if self.config.cc.carries_start_timestamp() {
                    buf.extend_from_slice(&body.start_ts.to_le_bytes());
                }
                encode_requests(buf, &body.requests);
            }
            MessageBody::QueryResponse(body) => buf.push(body.rc.as_u8()),
            MessageBody::Finish(body) => {
                buf.extend_from_slice(&body.pid.to_le_bytes());
                buf.push(body.rc.as_u8());
                buf.push(body.read_only as u8);
            }
            MessageBody::Ack(body) => buf.push(body.rc.as_u8()),
            MessageBody::Forward | MessageBody::Done => {
                buf.extend_from_slice(&msg.batch_id.to_le_bytes());
            }
            MessageBody::ClientResponse(body) => {
                buf.extend_from_slice(&body.client_start_ts.to_le_bytes());
            }
            MessageBody::LogWrite(body) => {
                buf.extend_from_slice(&body.record.serialize());
            }
        }

        buf.len() - start
    }

    /// Total encoded size of `msg` under this configuration.
    pub fn encoded_size(&self, msg: &Message) -> usize {
        let base = 1 + 8;
        let body = match &msg.body {
            MessageBody::InitDone
            | MessageBody::Prepare
            | MessageBody::LogWriteResponse
            | MessageBody::LogFlushed => 0,
            MessageBody::ClientQuery(body) => {
                let coordinated = if self.config.cc.is_coordinated() { 8 } else { 0 };
                8 + coordinated
                    + 8
                    + 4
                    + 8 * body.partitions.len()
                    + 4
                    + Request::WIRE_SIZE * body.requests.len()
            }
            MessageBody::RemoteQuery(body) => {
                let ts = if self.config.cc.carries_timestamp() { 8 } else { 0 };
                let start_ts = if self.config.cc.carries_start_timestamp() {
                    8
                } else {
                    0
                };
                ts + start_ts + 4 + Request::WIRE_SIZE * body.requests.len()
            }
            MessageBody::QueryResponse(_) => 1,
            MessageBody::Finish(_) => 8 + 1 + 1,
            MessageBody::Ack(_) => 1,
            MessageBody::Forward | MessageBody::Done => 8,
            MessageBody::ClientResponse(_) => 8,
            MessageBody::LogWrite(body) => body.record.encoded_size(),
        };
        base + body
    }

    /// Decode one message from the front of `buf`, returning it and the
    /// number of bytes consumed.
    pub fn decode(&self, buf: &[u8]) -> (Message, usize) {
        let mut reader = ByteReader::new(buf);

        let tag = reader.read_u8();
        let kind = match MessageKind::from_u8(tag) {
            Some(kind) => kind,
            None => ProtocolViolation::UnknownDiscriminant { tag }.raise(),
        };
        let txn_id = reader.read_u64();
        let mut batch_id = UNSET_BATCH_ID;

        let body = match kind {
            MessageKind::InitDone => MessageBody::InitDone,
            MessageKind::Prepare => MessageBody::Prepare,
            MessageKind::LogWriteResponse => MessageBody::LogWriteResponse,
            MessageKind::LogFlushed => MessageBody::LogFlushed,
            MessageKind::ClientQuery | MessageKind::RemoteTxn => {
                let ts = reader.read_u64();
                if self.config.cc.is_coordinated() {
                    batch_id = reader.read_u64();
                }
                let client_start_ts = reader.read_u64();
                let partitions = decode_partitions(&mut reader);
                let requests = decode_requests(&mut reader);
                MessageBody::ClientQuery(ClientQueryBody {
                    ts,
                    client_start_ts,
                    partitions,
                    requests,
                })
            }
            MessageKind::RemoteQuery => {
                let ts = if self.config.cc.carries_timestamp() {
                    reader.read_u64()
                } else {
                    0
                };
                let start_ts = if self.config.cc.carries_start_timestamp() {
                    reader.read_u64()
                } else {
                    0
                };
                let requests = decode_requests(&mut reader);
                MessageBody::RemoteQuery(RemoteQueryBody {
                    ts,
                    start_ts,
                    requests,
                })
            }
            MessageKind::RemoteQueryResponse => MessageBody::QueryResponse(QueryResponseBody {
                rc: decode_rc(&mut reader),
            }),
            MessageKind::RemoteFinish => {
                let pid = reader.read_u64();
                let rc = decode_rc(&mut reader);
                let read_only = reader.read_bool();
                MessageBody::Finish(FinishBody {
                    pid,
                    rc,
                    read_only,
                })
            }
            MessageKind::PrepareAck | MessageKind::FinishAck => MessageBody::Ack(AckBody {
                rc: decode_rc(&mut reader),
            }),
            MessageKind::Forward => {
                batch_id = reader.read_u64();
                MessageBody::Forward
            }
            MessageKind::Done => {
                batch_id = reader.read_u64();
                MessageBody::Done
            }
            MessageKind::ClientResponse => MessageBody::ClientResponse(ClientResponseBody {
                client_start_ts: reader.read_u64(),
            }),
            MessageKind::LogWrite => {
                let (record, consumed) = match LogRecord::deserialize(reader.rest()) {
                    Ok(decoded) => decoded,
                    Err(err) => ProtocolViolation::CorruptLogRecord {
                        detail: err.to_string(),
                    }
                    .raise(),
                };
                reader.advance(consumed);
                MessageBody::LogWrite(LogWriteBody { record })
            }
        };

        let consumed = reader.position();
        (
            Message {
                kind,
                txn_id,
                batch_id,
                return_node_id: 0,
                dest_node_id: 0,
                body,
            },
            consumed,
        )
    }
}

fn encode_partitions(buf: &mut Vec<u8>, partitions: &[u64]) {
    buf.extend_from_slice(&(partitions.len() as u32).to_le_bytes());
    for partition in partitions {
        buf.extend_from_slice(&partition.to_le_bytes());
    }
}

fn decode_partitions(reader: &mut ByteReader<'_>) -> Vec<u64> {
    let count = reader.read_u32() as usize;
    // Reject the stated count before allocating for it.
    reader.require(count * 8);
    let mut partitions = Vec::with_capacity(count);
    for _ in 0..count {
        partitions.push(reader.read_u64());
    }
    partitions
}

fn encode_requests(buf: &mut Vec<u8>, requests: &[Request]) {
    buf.extend_from_slice(&(requests.len() as u32).to_le_bytes());
    for request in requests {
        buf.push(request.access.as_u8());
        buf.extend_from_slice(&request.key.to_le_bytes());
        buf.extend_from_slice(&request.value.to_le_bytes());
    }
}

fn decode_requests(reader: &mut ByteReader<'_>) -> Vec<Request> {
    let count = reader.read_u32() as usize;
    reader.require(count * Request::WIRE_SIZE);
    let mut requests = Vec::with_capacity(count);
    for _ in 0..count {
        let access_byte = reader.read_u8();
        let access = match AccessType::from_u8(access_byte) {
            Some(access) => access,
            None => ProtocolViolation::InvalidFieldValue {
                field: "access",
                value: access_byte as u64,
            }
            .raise(),
        };
        let key = reader.read_u64();
        let value = reader.read_u64();
        requests.push(Request { access, key, value });
    }
    requests
}

fn decode_rc(reader: &mut ByteReader<'_>) -> ReturnCode {
    let byte = reader.read_u8();
    match ReturnCode::from_u8(byte) {
        Some(rc) => rc,
        None => ProtocolViolation::InvalidFieldValue {
            field: "rc",
            value: byte as u64,
        }
        .raise(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CcAlgorithm, WorkloadKind};
    use crate::txn::{ClientQuery, TxnHandle};

    fn maat_codec() -> Codec {
        Codec::new(ProtocolConfig::default())
    }

    fn roundtrip(codec: &Codec, msg: &Message) -> Message {
        let mut buf = Vec::new();
        let written = codec.encode(msg, &mut buf);
        assert_eq!(written, buf.len());
        assert_eq!(written, codec.encoded_size(msg));
        let (decoded, consumed) = codec.decode(&buf);
        assert_eq!(consumed, written);
        decoded
    }

    #[test]
    fn test_empty_variants_roundtrip() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        for kind in [
            MessageKind::InitDone,
            MessageKind::Prepare,
            MessageKind::LogWriteResponse,
            MessageKind::LogFlushed,
        ] {
            let mut msg = Message::create(kind, &config);
            msg.txn_id = 21;
            let decoded = roundtrip(&codec, &msg);
            assert_eq!(decoded.kind, kind);
            assert_eq!(decoded.txn_id, 21);
            assert_eq!(decoded.body, msg.body);
        }
    }

    #[test]
    fn test_client_query_roundtrip() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        let mut txn = TxnHandle::new(5, 100);
        txn.set_query(ClientQuery::new(
            vec![2, 5],
            vec![Request::read(1), Request::write(2, 9), Request::read(3)],
        ));
        let msg = Message::from_txn(&txn, MessageKind::ClientQuery, &config);

        let decoded = roundtrip(&codec, &msg);
        assert_eq!(decoded.body, msg.body);
        assert_eq!(decoded.txn_id, 5);
    }

    #[test]
    fn test_remote_query_conditional_timestamp() {
        // Timestamp-family layout carries ts, OCC layout carries
        // start_ts; the two encodings differ under the same message.
        let config_maat = ProtocolConfig::default();
        let config_occ = ProtocolConfig {
            cc: CcAlgorithm::Occ,
            workload: WorkloadKind::Ycsb,
        };

        let mut msg = Message::create(MessageKind::RemoteQuery, &config_maat);
        msg.txn_id = 1;
        if let MessageBody::RemoteQuery(body) = &mut msg.body {
            body.ts = 42;
            body.start_ts = 77;
            body.requests = vec![Request::read(8)];
        }

        let maat = Codec::new(config_maat);
        let occ = Codec::new(config_occ);

        let decoded_maat = roundtrip(&maat, &msg);
        if let MessageBody::RemoteQuery(body) = decoded_maat.body {
            assert_eq!(body.ts, 42);
            assert_eq!(body.start_ts, 0); // not on the wire for maat
        } else {
            panic!("wrong body");
        }

        let decoded_occ = roundtrip(&occ, &msg);
        if let MessageBody::RemoteQuery(body) = decoded_occ.body {
            assert_eq!(body.ts, 0); // not on the wire for occ
            assert_eq!(body.start_ts, 77);
        } else {
            panic!("wrong body");
        }
    }

    #[test]
    fn test_calvin_layout_carries_batch_id() {
        let config = ProtocolConfig {
            cc: CcAlgorithm::Calvin,
            workload: WorkloadKind::Ycsb,
        };
        let codec = Codec::new(config);
        let mut msg = Message::from_query(
            &ClientQuery::new(vec![1], vec![Request::read(4)]),
            MessageKind::RemoteTxn,
            &config,
        );
        msg.txn_id = 3;
        msg.batch_id = 12;

        let decoded = roundtrip(&codec, &msg);
        assert_eq!(decoded.batch_id, 12);
    }

    #[test]
    fn test_batch_id_not_on_wire_for_uncoordinated() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        let mut msg = Message::from_query(
            &ClientQuery::new(vec![1], vec![]),
            MessageKind::ClientQuery,
            &config,
        );
        msg.batch_id = 12;
        let decoded = roundtrip(&codec, &msg);
        assert_eq!(decoded.batch_id, UNSET_BATCH_ID);
    }

    #[test]
    fn test_finish_roundtrip() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        let mut msg = Message::create(MessageKind::RemoteFinish, &config);
        msg.txn_id = 9;
        msg.body = MessageBody::Finish(FinishBody {
            pid: 4,
            rc: ReturnCode::Commit,
            read_only: true,
        });
        let decoded = roundtrip(&codec, &msg);
        assert_eq!(decoded.body, msg.body);
    }

    #[test]
    fn test_forward_and_done_restore_batch_id() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        for kind in [MessageKind::Forward, MessageKind::Done] {
            let mut msg = Message::create(kind, &config);
            msg.txn_id = 2;
            msg.batch_id = 31;
            let decoded = roundtrip(&codec, &msg);
            assert_eq!(decoded.batch_id, 31);
        }
    }

    #[test]
    fn test_log_write_roundtrip() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        let record = LogRecord::update(6, 44, 1, 900, vec![1, 2, 3]);
        let msg = Message::from_record(record.clone(), &config);
        let decoded = roundtrip(&codec, &msg);
        assert_eq!(
            decoded.body,
            MessageBody::LogWrite(LogWriteBody { record })
        );
        assert_eq!(decoded.txn_id, 44);
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_UNKNOWN_KIND")]
    fn test_unknown_discriminant_is_fatal() {
        let codec = maat_codec();
        let mut buf = vec![99u8];
        buf.extend_from_slice(&0u64.to_le_bytes());
        codec.decode(&buf);
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_TRUNCATED")]
    fn test_truncated_prefix_is_fatal() {
        let codec = maat_codec();
        codec.decode(&[MessageKind::Prepare.as_u8(), 0, 0]);
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_TRUNCATED")]
    fn test_request_count_past_buffer_is_fatal() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        let msg = Message::from_query(
            &ClientQuery::new(vec![], vec![Request::read(1)]),
            MessageKind::ClientQuery,
            &config,
        );
        let mut buf = Vec::new();
        codec.encode(&msg, &mut buf);

        // Inflate the request count without supplying the bytes. The
        // count field sits right after ts and client_start_ts plus the
        // empty partitions list.
        let count_offset = 1 + 8 + 8 + 8 + 4;
        buf[count_offset..count_offset + 4].copy_from_slice(&1000u32.to_le_bytes());
        codec.decode(&buf);
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_BAD_FIELD")]
    fn test_invalid_rc_byte_is_fatal() {
        let codec = maat_codec();
        let mut buf = vec![MessageKind::PrepareAck.as_u8()];
        buf.extend_from_slice(&1u64.to_le_bytes());
        buf.push(200); // no such return code
        codec.decode(&buf);
    }

    #[test]
    #[should_panic(expected = "QDB_LOG_CORRUPTION")]
    fn test_corrupt_log_record_is_fatal() {
        let codec = maat_codec();
        let config = ProtocolConfig::default();
        let msg = Message::from_record(LogRecord::commit(1, 2), &config);
        let mut buf = Vec::new();
        codec.encode(&msg, &mut buf);
        let last = buf.len() - 1;
        buf[last] ^= 0xFF; // flip a checksum byte
        codec.decode(&buf);
    }
}
