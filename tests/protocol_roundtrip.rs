//! Protocol Round-Trip Tests
//!
//! For every message kind and every legal field combination under a
//! fixed configuration, decode(encode(m)) must reproduce every field
//! the variant defines. Truncation and unknown discriminants must be
//! rejected fatally, never returned as partial messages.

use quorumdb::config::{CcAlgorithm, ProtocolConfig, WorkloadKind};
use quorumdb::log::LogRecord;
use quorumdb::transport::{
    AckBody, ClientResponseBody, Codec, FinishBody, Message, MessageBody, MessageKind,
    QueryResponseBody,
};
use quorumdb::txn::{ClientQuery, Request, ReturnCode, TxnHandle};

fn config(cc: CcAlgorithm) -> ProtocolConfig {
    ProtocolConfig {
        cc,
        workload: WorkloadKind::Ycsb,
    }
}

fn all_cc() -> [CcAlgorithm; 6] {
    [
        CcAlgorithm::Maat,
        CcAlgorithm::Timestamp,
        CcAlgorithm::Mvcc,
        CcAlgorithm::WaitDie,
        CcAlgorithm::Occ,
        CcAlgorithm::Calvin,
    ]
}

/// A populated message of every kind under the given configuration.
fn sample_messages(config: &ProtocolConfig) -> Vec<Message> {
    let mut txn = TxnHandle::new(5, 100);
    txn.set_batch_id(3);
    txn.restore_client_start_ts(77);
    txn.set_query(ClientQuery::new(
        vec![2, 5],
        vec![Request::read(1), Request::write(2, 20)],
    ));
    txn.set_rc(ReturnCode::Commit);

    let mut messages = Vec::new();
    for kind in MessageKind::all() {
        let msg = match kind {
            MessageKind::LogWrite => Message::from_record(
                LogRecord::update(8, 5, 1, 2, vec![1, 2, 3, 4]),
                config,
            ),
            _ => Message::from_txn(&txn, kind, config),
        };
        messages.push(msg);
    }
    messages
}

// =============================================================================
// Round-trip across every kind and configuration
// =============================================================================

#[test]
fn test_every_kind_roundtrips_under_every_cc() {
    for cc in all_cc() {
        let config = config(cc);
        let codec = Codec::new(config);
        for msg in sample_messages(&config) {
            let mut buf = Vec::new();
            let written = codec.encode(&msg, &mut buf);
            assert_eq!(written, buf.len());
            assert_eq!(
                written,
                codec.encoded_size(&msg),
                "size mismatch for {:?} under {:?}",
                msg.kind,
                cc
            );

            let (decoded, consumed) = codec.decode(&buf);
            assert_eq!(consumed, written);
            assert_eq!(decoded.kind, msg.kind);
            assert_eq!(decoded.txn_id, msg.txn_id);
            assert_eq!(
                decoded.body, msg.body,
                "body mismatch for {:?} under {:?}",
                msg.kind, cc
            );
        }
    }
}

#[test]
fn test_encoding_is_deterministic() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);
    for msg in sample_messages(&config) {
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        codec.encode(&msg, &mut buf1);
        codec.encode(&msg, &mut buf2);
        assert_eq!(buf1, buf2);
    }
}

// =============================================================================
// Field scenarios
// =============================================================================

/// Encode a client query carrying 3 request records, partitions {2,5},
/// timestamp 100; decode must reproduce all of it.
#[test]
fn test_client_query_scenario() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);

    let mut txn = TxnHandle::new(9, 100);
    txn.set_query(ClientQuery::new(
        vec![2, 5],
        vec![Request::read(10), Request::write(11, 1), Request::read(12)],
    ));
    let msg = Message::from_txn(&txn, MessageKind::ClientQuery, &config);

    let mut buf = Vec::new();
    codec.encode(&msg, &mut buf);
    let (decoded, _) = codec.decode(&buf);

    match decoded.body {
        MessageBody::ClientQuery(body) => {
            assert_eq!(body.ts, 100);
            assert_eq!(body.partitions, vec![2, 5]);
            assert_eq!(body.requests.len(), 3);
            assert_eq!(body.requests[1], Request::write(11, 1));
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn test_rc_values_survive_the_wire() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);
    for rc in [
        ReturnCode::Ok,
        ReturnCode::Commit,
        ReturnCode::Abort,
        ReturnCode::Wait,
        ReturnCode::Error,
        ReturnCode::Finish,
    ] {
        let mut msg = Message::create(MessageKind::PrepareAck, &config);
        msg.txn_id = 1;
        msg.body = MessageBody::Ack(AckBody { rc });
        let mut buf = Vec::new();
        codec.encode(&msg, &mut buf);
        let (decoded, _) = codec.decode(&buf);
        assert_eq!(decoded.body, MessageBody::Ack(AckBody { rc }));
    }
}

#[test]
fn test_finish_flags_roundtrip() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);
    for read_only in [false, true] {
        let mut msg = Message::create(MessageKind::RemoteFinish, &config);
        msg.txn_id = 2;
        msg.body = MessageBody::Finish(FinishBody {
            pid: 6,
            rc: ReturnCode::Abort,
            read_only,
        });
        let mut buf = Vec::new();
        codec.encode(&msg, &mut buf);
        let (decoded, _) = codec.decode(&buf);
        assert_eq!(decoded.body, msg.body);
    }
}

#[test]
fn test_query_response_and_client_response() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);

    let mut response = Message::create(MessageKind::RemoteQueryResponse, &config);
    response.txn_id = 3;
    response.body = MessageBody::QueryResponse(QueryResponseBody {
        rc: ReturnCode::Abort,
    });
    let mut buf = Vec::new();
    codec.encode(&response, &mut buf);
    assert_eq!(codec.decode(&buf).0.body, response.body);

    let mut client = Message::create(MessageKind::ClientResponse, &config);
    client.txn_id = 3;
    client.body = MessageBody::ClientResponse(ClientResponseBody {
        client_start_ts: 1234,
    });
    buf.clear();
    codec.encode(&client, &mut buf);
    assert_eq!(codec.decode(&buf).0.body, client.body);
}

#[test]
fn test_log_write_record_integrity() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);
    let record = LogRecord::update(21, 42, 3, 1000, vec![0xAB; 32]);
    let msg = Message::from_record(record.clone(), &config);

    let mut buf = Vec::new();
    codec.encode(&msg, &mut buf);
    let (decoded, _) = codec.decode(&buf);
    match decoded.body {
        MessageBody::LogWrite(body) => assert_eq!(body.record, record),
        other => panic!("unexpected body {:?}", other),
    }
}

// =============================================================================
// Fatal rejection paths
// =============================================================================

#[test]
fn test_truncation_of_every_variant_is_fatal() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);
    for msg in sample_messages(&config) {
        let mut buf = Vec::new();
        codec.encode(&msg, &mut buf);
        // Dropping the final byte lands the cut in each variant's own
        // suffix where one exists, and inside the common prefix for
        // the empty-suffix variants.
        let cut = buf.len() - 1;
        let truncated = buf[..cut].to_vec();
        let result = std::panic::catch_unwind(|| codec.decode(&truncated));
        assert!(
            result.is_err(),
            "truncated decode of {:?} did not fail",
            msg.kind
        );
    }
}

#[test]
#[should_panic(expected = "QDB_PROTO_UNKNOWN_KIND")]
fn test_unknown_discriminant_is_fatal() {
    let codec = Codec::new(ProtocolConfig::default());
    let mut buf = vec![200u8];
    buf.extend_from_slice(&7u64.to_le_bytes());
    codec.decode(&buf);
}

#[test]
#[should_panic(expected = "QDB_PROTO_TRUNCATED")]
fn test_partition_count_past_buffer_is_fatal() {
    let config = ProtocolConfig::default();
    let codec = Codec::new(config);
    let msg = Message::from_query(
        &ClientQuery::new(vec![1], vec![]),
        MessageKind::ClientQuery,
        &config,
    );
    let mut buf = Vec::new();
    codec.encode(&msg, &mut buf);
    // Partition count field follows the prefix, ts, and client start.
    let offset = 1 + 8 + 8 + 8;
    buf[offset..offset + 4].copy_from_slice(&500u32.to_le_bytes());
    codec.decode(&buf);
}
