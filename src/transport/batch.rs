//! Batch framer: one transport payload, many messages
//!
//! Messages bound for the same node travel together. The frame is a
//! fixed header (destination, source, count) followed by each message's
//! encoding back to back. The header is authoritative for provenance:
//! every unpacked message gets its return node id overridden with the
//! batch's declared source.

use crate::config::ClusterConfig;
use crate::observability::NodeLogger;
use crate::transport::cursor::ByteReader;
use crate::transport::{Codec, Message, ProtocolViolation};

/// Encoded batch header: dest (u32), source (u32), count (u32).
const BATCH_HEADER_SIZE: usize = 4 + 4 + 4;

/// Packs and unpacks message batches for one node.
#[derive(Debug)]
pub struct BatchFramer {
    codec: Codec,
    local_node_id: u32,
    logger: NodeLogger,
}

impl BatchFramer {
    /// Build a framer for `local_node_id` using `codec`'s layout.
    pub fn new(codec: Codec, local_node_id: u32) -> Self {
        Self {
            codec,
            local_node_id,
            logger: NodeLogger::for_node(local_node_id),
        }
    }

    /// Build a framer for the configured local node.
    pub fn for_cluster(codec: Codec, cluster: &ClusterConfig) -> Self {
        Self::new(codec, cluster.node_id)
    }

    /// The codec this framer encodes with.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Frame `messages` for transport to `dest`, stamped with source
    /// `src`.
    pub fn pack(&self, messages: &[Message], dest: u32, src: u32) -> Vec<u8> {
        let payload: usize = messages.iter().map(|m| self.codec.encoded_size(m)).sum();
        let mut buf = Vec::with_capacity(BATCH_HEADER_SIZE + payload);

        buf.extend_from_slice(&dest.to_le_bytes());
        buf.extend_from_slice(&src.to_le_bytes());
        buf.extend_from_slice(&(messages.len() as u32).to_le_bytes());

        for message in messages {
            self.codec.encode(message, &mut buf);
        }
        buf
    }

    /// Split a received frame back into messages.
    ///
    /// Fatal if the frame is addressed to another node or runs out of
    /// bytes before the declared count is consumed. Each message's
    /// return node id is forced to the header's source and its
    /// destination to the header's destination.
    pub fn unpack(&self, buf: &[u8]) -> Vec<Message> {
        let mut reader = ByteReader::new(buf);
        reader.require(BATCH_HEADER_SIZE);
        let dest = reader.read_u32();
        let src = reader.read_u32();
        let count = reader.read_u32();

        if dest != self.local_node_id {
            ProtocolViolation::DestinationMismatch {
                dest,
                local: self.local_node_id,
            }
            .raise_logged(&self.logger);
        }

        let mut messages = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (mut message, consumed) = self.codec.decode(reader.rest());
            reader.advance(consumed);
            message.return_node_id = src;
            message.dest_node_id = dest;
            messages.push(message);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use crate::transport::MessageKind;
    use crate::txn::{ClientQuery, Request};

    fn framer(local: u32) -> BatchFramer {
        BatchFramer::new(Codec::new(ProtocolConfig::default()), local)
    }

    fn sample_messages() -> Vec<Message> {
        let config = ProtocolConfig::default();
        let mut q = Message::from_query(
            &ClientQuery::new(vec![0], vec![Request::write(3, 8)]),
            MessageKind::RemoteTxn,
            &config,
        );
        q.txn_id = 1;
        let mut p = Message::create(MessageKind::Prepare, &config);
        p.txn_id = 2;
        let mut a = Message::create(MessageKind::FinishAck, &config);
        a.txn_id = 3;
        vec![q, p, a]
    }

    #[test]
    fn test_pack_unpack_preserves_order_and_payloads() {
        let framer = framer(4);
        let messages = sample_messages();
        let buf = framer.pack(&messages, 4, 7);
        let unpacked = framer.unpack(&buf);

        assert_eq!(unpacked.len(), 3);
        for (original, decoded) in messages.iter().zip(&unpacked) {
            assert_eq!(decoded.kind, original.kind);
            assert_eq!(decoded.txn_id, original.txn_id);
            assert_eq!(decoded.body, original.body);
        }
    }

    #[test]
    fn test_unpack_overrides_provenance_from_header() {
        let framer = framer(4);
        let mut messages = sample_messages();
        // Whatever the messages claim, the header wins.
        for message in &mut messages {
            message.return_node_id = 99;
        }
        let buf = framer.pack(&messages, 4, 7);
        for message in framer.unpack(&buf) {
            assert_eq!(message.return_node_id, 7);
            assert_eq!(message.dest_node_id, 4);
        }
    }

    #[test]
    fn test_empty_batch() {
        let framer = framer(0);
        let buf = framer.pack(&[], 0, 2);
        assert_eq!(buf.len(), BATCH_HEADER_SIZE);
        assert!(framer.unpack(&buf).is_empty());
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_DEST_MISMATCH")]
    fn test_misrouted_batch_is_fatal() {
        let sender = framer(1);
        let buf = sender.pack(&sample_messages(), 2, 1);
        let receiver = framer(5);
        receiver.unpack(&buf);
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_TRUNCATED")]
    fn test_count_exceeding_payload_is_fatal() {
        let framer = framer(4);
        let mut buf = framer.pack(&sample_messages(), 4, 7);
        // Claim one more message than the frame carries.
        buf[8..12].copy_from_slice(&4u32.to_le_bytes());
        framer.unpack(&buf);
    }

    #[test]
    #[should_panic(expected = "QDB_PROTO_TRUNCATED")]
    fn test_header_shorter_than_fixed_size_is_fatal() {
        let framer = framer(4);
        framer.unpack(&[0, 0, 0]);
    }
}
