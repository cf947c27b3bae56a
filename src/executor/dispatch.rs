//! Message dispatch
//!
//! The body of a worker thread's receive loop: take one decoded
//! message, route it, and emit any replies through the outbound queue.
//! Query messages run against the local partition under the row
//! controller; every admission is paired with a commit or a release
//! before the reply leaves, so no transaction strands intent in a
//! row's uncommitted sets.
//!
//! Thread spawning and the surrounding loop live outside the core; the
//! dispatcher itself is shared-state safe and called from any worker.

use std::sync::{Arc, Mutex};

use crate::config::ProtocolConfig;
use crate::executor::{FlightControl, MessageQueue, StartupBarrier};
use crate::log::LogRecord;
use crate::observability::{Counter, MetricsRegistry, NodeLogger};
use crate::storage::{Partition, Row};
use crate::transport::{Message, MessageBody, MessageKind};
use crate::txn::{AccessType, ReturnCode, TxnHandle};

/// Routes decoded messages for one node.
pub struct Dispatcher {
    config: ProtocolConfig,
    node_id: u32,
    partition: Arc<Partition>,
    outbound: Arc<dyn MessageQueue>,
    barrier: Arc<StartupBarrier>,
    flight: Arc<FlightControl>,
    metrics: Arc<MetricsRegistry>,
    logger: NodeLogger,
    applied_log: Mutex<Vec<LogRecord>>,
}

impl Dispatcher {
    /// Wire up a dispatcher for `node_id`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ProtocolConfig,
        node_id: u32,
        partition: Arc<Partition>,
        outbound: Arc<dyn MessageQueue>,
        barrier: Arc<StartupBarrier>,
        flight: Arc<FlightControl>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            config,
            node_id,
            partition,
            outbound,
            barrier,
            flight,
            metrics,
            logger: NodeLogger::for_node(node_id),
            applied_log: Mutex::new(Vec::new()),
        }
    }

    /// Consume one message and route it.
    ///
    /// Returns the outcome of the work the message triggered:
    /// `Commit`/`Abort` for executed queries, `Ok` for control and
    /// bookkeeping traffic.
    pub fn dispatch(&self, msg: Message) -> ReturnCode {
        match msg.kind {
            MessageKind::InitDone => {
                if self.barrier.observe_init_done() {
                    self.logger.info("CLUSTER_READY", &[]);
                }
                ReturnCode::Ok
            }
            MessageKind::ClientQuery | MessageKind::RemoteTxn => {
                self.execute_query(&msg, MessageKind::ClientResponse)
            }
            MessageKind::RemoteQuery => {
                self.execute_query(&msg, MessageKind::RemoteQueryResponse)
            }
            MessageKind::Prepare => {
                let mut txn = TxnHandle::new(msg.txn_id, 0);
                txn.set_rc(ReturnCode::Ok);
                self.reply(&txn, MessageKind::PrepareAck, msg.return_node_id);
                ReturnCode::Ok
            }
            MessageKind::RemoteFinish => {
                // The commit/abort decision was already applied row by
                // row; the ack just echoes it to the coordinator.
                let decision = match &msg.body {
                    MessageBody::Finish(body) => body.rc,
                    _ => ReturnCode::Ok,
                };
                let mut txn = TxnHandle::new(msg.txn_id, 0);
                txn.set_rc(decision);
                self.reply(&txn, MessageKind::FinishAck, msg.return_node_id);
                ReturnCode::Ok
            }
            MessageKind::LogWrite => {
                if let MessageBody::LogWrite(body) = msg.body {
                    self.append_log_record(body.record);
                }
                let txn = TxnHandle::new(msg.txn_id, 0);
                self.reply(&txn, MessageKind::LogWriteResponse, msg.return_node_id);
                ReturnCode::Ok
            }
            MessageKind::ClientResponse => {
                // Client receive path: the reply releases its inflight
                // slot against the responding server.
                if msg.return_node_id < self.flight.server_count() {
                    self.flight.dec_inflight(msg.return_node_id);
                }
                ReturnCode::Ok
            }
            MessageKind::RemoteQueryResponse
            | MessageKind::PrepareAck
            | MessageKind::FinishAck
            | MessageKind::LogWriteResponse
            | MessageKind::LogFlushed
            | MessageKind::Forward
            | MessageKind::Done => {
                self.logger.trace(
                    "MSG_OBSERVED",
                    &[("kind", msg.kind.name())],
                );
                ReturnCode::Ok
            }
        }
    }

    /// Run a query message against the local partition and reply.
    fn execute_query(&self, msg: &Message, reply_kind: MessageKind) -> ReturnCode {
        let mut txn = TxnHandle::unassigned();
        msg.copy_to_txn(&mut txn, &self.config);

        let requests = match txn.query() {
            Some(query) => query.requests.clone(),
            None => Vec::new(),
        };

        // Admission phase: record intent on every row, remembering the
        // pending value for writes.
        let mut accessed: Vec<(&Row, Option<u64>)> = Vec::with_capacity(requests.len());
        for request in &requests {
            let row = match self.partition.get(request.key) {
                Some(row) => row,
                None => {
                    let key = request.key.to_string();
                    self.logger
                        .warn("ROW_NOT_FOUND", &[("key", key.as_str())]);
                    for (row, _) in &accessed {
                        row.release(&txn);
                        self.metrics.inc(Counter::TxnReleases);
                    }
                    txn.set_rc(ReturnCode::Error);
                    self.reply(&txn, reply_kind, msg.return_node_id);
                    return ReturnCode::Error;
                }
            };
            match request.access {
                AccessType::Read => {
                    row.read(&txn);
                    self.metrics.inc(Counter::RowReads);
                    accessed.push((row, None));
                }
                AccessType::Write => {
                    row.prewrite(&txn);
                    self.metrics.inc(Counter::RowPrewrites);
                    accessed.push((row, Some(request.value)));
                }
            }
        }

        // Commit phase: validate row by row. The first conflict aborts
        // the transaction and releases everything still pending;
        // cross-row atomicity beyond that belongs to the commit
        // coordination above this layer.
        let mut rc = ReturnCode::Commit;
        for (index, (row, pending)) in accessed.iter().enumerate() {
            if row.commit(&txn, *pending) == ReturnCode::Abort {
                for (pending_row, _) in &accessed[index..] {
                    pending_row.release(&txn);
                    self.metrics.inc(Counter::TxnReleases);
                }
                rc = ReturnCode::Abort;
                break;
            }
        }

        match rc {
            ReturnCode::Commit => self.metrics.inc(Counter::TxnCommits),
            _ => self.metrics.inc(Counter::TxnAborts),
        }

        txn.set_rc(rc);
        self.reply(&txn, reply_kind, msg.return_node_id);
        rc
    }

    /// Build and enqueue a reply to `dest`.
    fn reply(&self, txn: &TxnHandle, kind: MessageKind, dest: u32) {
        let mut reply = Message::from_txn(txn, kind, &self.config);
        reply.return_node_id = self.node_id;
        reply.dest_node_id = dest;
        self.outbound.enqueue(reply, dest);
        self.metrics.inc(Counter::RepliesSent);
    }

    fn append_log_record(&self, record: LogRecord) {
        self.applied_log
            .lock()
            .expect("applied log poisoned")
            .push(record);
        self.metrics.inc(Counter::LogRecordsAppended);
    }

    /// Records shipped to this node, in arrival order.
    pub fn applied_log(&self) -> Vec<LogRecord> {
        self.applied_log
            .lock()
            .expect("applied log poisoned")
            .clone()
    }
}
