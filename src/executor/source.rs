//! Client query source boundary
//!
//! Workload generation (key distributions, query mixes) is an external
//! collaborator; the core consumes it through this narrow interface on
//! the client send path.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::txn::ClientQuery;

/// Supplies the next query a client thread should send.
pub trait QuerySource: Send + Sync {
    /// Next query bound for `partition`, drawn for `thread`; `None`
    /// when that partition's supply is exhausted.
    fn next_query(&self, partition: u64, thread: u64) -> Option<ClientQuery>;

    /// Whether every partition's supply is exhausted.
    fn done(&self) -> bool;
}

/// A pre-generated query list per partition, drained in order.
///
/// Stands in for a real workload generator in tests and the selfcheck
/// harness.
#[derive(Debug)]
pub struct FixedQuerySource {
    partitions: Vec<Mutex<VecDeque<ClientQuery>>>,
}

impl FixedQuerySource {
    /// A source over `queries[p]` for each partition `p`.
    pub fn new(queries: Vec<Vec<ClientQuery>>) -> Self {
        let partitions = queries
            .into_iter()
            .map(|qs| Mutex::new(qs.into()))
            .collect();
        Self { partitions }
    }
}

impl QuerySource for FixedQuerySource {
    fn next_query(&self, partition: u64, _thread: u64) -> Option<ClientQuery> {
        self.partitions
            .get(partition as usize)?
            .lock()
            .expect("query source poisoned")
            .pop_front()
    }

    fn done(&self) -> bool {
        self.partitions
            .iter()
            .all(|p| p.lock().expect("query source poisoned").is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::Request;

    #[test]
    fn test_drains_per_partition_in_order() {
        let q1 = ClientQuery::new(vec![0], vec![Request::read(1)]);
        let q2 = ClientQuery::new(vec![0], vec![Request::read(2)]);
        let q3 = ClientQuery::new(vec![1], vec![Request::read(3)]);
        let source = FixedQuerySource::new(vec![vec![q1.clone(), q2.clone()], vec![q3.clone()]]);

        assert!(!source.done());
        assert_eq!(source.next_query(0, 0), Some(q1));
        assert_eq!(source.next_query(1, 0), Some(q3));
        assert_eq!(source.next_query(0, 0), Some(q2));
        assert_eq!(source.next_query(0, 0), None);
        assert!(source.done());
    }

    #[test]
    fn test_unknown_partition_yields_none() {
        let source = FixedQuerySource::new(vec![Vec::new()]);
        assert!(source.next_query(5, 0).is_none());
        assert!(source.done());
    }
}
