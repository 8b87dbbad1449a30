//! Session-scoped identifier generation for nodes and edges.

use crate::types::{EdgeId, NodeId};

/// Hands out short sequential ids (`n1`, `n2`, ... and `e1`, `e2`, ...).
///
/// Ids are unique for the lifetime of the generator only; there is no global
/// uniqueness or persistence guarantee. Callers that may already hold ids from
/// a loaded document should skip taken values with [`IdGenerator::next_node_id_where`].
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    nodes_issued: u64,
    edges_issued: u64,
}

impl IdGenerator {
    /// Creates a generator whose first ids are `n1` and `e1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next node id.
    pub fn next_node_id(&mut self) -> NodeId {
        self.nodes_issued += 1;
        format!("n{}", self.nodes_issued)
    }

    /// Returns the next edge id.
    pub fn next_edge_id(&mut self) -> EdgeId {
        self.edges_issued += 1;
        format!("e{}", self.edges_issued)
    }

    /// Returns the next node id for which `is_free` holds.
    pub fn next_node_id_where(&mut self, is_free: impl Fn(&str) -> bool) -> NodeId {
        loop {
            let id = self.next_node_id();
            if is_free(&id) {
                return id;
            }
        }
    }

    /// Returns the next edge id for which `is_free` holds.
    pub fn next_edge_id_where(&mut self, is_free: impl Fn(&str) -> bool) -> EdgeId {
        loop {
            let id = self.next_edge_id();
            if is_free(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_and_edge_sequences_are_independent() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_node_id(), "n1");
        assert_eq!(ids.next_node_id(), "n2");
        assert_eq!(ids.next_edge_id(), "e1");
        assert_eq!(ids.next_node_id(), "n3");
    }

    #[test]
    fn taken_ids_are_skipped() {
        let mut ids = IdGenerator::new();
        let taken = ["n1", "n2"];
        assert_eq!(ids.next_node_id_where(|id| !taken.contains(&id)), "n3");
        assert_eq!(ids.next_edge_id_where(|id| id != "e1"), "e2");
    }
}
