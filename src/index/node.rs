use crate::storage::Address;

/// Indexed key type. Vote counts in the sample dataset fit comfortably.
pub type Key = u64;

/// Arena handle; indexes into the tree's node vector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A tree node. Keys live here for both kinds; leaves additionally hold
/// one address set per key plus the chain link, internals hold child
/// handles (always `keys.len() + 1` of them).
#[derive(Debug)]
pub struct Node {
    pub keys: Vec<Key>,
    pub parent: Option<NodeId>,
    pub is_root: bool,
    pub kind: NodeKind,
}

#[derive(Debug)]
pub enum NodeKind {
    Leaf(LeafState),
    Internal(InternalState),
}

#[derive(Debug, Default)]
pub struct LeafState {
    /// Parallel to `keys`: all record addresses filed under each key.
    pub addresses: Vec<Vec<Address>>,
    /// Next leaf in key order.
    pub next: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct InternalState {
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new_leaf() -> Self {
        Node {
            keys: Vec::new(),
            parent: None,
            is_root: false,
            kind: NodeKind::Leaf(LeafState::default()),
        }
    }

    pub fn new_internal() -> Self {
        Node {
            keys: Vec::new(),
            parent: None,
            is_root: false,
            kind: NodeKind::Internal(InternalState::default()),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn as_leaf(&self) -> &LeafState {
        match &self.kind {
            NodeKind::Leaf(leaf) => leaf,
            NodeKind::Internal(_) => panic!("internal node treated as leaf"),
        }
    }

    pub fn as_leaf_mut(&mut self) -> &mut LeafState {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => leaf,
            NodeKind::Internal(_) => panic!("internal node treated as leaf"),
        }
    }

    pub fn as_internal(&self) -> &InternalState {
        match &self.kind {
            NodeKind::Internal(internal) => internal,
            NodeKind::Leaf(_) => panic!("leaf node treated as internal"),
        }
    }

    pub fn as_internal_mut(&mut self) -> &mut InternalState {
        match &mut self.kind {
            NodeKind::Internal(internal) => internal,
            NodeKind::Leaf(_) => panic!("leaf node treated as internal"),
        }
    }

    /// Files `address` under `key` in a leaf, creating a singleton entry
    /// when the key is new. Returns the index the key occupies.
    pub fn set_address(&mut self, key: Key, address: Address) -> usize {
        let NodeKind::Leaf(leaf) = &mut self.kind else {
            panic!("set_address on internal node");
        };
        match self.keys.binary_search(&key) {
            Ok(i) => {
                leaf.addresses[i].push(address);
                i
            }
            Err(i) => {
                self.keys.insert(i, key);
                leaf.addresses.insert(i, vec![address]);
                i
            }
        }
    }

    /// Drops the leaf entry at `i`, handing back its whole address set.
    pub fn delete_entry_at(&mut self, i: usize) -> Vec<Address> {
        let NodeKind::Leaf(leaf) = &mut self.kind else {
            panic!("delete_entry_at on internal node");
        };
        self.keys.remove(i);
        leaf.addresses.remove(i)
    }

}
