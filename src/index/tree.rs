use std::mem;

use crate::db_debug;
use crate::debugger::DebugLevel;
use crate::index::node::{Key, Node, NodeId, NodeKind};
use crate::storage::Address;

/// Per-entry child pointer width in the simulated node layout.
const POINTER_SIZE: usize = 8;
/// Width of one key.
const KEY_SIZE: usize = 4;
/// Per-node boolean flag width (leaf marker, root marker).
const FLAG_SIZE: usize = 1;

/// Result of an index lookup: the matching record addresses plus how
/// many tree nodes the walk touched.
#[derive(Debug, Default)]
pub struct Lookup {
    pub addresses: Vec<Address>,
    pub nodes_accessed: usize,
}

/// Order-preserving secondary index over (key, record address) pairs.
///
/// Nodes live in an arena vector and refer to one another by handle;
/// freed slots are recycled through a free list. Duplicate keys share
/// one leaf entry holding every address filed under the key.
pub struct BPlusTree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    num_levels: usize,
    num_nodes: usize,
    max_keys: usize,
    min_internal_keys: usize,
    min_leaf_keys: usize,
}

impl BPlusTree {
    /// Derives node fan-out from the block size: a node must fit its
    /// keys, its child pointers, a sibling pointer, and two flags.
    pub fn new(block_size: usize) -> Self {
        let max_keys = block_size
            .checked_sub(2 * POINTER_SIZE + 2 * FLAG_SIZE)
            .map_or(0, |payload| payload / (POINTER_SIZE + KEY_SIZE));
        assert!(max_keys >= 2, "block size {} too small for a node", block_size);
        BPlusTree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            num_levels: 0,
            num_nodes: 0,
            max_keys,
            min_internal_keys: max_keys / 2,
            min_leaf_keys: (max_keys + 1) / 2,
        }
    }

    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    pub fn min_internal_keys(&self) -> usize {
        self.min_internal_keys
    }

    pub fn min_leaf_keys(&self) -> usize {
        self.min_leaf_keys
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    pub fn is_empty(&self) -> bool {
        match self.root {
            Some(root) => self.node(root).keys.is_empty(),
            None => true,
        }
    }

    pub fn root_keys(&self) -> Vec<Key> {
        match self.root {
            Some(root) => self.node(root).keys.clone(),
            None => Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.num_nodes += 1;
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.num_nodes -= 1;
        self.nodes[id.0] = Node::new_leaf();
        self.free.push(id);
    }

    /// Smallest key reachable under `id`.
    fn minimum_key(&self, id: NodeId) -> Key {
        let mut cur = id;
        loop {
            let node = self.node(cur);
            match &node.kind {
                NodeKind::Leaf(_) => return node.keys[0],
                NodeKind::Internal(internal) => cur = internal.children[0],
            }
        }
    }

    fn leftmost_leaf(&self) -> Option<NodeId> {
        let mut cur = self.root?;
        loop {
            match &self.node(cur).kind {
                NodeKind::Leaf(_) => return Some(cur),
                NodeKind::Internal(internal) => cur = internal.children[0],
            }
        }
    }

    /// Descends to the leaf that owns `key` for insertion: at each
    /// internal node, take the first child whose separator exceeds the
    /// key (ties go right).
    fn search_leaf(&self, key: Key) -> Option<NodeId> {
        let mut cur = self.root?;
        loop {
            let node = self.node(cur);
            match &node.kind {
                NodeKind::Leaf(_) => return Some(cur),
                NodeKind::Internal(internal) => {
                    let i = node.keys.partition_point(|k| *k <= key);
                    cur = internal.children[i];
                }
            }
        }
    }

    /// Descent for range scans: stop left of any separator >= `low` so
    /// the walk starts no later than the first qualifying key. Counts
    /// every node touched.
    fn search_leaf_low(&self, low: Key, accessed: &mut usize) -> Option<NodeId> {
        let mut cur = self.root?;
        loop {
            *accessed += 1;
            let node = self.node(cur);
            match &node.kind {
                NodeKind::Leaf(_) => return Some(cur),
                NodeKind::Internal(internal) => {
                    let i = node.keys.partition_point(|k| *k < low);
                    cur = internal.children[i];
                }
            }
        }
    }

    // ---- insertion ----

    pub fn insert(&mut self, key: Key, address: Address) {
        if self.root.is_none() {
            let mut node = Node::new_leaf();
            node.is_root = true;
            node.set_address(key, address);
            let id = self.alloc(node);
            self.root = Some(id);
            self.num_levels = 1;
            return;
        }
        let leaf_id = self
            .search_leaf(key)
            .unwrap_or_else(|| unreachable!("non-empty tree has a leaf"));
        let leaf = self.node(leaf_id);
        // An existing key gains an address without consuming a slot, so
        // it can never trigger a split.
        if leaf.keys.len() < self.max_keys || leaf.keys.binary_search(&key).is_ok() {
            self.node_mut(leaf_id).set_address(key, address);
        } else {
            self.split_leaf(leaf_id, key, address);
        }

        #[cfg(debug_assertions)]
        self.assert_invariants();
    }

    fn split_leaf(&mut self, leaf_id: NodeId, key: Key, address: Address) {
        let (mut keys, mut addresses, old_next, parent) = {
            let node = self.node_mut(leaf_id);
            let keys = mem::take(&mut node.keys);
            let parent = node.parent;
            let leaf = node.as_leaf_mut();
            (keys, mem::take(&mut leaf.addresses), leaf.next, parent)
        };

        let pos = keys.partition_point(|k| *k <= key);
        keys.insert(pos, key);
        addresses.insert(pos, vec![address]);

        let right_keys = keys.split_off(self.min_leaf_keys);
        let right_addresses = addresses.split_off(self.min_leaf_keys);

        let mut right = Node::new_leaf();
        right.keys = right_keys;
        right.parent = parent;
        {
            let leaf = right.as_leaf_mut();
            leaf.addresses = right_addresses;
            leaf.next = old_next;
        }
        let right_id = self.alloc(right);

        {
            let node = self.node_mut(leaf_id);
            node.keys = keys;
            let leaf = node.as_leaf_mut();
            leaf.addresses = addresses;
            leaf.next = Some(right_id);
        }
        db_debug!(
            DebugLevel::Debug,
            "index: split leaf {:?}, new sibling {:?}",
            leaf_id,
            right_id
        );

        match parent {
            None => self.promote_root(leaf_id, right_id),
            Some(parent_id) => {
                if self.node(parent_id).keys.len() < self.max_keys {
                    self.insert_child(parent_id, right_id);
                } else {
                    self.split_parent(parent_id, right_id);
                }
            }
        }
    }

    /// Raises a fresh internal root above `left` and `right`.
    fn promote_root(&mut self, left: NodeId, right: NodeId) {
        let separator = self.minimum_key(right);
        let mut root = Node::new_internal();
        root.is_root = true;
        root.keys.push(separator);
        root.as_internal_mut().children.extend([left, right]);
        let root_id = self.alloc(root);

        for child in [left, right] {
            let node = self.node_mut(child);
            node.is_root = false;
            node.parent = Some(root_id);
        }
        self.root = Some(root_id);
        self.num_levels += 1;
        db_debug!(
            DebugLevel::Info,
            "index: new root {:?}, height {}",
            root_id,
            self.num_levels
        );
    }

    /// Hooks `child` into a non-full internal node, keeping separators
    /// equal to each right-hand subtree's minimum.
    fn insert_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let child_min = self.minimum_key(child_id);
        let first_child_min = self
            .node(parent_id)
            .as_internal()
            .children
            .first()
            .map(|&c| self.minimum_key(c));

        let parent = self.node_mut(parent_id);
        let NodeKind::Internal(internal) = &mut parent.kind else {
            panic!("insert_child on leaf");
        };
        match first_child_min {
            None => internal.children.push(child_id),
            // New global minimum: child takes the front slot and the old
            // first child's minimum becomes the first separator.
            Some(m0) if child_min < m0 => {
                parent.keys.insert(0, m0);
                internal.children.insert(0, child_id);
            }
            Some(_) => {
                let i = parent.keys.partition_point(|k| *k <= child_min);
                parent.keys.insert(i, child_min);
                internal.children.insert(i + 1, child_id);
            }
        }
        self.node_mut(child_id).parent = Some(parent_id);
    }

    /// Hooks `child` in as the new first child and rebuilds separators.
    /// Used when an underflowing node borrows from its left sibling.
    fn insert_child_front(&mut self, parent_id: NodeId, child_id: NodeId) {
        self.node_mut(parent_id)
            .as_internal_mut()
            .children
            .insert(0, child_id);
        self.node_mut(child_id).parent = Some(parent_id);
        self.refresh_separators(parent_id);
    }

    /// Detaches `child` from `parent` and rebuilds the separators from
    /// the remaining children.
    fn delete_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let internal = self.node_mut(parent_id).as_internal_mut();
        let pos = internal
            .children
            .iter()
            .position(|&c| c == child_id)
            .unwrap_or_else(|| unreachable!("child not under parent"));
        internal.children.remove(pos);
        self.refresh_separators(parent_id);
    }

    /// Recomputes every separator as the minimum key of the subtree to
    /// its right. The children are the source of truth; separators are
    /// derived state.
    fn refresh_separators(&mut self, parent_id: NodeId) {
        let children = self.node(parent_id).as_internal().children.clone();
        let keys: Vec<Key> = children[1..].iter().map(|&c| self.minimum_key(c)).collect();
        self.node_mut(parent_id).keys = keys;
    }

    /// Splits a full internal node to admit one more child. The left
    /// node keeps `min_internal_keys + 2` children; the rest move to a
    /// new right sibling, which is then hooked into the grandparent.
    fn split_parent(&mut self, parent_id: NodeId, new_child_id: NodeId) {
        let (mut children, grandparent, was_root) = {
            let node = self.node_mut(parent_id);
            let grandparent = node.parent;
            let was_root = node.is_root;
            node.keys.clear();
            (
                mem::take(&mut node.as_internal_mut().children),
                grandparent,
                was_root,
            )
        };

        let new_min = self.minimum_key(new_child_id);
        let pos = children.partition_point(|&c| self.minimum_key(c) <= new_min);
        children.insert(pos, new_child_id);

        let right_children = children.split_off(self.min_internal_keys + 2);

        for &c in &children {
            self.node_mut(c).parent = Some(parent_id);
        }
        self.node_mut(parent_id).as_internal_mut().children = children;
        self.refresh_separators(parent_id);

        let right = Node::new_internal();
        let right_id = self.alloc(right);
        for &c in &right_children {
            self.node_mut(c).parent = Some(right_id);
        }
        self.node_mut(right_id).as_internal_mut().children = right_children;
        self.node_mut(right_id).parent = grandparent;
        self.refresh_separators(right_id);
        db_debug!(
            DebugLevel::Debug,
            "index: split internal {:?}, new sibling {:?}",
            parent_id,
            right_id
        );

        if was_root {
            self.promote_root(parent_id, right_id);
        } else {
            let gp = grandparent.unwrap_or_else(|| unreachable!("non-root node has a parent"));
            if self.node(gp).keys.len() < self.max_keys {
                self.insert_child(gp, right_id);
            } else {
                self.split_parent(gp, right_id);
            }
        }
    }

    // ---- lookup ----

    /// All addresses filed under exactly `key`.
    pub fn get(&self, key: Key) -> Lookup {
        self.range(key, key)
    }

    /// All addresses for keys in `[low, high]`, in key order. Walks the
    /// leaf chain from the first qualifying leaf.
    pub fn range(&self, low: Key, high: Key) -> Lookup {
        let mut out = Lookup::default();
        let Some(start) = self.search_leaf_low(low, &mut out.nodes_accessed) else {
            return out;
        };
        let mut cur = Some(start);
        'walk: while let Some(id) = cur {
            // The entry leaf was already counted by the descent.
            if id != start {
                out.nodes_accessed += 1;
            }
            let node = self.node(id);
            let leaf = node.as_leaf();
            for (i, &k) in node.keys.iter().enumerate() {
                if k < low {
                    continue;
                }
                if k > high {
                    break 'walk;
                }
                out.addresses.extend_from_slice(&leaf.addresses[i]);
            }
            cur = leaf.next;
        }
        out
    }

    /// Keys present in `[low, high]`, in order.
    pub fn keys_in_range(&self, low: Key, high: Key) -> Vec<Key> {
        let mut out = Vec::new();
        let mut accessed = 0;
        let mut cur = self.search_leaf_low(low, &mut accessed);
        'walk: while let Some(id) = cur {
            let node = self.node(id);
            for &k in &node.keys {
                if k < low {
                    continue;
                }
                if k > high {
                    break 'walk;
                }
                out.push(k);
            }
            cur = node.as_leaf().next;
        }
        out
    }

    // ---- deletion ----

    /// Removes every key in `[low, high]` and returns the addresses
    /// that were filed under them. The qualifying keys are collected up
    /// front via one chain walk; each is then deleted one at a time,
    /// with a rebalance pass after every deletion, so the tree is valid
    /// between steps.
    pub fn remove_range(&mut self, low: Key, high: Key) -> Vec<Address> {
        let keys = self.keys_in_range(low, high);
        let mut removed = Vec::new();
        for key in keys {
            let leaf_id = self
                .search_leaf(key)
                .unwrap_or_else(|| unreachable!("collected key has a leaf"));
            let i = self
                .node(leaf_id)
                .keys
                .binary_search(&key)
                .unwrap_or_else(|_| unreachable!("collected key present in its leaf"));
            removed.extend(self.node_mut(leaf_id).delete_entry_at(i));
            db_debug!(DebugLevel::Trace, "index: removed key {}", key);
            self.clean_leaf(leaf_id);

            #[cfg(debug_assertions)]
            self.assert_invariants();
        }
        removed
    }

    /// Restores the occupancy invariant on `leaf_id` after a removal,
    /// then propagates separator maintenance upward.
    fn clean_leaf(&mut self, leaf_id: NodeId) {
        // The root leaf has no minimum occupancy and no parent to
        // reconcile; a fully emptied tree stays a single empty root leaf.
        if self.node(leaf_id).is_root {
            return;
        }
        let parent_id = self
            .node(leaf_id)
            .parent
            .unwrap_or_else(|| unreachable!("non-root leaf has a parent"));

        while self.node(leaf_id).keys.len() < self.min_leaf_keys {
            let left = self.left_sibling(leaf_id);
            let right = self.right_sibling(leaf_id);
            if let Some(l) = left.filter(|&l| self.node(l).keys.len() > self.min_leaf_keys) {
                // Borrow the left sibling's last entry.
                let (k, a) = {
                    let node = self.node_mut(l);
                    let k = node.keys.pop().unwrap_or_else(|| unreachable!());
                    let a = node
                        .as_leaf_mut()
                        .addresses
                        .pop()
                        .unwrap_or_else(|| unreachable!());
                    (k, a)
                };
                let node = self.node_mut(leaf_id);
                node.keys.insert(0, k);
                node.as_leaf_mut().addresses.insert(0, a);
            } else if let Some(r) = right.filter(|&r| self.node(r).keys.len() > self.min_leaf_keys)
            {
                // Borrow the right sibling's first entry.
                let (k, a) = {
                    let node = self.node_mut(r);
                    let k = node.keys.remove(0);
                    let a = node.as_leaf_mut().addresses.remove(0);
                    (k, a)
                };
                let node = self.node_mut(leaf_id);
                node.keys.push(k);
                node.as_leaf_mut().addresses.push(a);
            } else {
                self.merge_leaf(leaf_id, parent_id);
                return;
            }
        }
        self.clean_parent(parent_id);
    }

    /// Folds an underflowing leaf into a sibling (left preferred) and
    /// detaches it from its parent.
    fn merge_leaf(&mut self, leaf_id: NodeId, parent_id: NodeId) {
        let (keys, addresses, next) = {
            let node = self.node_mut(leaf_id);
            let keys = mem::take(&mut node.keys);
            let leaf = node.as_leaf_mut();
            (keys, mem::take(&mut leaf.addresses), leaf.next)
        };

        if let Some(l) = self.left_sibling(leaf_id) {
            // The left sibling is also the chain predecessor.
            let node = self.node_mut(l);
            node.keys.extend(keys);
            let leaf = node.as_leaf_mut();
            leaf.addresses.extend(addresses);
            leaf.next = next;
        } else {
            let r = self
                .right_sibling(leaf_id)
                .unwrap_or_else(|| unreachable!("non-root leaf has a sibling"));
            {
                let node = self.node_mut(r);
                node.keys.splice(0..0, keys);
                node.as_leaf_mut().addresses.splice(0..0, addresses);
            }
            // The chain predecessor, if any, lives under another parent.
            if let Some(pred) = self.chain_predecessor(leaf_id) {
                self.node_mut(pred).as_leaf_mut().next = next;
            }
        }
        db_debug!(DebugLevel::Debug, "index: merged leaf {:?}", leaf_id);

        self.delete_child(parent_id, leaf_id);
        self.release(leaf_id);
        self.clean_parent(parent_id);
    }

    /// Restores the occupancy invariant on an internal node and recurses
    /// to the root, rebuilding separators along the way.
    fn clean_parent(&mut self, parent_id: NodeId) {
        if self.node(parent_id).is_root {
            if self.node(parent_id).as_internal().children.len() == 1 {
                // Height shrinks: the lone child becomes the root.
                let child = self.node(parent_id).as_internal().children[0];
                {
                    let node = self.node_mut(child);
                    node.is_root = true;
                    node.parent = None;
                }
                self.release(parent_id);
                self.root = Some(child);
                self.num_levels -= 1;
                db_debug!(
                    DebugLevel::Info,
                    "index: root collapsed to {:?}, height {}",
                    child,
                    self.num_levels
                );
            } else {
                self.refresh_separators(parent_id);
            }
            return;
        }
        let grandparent_id = self
            .node(parent_id)
            .parent
            .unwrap_or_else(|| unreachable!("non-root node has a parent"));

        while self.node(parent_id).keys.len() < self.min_internal_keys {
            let left = self.left_sibling(parent_id);
            let right = self.right_sibling(parent_id);
            if let Some(l) = left.filter(|&l| self.node(l).keys.len() > self.min_internal_keys) {
                // Adopt the left sibling's last child.
                let child = {
                    let node = self.node_mut(l);
                    node.keys.pop();
                    node.as_internal_mut()
                        .children
                        .pop()
                        .unwrap_or_else(|| unreachable!())
                };
                self.insert_child_front(parent_id, child);
            } else if let Some(r) =
                right.filter(|&r| self.node(r).keys.len() > self.min_internal_keys)
            {
                // Adopt the right sibling's first child.
                let child = self.node_mut(r).as_internal_mut().children.remove(0);
                self.refresh_separators(r);
                self.insert_child(parent_id, child);
            } else {
                self.merge_internal(parent_id, grandparent_id);
                return;
            }
        }
        self.refresh_separators(parent_id);
        self.clean_parent(grandparent_id);
    }

    /// Folds an underflowing internal node into a sibling (left
    /// preferred) and detaches it from the grandparent.
    fn merge_internal(&mut self, parent_id: NodeId, grandparent_id: NodeId) {
        let children = mem::take(&mut self.node_mut(parent_id).as_internal_mut().children);
        self.node_mut(parent_id).keys.clear();

        if let Some(l) = self.left_sibling(parent_id) {
            for &c in &children {
                self.node_mut(c).parent = Some(l);
            }
            self.node_mut(l).as_internal_mut().children.extend(children);
            self.refresh_separators(l);
        } else {
            let r = self
                .right_sibling(parent_id)
                .unwrap_or_else(|| unreachable!("non-root node has a sibling"));
            for &c in &children {
                self.node_mut(c).parent = Some(r);
            }
            self.node_mut(r)
                .as_internal_mut()
                .children
                .splice(0..0, children);
            self.refresh_separators(r);
        }
        db_debug!(DebugLevel::Debug, "index: merged internal {:?}", parent_id);

        self.delete_child(grandparent_id, parent_id);
        self.release(parent_id);
        self.clean_parent(grandparent_id);
    }

    /// Sibling immediately left of `id` under the same parent.
    fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let children = &self.node(parent).as_internal().children;
        let pos = children.iter().position(|&c| c == id)?;
        if pos > 0 { Some(children[pos - 1]) } else { None }
    }

    /// Sibling immediately right of `id` under the same parent.
    fn right_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let children = &self.node(parent).as_internal().children;
        let pos = children.iter().position(|&c| c == id)?;
        children.get(pos + 1).copied()
    }

    /// Leaf whose chain link points at `leaf_id`, found by walking the
    /// chain from the leftmost leaf. None when `leaf_id` is first.
    fn chain_predecessor(&self, leaf_id: NodeId) -> Option<NodeId> {
        let mut cur = self.leftmost_leaf()?;
        while cur != leaf_id {
            let next = self.node(cur).as_leaf().next?;
            if next == leaf_id {
                return Some(cur);
            }
            cur = next;
        }
        None
    }

    // ---- inspection ----

    /// Keys per node, level by level from the root. For reports and
    /// tests.
    pub fn dump_levels(&self) -> Vec<Vec<Vec<Key>>> {
        let mut levels = Vec::new();
        let Some(root) = self.root else {
            return levels;
        };
        let mut frontier = vec![root];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            let mut level = Vec::new();
            for &id in &frontier {
                let node = self.node(id);
                level.push(node.keys.clone());
                if let NodeKind::Internal(internal) = &node.kind {
                    next.extend_from_slice(&internal.children);
                }
            }
            levels.push(level);
            frontier = next;
        }
        levels
    }

    /// Every key in the tree, in order, via the leaf chain.
    pub fn leaf_keys(&self) -> Vec<Key> {
        let mut out = Vec::new();
        let mut cur = self.leftmost_leaf();
        while let Some(id) = cur {
            let node = self.node(id);
            out.extend_from_slice(&node.keys);
            cur = node.as_leaf().next;
        }
        out
    }

    /// Full structural check, wired into every mutation in debug builds.
    #[cfg(debug_assertions)]
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.num_nodes, 0, "empty tree reports live nodes");
            assert_eq!(self.num_levels, 0);
            return;
        };
        assert!(self.node(root).is_root);
        assert!(self.node(root).parent.is_none());

        let mut visited = 0;
        let mut leaves = Vec::new();
        self.check_node(root, None, 1, &mut visited, &mut leaves);
        assert_eq!(visited, self.num_nodes, "node count out of sync");

        // The leaf chain must visit exactly the leaves of the structure,
        // left to right, with globally sorted keys.
        let mut chained = Vec::new();
        let mut cur = self.leftmost_leaf();
        while let Some(id) = cur {
            chained.push(id);
            cur = self.node(id).as_leaf().next;
        }
        assert_eq!(chained, leaves, "leaf chain diverges from structure");
        let keys = self.leaf_keys();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys out of order");
    }

    #[cfg(debug_assertions)]
    fn check_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
        visited: &mut usize,
        leaves: &mut Vec<NodeId>,
    ) {
        *visited += 1;
        let node = self.node(id);
        assert_eq!(node.parent, parent, "bad parent link on {:?}", id);
        assert!(
            node.keys.windows(2).all(|w| w[0] < w[1]),
            "unsorted keys in {:?}",
            id
        );
        assert!(node.keys.len() <= self.max_keys, "overfull node {:?}", id);
        match &node.kind {
            NodeKind::Leaf(leaf) => {
                assert_eq!(depth, self.num_levels, "leaf {:?} at wrong depth", id);
                assert_eq!(leaf.addresses.len(), node.keys.len());
                assert!(leaf.addresses.iter().all(|a| !a.is_empty()));
                if !node.is_root {
                    assert!(
                        node.keys.len() >= self.min_leaf_keys,
                        "underfull leaf {:?}",
                        id
                    );
                }
                leaves.push(id);
            }
            NodeKind::Internal(internal) => {
                assert_eq!(internal.children.len(), node.keys.len() + 1);
                if !node.is_root {
                    // An internal split hands the right sibling
                    // max_keys - min_internal_keys - 1 keys, which sits
                    // one below min_internal_keys when the fan-out is
                    // even; rebalancing only ever raises it from there.
                    let floor = self.max_keys - self.min_internal_keys - 1;
                    assert!(node.keys.len() >= floor, "underfull internal {:?}", id);
                }
                for (i, &k) in node.keys.iter().enumerate() {
                    assert_eq!(
                        k,
                        self.minimum_key(internal.children[i + 1]),
                        "stale separator in {:?}",
                        id
                    );
                }
                for &c in &internal.children {
                    self.check_node(c, Some(id), depth + 1, visited, leaves);
                }
            }
        }
    }
}
