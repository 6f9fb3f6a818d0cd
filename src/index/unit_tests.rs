#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;

    use crate::index::tree::BPlusTree;
    use crate::storage::Address;

    fn addr(n: u64) -> Address {
        Address::new(n as u32, 0)
    }

    /// Smallest block size that yields the wanted fan-out.
    fn block_for(max_keys: usize) -> usize {
        2 * 8 + 2 * 1 + max_keys * (8 + 4)
    }

    #[test]
    fn capacity_derivation() {
        let tree = BPlusTree::new(200);
        assert_eq!(tree.max_keys(), 15);
        assert_eq!(tree.min_internal_keys(), 7);
        assert_eq!(tree.min_leaf_keys(), 8);

        let tree = BPlusTree::new(block_for(3));
        assert_eq!(tree.max_keys(), 3);
        assert_eq!(tree.min_internal_keys(), 1);
        assert_eq!(tree.min_leaf_keys(), 2);
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn rejects_tiny_block_sizes() {
        BPlusTree::new(10);
    }

    #[test]
    fn even_fanout_workload_stays_consistent() {
        let mut tree = BPlusTree::new(block_for(4));
        assert_eq!(tree.max_keys(), 4);
        for k in 1..=40 {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.leaf_keys(), (1..=40).collect::<Vec<u64>>());
        for k in 1..=40 {
            assert_eq!(tree.get(k).addresses, vec![addr(k)], "key {}", k);
        }
        let removed = tree.remove_range(10, 30);
        assert_eq!(removed.len(), 21);
        let mut expect: Vec<u64> = (1..=9).collect();
        expect.extend(31..=40);
        assert_eq!(tree.leaf_keys(), expect);
    }

    #[test]
    fn first_split_promotes_a_root() {
        let mut tree = BPlusTree::new(block_for(4));
        for k in 1..=4 {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.num_levels(), 1);

        tree.insert(5, addr(5));
        assert_eq!(tree.num_nodes(), 3);
        assert_eq!(tree.num_levels(), 2);
        // Left leaf keeps the minimum occupancy, the rest move right.
        let min = tree.min_leaf_keys() as u64;
        assert_eq!(
            tree.dump_levels(),
            vec![
                vec![vec![min + 1]],
                vec![(1..=min).collect(), (min + 1..=5).collect()],
            ]
        );
    }

    #[test]
    fn duplicate_keys_share_an_entry_and_never_split() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in 1..=3 {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.num_nodes(), 1);
        // The leaf is full, but re-inserting an existing key only grows
        // its address set.
        for i in 0..10 {
            tree.insert(2, Address::new(100 + i, 0));
        }
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.get(2).addresses.len(), 11);
        assert_eq!(tree.get(1).addresses, vec![addr(1)]);

        // Deleting the key frees its whole address set at once.
        let freed = tree.remove_range(2, 2);
        assert_eq!(freed.len(), 11);
        assert_eq!(tree.leaf_keys(), vec![1, 3]);
    }

    #[test]
    fn range_walks_the_leaf_chain() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in (1..=20).rev() {
            tree.insert(k, addr(k));
        }
        let hits = tree.range(5, 12);
        assert_eq!(
            hits.addresses,
            (5..=12).map(addr).collect::<Vec<_>>()
        );
        assert!(hits.nodes_accessed >= tree.num_levels());

        assert_eq!(tree.keys_in_range(0, 100), (1..=20).collect::<Vec<u64>>());
        assert!(tree.range(21, 30).addresses.is_empty());
    }

    #[test]
    fn range_finds_keys_on_separator_boundaries() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in 1..=30 {
            tree.insert(k, addr(k));
        }
        // Every key must be reachable as a single-key range, including
        // the ones that sit in separators.
        for k in 1..=30 {
            assert_eq!(tree.get(k).addresses, vec![addr(k)], "key {}", k);
        }
    }

    #[test]
    fn range_delete_removes_the_span() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in 10..=19 {
            tree.insert(k, addr(k));
        }
        let removed = tree.remove_range(12, 15);
        assert_eq!(removed.len(), 4);
        assert_eq!(
            tree.leaf_keys(),
            vec![10, 11, 16, 17, 18, 19]
        );
        // The freed span can be refilled.
        for k in 12..=15 {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.leaf_keys(), (10..=19).collect::<Vec<u64>>());
    }

    #[test]
    fn deleting_everything_leaves_an_empty_root_leaf() {
        let mut tree = BPlusTree::new(block_for(3));
        let mut keys: Vec<u64> = (1..=50).collect();
        keys.shuffle(&mut rand::rng());
        for &k in &keys {
            tree.insert(k, addr(k));
        }
        let removed = tree.remove_range(0, u64::MAX);
        assert_eq!(removed.len(), 50);
        assert!(tree.is_empty());
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.num_levels(), 1);
        assert!(tree.leaf_keys().is_empty());

        // The empty root leaf accepts fresh inserts.
        tree.insert(7, addr(7));
        assert_eq!(tree.leaf_keys(), vec![7]);
        assert_eq!(tree.num_nodes(), 1);
    }

    #[test]
    fn underflowing_leaf_borrows_from_right_sibling() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in 1..=5 {
            tree.insert(k, addr(k));
        }
        // Leaves [1,2] | [3,4,5]; deleting 1 leaves the first leaf one
        // short, so it takes the right sibling's first entry.
        tree.remove_range(1, 1);
        assert_eq!(
            tree.dump_levels(),
            vec![vec![vec![4]], vec![vec![2, 3], vec![4, 5]]]
        );
    }

    #[test]
    fn underflowing_leaf_borrows_from_left_sibling() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in 1..=5 {
            tree.insert(k, addr(k));
        }
        tree.insert(0, addr(0));
        // Leaves [0,1,2] | [3,4,5]; emptying the right leaf down to [3]
        // pulls the left sibling's last entry across.
        tree.remove_range(4, 5);
        assert_eq!(
            tree.dump_levels(),
            vec![vec![vec![2]], vec![vec![0, 1], vec![2, 3]]]
        );
    }

    #[test]
    fn underflowing_internal_borrows_from_left_sibling() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in 1..=16 {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.num_levels(), 3);
        // The rightmost internal node holds two leaves; merging them
        // away leaves it a single child, so it adopts the last child of
        // the internal node to its left.
        tree.remove_range(13, 14);
        let mut expect: Vec<u64> = (1..=12).collect();
        expect.extend(15..=16);
        assert_eq!(tree.leaf_keys(), expect);
        assert_eq!(tree.root_keys(), vec![7, 11]);
        assert_eq!(tree.num_levels(), 3);
    }

    #[test]
    fn underflowing_internal_borrows_from_right_sibling() {
        let mut tree = BPlusTree::new(block_for(3));
        for k in 1..=16 {
            tree.insert(k, addr(k));
        }
        // Draining the leftmost leaves empties the first internal node
        // down to one child; it adopts the first child of the internal
        // node to its right.
        tree.remove_range(1, 3);
        assert_eq!(tree.leaf_keys(), (4..=16).collect::<Vec<u64>>());
        assert_eq!(tree.root_keys(), vec![9, 13]);
        assert_eq!(tree.num_levels(), 3);
    }

    #[test]
    fn merge_cascade_collapses_the_root() {
        let mut tree = BPlusTree::new(block_for(2));
        for k in 1..=4 {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.num_levels(), 2);
        let before = tree.num_nodes();

        tree.remove_range(1, 3);
        // Underflow merges all the way up: a single root leaf remains
        // and the node count reflects every released node.
        assert_eq!(tree.num_levels(), 1);
        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.num_nodes() < before);
        assert_eq!(tree.leaf_keys(), vec![4]);
    }

    #[test]
    fn shuffled_workload_stays_consistent() {
        let mut tree = BPlusTree::new(block_for(5));
        let mut keys: Vec<u64> = (1..=200).collect();
        keys.shuffle(&mut rand::rng());
        for &k in &keys {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.leaf_keys(), (1..=200).collect::<Vec<u64>>());

        let removed = tree.remove_range(51, 150);
        assert_eq!(removed.len(), 100);
        let mut expect: Vec<u64> = (1..=50).collect();
        expect.extend(151..=200);
        assert_eq!(tree.leaf_keys(), expect);

        for k in 51..=150 {
            tree.insert(k, addr(k));
        }
        assert_eq!(tree.leaf_keys(), (1..=200).collect::<Vec<u64>>());
    }
}
