//! Pseudo-LRU: a binary bit-tree with precomputated masks.
//!
//! Grounded on `original_source/cache.h`'s `pseudo_lru_info<NumWays>`, which
//! keeps one bit per internal node of a binary tree over the ways and
//! updates/queries it via four precomputed mask tables (`mask1s`, `mask0s`,
//! `mask1sFind`, `mask0sFind`). Rather than transliterate those literal
//! per-`NumWays` mask constants (the original only ships a commented-out
//! example for 9 ways), this builds the same tree topology once at
//! construction and walks it directly — same amortized O(depth) cost per
//! access, without hand-maintained mask tables for every possible way count.

use std::fmt::Write as _;

use super::ReplacementPolicy;
use crate::error::CheckpointError;
use crate::rng::CacheRng;

#[derive(Clone, Copy, Debug)]
enum Child {
    Leaf(usize),
    Node(usize),
}

#[derive(Clone, Copy, Debug)]
struct NodeInfo {
    left: Child,
    right: Child,
}

/// A binary recency tree over a fixed set of leaves (ways, or a group of
/// ways in the generalized two-level policy). One bit per internal node
/// records which side was least recently touched.
#[derive(Clone, Debug)]
pub(super) struct PlruTree {
    root: Child,
    nodes: Vec<NodeInfo>,
    /// `paths[leaf]` is the root-to-leaf sequence of `(node_id, side_taken)`,
    /// `side_taken == true` meaning "right".
    paths: Vec<Vec<(usize, bool)>>,
}

impl PlruTree {
    pub(super) fn new(num_leaves: usize) -> Self {
        assert!(num_leaves > 0, "a PLRU tree needs at least one leaf");
        let mut nodes = Vec::new();
        let root = Self::build(0, num_leaves, &mut nodes);
        let mut paths = vec![Vec::new(); num_leaves];
        Self::collect_paths(root, Vec::new(), &nodes, &mut paths);
        Self { root, nodes, paths }
    }

    fn build(lo: usize, hi: usize, nodes: &mut Vec<NodeInfo>) -> Child {
        if hi - lo == 1 {
            return Child::Leaf(lo);
        }
        let mid = lo + (hi - lo) / 2;
        let id = nodes.len();
        nodes.push(NodeInfo {
            left: Child::Leaf(lo),
            right: Child::Leaf(mid),
        });
        let left = Self::build(lo, mid, nodes);
        let right = Self::build(mid, hi, nodes);
        nodes[id] = NodeInfo { left, right };
        Child::Node(id)
    }

    fn collect_paths(
        node: Child,
        prefix: Vec<(usize, bool)>,
        nodes: &[NodeInfo],
        paths: &mut [Vec<(usize, bool)>],
    ) {
        match node {
            Child::Leaf(leaf) => paths[leaf] = prefix,
            Child::Node(id) => {
                let info = nodes[id];
                let mut left_prefix = prefix.clone();
                left_prefix.push((id, false));
                Self::collect_paths(info.left, left_prefix, nodes, paths);
                let mut right_prefix = prefix;
                right_prefix.push((id, true));
                Self::collect_paths(info.right, right_prefix, nodes, paths);
            }
        }
    }

    fn num_internal_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Walks the tree following each node's recorded "least recently
    /// touched" side, returning the leaf at the end of that walk.
    pub(super) fn victim(&self, bits: &[bool]) -> usize {
        let mut current = self.root;
        loop {
            match current {
                Child::Leaf(leaf) => return leaf,
                Child::Node(id) => {
                    current = if bits[id] {
                        self.nodes[id].right
                    } else {
                        self.nodes[id].left
                    };
                }
            }
        }
    }

    /// Like [`PlruTree::victim`], but steers away from any subtree whose
    /// leaves are all marked reserved in `reserved`. Used by the generalized
    /// two-level policy, where a leaf's replicas can all be reserved while
    /// siblings still have free ways.
    ///
    /// # Panics
    ///
    /// Panics if every leaf is reserved.
    pub(super) fn victim_with_reservations(&self, bits: &[bool], reserved: &[bool]) -> usize {
        assert!(
            !reserved.iter().all(|&r| r),
            "no free leaves: every leaf is reserved"
        );
        self.walk_with_reservations(self.root, bits, reserved)
    }

    fn walk_with_reservations(&self, node: Child, bits: &[bool], reserved: &[bool]) -> usize {
        match node {
            Child::Leaf(leaf) => leaf,
            Child::Node(id) => {
                let info = self.nodes[id];
                let left_reserved = self.all_reserved(info.left, reserved);
                let right_reserved = self.all_reserved(info.right, reserved);
                let go_right = if left_reserved && !right_reserved {
                    true
                } else if right_reserved && !left_reserved {
                    false
                } else {
                    bits[id]
                };
                let next = if go_right { info.right } else { info.left };
                self.walk_with_reservations(next, bits, reserved)
            }
        }
    }

    fn all_reserved(&self, node: Child, reserved: &[bool]) -> bool {
        match node {
            Child::Leaf(leaf) => reserved[leaf],
            Child::Node(id) => {
                let info = self.nodes[id];
                self.all_reserved(info.left, reserved) && self.all_reserved(info.right, reserved)
            }
        }
    }

    pub(super) fn num_leaves(&self) -> usize {
        self.paths.len()
    }

    /// Records that `leaf` was just touched: every node on its root-to-leaf
    /// path is pointed away from it, so a future victim walk avoids it.
    pub(super) fn make_mru(&self, bits: &mut [bool], leaf: usize) {
        for &(node, side_taken) in &self.paths[leaf] {
            bits[node] = !side_taken;
        }
    }

    /// Records that `leaf` should be the next victim: every node on its
    /// root-to-leaf path is pointed towards it.
    pub(super) fn make_lru(&self, bits: &mut [bool], leaf: usize) {
        for &(node, side_taken) in &self.paths[leaf] {
            bits[node] = side_taken;
        }
    }
}

fn bits_to_hex(bits: &[bool]) -> String {
    let mut word: u64 = 0;
    for (i, &b) in bits.iter().enumerate() {
        if b {
            word |= 1 << i;
        }
    }
    let mut out = String::new();
    let _ = write!(out, "0x{word:x}");
    out
}

fn hex_to_bits(text: &str, len: usize) -> Result<Vec<bool>, CheckpointError> {
    let hex = text
        .strip_prefix("0x")
        .ok_or_else(|| CheckpointError::MalformedPolicyState(text.to_owned()))?;
    let word = u64::from_str_radix(hex, 16)
        .map_err(|_| CheckpointError::MalformedPolicyState(text.to_owned()))?;
    Ok((0..len).map(|i| (word >> i) & 1 != 0).collect())
}

/// Pseudo-LRU replacement policy: a binary recency tree per set. Does not
/// support reservations — `get_victim` asserts `reserved_mask == 0`, matching
/// the original `PseudoLRUReplacement::GetVictim`.
#[derive(Clone, Debug)]
pub struct PlruPolicy {
    tree: PlruTree,
    bits: Vec<Vec<bool>>,
}

impl PlruPolicy {
    /// Builds a fresh policy for a cache with `num_sets` sets of `num_ways`
    /// ways each.
    #[must_use]
    pub fn new(num_sets: usize, num_ways: usize) -> Self {
        let tree = PlruTree::new(num_ways);
        let bits = vec![vec![false; tree.num_internal_nodes()]; num_sets];
        Self { tree, bits }
    }
}

impl ReplacementPolicy for PlruPolicy {
    fn get_victim(&mut self, set: usize, reserved_mask: u64, _rng: &mut CacheRng) -> usize {
        assert!(
            reserved_mask == 0,
            "PlruPolicy does not support reserved ways"
        );
        self.tree.victim(&self.bits[set])
    }

    fn make_mru(&mut self, set: usize, way: usize) {
        self.tree.make_mru(&mut self.bits[set], way);
    }

    fn make_lru(&mut self, set: usize, way: usize) {
        self.tree.make_lru(&mut self.bits[set], way);
    }

    fn get_mru(&self, set: usize) -> usize {
        let inverted: Vec<bool> = self.bits[set].iter().map(|b| !b).collect();
        self.tree.victim(&inverted)
    }

    fn get_lru(&self, set: usize, reserved_mask: u64) -> usize {
        assert!(
            reserved_mask == 0,
            "PlruPolicy does not support reserved ways"
        );
        self.tree.victim(&self.bits[set])
    }

    fn save_state(&self, set: usize) -> String {
        bits_to_hex(&self.bits[set])
    }

    fn restore_state(&mut self, set: usize, payload: &str) -> Result<(), CheckpointError> {
        let bits = hex_to_bits(payload.trim(), self.bits[set].len())?;
        self.bits[set] = bits;
        Ok(())
    }
}
