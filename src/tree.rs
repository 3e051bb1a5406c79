//! Cost-ordered red-black tree.
//!
//! A balanced binary search tree keyed by `(cost, handle)`, backing the
//! decimation queue. Handles are looked up through a side map, so removing
//! or re-keying an arbitrary entry is O(log n) without searching. Equal
//! costs are ordered by handle, which makes traversal order deterministic.
//!
//! Nodes live in an arena with a free list; index 0 is the shared NIL
//! sentinel, which also absorbs the parent bookkeeping of spliced leaves
//! during removal.

use std::collections::HashMap;
use std::hash::Hash;

const NIL: u32 = 0;

#[derive(Debug, Clone)]
struct Node<H> {
    key: f64,
    handle: H,
    parent: u32,
    child: [u32; 2],
    red: bool,
}

/// Node arena addressed by `u32`.
#[derive(Debug, Clone)]
struct Arena<H>(Vec<Node<H>>);

impl<H> std::ops::Index<u32> for Arena<H> {
    type Output = Node<H>;

    #[inline]
    fn index(&self, i: u32) -> &Node<H> {
        &self.0[i as usize]
    }
}

impl<H> std::ops::IndexMut<u32> for Arena<H> {
    #[inline]
    fn index_mut(&mut self, i: u32) -> &mut Node<H> {
        &mut self.0[i as usize]
    }
}

/// A priority structure over `(cost, handle)` pairs with O(log n) insert,
/// removal by handle, and ordered traversal.
#[derive(Debug, Clone)]
pub struct CostTree<H> {
    nodes: Arena<H>,
    root: u32,
    free: Vec<u32>,
    map: HashMap<H, u32>,
}

#[inline]
fn before<H: Ord>(a_key: f64, a_handle: &H, b_key: f64, b_handle: &H) -> bool {
    match a_key.total_cmp(&b_key) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => a_handle < b_handle,
    }
}

impl<H: Copy + Eq + Hash + Ord + Default> Default for CostTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy + Eq + Hash + Ord + Default> CostTree<H> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Arena(vec![Node {
                key: 0.0,
                handle: H::default(),
                parent: NIL,
                child: [NIL, NIL],
                red: false,
            }]),
            root: NIL,
            free: Vec::new(),
            map: HashMap::new(),
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the tree is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether `handle` has an entry.
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.map.contains_key(&handle)
    }

    /// The cost stored for `handle`, if any.
    pub fn cost(&self, handle: H) -> Option<f64> {
        self.map.get(&handle).map(|&n| self.nodes[n].key)
    }

    /// Insert an entry. Returns `false` if `handle` is already present,
    /// leaving its cost unchanged.
    pub fn insert(&mut self, key: f64, handle: H) -> bool {
        if self.map.contains_key(&handle) {
            return false;
        }

        let z = self.allocate(key, handle);
        let mut parent = NIL;
        let mut cur = self.root;
        while cur != NIL {
            parent = cur;
            let go_right = before(
                self.nodes[cur].key,
                &self.nodes[cur].handle,
                key,
                &handle,
            );
            cur = self.nodes[cur].child[go_right as usize];
        }
        self.nodes[z].parent = parent;
        if parent == NIL {
            self.root = z;
        } else {
            let go_right = before(
                self.nodes[parent].key,
                &self.nodes[parent].handle,
                key,
                &handle,
            );
            self.nodes[parent].child[go_right as usize] = z;
        }
        self.map.insert(handle, z);
        self.insert_fixup(z);
        true
    }

    /// Remove the entry for `handle`, returning its cost.
    pub fn remove(&mut self, handle: H) -> Option<f64> {
        let z = self.map.remove(&handle)?;
        let removed_key = self.nodes[z].key;

        // Two children: copy the successor's payload into this node and
        // splice the successor out instead.
        let y = if self.nodes[z].child[0] == NIL || self.nodes[z].child[1] == NIL {
            z
        } else {
            self.minimum(self.nodes[z].child[1])
        };
        if y != z {
            self.nodes[z].key = self.nodes[y].key;
            self.nodes[z].handle = self.nodes[y].handle;
            self.map.insert(self.nodes[z].handle, z);
        }

        let x = if self.nodes[y].child[0] != NIL {
            self.nodes[y].child[0]
        } else {
            self.nodes[y].child[1]
        };
        let p = self.nodes[y].parent;
        self.nodes[x].parent = p;
        if p == NIL {
            self.root = x;
        } else {
            let side = (self.nodes[p].child[1] == y) as usize;
            self.nodes[p].child[side] = x;
        }

        if !self.nodes[y].red {
            self.delete_fixup(x);
        }
        self.free.push(y);
        Some(removed_key)
    }

    /// Set the cost of `handle`, inserting it if absent.
    pub fn update(&mut self, key: f64, handle: H) {
        if let Some(&n) = self.map.get(&handle) {
            if self.nodes[n].key == key {
                return;
            }
            self.remove(handle);
        }
        self.insert(key, handle);
    }

    /// The entry with the smallest cost.
    pub fn first(&self) -> Option<(f64, H)> {
        if self.root == NIL {
            return None;
        }
        let n = self.minimum(self.root);
        Some((self.nodes[n].key, self.nodes[n].handle))
    }

    /// The first entry strictly after `(key, handle)` in tree order,
    /// whether or not that pair is present.
    pub fn next_after(&self, key: f64, handle: H) -> Option<(f64, H)> {
        let mut best = NIL;
        let mut cur = self.root;
        while cur != NIL {
            if before(key, &handle, self.nodes[cur].key, &self.nodes[cur].handle) {
                best = cur;
                cur = self.nodes[cur].child[0];
            } else {
                cur = self.nodes[cur].child[1];
            }
        }
        (best != NIL).then(|| (self.nodes[best].key, self.nodes[best].handle))
    }

    /// Iterate over entries in ascending cost order.
    pub fn iter(&self) -> Iter<'_, H> {
        let start = if self.root == NIL {
            NIL
        } else {
            self.minimum(self.root)
        };
        Iter {
            tree: self,
            current: start,
        }
    }

    // ==================== Internals ====================

    fn allocate(&mut self, key: f64, handle: H) -> u32 {
        let node = Node {
            key,
            handle,
            parent: NIL,
            child: [NIL, NIL],
            red: true,
        };
        if let Some(n) = self.free.pop() {
            self.nodes[n] = node;
            n
        } else {
            self.nodes.0.push(node);
            (self.nodes.0.len() - 1) as u32
        }
    }

    fn minimum(&self, mut n: u32) -> u32 {
        while self.nodes[n].child[0] != NIL {
            n = self.nodes[n].child[0];
        }
        n
    }

    fn successor(&self, n: u32) -> u32 {
        if self.nodes[n].child[1] != NIL {
            return self.minimum(self.nodes[n].child[1]);
        }
        let mut cur = n;
        let mut parent = self.nodes[cur].parent;
        while parent != NIL && self.nodes[parent].child[1] == cur {
            cur = parent;
            parent = self.nodes[cur].parent;
        }
        parent
    }

    /// Rotate `x` down in direction `dir`; its child on the other side
    /// takes its place.
    fn rotate(&mut self, x: u32, dir: usize) {
        let y = self.nodes[x].child[1 - dir];
        let inner = self.nodes[y].child[dir];
        self.nodes[x].child[1 - dir] = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        let p = self.nodes[x].parent;
        self.nodes[y].parent = p;
        if p == NIL {
            self.root = y;
        } else {
            let side = (self.nodes[p].child[1] == x) as usize;
            self.nodes[p].child[side] = y;
        }
        self.nodes[y].child[dir] = x;
        self.nodes[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: u32) {
        while self.nodes[self.nodes[z].parent].red {
            let parent = self.nodes[z].parent;
            let grand = self.nodes[parent].parent;
            let dir = (self.nodes[grand].child[1] == parent) as usize;
            let uncle = self.nodes[grand].child[1 - dir];
            if self.nodes[uncle].red {
                // Red uncle: push the conflict two levels up.
                self.nodes[parent].red = false;
                self.nodes[uncle].red = false;
                self.nodes[grand].red = true;
                z = grand;
            } else {
                if self.nodes[parent].child[1 - dir] == z {
                    z = parent;
                    self.rotate(z, dir);
                }
                let parent = self.nodes[z].parent;
                let grand = self.nodes[parent].parent;
                self.nodes[parent].red = false;
                self.nodes[grand].red = true;
                self.rotate(grand, 1 - dir);
            }
        }
        let root = self.root;
        self.nodes[root].red = false;
    }

    fn delete_fixup(&mut self, mut x: u32) {
        while x != self.root && !self.nodes[x].red {
            let parent = self.nodes[x].parent;
            let dir = (self.nodes[parent].child[1] == x) as usize;
            let mut w = self.nodes[parent].child[1 - dir];
            if self.nodes[w].red {
                // Red sibling: rotate it above and retry with a black one.
                self.nodes[w].red = false;
                self.nodes[parent].red = true;
                self.rotate(parent, dir);
                w = self.nodes[parent].child[1 - dir];
            }
            if !self.nodes[self.nodes[w].child[0]].red
                && !self.nodes[self.nodes[w].child[1]].red
            {
                self.nodes[w].red = true;
                x = parent;
            } else {
                if !self.nodes[self.nodes[w].child[1 - dir]].red {
                    let near = self.nodes[w].child[dir];
                    self.nodes[near].red = false;
                    self.nodes[w].red = true;
                    self.rotate(w, 1 - dir);
                    w = self.nodes[parent].child[1 - dir];
                }
                self.nodes[w].red = self.nodes[parent].red;
                self.nodes[parent].red = false;
                let far = self.nodes[w].child[1 - dir];
                self.nodes[far].red = false;
                self.rotate(parent, dir);
                x = self.root;
            }
        }
        self.nodes[x].red = false;
    }
}

/// Ascending iterator over `(cost, handle)` entries.
pub struct Iter<'a, H> {
    tree: &'a CostTree<H>,
    current: u32,
}

impl<'a, H: Copy + Eq + Hash + Ord + Default> Iterator for Iter<'a, H> {
    type Item = (f64, H);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NIL {
            return None;
        }
        let n = &self.tree.nodes[self.current];
        self.current = self.tree.successor(self.current);
        Some((n.key, n.handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Check the red-black invariants: the root is black, no red node has a
    /// red child, and every path to a leaf crosses the same number of
    /// black nodes.
    fn check_invariants(tree: &CostTree<u32>) {
        fn walk(tree: &CostTree<u32>, n: u32) -> usize {
            if n == NIL {
                return 1;
            }
            let node = &tree.nodes[n];
            if node.red {
                assert!(!tree.nodes[node.child[0]].red);
                assert!(!tree.nodes[node.child[1]].red);
            }
            for &c in &node.child {
                if c != NIL {
                    assert_eq!(tree.nodes[c].parent, n);
                }
            }
            let left = walk(tree, node.child[0]);
            let right = walk(tree, node.child[1]);
            assert_eq!(left, right);
            left + !node.red as usize
        }
        assert!(!tree.nodes[tree.root].red || tree.root == NIL);
        walk(tree, tree.root);
    }

    #[test]
    fn test_insert_and_first() {
        let mut tree = CostTree::new();
        assert!(tree.is_empty());

        assert!(tree.insert(3.0, 30));
        assert!(tree.insert(1.0, 10));
        assert!(tree.insert(2.0, 20));
        assert!(!tree.insert(5.0, 10));

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.first(), Some((1.0, 10)));
        assert_eq!(tree.cost(10), Some(1.0));
        check_invariants(&tree);
    }

    #[test]
    fn test_sorted_iteration() {
        let mut tree = CostTree::new();
        // A pseudo-random insertion order.
        for i in 0u32..200 {
            let key = (i * 7919 % 200) as f64;
            tree.insert(key, i * 7919 % 200);
        }
        assert_eq!(tree.len(), 200);
        check_invariants(&tree);

        let entries: Vec<_> = tree.iter().collect();
        assert_eq!(entries.len(), 200);
        for pair in entries.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn test_duplicate_costs_ordered_by_handle() {
        let mut tree = CostTree::new();
        tree.insert(1.0, 5);
        tree.insert(1.0, 3);
        tree.insert(1.0, 9);
        tree.insert(0.5, 7);

        let entries: Vec<_> = tree.iter().collect();
        assert_eq!(entries, vec![(0.5, 7), (1.0, 3), (1.0, 5), (1.0, 9)]);
    }

    #[test]
    fn test_remove_rebalances() {
        let mut tree = CostTree::new();
        for i in 0u32..100 {
            tree.insert(i as f64, i);
        }
        for i in (0u32..100).step_by(2) {
            assert_eq!(tree.remove(i), Some(i as f64));
            check_invariants(&tree);
        }
        assert_eq!(tree.remove(2), None);
        assert_eq!(tree.len(), 50);

        let entries: Vec<_> = tree.iter().collect();
        assert_eq!(entries.len(), 50);
        for (k, h) in entries {
            assert_eq!(h % 2, 1);
            assert_eq!(k, h as f64);
        }
    }

    #[test]
    fn test_update_moves_entry() {
        let mut tree = CostTree::new();
        tree.insert(5.0, 1);
        tree.insert(6.0, 2);

        tree.update(0.5, 2);
        assert_eq!(tree.first(), Some((0.5, 2)));
        assert_eq!(tree.len(), 2);

        // Upsert of an absent handle.
        tree.update(0.1, 3);
        assert_eq!(tree.first(), Some((0.1, 3)));
        assert_eq!(tree.len(), 3);
        check_invariants(&tree);
    }

    #[test]
    fn test_next_after() {
        let mut tree = CostTree::new();
        tree.insert(1.0, 1);
        tree.insert(2.0, 2);
        tree.insert(3.0, 3);

        assert_eq!(tree.next_after(1.0, 1), Some((2.0, 2)));
        assert_eq!(tree.next_after(2.0, 2), Some((3.0, 3)));
        assert_eq!(tree.next_after(3.0, 3), None);
        // The query pair does not have to be present.
        assert_eq!(tree.next_after(1.5, 0), Some((2.0, 2)));
    }

    #[test]
    fn test_slot_reuse() {
        let mut tree = CostTree::new();
        for i in 0u32..50 {
            tree.insert(i as f64, i);
        }
        for i in 0u32..50 {
            tree.remove(i);
        }
        assert!(tree.is_empty());

        let slots = tree.nodes.0.len();
        for i in 0u32..50 {
            tree.insert(i as f64, i);
        }
        assert_eq!(tree.nodes.0.len(), slots);
        check_invariants(&tree);
    }
}
