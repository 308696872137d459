//! Binary min-heap used as the open set of the search.
use std::cmp::Ordering;

/// A queued node together with the costs it had when it was pushed. The keys are snapshots:
/// improving a node's cost later pushes a new entry rather than touching this one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpenEntry<N> {
    pub g_cost: f32,
    pub h_cost: f32,
    pub node: N,
}

impl<N> OpenEntry<N> {
    pub fn new(node: N, g_cost: f32, h_cost: f32) -> OpenEntry<N> {
        OpenEntry {
            g_cost,
            h_cost,
            node,
        }
    }
    pub fn f_cost(&self) -> f32 {
        self.g_cost + self.h_cost
    }
    /// First orders per total cost, then prefers the entry closer to the goal.
    fn key_cmp(&self, other: &Self) -> Ordering {
        match self.f_cost().total_cmp(&other.f_cost()) {
            Ordering::Equal => self.h_cost.total_cmp(&other.h_cost),
            s => s,
        }
    }
}

/// Min-heap of [OpenEntry]s ordered by total cost, ties broken by the smaller `h_cost`.
/// Entries are not deduplicated, so the same node may be queued several times.
#[derive(Clone, Debug)]
pub struct OpenList<N> {
    heap: Vec<OpenEntry<N>>,
}

impl<N> Default for OpenList<N> {
    fn default() -> Self {
        OpenList { heap: Vec::new() }
    }
}

impl<N> OpenList<N> {
    pub fn new() -> OpenList<N> {
        OpenList::default()
    }
    pub fn with_capacity(capacity: usize) -> OpenList<N> {
        OpenList {
            heap: Vec::with_capacity(capacity),
        }
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn peek(&self) -> Option<&OpenEntry<N>> {
        self.heap.first()
    }
    pub fn push(&mut self, entry: OpenEntry<N>) {
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1);
    }
    /// Removes the entry with the smallest key, `None` when empty.
    pub fn pop(&mut self) -> Option<OpenEntry<N>> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(top)
    }
    /// Drops every entry, keeping the allocation for the next search.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.heap[a].key_cmp(&self.heap[b]) == Ordering::Less
    }
    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.less(index, parent) {
                self.heap.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }
    fn sift_down(&mut self, mut index: usize) {
        let size = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < size && self.less(left, smallest) {
                smallest = left;
            }
            if right < size && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}
