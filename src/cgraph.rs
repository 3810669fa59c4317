//! # Constraint graphs
//!
//! A packed placement is evaluated through two DAGs over the same block
//! set: the horizontal graph, where an edge `u -> v` means "u is left of
//! v", and the vertical graph, where it means "u is below v". Synthetic
//! `source` and `target` nodes bracket the blocks, and the longest
//! source-to-target path (each block node contributing its width or
//! height) is the envelope extent on that axis.
//!
//! ```text
//!            +---+
//! source --> | a | --> b ... --> target
//!            +---+
//! ```
//!
//! Weights are propagated in a Kahn-style wave: a node is finalised once
//! all of its in-edges have been relaxed, at which point its weight is the
//! far edge of the block on that axis. That makes coordinate assignment a
//! byproduct of the walk: `right_x = weight`, `left_x = weight - width`
//! (and the same for the vertical axis).

use std::collections::VecDeque;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};

use crate::block::Block;

/// Node payload. Sentinels carry no block, so the "add own span" step is a
/// total match instead of a null check.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Source,
    Target,
    Block(usize),
}

/// Which axis a constraint graph measures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The block's extent along this axis.
    fn span(self, block: &Block) -> u64 {
        match self {
            Axis::Horizontal => block.width(),
            Axis::Vertical => block.height(),
        }
    }

    /// Writes the block's coordinates on this axis, given the far edge.
    fn place(self, block: &mut Block, weight: u64) {
        match self {
            Axis::Horizontal => block.place_x(weight - block.width(), weight),
            Axis::Vertical => block.place_y(weight - block.height(), weight),
        }
    }
}

pub struct ConstraintGraph {
    axis: Axis,
    graph: DiGraph<NodeKind, ()>,
    source: NodeIndex,
    target: NodeIndex,
    block_nodes: Vec<NodeIndex>,
    st_connected: bool,
}

impl ConstraintGraph {
    pub fn new(axis: Axis, n_blocks: usize) -> Self {
        let mut graph = DiGraph::with_capacity(n_blocks + 2, n_blocks * 2);
        let source = graph.add_node(NodeKind::Source);
        let target = graph.add_node(NodeKind::Target);
        let block_nodes = (0..n_blocks).map(|i| graph.add_node(NodeKind::Block(i))).collect();
        ConstraintGraph { axis, graph, source, target, block_nodes, st_connected: false }
    }

    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Adds the ordering edge `from -> to` between two blocks.
    pub fn connect(&mut self, from: usize, to: usize) {
        self.graph.add_edge(self.block_nodes[from], self.block_nodes[to], ());
    }

    /// Hooks blocks without predecessors to `source` and blocks without
    /// successors to `target`. An isolated block gets both. Must run after
    /// the last [`connect`][`Self::connect`] and before
    /// [`target_weight`][`Self::target_weight`].
    pub fn connect_to_st(&mut self) {
        let needs_source: Vec<_> = self
            .block_nodes
            .iter()
            .copied()
            .filter(|&n| self.graph.neighbors_directed(n, Direction::Incoming).next().is_none())
            .collect();
        let needs_target: Vec<_> = self
            .block_nodes
            .iter()
            .copied()
            .filter(|&n| self.graph.neighbors_directed(n, Direction::Outgoing).next().is_none())
            .collect();

        for n in needs_source {
            self.graph.add_edge(self.source, n, ());
        }
        for n in needs_target {
            self.graph.add_edge(n, self.target, ());
        }
        self.st_connected = true;
    }

    /// Runs the longest-path wave, writes every block's coordinates on
    /// this axis, and returns the envelope extent.
    ///
    /// Panics when called before [`connect_to_st`][`Self::connect_to_st`]:
    /// nodes would then be unreachable from `source`, which is a bug in
    /// the caller, not a recoverable state.
    pub fn target_weight(&mut self, blocks: &mut [Block]) -> u64 {
        assert!(
            self.st_connected,
            "longest path requested before the source/target hookup ({:?} graph)",
            self.axis
        );

        let n = self.graph.node_count();
        let mut weight = vec![0u64; n];
        let mut pending = vec![0usize; n];
        for node in self.graph.node_indices() {
            pending[node.index()] =
                self.graph.neighbors_directed(node, Direction::Incoming).count();
        }

        let mut queue = VecDeque::with_capacity(n);
        queue.push_back(self.source);
        let mut visited = 0usize;

        while let Some(cur) = queue.pop_front() {
            visited += 1;
            let cur_weight = weight[cur.index()];
            for out in self.graph.neighbors_directed(cur, Direction::Outgoing) {
                let i = out.index();
                pending[i] -= 1;
                if cur_weight > weight[i] {
                    weight[i] = cur_weight;
                }
                if pending[i] == 0 {
                    if let NodeKind::Block(b) = self.graph[out] {
                        weight[i] += self.axis.span(&blocks[b]);
                    }
                    queue.push_back(out);
                }
            }
        }
        assert_eq!(visited, n, "constraint graph wave did not reach every node");

        for &node in &self.block_nodes {
            if let NodeKind::Block(b) = self.graph[node] {
                self.axis.place(&mut blocks[b], weight[node.index()]);
            }
        }

        weight[self.target.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(dims: &[(u64, u64)]) -> Vec<Block> {
        dims.iter()
            .enumerate()
            .map(|(i, &(w, h))| Block::new(format!("b{i}"), w, h))
            .collect()
    }

    #[test]
    fn chain_sums_widths() {
        let mut blocks = blocks(&[(10, 10), (10, 10)]);
        let mut hcg = ConstraintGraph::new(Axis::Horizontal, 2);
        hcg.connect(0, 1);
        hcg.connect_to_st();
        assert_eq!(hcg.target_weight(&mut blocks), 20);
        assert_eq!((blocks[0].left_x(), blocks[0].right_x()), (0, 10));
        assert_eq!((blocks[1].left_x(), blocks[1].right_x()), (10, 20));
    }

    #[test]
    fn unordered_blocks_take_the_max() {
        let mut blocks = blocks(&[(10, 20), (20, 10), (15, 15)]);
        let mut vcg = ConstraintGraph::new(Axis::Vertical, 3);
        // no block-to-block edges: everything hangs off source and target
        vcg.connect_to_st();
        assert_eq!(vcg.target_weight(&mut blocks), 20);
        for b in &blocks {
            assert_eq!(b.bottom_y(), 0);
            assert_eq!(b.top_y(), b.height());
        }
    }

    #[test]
    fn vertical_chain_stacks_heights() {
        let mut blocks = blocks(&[(10, 20), (20, 10), (15, 15)]);
        let mut vcg = ConstraintGraph::new(Axis::Vertical, 3);
        vcg.connect(2, 1);
        vcg.connect(2, 0);
        vcg.connect(1, 0);
        vcg.connect_to_st();
        assert_eq!(vcg.target_weight(&mut blocks), 45);
        assert_eq!((blocks[2].bottom_y(), blocks[2].top_y()), (0, 15));
        assert_eq!((blocks[1].bottom_y(), blocks[1].top_y()), (15, 25));
        assert_eq!((blocks[0].bottom_y(), blocks[0].top_y()), (25, 45));
    }

    #[test]
    fn longest_branch_wins() {
        // 0 -> 1 -> 3 and 0 -> 2 -> 3 with a fat middle on the second path
        let mut blocks = blocks(&[(5, 1), (10, 1), (25, 1), (5, 1)]);
        let mut hcg = ConstraintGraph::new(Axis::Horizontal, 4);
        hcg.connect(0, 1);
        hcg.connect(0, 2);
        hcg.connect(1, 3);
        hcg.connect(2, 3);
        hcg.connect_to_st();
        assert_eq!(hcg.target_weight(&mut blocks), 5 + 25 + 5);
        assert_eq!(blocks[3].left_x(), 30);
    }

    #[test]
    fn single_block_sits_at_origin() {
        let mut blocks = blocks(&[(12, 7)]);
        let mut hcg = ConstraintGraph::new(Axis::Horizontal, 1);
        hcg.connect_to_st();
        assert_eq!(hcg.target_weight(&mut blocks), 12);
        assert_eq!(blocks[0].left_x(), 0);
    }

    #[test]
    #[should_panic(expected = "source/target hookup")]
    fn longest_path_without_hookup_is_a_bug() {
        let mut blocks = blocks(&[(10, 10)]);
        let mut hcg = ConstraintGraph::new(Axis::Horizontal, 1);
        hcg.target_weight(&mut blocks);
    }
}
