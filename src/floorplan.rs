//! The floorplan aggregate: sole owner of blocks, terminals and nets for
//! the lifetime of a run. Constraint graphs are rebuilt from scratch for
//! every evaluation and discarded afterwards.

use std::cmp::Ordering;

use anyhow::bail;
use itertools::Itertools;

use crate::{
    block::{Block, Terminal},
    cgraph::{Axis, ConstraintGraph},
    dimensions::Dimensions,
    net::Net,
    seqpair::SeqPair,
};

pub struct Floorplan {
    alpha: f64,
    outline: Dimensions,
    blocks: Vec<Block>,
    terminals: Vec<Terminal>,
    nets: Vec<Net>,
}

impl Floorplan {
    pub fn new(
        alpha: f64,
        outline: Dimensions,
        blocks: Vec<Block>,
        terminals: Vec<Terminal>,
        nets: Vec<Net>,
    ) -> Self {
        Floorplan { alpha, outline, blocks, terminals, nets }
    }

    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    pub const fn outline(&self) -> Dimensions {
        self.outline
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    /// Decodes a sequence pair into a compacted placement.
    ///
    /// For every ordered pair of blocks in P, the relative order in N picks
    /// the constraint: same order means left-of, inverted order means
    /// below. Every block coordinate is rewritten; the returned extent is
    /// the envelope.
    // TODO: the pair scan emits the transitive closure; running petgraph's
    // tred over the block edges first would thin the relaxation work.
    pub fn pack(&mut self, pair: &SeqPair) -> Dimensions {
        let n = self.blocks.len();
        debug_assert_eq!(pair.len(), n);
        if n == 0 {
            return Dimensions::default();
        }

        let mut hcg = ConstraintGraph::new(Axis::Horizontal, n);
        let mut vcg = ConstraintGraph::new(Axis::Vertical, n);

        for (a, b) in pair.positive().iter().copied().tuple_combinations() {
            match pair.negative().position_of(a).cmp(&pair.negative().position_of(b)) {
                Ordering::Less => hcg.connect(a, b),
                Ordering::Greater => vcg.connect(b, a),
                Ordering::Equal => {
                    panic!("blocks {a} and {b} share a position in the negative sequence")
                }
            }
        }

        hcg.connect_to_st();
        vcg.connect_to_st();
        let width = hcg.target_weight(&mut self.blocks);
        let height = vcg.target_weight(&mut self.blocks);
        Dimensions::new(width, height)
    }

    /// Total half-perimeter wirelength over all nets, for the coordinates
    /// written by the last [`pack`][`Self::pack`].
    pub fn hpwl(&self) -> u64 {
        self.nets.iter().map(|net| net.hpwl(&self.blocks, &self.terminals)).sum()
    }

    /// Whether an envelope fits the outline. The mixed `<=` / `<`
    /// comparison is asymmetric on purpose: width may sit exactly on the
    /// boundary, height may not. Acceptance and best-tracking both key off
    /// this exact test, so keep it as is.
    pub const fn fits(&self, dims: Dimensions) -> bool {
        dims.width <= self.outline.width && dims.height < self.outline.height
    }

    /// Area term of the cost. Zero once the envelope is strictly inside
    /// the outline. Otherwise the penalised area, where a dimension that
    /// is still under its limit is substituted by the *orthogonal* limit;
    /// `strict` switches that substitution to the plain
    /// `max(extent, limit)` product instead.
    pub fn area_cost(&self, dims: Dimensions, strict: bool) -> u64 {
        let Dimensions { width, height } = dims;
        let outline = self.outline;
        if width < outline.width && height < outline.height {
            return 0;
        }
        if strict {
            return width.max(outline.width) * height.max(outline.height);
        }
        // The substitution swaps limits: an in-bounds width is replaced by
        // the *height* limit and vice versa. Published results depend on
        // this exact formula; `strict` is the escape hatch.
        let width = if width < outline.width { outline.height } else { width };
        let height = if height < outline.height { outline.width } else { height };
        width * height
    }

    /// Combined objective: `alpha * area_cost + (1 - alpha) * hpwl`.
    pub fn cost(&self, dims: Dimensions, strict: bool) -> f64 {
        self.alpha * self.area_cost(dims, strict) as f64
            + (1.0 - self.alpha) * self.hpwl() as f64
    }

    /// Sanity-checks the current placement against `dims`. Failures are
    /// decoder bugs, never input errors; the caller decides how loudly to
    /// die.
    pub fn validate(&self, dims: Dimensions) -> anyhow::Result<()> {
        for b in &self.blocks {
            if b.right_x() - b.left_x() != b.width() || b.top_y() - b.bottom_y() != b.height() {
                bail!("block {} spans do not match its dimensions", b.name());
            }
        }

        let overlapping: Vec<_> = self
            .blocks
            .iter()
            .tuple_combinations()
            .filter(|(a, b)| a.overlaps(b))
            .collect();
        if !overlapping.is_empty() {
            for (a, b) in &overlapping {
                log::error!(target: "validation", "Overlap! {a} <-> {b}");
            }
            bail!("placement contains {} overlapping block pairs", overlapping.len());
        }

        let width = self.blocks.iter().map(Block::right_x).max().unwrap_or(0);
        let height = self.blocks.iter().map(Block::top_y).max().unwrap_or(0);
        if Dimensions::new(width, height) != dims {
            bail!("placement extent {width}x{height} disagrees with the envelope {dims}");
        }

        Ok(())
    }
}
