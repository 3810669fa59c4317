//! Simulated-annealing search over the sequence-pair space.
//!
//! The search has two phases: a shuffle-seeding pass that keeps the
//! smallest-area random start, then the Metropolis loop proper with
//! geometric cooling. Any candidate that lands inside the outline is
//! accepted outright and recorded as the best so far, whatever its cost;
//! that bias is what turns a plain min-area packer into a fixed-outline
//! one.

use std::{
    io::Write,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::Context;
use assertables::assert_all;
use enum_iterator::{Sequence, all, cardinality};
use enum_map::{Enum, EnumMap};
use log::{debug, error, info};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    block::Block, config::AnnealConfig, dimensions::Dimensions, floorplan::Floorplan,
    seqpair::SeqPair,
};

/// The move pool. `Rotate` must stay the last variant: the sampler trims
/// it off the pool unless the `rotate-move` feature is enabled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[derive(Enum, Sequence)]
pub enum MoveKind {
    /// Swap two positions in P only.
    SwapPositive,
    /// Swap one block pair in both P and N.
    SwapBoth,
    /// Toggle one block's rotation flag.
    Rotate,
}

/// A drawn move with its arguments. Every move is an involution, so a
/// rejected move is undone by applying it a second time; no snapshot of
/// the sequence pair is ever taken.
#[derive(Copy, Clone, Debug)]
enum Move {
    SwapPositive { i: usize, j: usize },
    SwapBoth { a: usize, b: usize },
    Rotate { block: usize },
}

impl Move {
    const fn kind(self) -> MoveKind {
        match self {
            Move::SwapPositive { .. } => MoveKind::SwapPositive,
            Move::SwapBoth { .. } => MoveKind::SwapBoth,
            Move::Rotate { .. } => MoveKind::Rotate,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct MoveStats {
    pub proposed: u64,
    pub accepted: u64,
}

/// Summary of a finished run. Block coordinates live in the floorplan.
#[derive(Debug, Clone)]
pub struct Solution {
    pub dims: Dimensions,
    pub area: u64,
    pub hpwl: u64,
    pub cost: f64,
    pub elapsed: Duration,
}

pub struct Annealer<'a> {
    plan: &'a mut Floorplan,
    cfg: AnnealConfig,
    rng: SmallRng,
    start: Instant,
    interrupted: Arc<AtomicBool>,
    trace: Option<Box<dyn Write>>,
    move_stats: EnumMap<MoveKind, MoveStats>,
}

impl<'a> Annealer<'a> {
    /// `start` is the program start, not the annealer construction time:
    /// both deadlines are measured from it.
    pub fn new(plan: &'a mut Floorplan, cfg: AnnealConfig, seed: u64, start: Instant) -> Self {
        Annealer {
            plan,
            cfg,
            rng: SmallRng::seed_from_u64(seed),
            start,
            interrupted: Arc::new(AtomicBool::new(false)),
            trace: None,
            move_stats: EnumMap::default(),
        }
    }

    /// Flag checked at every loop boundary; flip it to wind the search
    /// down early (the Ctrl-C handler does).
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Streams one line per cooling round into `writer`.
    pub fn with_trace(mut self, writer: impl Write + 'static) -> Self {
        self.trace = Some(Box::new(writer));
        self
    }

    pub fn run(mut self) -> anyhow::Result<Solution> {
        let n = self.plan.blocks().len();
        if n < 2 {
            // nothing to permute; a single decode settles it
            return self.finish(&SeqPair::identity(n), None);
        }

        let pair = self.seed_pair();
        let (best_pair, best_dims) = self.metropolis(pair)?;
        self.finish(&best_pair, Some(best_dims))
    }

    /// Shuffle seeding: re-roll both sequences independently and keep the
    /// smallest-area pair, but only ever adopt a candidate whose area is
    /// within the configured multiple of the outline budget.
    fn seed_pair(&mut self) -> SeqPair {
        let deadline = self.start + Duration::from_secs(self.cfg.shuffle_deadline_secs);
        let area_budget = self.cfg.shuffle_area_factor * self.plan.outline().area() as f64;

        let mut pair = SeqPair::identity(self.plan.blocks().len());
        let mut best = pair.clone();
        let mut best_area = self.plan.pack(&pair).area();
        let mut adopted = 0usize;

        for _ in 0..self.cfg.shuffle_cap {
            if self.expired(deadline) {
                break;
            }
            pair.shuffle(&mut self.rng);
            let area = self.plan.pack(&pair).area();
            if (area as f64) < area_budget && area < best_area {
                best_area = area;
                best = pair.clone();
                adopted += 1;
            } else {
                pair = best.clone();
            }
        }

        debug!(target: "anneal", "seeding kept area {best_area} after {adopted} improvements");
        best
    }

    fn metropolis(&mut self, mut pair: SeqPair) -> anyhow::Result<(SeqPair, Dimensions)> {
        let n = pair.len();
        let uphill_limit = (self.cfg.moves_per_block * n) as u64;
        let move_limit = 2 * uphill_limit;
        let deadline = self.start + Duration::from_secs(self.cfg.abort_deadline_secs);
        let strict = self.cfg.strict_area_cost;

        let dims = self.plan.pack(&pair);
        let mut current = self.plan.cost(dims, strict);
        let mut best_pair = pair.clone();
        let mut best_cost = current;
        let mut best_dims = dims;

        let mut t = self.cfg.t_initial;
        let mut round = 0usize;

        'cooling: loop {
            let mut moves = 0u64;
            let mut uphill = 0u64;
            let mut rejects = 0u64;

            while uphill <= uphill_limit && moves <= move_limit {
                if self.expired(deadline) {
                    debug!(target: "anneal", "budget exhausted in round {round}");
                    break 'cooling;
                }

                let mv = self.draw_move(n);
                self.apply(&mut pair, mv);
                moves += 1;
                self.move_stats[mv.kind()].proposed += 1;

                let dims = self.plan.pack(&pair);
                let cost = self.plan.cost(dims, strict);
                let delta = cost - current;
                let feasible = self.plan.fits(dims);

                // A candidate inside the outline is taken no matter what
                // the Metropolis draw says.
                let accepted = delta < 0.0
                    || self.rng.gen_range(0.0..1.0) < (-delta / t).exp()
                    || feasible;

                if accepted {
                    if delta > 0.0 {
                        uphill += 1;
                    }
                    current = cost;
                    self.move_stats[mv.kind()].accepted += 1;
                    // Feasible candidates pin the best even when they cost
                    // more; a fitting answer beats a cheap one.
                    if cost < best_cost || feasible {
                        best_cost = cost;
                        best_dims = dims;
                        best_pair = pair.clone();
                    }
                } else {
                    self.apply(&mut pair, mv);
                    rejects += 1;
                }
            }

            let reject_ratio = rejects as f64 / moves as f64;
            debug!(
                target: "anneal",
                "round {round}: T={t:.3} moves={moves} uphill={uphill} rejects={rejects} best={best_cost:.1} ({best_dims})"
            );
            if let Some(trace) = &mut self.trace {
                writeln!(
                    trace,
                    "{round} {t:.6} {moves} {uphill} {rejects} {best_cost} {} {}",
                    best_dims.width, best_dims.height
                )
                .context("failed to write the anneal trace")?;
            }

            if reject_ratio > self.cfg.reject_ratio_limit {
                info!(target: "anneal", "search froze (reject ratio {reject_ratio:.3} in round {round})");
                break;
            }
            if self.expired(deadline) {
                break;
            }
            t *= self.cfg.cooling;
            round += 1;
        }

        Ok((best_pair, best_dims))
    }

    /// Restores the best pair, refreshes every coordinate, and runs the
    /// placement self-checks. Validation failures are decoder bugs and
    /// fatal.
    fn finish(mut self, best: &SeqPair, recorded: Option<Dimensions>) -> anyhow::Result<Solution> {
        let dims = self.plan.pack(best);
        if let Some(recorded) = recorded {
            assert_eq!(dims, recorded, "re-decoding the best pair changed the envelope");
        }

        if let Err(err) = self.plan.validate(dims) {
            error!(target: "anneal", "final placement failed to validate: {err:?}");
            panic!("the final placement failed to validate: {err}");
        }
        assert_all!(self.plan.blocks().iter(), |b: &Block| b.right_x() <= dims.width()
            && b.top_y() <= dims.height());

        for (kind, stats) in &self.move_stats {
            debug!(target: "anneal", "{kind:?}: accepted {}/{}", stats.accepted, stats.proposed);
        }

        let hpwl = self.plan.hpwl();
        let cost = self.plan.cost(dims, self.cfg.strict_area_cost);
        let elapsed = self.start.elapsed();
        info!(
            target: "anneal",
            "done: cost {cost:.1}, envelope {dims} (area {}), wirelength {hpwl}",
            dims.area()
        );

        Ok(Solution { dims, area: dims.area(), hpwl, cost, elapsed })
    }

    fn draw_move(&mut self, n: usize) -> Move {
        let pool = if cfg!(feature = "rotate-move") {
            cardinality::<MoveKind>()
        } else {
            cardinality::<MoveKind>() - 1
        };
        match all::<MoveKind>().nth(self.rng.gen_range(0..pool)).unwrap() {
            MoveKind::SwapPositive => {
                let (i, j) = self.distinct_pair(n);
                Move::SwapPositive { i, j }
            }
            MoveKind::SwapBoth => {
                let (a, b) = self.distinct_pair(n);
                Move::SwapBoth { a, b }
            }
            MoveKind::Rotate => Move::Rotate { block: self.rng.gen_range(0..n) },
        }
    }

    fn distinct_pair(&mut self, n: usize) -> (usize, usize) {
        let i = self.rng.gen_range(0..n);
        loop {
            let j = self.rng.gen_range(0..n);
            if j != i {
                return (i, j);
            }
        }
    }

    fn apply(&mut self, pair: &mut SeqPair, mv: Move) {
        match mv {
            Move::SwapPositive { i, j } => pair.swap_positive(i, j),
            Move::SwapBoth { a, b } => pair.swap_both(a, b),
            Move::Rotate { block } => self.plan.blocks_mut()[block].rotate(),
        }
    }

    fn expired(&self, deadline: Instant) -> bool {
        self.interrupted.load(Ordering::Relaxed) || Instant::now() >= deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squares(n: usize, side: u64) -> Vec<Block> {
        (0..n).map(|i| Block::new(format!("b{i}"), side, side)).collect()
    }

    fn test_config() -> AnnealConfig {
        AnnealConfig {
            abort_deadline_secs: 2,
            shuffle_deadline_secs: 1,
            shuffle_cap: 500,
            ..AnnealConfig::default()
        }
    }

    #[test]
    fn seven_squares_settle_inside_the_outline() {
        let mut plan = Floorplan::new(
            1.0,
            Dimensions::new(40, 40),
            squares(7, 10),
            vec![],
            vec![],
        );
        let sol = Annealer::new(&mut plan, test_config(), 0xF100, Instant::now())
            .run()
            .unwrap();
        assert!(plan.fits(sol.dims), "best envelope {} misses the outline", sol.dims);
        plan.validate(sol.dims).unwrap();
    }

    #[test]
    fn single_block_lands_at_the_origin() {
        let mut plan =
            Floorplan::new(0.5, Dimensions::new(50, 50), squares(1, 12), vec![], vec![]);
        let sol = Annealer::new(&mut plan, test_config(), 1, Instant::now()).run().unwrap();
        assert_eq!(sol.dims, Dimensions::new(12, 12));
        assert_eq!(sol.hpwl, 0);
        let b = &plan.blocks()[0];
        assert_eq!((b.left_x(), b.bottom_y()), (0, 0));
    }

    #[test]
    fn oversized_block_still_yields_a_report() {
        let mut plan =
            Floorplan::new(0.5, Dimensions::new(50, 50), squares(1, 100), vec![], vec![]);
        let sol = Annealer::new(&mut plan, test_config(), 9, Instant::now()).run().unwrap();
        assert_eq!(sol.dims, Dimensions::new(100, 100));
        assert!(!plan.fits(sol.dims));
        // both dimensions blow the outline, so no limit substitution applies
        assert_eq!(sol.cost, 0.5 * (100.0 * 100.0));
    }

    #[test]
    fn empty_instance_reports_zeroes() {
        let mut plan = Floorplan::new(0.5, Dimensions::new(50, 50), vec![], vec![], vec![]);
        let sol = Annealer::new(&mut plan, test_config(), 1, Instant::now()).run().unwrap();
        assert_eq!(sol.dims, Dimensions::default());
        assert_eq!(sol.area, 0);
        assert_eq!(sol.hpwl, 0);
        assert_eq!(sol.cost, 0.0);
    }

    #[test]
    fn interrupt_finalizes_the_best_so_far() {
        let mut plan = Floorplan::new(
            0.5,
            Dimensions::new(100, 100),
            squares(5, 10),
            vec![],
            vec![],
        );
        let annealer = Annealer::new(&mut plan, AnnealConfig::default(), 3, Instant::now());
        annealer.interrupt_handle().store(true, Ordering::Relaxed);
        // with the flag already set, both phases fall through immediately
        let sol = annealer.run().unwrap();
        plan.validate(sol.dims).unwrap();
    }
}
