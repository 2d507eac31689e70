//! The Seymour decomposition driver.
//!
//! A matrix is decomposed by a FIFO work queue over decomposition nodes.
//! Processing a node dispatches, in order: the 1-sum split into connected
//! blocks, direct graphicness and cographicness tests, the R10 pattern
//! match, series-parallel reduction, the simple 3-separation patterns, the
//! nested minor sequence, and the full separation search. Discovered
//! separations split the node into 2-sum, Δ-sum, Y-sum or 3-sum children
//! (or apply a pivot, depending on [`DecomposeStrategy`]); each child
//! becomes a new task. A node with no further decomposition is a leaf:
//! graphic, cographic, planar, series-parallel, R10, or irregular.

pub(crate) mod nested;
pub mod sums;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::graphic::{test_graphic_transposed, GraphicOutcome};
use crate::matrix::{Matrix, Submatrix};
use crate::onesum::decompose_one_sum;
use crate::separation::{Separation, SeparationKind, Side};
use crate::series_parallel::{self, Reduction, SpOutcome};
use crate::{Deadline, Decision, Element, Error, Result};

pub use nested::NestedMinorSequence;
use nested::{search_separation, simple_three_separation, ExtendOutcome};
use sums::{
    delta_sum_decompose, three_sum_decompose, two_sum_decompose, y_sum_decompose, SumChild,
};

/// Identifier of a node inside a [`Decomposition`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// The kind of a decomposition node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Not determined yet (appears in aborted decompositions).
    Unknown,
    OneSum,
    TwoSum,
    DeltaSum,
    YSum,
    ThreeSum,
    /// A pivot sequence applied to make a separation tractable; one child.
    Pivots,
    /// A series-parallel node: either a leaf (fully reducible) or with the
    /// reduced submatrix as its only child.
    SeriesParallel,
    Graphic,
    Cographic,
    /// Graphic and cographic.
    Planar,
    R10,
    Irregular,
    /// A node holding only a violating submatrix.
    Submatrix,
    /// A node holding a violating determinant certificate.
    Determinant,
}

/// How distributed-rank 3-separations are decomposed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DistributedStrategy {
    DeltaSum,
    YSum,
    Pivot,
}

/// How concentrated-rank 3-separations are decomposed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConcentratedStrategy {
    ThreeSum,
    Pivot,
}

/// Selection of the 3-separation decomposition variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecomposeStrategy {
    pub distributed: DistributedStrategy,
    pub concentrated: ConcentratedStrategy,
}

/// Parameters of the decomposition driver.
#[derive(Copy, Clone, Debug)]
pub struct SeymourParams {
    /// Attempt graphicness (and cographicness) before SP decomposition.
    pub direct_graphicness: bool,
    /// After a positive graphicness test, also test cographicness to
    /// declare planarity.
    pub planarity_check: bool,
    /// Use series-parallel reductions; otherwise the first reduction is
    /// forced into a 2-sum.
    pub series_parallel: bool,
    /// Abort on the first irregularity verdict.
    pub stop_when_irregular: bool,
    /// Abort once some node is known to be non-graphic.
    pub stop_when_nongraphic: bool,
    /// Abort once some node is known to be non-cographic.
    pub stop_when_noncographic: bool,
    pub decompose_strategy: DecomposeStrategy,
}

impl Default for SeymourParams {
    fn default() -> SeymourParams {
        SeymourParams {
            direct_graphicness: true,
            planarity_check: false,
            series_parallel: true,
            stop_when_irregular: true,
            stop_when_nongraphic: false,
            stop_when_noncographic: false,
            decompose_strategy: DecomposeStrategy {
                distributed: DistributedStrategy::YSum,
                concentrated: ConcentratedStrategy::ThreeSum,
            },
        }
    }
}

/// Counters and timings of one decomposition run.
#[derive(Clone, Debug, Default)]
pub struct SeymourStats {
    pub total_count: usize,
    pub one_sum_count: usize,
    pub graphicness_count: usize,
    pub cographicness_count: usize,
    pub r10_count: usize,
    pub series_parallel_count: usize,
    pub simple_three_separation_count: usize,
    pub separation_search_count: usize,
    pub sequence_extension_count: usize,
    pub sum_count: usize,
    pub total_time: Duration,
}

/// A link from a parent node to one child.
#[derive(Clone, Debug)]
pub struct ChildLink {
    pub node: NodeId,
    /// Child row → element of the parent.
    pub rows_to_parent: Vec<Element>,
    /// Child column → element of the parent.
    pub columns_to_parent: Vec<Element>,
    /// Child rows forming the sum's connecting structure.
    pub special_rows: Vec<usize>,
    /// Child columns forming the sum's connecting structure.
    pub special_columns: Vec<usize>,
}

/// One node of a Seymour decomposition.
#[derive(Debug)]
pub struct SeymourNode {
    matrix: Matrix,
    transpose: Option<Matrix>,
    is_ternary: bool,
    kind: NodeKind,
    regularity: Decision,
    graphicness: Decision,
    cographicness: Decision,
    tested_two_connected: bool,
    tested_series_parallel: bool,
    tested_simple_three_separations: bool,
    tested_r10: bool,
    children: Vec<ChildLink>,
    graph: Option<GraphicOutcome>,
    cograph: Option<GraphicOutcome>,
    sp_reductions: Vec<Reduction>,
    pivot_rows: Vec<usize>,
    pivot_columns: Vec<usize>,
    violator: Option<Submatrix>,
    nested: Option<NestedMinorSequence>,
}

impl SeymourNode {
    fn new(matrix: Matrix, is_ternary: bool) -> SeymourNode {
        SeymourNode {
            matrix,
            transpose: None,
            is_ternary,
            kind: NodeKind::Unknown,
            regularity: Decision::Unknown,
            graphicness: Decision::Unknown,
            cographicness: Decision::Unknown,
            tested_two_connected: false,
            tested_series_parallel: false,
            tested_simple_three_separations: false,
            tested_r10: false,
            children: Vec::new(),
            graph: None,
            cograph: None,
            sp_reductions: Vec::new(),
            pivot_rows: Vec::new(),
            pivot_columns: Vec::new(),
            violator: None,
            nested: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn is_ternary(&self) -> bool {
        self.is_ternary
    }

    pub fn regularity(&self) -> Decision {
        self.regularity
    }

    pub fn graphicness(&self) -> Decision {
        self.graphicness
    }

    pub fn cographicness(&self) -> Decision {
        self.cographicness
    }

    pub fn children(&self) -> &[ChildLink] {
        &self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// The realising graph of a graphic or planar leaf.
    pub fn graph(&self) -> Option<&GraphicOutcome> {
        self.graph.as_ref()
    }

    /// The realising graph of the transpose of a cographic or planar leaf.
    pub fn cograph(&self) -> Option<&GraphicOutcome> {
        self.cograph.as_ref()
    }

    pub fn series_parallel_reductions(&self) -> &[Reduction] {
        &self.sp_reductions
    }

    pub fn pivots(&self) -> (&[usize], &[usize]) {
        (&self.pivot_rows, &self.pivot_columns)
    }

    pub fn violator(&self) -> Option<&Submatrix> {
        self.violator.as_ref()
    }

    /// The nested minor sequence recorded during the 3-connectivity phase.
    pub fn nested_minor_sequence(&self) -> Option<&NestedMinorSequence> {
        self.nested.as_ref()
    }

    fn ensure_transpose(&mut self) -> &Matrix {
        if self.transpose.is_none() {
            self.transpose = Some(self.matrix.transpose());
        }
        self.transpose.as_ref().unwrap()
    }
}

/// A Seymour decomposition tree, stored as an index arena.
#[derive(Debug)]
pub struct Decomposition {
    nodes: Vec<SeymourNode>,
    root: NodeId,
}

impl Decomposition {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SeymourNode {
        &self.nodes[id.0]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates over all nodes with their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SeymourNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// The regularity verdict of the root.
    pub fn regularity(&self) -> Decision {
        self.node(self.root).regularity
    }

    /// Propagates regularity, graphicness and cographicness from the
    /// leaves to the root.
    fn set_attributes(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.nodes[id.0].children.iter().map(|c| c.node).collect();
        for child in &children {
            self.set_attributes(*child);
        }
        let combine = |values: Vec<Decision>| -> Decision {
            if values.iter().any(|v| v.is_no()) {
                Decision::No
            } else if values.iter().any(|v| *v == Decision::Unknown) {
                Decision::Unknown
            } else {
                Decision::Yes
            }
        };
        if !children.is_empty() {
            let node = &self.nodes[id.0];
            if node.regularity == Decision::Unknown {
                let v = combine(children.iter().map(|c| self.nodes[c.0].regularity).collect());
                self.nodes[id.0].regularity = v;
            }
            if self.nodes[id.0].graphicness == Decision::Unknown {
                let v = combine(
                    children
                        .iter()
                        .map(|c| self.nodes[c.0].graphicness)
                        .collect(),
                );
                self.nodes[id.0].graphicness = v;
            }
            if self.nodes[id.0].cographicness == Decision::Unknown {
                let v = combine(
                    children
                        .iter()
                        .map(|c| self.nodes[c.0].cographicness)
                        .collect(),
                );
                self.nodes[id.0].cographicness = v;
            }
        } else if self.nodes[id.0].kind == NodeKind::Unknown {
            // An unprocessed leaf of an aborted run decides nothing.
        }
    }
}

struct Driver<'a> {
    nodes: Vec<SeymourNode>,
    queue: VecDeque<NodeId>,
    params: SeymourParams,
    stats: Option<&'a mut SeymourStats>,
    deadline: Deadline,
    found_irregularity: bool,
    found_nongraphicness: bool,
    found_noncographicness: bool,
}

/// Decomposes `matrix`; the entry point used by the regularity and TU
/// tests.
pub(crate) fn decompose(
    matrix: Matrix,
    ternary: bool,
    params: SeymourParams,
    mut stats: Option<&mut SeymourStats>,
    deadline: Deadline,
) -> Result<Decomposition> {
    let start = Instant::now();
    if let Some(stats) = stats.as_deref_mut() {
        stats.total_count += 1;
    }

    let mut driver = Driver {
        nodes: vec![SeymourNode::new(matrix, ternary)],
        queue: VecDeque::new(),
        params,
        stats,
        deadline,
        found_irregularity: false,
        found_nongraphicness: false,
        found_noncographicness: false,
    };
    let root = NodeId(0);
    driver.queue.push_back(root);

    while let Some(id) = driver.queue.pop_front() {
        if (driver.found_irregularity && params.stop_when_irregular)
            || (driver.found_nongraphicness && params.stop_when_nongraphic)
            || (driver.found_noncographicness && params.stop_when_noncographic)
        {
            break;
        }
        driver.process(id)?;
    }

    let mut decomposition = Decomposition {
        nodes: driver.nodes,
        root,
    };
    decomposition.set_attributes(root);
    if let Some(stats) = driver.stats {
        stats.total_time += start.elapsed();
    }
    Ok(decomposition)
}

impl Driver<'_> {
    fn bump<F: FnOnce(&mut SeymourStats)>(&mut self, f: F) {
        if let Some(stats) = self.stats.as_deref_mut() {
            f(stats);
        }
    }

    fn add_node(&mut self, matrix: Matrix, ternary: bool) -> NodeId {
        self.nodes.push(SeymourNode::new(matrix, ternary));
        NodeId(self.nodes.len() - 1)
    }

    fn attach_sum_child(&mut self, parent: NodeId, child: SumChild) -> NodeId {
        let ternary = self.nodes[parent.0].is_ternary;
        let id = self.add_node(child.matrix, ternary);
        self.nodes[parent.0].children.push(ChildLink {
            node: id,
            rows_to_parent: child.rows_to_parent,
            columns_to_parent: child.columns_to_parent,
            special_rows: child.special_rows,
            special_columns: child.special_columns,
        });
        self.queue.push_back(id);
        id
    }

    fn mark_irregular(&mut self, id: NodeId, violator: Option<Submatrix>) {
        let node = &mut self.nodes[id.0];
        node.kind = NodeKind::Irregular;
        node.regularity = Decision::No;
        node.violator = violator;
        self.found_irregularity = true;
    }

    fn process(&mut self, id: NodeId) -> Result<()> {
        if self.nodes[id.0].regularity.is_decided() {
            return Ok(());
        }

        // 1-sum decomposition into connected blocks.
        if !self.nodes[id.0].tested_two_connected && self.one_sum_step(id) {
            return Ok(());
        }

        // Direct leaf tests.
        if self.params.direct_graphicness && self.leaf_tests_step(id)? {
            return Ok(());
        }

        // R10 pattern.
        if !self.nodes[id.0].tested_r10 {
            self.bump(|s| s.r10_count += 1);
            self.nodes[id.0].tested_r10 = true;
            if is_r10(&self.nodes[id.0].matrix) {
                let node = &mut self.nodes[id.0];
                node.kind = NodeKind::R10;
                node.regularity = Decision::Yes;
                node.graphicness = Decision::No;
                node.cographicness = Decision::No;
                return Ok(());
            }
        }

        // Series-parallel reduction.
        if !self.nodes[id.0].tested_series_parallel {
            self.deadline.check()?;
            if self.series_parallel_step(id)? {
                return Ok(());
            }
        }

        // Simple 3-separations.
        if !self.nodes[id.0].tested_simple_three_separations {
            self.bump(|s| s.simple_three_separation_count += 1);
            self.nodes[id.0].tested_simple_three_separations = true;
            let transpose = self.nodes[id.0].ensure_transpose().clone();
            if let Some(separation) = simple_three_separation(&self.nodes[id.0].matrix, &transpose)
            {
                self.decompose_three_separation(id, separation)?;
                return Ok(());
            }
        }

        // Grow the nested minor sequence over the whole matrix.
        {
            let transpose = self.nodes[id.0].ensure_transpose().clone();
            let matrix = self.nodes[id.0].matrix.clone();
            let mut sequence = self.nodes[id.0].nested.take().unwrap_or_else(|| {
                // No wheel was recorded; seed with the first nonzero.
                let seed_row = (0..matrix.num_rows())
                    .find(|&r| matrix.row_len(r) > 0)
                    .unwrap_or(0);
                let seed_column = matrix.row(seed_row).0.first().copied().unwrap_or(0);
                NestedMinorSequence::from_wheel(&Submatrix::new(vec![seed_row], vec![seed_column]))
            });
            let deadline = self.deadline;
            let mut extensions = 0usize;
            while !sequence.covers(&matrix) {
                deadline.check()?;
                if sequence.extend(&matrix, &transpose) == ExtendOutcome::Covered {
                    break;
                }
                extensions += 1;
            }
            self.bump(|s| s.sequence_extension_count += extensions);
            self.nodes[id.0].nested = Some(sequence);
        }

        // Full separation search.
        self.deadline.check()?;
        self.bump(|s| s.separation_search_count += 1);
        match search_separation(&self.nodes[id.0].matrix)? {
            Some(separation) if separation.kind == SeparationKind::Two => {
                self.decompose_two_separation(id, separation)?;
            }
            Some(separation) => {
                self.decompose_three_separation(id, separation)?;
            }
            None => {
                // No separation left; the leaf tests decide (they ran
                // already when `direct_graphicness` is on).
                if self.leaf_tests_step(id)? {
                    return Ok(());
                }
                // Not graphic, not cographic, not R10 and 3-connected
                // beyond 3-separations: irregular.
                self.mark_irregular(id, None);
            }
        }
        Ok(())
    }

    /// Splits the node into connected blocks; returns `true` if children
    /// were created.
    fn one_sum_step(&mut self, id: NodeId) -> bool {
        self.nodes[id.0].tested_two_connected = true;
        let components = decompose_one_sum(&self.nodes[id.0].matrix);
        if components.len() <= 1 {
            return false;
        }
        self.bump(|s| s.one_sum_count += 1);
        self.nodes[id.0].kind = NodeKind::OneSum;
        let ternary = self.nodes[id.0].is_ternary;
        for component in components {
            let child = self.add_node(component.matrix, ternary);
            self.nodes[child.0].transpose = Some(component.transpose);
            self.nodes[id.0].children.push(ChildLink {
                node: child,
                rows_to_parent: component
                    .rows_to_original
                    .iter()
                    .map(|&r| Element::Row(r))
                    .collect(),
                columns_to_parent: component
                    .columns_to_original
                    .iter()
                    .map(|&c| Element::Column(c))
                    .collect(),
                special_rows: Vec::new(),
                special_columns: Vec::new(),
            });
            self.queue.push_back(child);
        }
        true
    }

    /// Tests the node matrix for graphicness and cographicness; returns
    /// `true` if the node became a leaf.
    fn leaf_tests_step(&mut self, id: NodeId) -> Result<bool> {
        if self.nodes[id.0].graphicness == Decision::Unknown {
            self.deadline.check()?;
            self.bump(|s| s.graphicness_count += 1);
            let transpose = self.nodes[id.0].ensure_transpose().support();
            match test_graphic_transposed(&transpose) {
                Some(outcome) => {
                    let node = &mut self.nodes[id.0];
                    node.graphicness = Decision::Yes;
                    node.regularity = Decision::Yes;
                    node.kind = NodeKind::Graphic;
                    node.graph = Some(outcome);
                    if self.params.planarity_check {
                        self.bump(|s| s.cographicness_count += 1);
                        let support = self.nodes[id.0].matrix.support();
                        if let Some(cograph) = test_graphic_transposed(&support) {
                            let node = &mut self.nodes[id.0];
                            node.cographicness = Decision::Yes;
                            node.kind = NodeKind::Planar;
                            node.cograph = Some(cograph);
                        } else {
                            self.nodes[id.0].cographicness = Decision::No;
                        }
                    }
                    return Ok(true);
                }
                None => {
                    self.nodes[id.0].graphicness = Decision::No;
                    self.found_nongraphicness = true;
                }
            }
        }
        if self.nodes[id.0].cographicness == Decision::Unknown {
            self.deadline.check()?;
            self.bump(|s| s.cographicness_count += 1);
            let support = self.nodes[id.0].matrix.support();
            match test_graphic_transposed(&support) {
                Some(outcome) => {
                    let node = &mut self.nodes[id.0];
                    node.cographicness = Decision::Yes;
                    node.regularity = Decision::Yes;
                    node.kind = NodeKind::Cographic;
                    node.cograph = Some(outcome);
                    return Ok(true);
                }
                None => {
                    self.nodes[id.0].cographicness = Decision::No;
                    self.found_noncographicness = true;
                }
            }
        }
        Ok(false)
    }

    /// Runs the series-parallel reduction; returns `true` if the node was
    /// fully handled (leaf, violator, or split).
    fn series_parallel_step(&mut self, id: NodeId) -> Result<bool> {
        self.bump(|s| s.series_parallel_count += 1);
        let ternary = self.nodes[id.0].is_ternary;

        if !self.params.series_parallel {
            // Forced 2-sum treatment of the first reduction. Matrices too
            // small to split are series-parallel leaves outright.
            let node = &self.nodes[id.0];
            if node.matrix.num_rows() + node.matrix.num_columns() <= 2 {
                let node = &mut self.nodes[id.0];
                node.kind = NodeKind::SeriesParallel;
                node.regularity = Decision::Yes;
                node.graphicness = Decision::Yes;
                node.cographicness = Decision::Yes;
                return Ok(true);
            }
            let result = series_parallel::decompose(&self.nodes[id.0].matrix, ternary, 1)?;
            if let SpOutcome::Violator(violator) = result.outcome {
                self.mark_irregular(id, Some(violator));
                return Ok(true);
            }
            let Some(&reduction) = result.reductions.first() else {
                self.nodes[id.0].tested_series_parallel = true;
                return Ok(false);
            };
            let separation = reduction_two_separation(&self.nodes[id.0].matrix, reduction);
            self.decompose_two_separation(id, separation)?;
            return Ok(true);
        }

        let result = series_parallel::decompose(&self.nodes[id.0].matrix, ternary, usize::MAX)?;
        match result.outcome {
            SpOutcome::Violator(violator) => {
                self.mark_irregular(id, Some(violator));
                Ok(true)
            }
            SpOutcome::SeriesParallel => {
                let node = &mut self.nodes[id.0];
                node.kind = NodeKind::SeriesParallel;
                node.sp_reductions = result.reductions;
                node.regularity = Decision::Yes;
                node.graphicness = Decision::Yes;
                node.cographicness = Decision::Yes;
                Ok(true)
            }
            outcome => {
                self.nodes[id.0].tested_series_parallel = true;
                if result.reductions.is_empty() {
                    // Work on the node itself.
                    match outcome {
                        SpOutcome::TwoSeparation(separation) => {
                            self.decompose_two_separation(id, separation)?;
                            Ok(true)
                        }
                        SpOutcome::Wheel(seed) => {
                            self.nodes[id.0].nested =
                                Some(NestedMinorSequence::from_wheel(&seed));
                            Ok(false)
                        }
                        _ => unreachable!(),
                    }
                } else {
                    // Wrap the residual as the single child of an SP node.
                    let node = &mut self.nodes[id.0];
                    node.kind = NodeKind::SeriesParallel;
                    node.sp_reductions = result.reductions;
                    let residual = node.matrix.filter(&result.reduced);
                    let child = self.add_node(residual, ternary);
                    self.nodes[child.0].tested_series_parallel = true;
                    self.nodes[child.0].tested_two_connected = true;
                    self.nodes[id.0].children.push(ChildLink {
                        node: child,
                        rows_to_parent: result
                            .reduced
                            .rows
                            .iter()
                            .map(|&r| Element::Row(r))
                            .collect(),
                        columns_to_parent: result
                            .reduced
                            .columns
                            .iter()
                            .map(|&c| Element::Column(c))
                            .collect(),
                        special_rows: Vec::new(),
                        special_columns: Vec::new(),
                    });
                    match outcome {
                        SpOutcome::Wheel(seed) => {
                            // Translate the seed into residual coordinates.
                            let rows = positions(&result.reduced.rows, &seed.rows);
                            let columns = positions(&result.reduced.columns, &seed.columns);
                            self.nodes[child.0].nested = Some(NestedMinorSequence::from_wheel(
                                &Submatrix::new(rows, columns),
                            ));
                            self.queue.push_back(child);
                        }
                        SpOutcome::TwoSeparation(separation) => {
                            self.decompose_two_separation(child, separation)?;
                        }
                        _ => unreachable!(),
                    }
                    Ok(true)
                }
            }
        }
    }

    fn decompose_two_separation(&mut self, id: NodeId, separation: Separation) -> Result<()> {
        self.bump(|s| s.sum_count += 1);
        let ternary = self.nodes[id.0].is_ternary;
        match two_sum_decompose(&self.nodes[id.0].matrix, &separation, ternary)? {
            Ok((first, second)) => {
                self.nodes[id.0].kind = NodeKind::TwoSum;
                self.attach_sum_child(id, first);
                self.attach_sum_child(id, second);
            }
            Err(violator) => self.mark_irregular(id, Some(violator)),
        }
        Ok(())
    }

    fn decompose_three_separation(&mut self, id: NodeId, separation: Separation) -> Result<()> {
        self.bump(|s| s.sum_count += 1);
        let ternary = self.nodes[id.0].is_ternary;
        let strategy = self.params.decompose_strategy;

        let pivot_requested = match separation.kind {
            SeparationKind::ThreeDistributed => {
                strategy.distributed == DistributedStrategy::Pivot
            }
            SeparationKind::ThreeConcentrated => {
                strategy.concentrated == ConcentratedStrategy::Pivot
            }
            SeparationKind::Two => false,
        };

        if pivot_requested {
            return self.pivot_and_decompose(id, separation);
        }

        match separation.kind {
            SeparationKind::ThreeDistributed => {
                let (first, second) = match strategy.distributed {
                    DistributedStrategy::DeltaSum => {
                        self.nodes[id.0].kind = NodeKind::DeltaSum;
                        delta_sum_decompose(&self.nodes[id.0].matrix, &separation, ternary)?
                    }
                    DistributedStrategy::YSum => {
                        self.nodes[id.0].kind = NodeKind::YSum;
                        y_sum_decompose(&self.nodes[id.0].matrix, &separation, ternary)?
                    }
                    DistributedStrategy::Pivot => unreachable!(),
                };
                self.attach_sum_child(id, first);
                self.attach_sum_child(id, second);
            }
            SeparationKind::ThreeConcentrated => {
                self.nodes[id.0].kind = NodeKind::ThreeSum;
                let (first, second) =
                    three_sum_decompose(&self.nodes[id.0].matrix, &separation, ternary)?;
                self.attach_sum_child(id, first);
                self.attach_sum_child(id, second);
            }
            SeparationKind::Two => unreachable!(),
        }
        Ok(())
    }

    /// Applies one pivot inside the low-rank block, which flips the
    /// separation between distributed and concentrated rank, then
    /// decomposes the pivoted child with the corresponding sum.
    fn pivot_and_decompose(&mut self, id: NodeId, separation: Separation) -> Result<()> {
        let matrix = self.nodes[id.0].matrix.clone();
        // A nonzero of a cross block.
        let mut pivot = None;
        'rows: for r in 0..matrix.num_rows() {
            let (columns, _) = matrix.row(r);
            for &c in columns {
                if separation.rows[r].side != separation.columns[c].side {
                    pivot = Some((r, c));
                    break 'rows;
                }
            }
        }
        let Some((pivot_row, pivot_col)) = pivot else {
            return Err(Error::Structure("separation has zero cross blocks"));
        };

        let ternary = self.nodes[id.0].is_ternary;
        let pivoted = if ternary {
            match matrix.ternary_pivot(pivot_row, pivot_col)? {
                Ok(pivoted) => pivoted,
                Err(violator) => {
                    self.mark_irregular(id, Some(violator));
                    return Ok(());
                }
            }
        } else {
            matrix.binary_pivot(pivot_row, pivot_col)?
        };

        // The pivot row and column swap sides.
        let mut separation = separation;
        separation.rows[pivot_row].side = opposite(separation.rows[pivot_row].side);
        separation.columns[pivot_col].side = opposite(separation.columns[pivot_col].side);
        separation.kind = match separation.kind {
            SeparationKind::ThreeDistributed => SeparationKind::ThreeConcentrated,
            SeparationKind::ThreeConcentrated => SeparationKind::ThreeDistributed,
            SeparationKind::Two => SeparationKind::Two,
        };

        self.nodes[id.0].kind = NodeKind::Pivots;
        self.nodes[id.0].pivot_rows = vec![pivot_row];
        self.nodes[id.0].pivot_columns = vec![pivot_col];
        let child = self.add_node(pivoted, ternary);
        let rows_to_parent = (0..matrix.num_rows()).map(Element::Row).collect();
        let columns_to_parent = (0..matrix.num_columns()).map(Element::Column).collect();
        self.nodes[id.0].children.push(ChildLink {
            node: child,
            rows_to_parent,
            columns_to_parent,
            special_rows: Vec::new(),
            special_columns: Vec::new(),
        });

        // Decompose the child directly with the non-pivot variant.
        let strategy_backup = self.params.decompose_strategy;
        self.params.decompose_strategy = DecomposeStrategy {
            distributed: if strategy_backup.distributed == DistributedStrategy::Pivot {
                DistributedStrategy::YSum
            } else {
                strategy_backup.distributed
            },
            concentrated: ConcentratedStrategy::ThreeSum,
        };
        let result = self.decompose_three_separation(child, separation);
        self.params.decompose_strategy = strategy_backup;
        result
    }
}

fn opposite(side: Side) -> Side {
    match side {
        Side::First => Side::Second,
        Side::Second => Side::First,
    }
}

/// Maps host indices to their positions within `ordered`.
fn positions(ordered: &[usize], values: &[usize]) -> Vec<usize> {
    values
        .iter()
        .map(|v| ordered.binary_search(v).expect("value is in residual"))
        .collect()
}

/// Builds the 2-separation induced by a single series-parallel reduction,
/// used when `series_parallel` is disabled.
fn reduction_two_separation(matrix: &Matrix, reduction: Reduction) -> Separation {
    let m = matrix.num_rows();
    let n = matrix.num_columns();
    let mate_is_row = reduction.mate.map_or(false, |mate| mate.is_row());

    // The big part sits opposite the reduced pair.
    let (default_side, pair_side) = if mate_is_row {
        (Side::First, Side::Second)
    } else {
        (Side::Second, Side::First)
    };
    let mut rows = vec![default_side; m];
    let mut columns = vec![default_side; n];
    match reduction.element {
        Element::Row(r) => rows[r] = pair_side,
        Element::Column(c) => columns[c] = pair_side,
    }
    if let Some(mate) = reduction.mate {
        match mate {
            Element::Row(r) => rows[r] = pair_side,
            Element::Column(c) => columns[c] = pair_side,
        }
    }
    Separation::new(SeparationKind::Two, rows, columns)
}

/// Matches the 5×5 support against the two standard R10 representation
/// matrices (and their transposes) under row and column permutations.
fn is_r10(matrix: &Matrix) -> bool {
    if matrix.num_rows() != 5 || matrix.num_columns() != 5 {
        return false;
    }
    let support = matrix.support();
    let nnz = support.num_nonzeros();
    let circulant = Matrix::from_dense(&[
        &[1, 0, 0, 1, 1],
        &[1, 1, 0, 0, 1],
        &[0, 1, 1, 0, 1],
        &[0, 0, 1, 1, 1],
        &[1, 1, 1, 1, 1],
    ]);
    let symmetric = Matrix::from_dense(&[
        &[1, 1, 0, 0, 1],
        &[1, 1, 1, 0, 0],
        &[0, 1, 1, 1, 0],
        &[0, 0, 1, 1, 1],
        &[1, 0, 0, 1, 1],
    ]);
    let candidates = [&circulant, &symmetric];
    let transpose = support.transpose();
    for candidate in candidates {
        if candidate.num_nonzeros() != nnz {
            continue;
        }
        if permuted_equal(&support, candidate) || permuted_equal(&transpose, candidate) {
            return true;
        }
    }
    false
}

/// Checks whether some row and column permutation maps `a` onto `b`.
fn permuted_equal(a: &Matrix, b: &Matrix) -> bool {
    let n = a.num_rows();
    debug_assert_eq!(n, 5);
    let mut row_perm: Vec<usize> = (0..n).collect();
    let mut col_perm: Vec<usize> = (0..n).collect();
    permute_search(a, b, &mut row_perm, 0, &mut col_perm)
}

fn permute_search(
    a: &Matrix,
    b: &Matrix,
    row_perm: &mut Vec<usize>,
    depth: usize,
    col_perm: &mut Vec<usize>,
) -> bool {
    let n = row_perm.len();
    if depth == n {
        // Rows fixed; try all column permutations.
        return col_permute_search(a, b, row_perm, col_perm, 0);
    }
    for i in depth..n {
        row_perm.swap(depth, i);
        if a.row_len(row_perm[depth]) == b.row_len(depth)
            && permute_search(a, b, row_perm, depth + 1, col_perm)
        {
            return true;
        }
        row_perm.swap(depth, i);
    }
    false
}

fn col_permute_search(
    a: &Matrix,
    b: &Matrix,
    row_perm: &[usize],
    col_perm: &mut Vec<usize>,
    depth: usize,
) -> bool {
    let n = col_perm.len();
    if depth == n {
        return true;
    }
    for i in depth..n {
        col_perm.swap(depth, i);
        // Column `depth` of the permuted `a` must match column `depth`
        // of `b` on all rows.
        let consistent = (0..n).all(|r| {
            (a.get(row_perm[r], col_perm[depth]) != 0) == (b.get(r, depth) != 0)
        });
        if consistent && col_permute_search(a, b, row_perm, col_perm, depth + 1) {
            return true;
        }
        col_perm.swap(depth, i);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_r10_circulant() {
        let r10 = Matrix::from_dense(&[
            &[1, 0, 0, 1, 1],
            &[1, 1, 0, 0, 1],
            &[0, 1, 1, 0, 1],
            &[0, 0, 1, 1, 1],
            &[1, 1, 1, 1, 1],
        ]);
        assert!(is_r10(&r10));
    }

    #[test]
    fn recognises_r10_under_permutation() {
        let r10 = Matrix::from_dense(&[
            &[1, 1, 1, 1, 1],
            &[1, 0, 0, 1, 1],
            &[0, 1, 1, 0, 1],
            &[0, 0, 1, 1, 1],
            &[1, 1, 0, 0, 1],
        ]);
        assert!(is_r10(&r10));
    }

    #[test]
    fn rejects_wheel() {
        let w4 = Matrix::from_dense(&[
            &[1, 0, 0, 1, 1],
            &[1, 1, 0, 0, 1],
            &[0, 1, 1, 0, 1],
            &[0, 0, 1, 1, 1],
            &[1, 1, 1, 1, 0],
        ]);
        assert!(!is_r10(&w4));
    }
}
