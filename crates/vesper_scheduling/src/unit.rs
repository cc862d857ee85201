//! The scheduling unit: a package paired with its pipeline schedules.

use std::collections::BTreeMap;
use vesper_ir::{FunctionId, NodeId, Package};

/// The pipeline schedule of a single function: a map from node to stage.
///
/// Backed by a `BTreeMap` so iteration order — and with it every diagnostic
/// derived from a schedule — is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSchedule {
    stages: BTreeMap<NodeId, u32>,
}

impl PipelineSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a node to a pipeline stage.
    pub fn set_stage(&mut self, node: NodeId, stage: u32) {
        self.stages.insert(node, stage);
    }

    /// Returns the stage of a node, if scheduled.
    pub fn stage(&self, node: NodeId) -> Option<u32> {
        self.stages.get(&node).copied()
    }

    /// Returns `true` if the node is scheduled.
    pub fn contains(&self, node: NodeId) -> bool {
        self.stages.contains_key(&node)
    }

    /// Drops a node from the schedule.
    pub fn remove_node(&mut self, node: NodeId) {
        self.stages.remove(&node);
    }

    /// Iterates over `(node, stage)` pairs in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, u32)> + '_ {
        self.stages.iter().map(|(&n, &s)| (n, s))
    }

    /// Returns the number of scheduled nodes.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if no nodes are scheduled.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the number of pipeline stages (highest stage plus one).
    pub fn stage_count(&self) -> u32 {
        self.stages.values().max().map_or(0, |max| max + 1)
    }
}

/// A package paired with a per-function schedule.
///
/// Scheduling passes keep the two halves consistent: every schedule entry
/// refers to a live node, and a discarded schedule must be rebuilt by a
/// scheduling pass before it is consumed.
#[derive(Debug)]
pub struct SchedulingUnit {
    /// The underlying package.
    pub package: Package,
    schedules: BTreeMap<FunctionId, PipelineSchedule>,
}

impl SchedulingUnit {
    /// Wraps a package with no schedules yet.
    pub fn new(package: Package) -> Self {
        Self {
            package,
            schedules: BTreeMap::new(),
        }
    }

    /// Returns the schedule of a function, if present.
    pub fn schedule(&self, function: FunctionId) -> Option<&PipelineSchedule> {
        self.schedules.get(&function)
    }

    /// Returns mutable access to the schedule of a function, if present.
    pub fn schedule_mut(&mut self, function: FunctionId) -> Option<&mut PipelineSchedule> {
        self.schedules.get_mut(&function)
    }

    /// Installs the schedule of a function.
    pub fn set_schedule(&mut self, function: FunctionId, schedule: PipelineSchedule) {
        self.schedules.insert(function, schedule);
    }

    /// Discards every schedule.
    pub fn clear_schedules(&mut self) {
        self.schedules.clear();
    }

    /// Returns `true` if any function has a schedule.
    pub fn has_schedules(&self) -> bool {
        !self.schedules.is_empty()
    }

    /// Iterates over `(function, schedule)` pairs in function order.
    pub fn schedules(&self) -> impl Iterator<Item = (FunctionId, &PipelineSchedule)> {
        self.schedules.iter().map(|(&f, s)| (f, s))
    }
}
