//! Parent/child queries over the activity graph.

use std::collections::{HashSet, VecDeque};

use super::{ActivityGraph, ActivityIdx};
use crate::trace::{ActivityId, ExecutionInfo};

/// How `a` relates to `b` in a direct (one-edge) relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    None,
    /// `a` is the parent of `b`.
    Parent,
    /// `a` is a child of `b`.
    Child,
}

/// Restricts traversal to activities seen in one execution.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub execution: Option<ExecutionInfo>,
    /// With thread-level executions, match on the process instead of the thread.
    pub allow_cross_thread: bool,
}

impl Scope {
    /// No restriction at all.
    pub fn unscoped() -> Self {
        Self::default()
    }

    pub fn execution(execution: ExecutionInfo) -> Self {
        Self {
            execution: Some(execution),
            allow_cross_thread: false,
        }
    }

    pub fn allow_cross_thread(mut self, allow: bool) -> Self {
        self.allow_cross_thread = allow;
        self
    }

    fn matches(&self, execution: &ExecutionInfo) -> bool {
        match &self.execution {
            None => true,
            Some(scope) if self.allow_cross_thread => scope.same_process(execution),
            Some(scope) => scope == execution,
        }
    }

    fn admits(&self, graph: &ActivityGraph, idx: ActivityIdx) -> bool {
        if self.execution.is_none() {
            return true;
        }
        graph
            .activity(idx)
            .records
            .iter()
            .filter_map(|&id| graph.record(id))
            .any(|record| self.matches(&record.execution))
    }
}

impl ActivityGraph {
    /// Direct relationship between two activities, if both are in scope.
    pub fn relationship(&self, a: ActivityIdx, b: ActivityIdx, scope: &Scope) -> Relationship {
        if !scope.admits(self, a) || !scope.admits(self, b) {
            return Relationship::None;
        }
        if self.activity(b).parent == Some(a) {
            Relationship::Parent
        } else if self.activity(a).parent == Some(b) {
            Relationship::Child
        } else {
            Relationship::None
        }
    }

    /// [`relationship`](Self::relationship) by id; unknown ids are unrelated.
    pub fn direct_relationship(&self, a: &ActivityId, b: &ActivityId, scope: &Scope) -> Relationship {
        match (self.index_of(a), self.index_of(b)) {
            (Some(a), Some(b)) => self.relationship(a, b, scope),
            _ => Relationship::None,
        }
    }

    /// All descendants of `root` reachable through in-scope activities,
    /// breadth-first, excluding `root`.
    ///
    /// Each activity is visited at most once, so a transfer cycle ends the
    /// walk instead of looping.
    pub fn descendants(&self, root: ActivityIdx, scope: &Scope) -> Vec<ActivityIdx> {
        let mut visited = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for &child in &self.activity(current).children {
                if visited.insert(child) && scope.admits(self, child) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found
    }

    /// [`descendants`](Self::descendants) by id; an unknown id has none.
    pub fn child_activities(&self, root: &ActivityId, scope: &Scope) -> Vec<ActivityIdx> {
        self.index_of(root)
            .map(|idx| self.descendants(idx, scope))
            .unwrap_or_default()
    }
}
