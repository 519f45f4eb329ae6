// src/dag/graph.rs

//! Immutable task graph.
//!
//! Tasks are declared once through [`TaskGraphBuilder`]; `build` validates
//! the declaration (see [`crate::dag::validate`]) and the resulting
//! [`TaskGraph`] is never mutated. Declaration order is kept so that ready
//! tasks are always dispatched in a stable order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::engine::TaskName;
use crate::errors::Result;
use crate::transform::TransformUnit;

/// What a task does once its prerequisites are done.
#[derive(Clone)]
pub enum TaskAction {
    /// No work of its own; groups prerequisites (e.g. `build`).
    Aggregate,
    /// Invoke a transformation unit.
    Transform(Arc<dyn TransformUnit>),
}

impl TaskAction {
    pub fn transform(unit: impl TransformUnit + 'static) -> Self {
        TaskAction::Transform(Arc::new(unit))
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, TaskAction::Aggregate)
    }
}

impl fmt::Debug for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::Aggregate => f.write_str("Aggregate"),
            TaskAction::Transform(unit) => write!(f, "Transform({})", unit.name()),
        }
    }
}

/// One declared task.
#[derive(Debug, Clone)]
pub struct TaskDecl {
    pub name: TaskName,
    pub prerequisites: Vec<TaskName>,
    pub action: TaskAction,
}

#[derive(Debug)]
struct Node {
    decl: TaskDecl,
    dependents: Vec<TaskName>,
}

/// Validated, immutable DAG of tasks.
#[derive(Debug)]
pub struct TaskGraph {
    order: Vec<TaskName>,
    nodes: HashMap<TaskName, Node>,
}

impl TaskGraph {
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::default()
    }

    /// Task names in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn decl(&self, name: &str) -> Option<&TaskDecl> {
        self.nodes.get(name).map(|n| &n.decl)
    }

    pub fn action_of(&self, name: &str) -> Option<&TaskAction> {
        self.decl(name).map(|d| &d.action)
    }

    pub fn prerequisites_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.decl.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// `target` plus all its transitive prerequisites.
    pub fn prerequisite_closure(&self, target: &str) -> HashSet<TaskName> {
        self.closure(target, |name| self.prerequisites_of(name))
    }

    /// `root` plus all its transitive dependents.
    pub fn dependent_closure(&self, root: &str) -> HashSet<TaskName> {
        self.closure(root, |name| self.dependents_of(name))
    }

    fn closure<'a>(&'a self, start: &str, next: impl Fn(&str) -> &'a [TaskName]) -> HashSet<TaskName> {
        let mut seen = HashSet::new();
        if !self.contains(start) {
            return seen;
        }
        let mut stack = vec![start.to_string()];
        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            stack.extend(next(&name).iter().cloned());
        }
        seen
    }

    /// True if `task` transitively depends on `other` (or is `other`).
    pub fn reaches(&self, task: &str, other: &str) -> bool {
        self.prerequisite_closure(task).contains(other)
    }

    /// A topological order of all tasks (prerequisites first).
    pub fn topological_order(&self) -> Vec<TaskName> {
        crate::dag::validate::topological_order(&self.order, |n| self.prerequisites_of(n))
            .unwrap_or_default()
    }
}

/// Collects task declarations and validates them into a [`TaskGraph`].
#[derive(Debug, Default)]
pub struct TaskGraphBuilder {
    decls: Vec<TaskDecl>,
}

impl TaskGraphBuilder {
    pub fn task<I, S>(mut self, name: impl Into<TaskName>, prerequisites: I, action: TaskAction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.decls.push(TaskDecl {
            name: name.into(),
            prerequisites: prerequisites.into_iter().map(Into::into).collect(),
            action,
        });
        self
    }

    pub fn decl(mut self, decl: TaskDecl) -> Self {
        self.decls.push(decl);
        self
    }

    /// Validate and freeze the graph.
    ///
    /// Fails with a configuration error for duplicate names, unknown or self
    /// prerequisites, and with [`crate::errors::AssetdagError::DagCycle`] for
    /// cycles. No action is invoked here.
    pub fn build(self) -> Result<TaskGraph> {
        crate::dag::validate::validate_decls(&self.decls)?;

        let order: Vec<TaskName> = self.decls.iter().map(|d| d.name.clone()).collect();
        let mut nodes: HashMap<TaskName, Node> = HashMap::with_capacity(self.decls.len());
        for decl in self.decls {
            nodes.insert(
                decl.name.clone(),
                Node {
                    decl,
                    dependents: Vec::new(),
                },
            );
        }

        for name in &order {
            let prereqs = nodes[name].decl.prerequisites.clone();
            for prereq in prereqs {
                if let Some(node) = nodes.get_mut(&prereq) {
                    node.dependents.push(name.clone());
                }
            }
        }

        Ok(TaskGraph { order, nodes })
    }
}
