//! Depth and branch assignment for drawing a history graph.
//!
//! Presentation only; nothing in the storage path reads a layout.

use std::collections::HashMap;

use wls_types::NodeId;

use crate::worldline::WorldLine;

/// Where a single node sits in the drawn graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeLayout {
    /// Distance from the node's root (roots are 0).
    pub depth: usize,
    /// Branch lane. A first child shares its parent's lane; every later
    /// sibling, and every root after the first, opens a new lane.
    pub branch: usize,
}

/// Layout of a whole world-line.
#[derive(Clone, Debug, Default)]
pub struct HistoryLayout {
    nodes: HashMap<NodeId, NodeLayout>,
    order: Vec<NodeId>,
    branch_count: usize,
}

impl HistoryLayout {
    /// One depth-first pass from each root, children in append order.
    pub fn compute(line: &WorldLine) -> Self {
        let mut layout = Self::default();

        // (node, depth, inherited lane)
        let mut stack: Vec<(&NodeId, usize, Option<usize>)> = line
            .roots()
            .into_iter()
            .rev()
            .map(|n| (&n.id, 0, None))
            .collect();

        while let Some((id, depth, inherited)) = stack.pop() {
            let branch = match inherited {
                Some(branch) => branch,
                None => {
                    layout.branch_count += 1;
                    layout.branch_count - 1
                }
            };
            layout.nodes.insert(id.clone(), NodeLayout { depth, branch });
            layout.order.push(id.clone());

            for (i, child) in line.children_of(id).into_iter().enumerate().rev() {
                let lane = (i == 0).then_some(branch);
                stack.push((&child.id, depth + 1, lane));
            }
        }

        layout
    }

    pub fn get(&self, id: &NodeId) -> Option<NodeLayout> {
        self.nodes.get(id).copied()
    }

    /// Node ids in depth-first visiting order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of lanes allocated.
    pub fn branch_count(&self) -> usize {
        self.branch_count
    }

    /// Deepest depth in the layout.
    pub fn max_depth(&self) -> usize {
        self.nodes.values().map(|l| l.depth).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
