//! # Topology Builder
//!
//! Builds the swimlane diagram description from a [`LatencyModel`].
//!
//! The diagram has one node per stage (clustered by lane), a chain of
//! sequential edges inside each lane, fixed cross-lane links, two
//! annotation-only dashed edges, and a terminal node carrying the overall
//! total. Cross-lane wiring refers to the first/last stage of a lane, never
//! to a numeric position, so changing a lane's stage list cannot silently
//! rewire the graph.

use crate::classifier::Color;
use crate::model::{LaneStages, LatencyModel};
use crate::primitives::{Lane, Scenario};
use std::collections::BTreeSet;

/// Id of the synthetic terminal node.
pub const TERMINAL_NODE_ID: &str = "TotalNode";

/// Title line of the terminal node label.
pub const TERMINAL_TITLE: &str = "Overall Command→Photon";

// =============================================================================
// EDGE & NODE TYPES
// =============================================================================

/// Role of an edge in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// Consecutive stages within one lane.
    Sequential,
    /// Exit of one lane into the entry of the next.
    CrossLane,
    /// Dashed, label-only relationship. Not part of the timing path.
    Annotation,
    /// Bold edge into the terminal node.
    Terminal,
}

impl EdgeKind {
    /// Render style, if not the default solid line.
    #[must_use]
    pub const fn style(self) -> Option<&'static str> {
        match self {
            EdgeKind::Sequential | EdgeKind::CrossLane => None,
            EdgeKind::Annotation => Some("dashed"),
            EdgeKind::Terminal => Some("bold"),
        }
    }

    /// Whether durations accumulate along this edge.
    #[must_use]
    pub const fn is_timing_path(self) -> bool {
        !matches!(self, EdgeKind::Annotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Stage,
    Terminal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// `None` for the terminal node.
    pub lane: Option<Lane>,
    /// `None` for the terminal node.
    pub duration_ms: Option<f64>,
    /// `None` for the terminal node.
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub label: Option<String>,
}

/// The nodes of one lane, grouped for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneCluster {
    pub lane: Lane,
    pub label: String,
    pub node_ids: Vec<String>,
}

// =============================================================================
// FIXED WIRING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    First,
    Last,
}

/// Last stage of the first lane → first stage of the second.
const CROSS_LANE_LINKS: [(Lane, Lane); 3] = [
    (Lane::Leader, Lane::Network),
    (Lane::Network, Lane::Follower),
    (Lane::Follower, Lane::Video),
];

struct Annotation {
    from: (Lane, End),
    to: (Lane, End),
    label: &'static str,
}

const ANNOTATIONS: [Annotation; 2] = [
    // Out-of-band physical timing reference between the two arms.
    Annotation {
        from: (Lane::Leader, End::First),
        to: (Lane::Follower, End::First),
        label: "Direct timing correlation",
    },
    // The video path runs independently of the command path.
    Annotation {
        from: (Lane::Video, End::First),
        to: (Lane::Video, End::Last),
        label: "Video-only",
    },
];

/// The lane whose exit feeds the terminal node.
const TERMINAL_LANE: Lane = Lane::Video;

// =============================================================================
// DIAGRAM SPEC
// =============================================================================

/// A complete directed-graph description, ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSpec {
    pub scenario: Scenario,
    pub clusters: Vec<LaneCluster>,
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub overall_ms: f64,
}

impl DiagramSpec {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn stage_nodes(&self) -> impl Iterator<Item = &DiagramNode> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Stage)
    }

    #[must_use]
    pub fn terminal(&self) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Terminal)
    }

    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &DiagramEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    #[must_use]
    pub fn count(&self, kind: EdgeKind) -> usize {
        self.edges_of(kind).count()
    }

    /// Sum of stage durations along the timing path, from the entry of the
    /// first lane to the terminal node.
    ///
    /// Returns `None` if the path branches, dead-ends, or loops before the
    /// terminal node.
    #[must_use]
    pub fn timing_path_ms(&self) -> Option<f64> {
        let mut current = self.clusters.iter().find_map(|c| c.node_ids.first())?;
        let mut visited = BTreeSet::new();
        let mut total = 0.0;

        while current != TERMINAL_NODE_ID {
            if !visited.insert(current.clone()) {
                return None;
            }
            total += self.node(current)?.duration_ms?;

            let mut next = self
                .edges
                .iter()
                .filter(|e| e.kind.is_timing_path() && &e.from == current);
            let edge = next.next()?;
            if next.next().is_some() {
                return None;
            }
            current = &edge.to;
        }

        Some(total)
    }
}

// =============================================================================
// TOPOLOGY BUILDER
// =============================================================================

/// Builds a [`DiagramSpec`] from a resolved model.
pub struct TopologyBuilder;

impl TopologyBuilder {
    /// Node id for the `index`-th stage of `lane`.
    #[must_use]
    pub fn stage_node_id(lane: Lane, index: usize) -> String {
        format!("{}_{}", lane, index)
    }

    #[must_use]
    pub fn build(model: &LatencyModel) -> DiagramSpec {
        let mut clusters = Vec::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for lane in model.lanes() {
            let ids: Vec<String> = (0..lane.len())
                .map(|i| Self::stage_node_id(lane.lane, i))
                .collect();

            for (id, stage) in ids.iter().zip(&lane.stages) {
                nodes.push(DiagramNode {
                    id: id.clone(),
                    label: format!("{}\n{:.1} ms", stage.name, stage.duration_ms),
                    kind: NodeKind::Stage,
                    lane: Some(lane.lane),
                    duration_ms: Some(stage.duration_ms),
                    color: Some(stage.color),
                });
            }

            for pair in ids.windows(2) {
                edges.push(edge(&pair[0], &pair[1], EdgeKind::Sequential, None));
            }

            clusters.push(LaneCluster {
                lane: lane.lane,
                label: format!("{} (total {:.1} ms)", lane.lane, model.total(lane.lane)),
                node_ids: ids,
            });
        }

        for (from, to) in CROSS_LANE_LINKS {
            if let (Some(a), Some(b)) = (
                endpoint(model, from, End::Last),
                endpoint(model, to, End::First),
            ) {
                edges.push(edge(&a, &b, EdgeKind::CrossLane, None));
            }
        }

        for annotation in &ANNOTATIONS {
            let (from_lane, from_end) = annotation.from;
            let (to_lane, to_end) = annotation.to;
            if let (Some(a), Some(b)) = (
                endpoint(model, from_lane, from_end),
                endpoint(model, to_lane, to_end),
            ) {
                edges.push(edge(&a, &b, EdgeKind::Annotation, Some(annotation.label)));
            }
        }

        nodes.push(DiagramNode {
            id: TERMINAL_NODE_ID.to_string(),
            label: format!("{}\n{:.1} ms", TERMINAL_TITLE, model.overall()),
            kind: NodeKind::Terminal,
            lane: None,
            duration_ms: None,
            color: None,
        });
        if let Some(last) = endpoint(model, TERMINAL_LANE, End::Last) {
            edges.push(edge(&last, TERMINAL_NODE_ID, EdgeKind::Terminal, None));
        }

        DiagramSpec {
            scenario: model.scenario,
            clusters,
            nodes,
            edges,
            overall_ms: model.overall(),
        }
    }
}

fn endpoint(model: &LatencyModel, lane: Lane, end: End) -> Option<String> {
    let stages: &LaneStages = model.lane(lane)?;
    let index = match end {
        End::First if !stages.is_empty() => 0,
        End::Last => stages.len().checked_sub(1)?,
        End::First => return None,
    };
    Some(TopologyBuilder::stage_node_id(lane, index))
}

fn edge(from: &str, to: &str, kind: EdgeKind, label: Option<&str>) -> DiagramEdge {
    DiagramEdge {
        from: from.to_string(),
        to: to.to_string(),
        kind,
        label: label.map(str::to_string),
    }
}

// =============================================================================
// TESTS
// =============================================================================
