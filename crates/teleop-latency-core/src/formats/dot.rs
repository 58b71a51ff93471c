//! Graphviz DOT text for a [`DiagramSpec`].
//!
//! Rendering to an image is left to the `dot` tool.

use crate::topology::{DiagramSpec, EdgeKind, NodeKind};

pub const GRAPH_NAME: &str = "SwimlaneFromTable";

/// Quote a DOT identifier or label.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn edge_attrs(kind: EdgeKind, label: Option<&str>) -> String {
    let mut attrs = Vec::new();
    if let Some(style) = kind.style() {
        attrs.push(format!("style={style}"));
    }
    if let Some(label) = label {
        attrs.push(format!("label={}", quote(label)));
    }
    if attrs.is_empty() {
        String::new()
    } else {
        format!(" [{}]", attrs.join(", "))
    }
}

/// Render a diagram as DOT source.
///
/// Each lane is a filled `cluster_<Lane>` subgraph holding its stage nodes
/// and sequential edges. Cross-lane, annotation and terminal edges follow at
/// top level.
#[must_use]
pub fn render_dot(spec: &DiagramSpec) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph {GRAPH_NAME} {{\n"));
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [fontname=\"Helvetica\"];\n");

    for cluster in &spec.clusters {
        out.push_str(&format!("  subgraph cluster_{} {{\n", cluster.lane));
        out.push_str(&format!("    label={};\n", quote(&cluster.label)));
        out.push_str("    style=filled; color=lightgrey; fontsize=20;\n");

        for id in &cluster.node_ids {
            if let Some(node) = spec.node(id) {
                let fill = node.color.map_or("white", |c| c.hex());
                out.push_str(&format!(
                    "    {} [label={}, shape=box, style=filled, fillcolor={}];\n",
                    quote(&node.id),
                    quote(&node.label),
                    quote(fill)
                ));
            }
        }

        for edge in spec.edges_of(EdgeKind::Sequential) {
            if cluster.node_ids.contains(&edge.from) {
                out.push_str(&format!("    {} -> {};\n", quote(&edge.from), quote(&edge.to)));
            }
        }
        out.push_str("  }\n");
    }

    for node in spec.nodes.iter().filter(|n| n.kind == NodeKind::Terminal) {
        out.push_str(&format!(
            "  {} [label={}, shape=note, style=filled, fillcolor=lightyellow];\n",
            quote(&node.id),
            quote(&node.label)
        ));
    }

    for edge in spec.edges.iter().filter(|e| e.kind != EdgeKind::Sequential) {
        out.push_str(&format!(
            "  {} -> {}{};\n",
            quote(&edge.from),
            quote(&edge.to),
            edge_attrs(edge.kind, edge.label.as_deref())
        ));
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::primitives::Scenario;
    use crate::runner::ScenarioRunner;

    fn typical_dot() -> String {
        let store = fixtures::reference_store();
        let artifacts = ScenarioRunner::new(&store)
            .with_topology(true)
            .resolve(Scenario::Typical)
            .unwrap();
        render_dot(&artifacts.diagram.unwrap())
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("x\ny"), "\"x\\ny\"");
        assert_eq!(quote("c:\\d"), "\"c:\\\\d\"");
    }

    #[test]
    fn graph_header_and_clusters() {
        let dot = typical_dot();
        assert!(dot.starts_with("digraph SwimlaneFromTable {\n  rankdir=LR;"));
        assert!(dot.ends_with("}\n"));
        for lane in ["Leader", "Network", "Follower", "Video"] {
            assert!(dot.contains(&format!("subgraph cluster_{lane} {{")));
        }
        assert!(dot.contains("label=\"Leader (total 13.0 ms)\";"));
        assert!(dot.contains(
            "  node [fontname=\"Helvetica\"];\n  subgraph cluster_Leader {\n    label="
        ));
        assert!(dot.contains("fillcolor=\"#F4CCCC\"];\n  }\n  subgraph cluster_Follower {\n"));
    }

    #[test]
    fn stage_nodes_are_filled_with_cost_color() {
        let dot = typical_dot();
        assert!(dot.contains(
            "\"Network_0\" [label=\"Command network one-way\\n5.8 ms\", shape=box, style=filled, fillcolor=\"#F4CCCC\"];"
        ));
    }

    #[test]
    fn edge_styles() {
        let dot = typical_dot();
        assert!(dot.contains("    \"Leader_0\" -> \"Leader_1\";"));
        assert!(dot.contains("  \"Leader_5\" -> \"Network_0\";"));
        assert!(dot.contains(
            "  \"Leader_0\" -> \"Follower_0\" [style=dashed, label=\"Direct timing correlation\"];"
        ));
        assert!(dot.contains("  \"Video_11\" -> \"TotalNode\" [style=bold];"));
        assert!(dot.contains("shape=note, style=filled, fillcolor=lightyellow"));
    }

    #[test]
    fn sequential_edges_stay_inside_their_cluster() {
        let dot = typical_dot();
        let network = dot.find("subgraph cluster_Network").unwrap();
        let follower = dot.find("subgraph cluster_Follower").unwrap();
        let leader_edge = dot.find("\"Leader_4\" -> \"Leader_5\"").unwrap();
        assert!(leader_edge < network);
        assert!(!dot[network..follower].contains("->"));
    }
}
