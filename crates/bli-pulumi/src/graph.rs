//! Resource dependency graphs
//!
//! `pulumi stack graph` writes Graphviz DOT. [`ResourceGraph`] parses the
//! node and edge statements out of it and renders them as a tree, a flat
//! listing, or structured JSON/YAML.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::LazyLock;

use bli_core::Result;
use owo_colors::OwoColorize;
use regex::Regex;
use serde::Serialize;

static NODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Resource(\d+) \[label="([^"]+)"\];"#).expect("valid node regex")
});

static EDGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Resource(\d+) -> Resource(\d+)(?:\s*\[([^\]]*)\])?;").expect("valid edge regex")
});

static EDGE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"label\s*=\s*"([^"]+)""#).expect("valid edge label regex"));

/// Output formats for `bli graph`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GraphFormat {
    #[default]
    Dot,
    Json,
    Yaml,
}

impl GraphFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "dot" => Some(Self::Dot),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub urn: String,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl GraphNode {
    fn new(id: &str, urn: &str) -> Self {
        let (name, resource_type) = split_urn(urn);
        Self {
            id: id.to_string(),
            urn: urn.to_string(),
            name,
            resource_type,
        }
    }

    /// `name (type)` for URNs, the raw label otherwise
    pub fn display_name(&self) -> String {
        match &self.resource_type {
            Some(kind) => format!("{} ({})", self.name, kind),
            None => self.name.clone(),
        }
    }

    fn is_stack(&self) -> bool {
        self.urn.contains("::Stack::") || self.urn.contains(":Stack::")
    }
}

/// Edge `from -> to`: `from` depends on `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Split `urn:pulumi:<stack>::<project>::<type>::<name>` into name and type
fn split_urn(urn: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = urn.split("::").collect();
    if urn.starts_with("urn:pulumi:") && parts.len() >= 4 {
        let name = parts[parts.len() - 1].to_string();
        let kind = parts[parts.len() - 2].to_string();
        (name, Some(kind))
    } else {
        (urn.to_string(), None)
    }
}

impl ResourceGraph {
    pub fn parse(dot: &str) -> Self {
        let mut graph = Self::default();

        for caps in NODE_RE.captures_iter(dot) {
            let id = &caps[1];
            if graph.node(id).is_none() {
                graph.nodes.push(GraphNode::new(id, &caps[2]));
            }
        }

        for caps in EDGE_RE.captures_iter(dot) {
            let label = caps
                .get(3)
                .and_then(|attrs| EDGE_LABEL_RE.captures(attrs.as_str()))
                .map(|l| l[1].to_string());
            graph.edges.push(GraphEdge {
                from: caps[1].to_string(),
                to: caps[2].to_string(),
                label,
            });
        }

        graph
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The stack resource, or the first node when there is none
    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes
            .iter()
            .find(|n| n.is_stack())
            .or_else(|| self.nodes.first())
    }

    /// Target id to the ids of the resources depending on it
    pub fn dependents(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for edge in &self.edges {
            let sources = map.entry(edge.to.as_str()).or_default();
            if !sources.contains(&edge.from.as_str()) {
                sources.push(edge.from.as_str());
            }
        }
        map
    }

    /// Dependency tree rooted at the stack resource
    ///
    /// `resource_ids` maps URNs to cloud IDs and is appended to each line when
    /// present.
    pub fn render_tree(&self, resource_ids: &HashMap<String, String>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{}", "Resource Dependency Tree:".cyan());

        let Some(root) = self.root() else {
            let _ = writeln!(out, "{}", "No resources found in the graph.".yellow());
            return out;
        };

        let dependents = self.dependents();
        let mut path = Vec::new();
        self.write_node(&mut out, root, "", true, true, &dependents, resource_ids, &mut path);

        // Only the root line was written, fall back to a flat listing
        if out.lines().filter(|l| !l.trim().is_empty()).count() <= 2 && self.nodes.len() > 1 {
            let _ = writeln!(
                out,
                "{}",
                "Could not build proper tree structure. Listing all resources:".yellow()
            );
            for node in &self.nodes {
                let _ = writeln!(out, "  • {}", node.display_name());
            }
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn write_node<'g>(
        &'g self,
        out: &mut String,
        node: &'g GraphNode,
        prefix: &str,
        is_last: bool,
        is_root: bool,
        dependents: &BTreeMap<&str, Vec<&'g str>>,
        resource_ids: &HashMap<String, String>,
        path: &mut Vec<&'g str>,
    ) {
        if path.contains(&node.id.as_str()) {
            let connector = if is_last { "└── " } else { "├── " };
            let _ = writeln!(
                out,
                "{}{}{}",
                prefix,
                connector,
                format!("(cycle back to {})", node.display_name()).yellow()
            );
            return;
        }

        let detail = resource_ids
            .get(&node.urn)
            .map(|id| format!(" - ID: {}", id.yellow()))
            .unwrap_or_default();

        let child_prefix = if is_root {
            let _ = writeln!(out, "{}{}", node.display_name().green(), detail);
            String::new()
        } else {
            let connector = if is_last { "└── " } else { "├── " };
            let _ = writeln!(out, "{}{}{}{}", prefix, connector, node.display_name(), detail);
            format!("{}{}", prefix, if is_last { "    " } else { "│   " })
        };

        path.push(node.id.as_str());
        let children: Vec<&GraphNode> = dependents
            .get(node.id.as_str())
            .map(|ids| ids.iter().filter_map(|id| self.node(id)).collect())
            .unwrap_or_default();
        for (i, &child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            self.write_node(
                out,
                child,
                &child_prefix,
                last,
                false,
                dependents,
                resource_ids,
                path,
            );
        }
        path.pop();
    }

    /// Flat resource list followed by every dependency edge
    pub fn render_pretty(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{}", "Resources:".cyan());
        for node in &self.nodes {
            match &node.resource_type {
                Some(kind) => {
                    let _ = writeln!(out, "  {} ({})", node.name.green(), kind.cyan());
                }
                None => {
                    let _ = writeln!(out, "  {}", node.name.green());
                }
            }
        }

        let _ = writeln!(out, "\n{}", "Dependencies:".cyan());
        for edge in &self.edges {
            let from = self.node(&edge.from).map_or(edge.from.as_str(), |n| n.name.as_str());
            let to = self.node(&edge.to).map_or(edge.to.as_str(), |n| n.name.as_str());
            match &edge.label {
                Some(label) => {
                    let _ = writeln!(out, "  {} → {} ({})", from, to, label);
                }
                None => {
                    let _ = writeln!(out, "  {} → {}", from, to);
                }
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOT: &str = r##"strict digraph {
    Resource0 [label="urn:pulumi:dev::shop::pulumi:pulumi:Stack::shop-dev"];
    Resource1 [label="urn:pulumi:dev::shop::pulumi:providers:gcp::default"];
    Resource2 [label="urn:pulumi:dev::shop::gcp:storage/bucket:Bucket::assets"];
    Resource2 -> Resource0 [color = "#AA6639", label = "parent"];
    Resource2 -> Resource1 [color = "#246C60"];
    Resource3 [label="urn:pulumi:dev::shop::gcp:storage/bucketObject:BucketObject::logo"];
    Resource3 -> Resource2;
}
"##;

    #[test]
    fn test_parse_nodes_and_edges() {
        let graph = ResourceGraph::parse(DOT);
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 3);

        let bucket = graph.node("2").unwrap();
        assert_eq!(bucket.name, "assets");
        assert_eq!(bucket.resource_type.as_deref(), Some("gcp:storage/bucket:Bucket"));
        assert_eq!(graph.edges[0].label.as_deref(), Some("parent"));
        assert_eq!(graph.edges[1].label, None);
    }

    #[test]
    fn test_root_is_stack_resource() {
        let graph = ResourceGraph::parse(DOT);
        assert_eq!(graph.root().unwrap().name, "shop-dev");
    }

    #[test]
    fn test_tree_structure() {
        let graph = ResourceGraph::parse(DOT);
        let mut ids = HashMap::new();
        ids.insert(
            "urn:pulumi:dev::shop::gcp:storage/bucket:Bucket::assets".to_string(),
            "assets-123".to_string(),
        );
        let tree = graph.render_tree(&ids);

        assert!(tree.contains("Resource Dependency Tree:"));
        assert!(tree.contains("shop-dev (pulumi:pulumi:Stack)"));
        assert!(tree.contains("└── assets (gcp:storage/bucket:Bucket) - ID: "));
        assert!(tree.contains("assets-123"));
        assert!(tree.contains("    └── logo (gcp:storage/bucketObject:BucketObject)"));
    }

    #[test]
    fn test_tree_marks_cycles() {
        let dot = r#"
    Resource0 [label="urn:pulumi:dev::p::pulumi:pulumi:Stack::p-dev"];
    Resource1 [label="urn:pulumi:dev::p::gcp:compute/network:Network::a"];
    Resource2 [label="urn:pulumi:dev::p::gcp:compute/network:Network::b"];
    Resource1 -> Resource0;
    Resource2 -> Resource1;
    Resource1 -> Resource2;
"#;
        let tree = ResourceGraph::parse(dot).render_tree(&HashMap::new());
        assert!(tree.contains("(cycle back to a (gcp:compute/network:Network))"));
    }

    #[test]
    fn test_tree_empty_graph() {
        let tree = ResourceGraph::parse("strict digraph {\n}\n").render_tree(&HashMap::new());
        assert!(tree.contains("No resources found in the graph."));
    }

    #[test]
    fn test_tree_without_edges_lists_resources() {
        let dot = r#"
    Resource0 [label="urn:pulumi:dev::p::pulumi:pulumi:Stack::p-dev"];
    Resource1 [label="urn:pulumi:dev::p::gcp:storage/bucket:Bucket::loose"];
"#;
        let tree = ResourceGraph::parse(dot).render_tree(&HashMap::new());
        assert!(tree.contains("Could not build proper tree structure"));
        assert!(tree.contains("  • loose (gcp:storage/bucket:Bucket)"));
    }

    #[test]
    fn test_pretty_listing() {
        let pretty = ResourceGraph::parse(DOT).render_pretty();
        assert!(pretty.contains("Resources:"));
        assert!(pretty.contains("Dependencies:"));
        assert!(pretty.contains("assets → shop-dev (parent)"));
        assert!(pretty.contains("logo → assets"));
    }

    #[test]
    fn test_structured_formats() {
        let graph = ResourceGraph::parse(DOT);
        let json: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
        assert_eq!(json["nodes"][2]["type"], "gcp:storage/bucket:Bucket");
        assert_eq!(json["edges"][0]["label"], "parent");

        let yaml = graph.to_yaml().unwrap();
        assert!(yaml.contains("name: assets"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(GraphFormat::parse("JSON"), Some(GraphFormat::Json));
        assert_eq!(GraphFormat::parse("yml"), Some(GraphFormat::Yaml));
        assert_eq!(GraphFormat::parse("png"), None);
    }
}
