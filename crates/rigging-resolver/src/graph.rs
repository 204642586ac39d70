//! Resolved dependency graph and tree reports.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rigging_core::coordinate::{ModuleId, ModuleVersionId};

/// A node in the resolved graph: the configuration itself, or the selected
/// version of a module.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum GraphNode {
    Root(String),
    Module(ModuleVersionId),
}

impl GraphNode {
    /// Index key: `group:name` for modules, so only one version exists per module.
    pub fn key(&self) -> String {
        match self {
            GraphNode::Root(name) => format!("configuration '{name}'"),
            GraphNode::Module(id) => id.module().to_string(),
        }
    }

    pub fn module(&self) -> Option<&ModuleVersionId> {
        match self {
            GraphNode::Root(_) => None,
            GraphNode::Module(id) => Some(id),
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphNode::Root(name) => write!(f, "{name}"),
            GraphNode::Module(id) => write!(f, "{id}"),
        }
    }
}

/// Edge label: what the parent asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Declared version string, `None` when the declaration had no version.
    pub requested: Option<String>,
    /// Target configuration on the child module.
    pub configuration: String,
}

/// A resolved dependency graph backed by petgraph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, DependencyEdge>,
    index: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    /// An empty graph rooted at `configuration`.
    pub fn new(configuration: &str) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(GraphNode::Root(configuration.to_string()));
        Self {
            graph,
            index: HashMap::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Add or retrieve the node of a module. A module has one node whatever
    /// version is passed after the first.
    pub fn add_module(&mut self, id: ModuleVersionId) -> NodeIndex {
        let key = id.module().to_string();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode::Module(id));
        self.index.insert(key, idx);
        idx
    }

    /// Add a dependency edge from `from` to `to`, once per pair.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DependencyEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    /// Look up a module node by `group:name`.
    pub fn find(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn find_module(&self, module: &ModuleId) -> Option<&ModuleVersionId> {
        self.find(&module.to_string())
            .and_then(|idx| self.graph[idx].module())
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// All resolved modules, in insertion order.
    pub fn modules(&self) -> Vec<&ModuleVersionId> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].module())
            .collect()
    }

    /// Direct dependencies of a node, in the order they were declared.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DependencyEdge)> {
        // petgraph iterates outgoing edges newest first
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        deps.reverse();
        deps
    }

    /// Reverse dependencies (who depends on this node).
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DependencyEdge)> {
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect();
        deps.reverse();
        deps
    }

    /// Render the tree below the root.
    ///
    /// A request redirected by conflict resolution shows as
    /// `group:name:requested -> selected`; a module whose subtree was already
    /// printed is marked `(*)`.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = format!("{}\n", self.graph[self.root]);
        let deps = self.dependencies_of(self.root);
        if deps.is_empty() {
            output.push_str("No dependencies\n");
            return output;
        }
        let mut expanded = HashSet::new();
        let mut path = HashSet::new();
        let count = deps.len();
        for (i, (idx, edge)) in deps.iter().enumerate() {
            self.print_subtree(
                &mut output,
                TreeLine {
                    idx: *idx,
                    edge,
                    prefix: "",
                    is_last: i == count - 1,
                    depth: 1,
                },
                max_depth,
                &mut expanded,
                &mut path,
            );
        }
        output
    }

    fn print_subtree(
        &self,
        output: &mut String,
        line: TreeLine<'_>,
        max_depth: Option<usize>,
        expanded: &mut HashSet<NodeIndex>,
        path: &mut HashSet<NodeIndex>,
    ) {
        let connector = if line.is_last { "└── " } else { "├── " };
        let label = self.edge_label(line.idx, line.edge);
        let children = self.dependencies_of(line.idx);
        let repeated = !children.is_empty() && (expanded.contains(&line.idx) || path.contains(&line.idx));
        let marker = if repeated { " (*)" } else { "" };
        output.push_str(&format!("{}{connector}{label}{marker}\n", line.prefix));

        if repeated || max_depth.is_some_and(|max| line.depth >= max) {
            return;
        }
        expanded.insert(line.idx);
        path.insert(line.idx);

        let child_prefix = format!("{}{}", line.prefix, if line.is_last { "    " } else { "│   " });
        let count = children.len();
        for (i, (child, edge)) in children.iter().enumerate() {
            self.print_subtree(
                output,
                TreeLine {
                    idx: *child,
                    edge,
                    prefix: &child_prefix,
                    is_last: i == count - 1,
                    depth: line.depth + 1,
                },
                max_depth,
                expanded,
                path,
            );
        }
        path.remove(&line.idx);
    }

    fn edge_label(&self, idx: NodeIndex, edge: &DependencyEdge) -> String {
        let GraphNode::Module(id) = &self.graph[idx] else {
            return self.graph[idx].to_string();
        };
        match edge.requested.as_deref() {
            Some(requested) if requested == id.version => id.to_string(),
            Some(requested) => format!("{}:{requested} -> {}", id.module(), id.version),
            None => format!("{} -> {}", id.module(), id.version),
        }
    }

    /// Find the path from the root to a module.
    ///
    /// Accepts either `group:name` or just `name`.
    pub fn find_path(&self, target_key: &str) -> Option<Vec<&GraphNode>> {
        let target = self.resolve_key(target_key)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(self.root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    /// Exact `group:name` first, then the first module with that name.
    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        if let Some(&idx) = self.index.get(key) {
            return Some(idx);
        }
        self.graph.node_indices().find(|&idx| {
            self.graph[idx]
                .module()
                .is_some_and(|id| id.name == key)
        })
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Inverted tree for one module: who pulls it in, up to the root.
    pub fn print_inverted_tree(&self, target_key: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.resolve_key(target_key) else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(&mut output, *dep_idx, "", i == count - 1, &mut visited);
        }
        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(output, *dep_idx, &child_prefix, i == count - 1, visited);
        }

        visited.remove(&idx);
    }

    /// Number of module nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct TreeLine<'a> {
    idx: NodeIndex,
    edge: &'a DependencyEdge,
    prefix: &'a str,
    is_last: bool,
    depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ModuleVersionId {
        ModuleVersionId::parse(s).unwrap()
    }

    fn edge(requested: &str) -> DependencyEdge {
        DependencyEdge {
            requested: Some(requested.to_string()),
            configuration: "default".to_string(),
        }
    }

    /// compile -> a:1.0 -> c:3.0, compile -> b:2.0 -> c (asked 2.0)
    fn sample() -> DependencyGraph {
        let mut g = DependencyGraph::new("compile");
        let root = g.root();
        let a = g.add_module(id("org.a:a:1.0"));
        let b = g.add_module(id("org.b:b:2.0"));
        let c = g.add_module(id("org.c:c:3.0"));
        let d = g.add_module(id("org.d:d:1.0"));
        g.add_edge(root, a, edge("1.0"));
        g.add_edge(root, b, edge("2.0"));
        g.add_edge(a, c, edge("3.0"));
        g.add_edge(b, c, edge("2.0"));
        g.add_edge(c, d, edge("1.0"));
        g
    }

    #[test]
    fn add_and_find() {
        let mut g = DependencyGraph::new("compile");
        let idx = g.add_module(id("org.example:lib:1.0"));
        assert_eq!(g.find("org.example:lib"), Some(idx));
        assert_eq!(g.add_module(id("org.example:lib:1.0")), idx);
        assert_eq!(g.len(), 1);
        assert_eq!(
            g.find_module(&ModuleId::new(Some("org.example"), "lib")),
            Some(&id("org.example:lib:1.0"))
        );
    }

    #[test]
    fn empty_graph_tree() {
        let g = DependencyGraph::new("compile");
        assert!(g.is_empty());
        assert_eq!(g.print_tree(None), "compile\nNo dependencies\n");
    }

    #[test]
    fn tree_shows_redirects_and_repeats() {
        let tree = sample().print_tree(None);
        let expected = "\
compile
├── org.a:a:1.0
│   └── org.c:c:3.0
│       └── org.d:d:1.0
└── org.b:b:2.0
    └── org.c:c:2.0 -> 3.0 (*)
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn tree_respects_depth() {
        let tree = sample().print_tree(Some(1));
        assert!(tree.contains("org.a:a:1.0"));
        assert!(!tree.contains("org.c:c"));
    }

    #[test]
    fn find_path_by_full_and_partial_key() {
        let g = sample();
        let path = g.find_path("org.d:d").unwrap();
        let labels: Vec<String> = path.iter().map(|n| n.to_string()).collect();
        assert_eq!(labels, ["compile", "org.a:a:1.0", "org.c:c:3.0", "org.d:d:1.0"]);
        assert_eq!(g.find_path("b").unwrap().len(), 2);
        assert!(g.find_path("org.missing:lib").is_none());
    }

    #[test]
    fn inverted_tree() {
        let inv = sample().print_inverted_tree("org.c:c");
        assert!(inv.starts_with("org.c:c:3.0\n"));
        assert!(inv.contains("org.a:a:1.0"));
        assert!(inv.contains("org.b:b:2.0"));
        assert!(inv.contains("compile"));
    }
}
