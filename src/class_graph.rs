use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::{graph::NodeIndex, Directed, Graph};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    error::Result,
    hierarchy::{ClassId, ClassRegistry},
    lvl::EntityClass,
};

/**
Inheritance graph for a single root class, built on top of petgraph.

Nodes are class names: one per entity class under the root plus one
placeholder for the unmodelled root itself.  Edges point from base to
derived.  petgraph's `Graph` is index based, so we keep a name to
`NodeIndex` registry next to it; that registry is what guarantees at most
one node per name.  The class definitions behind the nodes are kept by name
for the JSON dump; the root placeholder has none.  The graph is strict: adding an edge that already exists
does nothing.

Graphs are built append-only, rendered once, and then dropped.
*/
pub struct ClassGraph {
    pub root: String,
    graph: Graph<String, (), Directed>,
    nodes: HashMap<String, NodeIndex>,
    classes: BTreeMap<String, EntityClass>,
}

impl ClassGraph {
    pub fn new(root: &str) -> Self {
        ClassGraph {
            root: root.to_string(),
            graph: Graph::new(),
            nodes: HashMap::new(),
            classes: BTreeMap::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.get(name).copied()
    }

    /// Return the node for `name`, creating it if needed.  The flag is true
    /// when the node was newly created.
    pub fn ensure_node(&mut self, name: &str) -> (NodeIndex, bool) {
        if let Some(idx) = self.nodes.get(name) {
            return (*idx, false);
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        (idx, true)
    }

    /// Add a base -> derived edge unless it already exists.
    pub fn add_edge(&mut self, base: NodeIndex, derived: NodeIndex) {
        self.graph.update_edge(base, derived, ());
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|name| name.as_str())
    }

    /// Edges as (base, derived) names in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.raw_edges().iter().map(move |edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
            )
        })
    }

    /// Sorted node names.
    pub fn node_names(&self) -> Vec<String> {
        let sorted: BTreeSet<&str> = self.nodes().collect();
        sorted.into_iter().map(str::to_string).collect()
    }

    /// Sorted (base, derived) edge pairs.
    pub fn list_edges(&self) -> Vec<(String, String)> {
        let sorted: BTreeSet<(&str, &str)> = self.edges().collect();
        sorted
            .into_iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    /// Convert to a `{ root, nodes, edges, classes }` rep where nodes is a
    /// sorted array of class names, edges is a sorted array of `{ from, to }`
    /// and classes maps each modelled class name to its definition.
    pub fn to_json(&self) -> Result<Value> {
        let edges: Vec<Value> = self
            .list_edges()
            .into_iter()
            .map(|(from, to)| json!({ "from": from, "to": to }))
            .collect();
        let classes = serde_json::to_value(&self.classes)?;
        Ok(json!({
            "root": self.root,
            "nodes": self.node_names(),
            "edges": edges,
            "classes": classes,
        }))
    }
}

/// Populates a `ClassGraph` for one root from a `ClassRegistry`.
pub struct GraphBuilder<'r, 'a> {
    registry: &'r ClassRegistry<'a>,
    graph: ClassGraph,
}

impl<'r, 'a> GraphBuilder<'r, 'a> {
    pub fn new(registry: &'r ClassRegistry<'a>, root: &str) -> Self {
        GraphBuilder {
            registry,
            graph: ClassGraph::new(root),
        }
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ClassGraph {
        self.graph
    }

    /// Make sure `id` and its whole base chain are in the graph, wired up
    /// base -> derived, and return its node.
    ///
    /// Returns `None` when the class belongs to a different root; callers
    /// treat that as "no edge to draw".  Nodes are registered by name before
    /// recursing into the base, so asking twice (or revisiting a shared base)
    /// hands back the existing node.
    pub fn add_class(&mut self, id: ClassId) -> Option<NodeIndex> {
        let ec = self.registry.get(id);
        if let Some(idx) = self.graph.node_index(&ec.type_name) {
            return Some(idx);
        }

        if self.registry.root_class_name(id) != self.graph.root {
            return None;
        }

        let (node, _) = self.graph.ensure_node(&ec.type_name);
        self.graph.classes.insert(ec.type_name.clone(), ec.clone());
        info!("Added node '{}'", ec.type_name);

        if let Some(base) = self.registry.base(id) {
            if let Some(base_node) = self.add_class(base) {
                self.graph.add_edge(base_node, node);
            }
        } else if ec.has_base_name() {
            let (base_node, created) = self.graph.ensure_node(&ec.base_name);
            if created {
                debug!("Added root placeholder '{}'", ec.base_name);
            }
            if base_node != node {
                self.graph.add_edge(base_node, node);
            }
        }

        Some(node)
    }

    /// Run `add_class` over every class in the registry.
    pub fn add_all(&mut self) {
        for id in self.registry.ids() {
            self.add_class(id);
        }
    }
}

/// Build the complete graph for `root`.
pub fn build_class_graph(registry: &ClassRegistry, root: &str) -> ClassGraph {
    let mut builder = GraphBuilder::new(registry, root);
    builder.add_all();
    builder.into_graph()
}
