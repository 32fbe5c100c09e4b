use std::path::Path;

use clap::ValueEnum;
use dot_structures::{
    Attribute, Edge, EdgeTy, Graph, GraphAttributes, Id, Node, NodeId, Stmt, Vertex,
};
use graphviz_rust::{
    cmd::{CommandArg, Format, Layout},
    exec,
    printer::{DotPrinter, PrinterContext},
};
use tracing::debug;

use crate::{
    class_graph::ClassGraph,
    error::{ErrorLayer, Result, ToolError},
    file_utils::{sanitize_file_stem, write_file_ensuring_parent_dir},
};

/// Output file format for each per-root plot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Raster image rendered by Graphviz.
    #[default]
    Png,
    /// Vector image rendered by Graphviz.
    Svg,
    /// DOT source; does not need Graphviz installed.
    Dot,
    /// `{ root, nodes, edges }` JSON dump of the graph.
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Dot => "dot",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub format: OutputFormat,
    pub dpi: f32,
    pub node_shape: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            format: OutputFormat::Png,
            dpi: 320.0,
            node_shape: "box".to_string(),
        }
    }
}

/// File name (no directory) for the plot of `root`.
pub fn output_file_name(root: &str, extension: &str) -> String {
    format!("{}.{}", sanitize_file_stem(root), extension)
}

/// Quote a name as a DOT string id.  Class names are free-form so everything
/// goes through the quoted form.
fn quoted_id(name: &str) -> Id {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    Id::Escaped(format!("\"{}\"", escaped))
}

fn quoted_attr(key: &str, value: &str) -> Attribute {
    Attribute(Id::Plain(key.to_string()), quoted_id(value))
}

/// Convert a class graph into a strict, directed DOT graph named after its
/// root.
pub fn to_dot(graph: &ClassGraph, settings: &RenderSettings) -> Graph {
    let mut stmts = vec![
        Stmt::GAttribute(GraphAttributes::Graph(vec![quoted_attr(
            "dpi",
            &settings.dpi.to_string(),
        )])),
        Stmt::GAttribute(GraphAttributes::Node(vec![quoted_attr(
            "shape",
            &settings.node_shape,
        )])),
    ];

    for name in graph.nodes() {
        stmts.push(Stmt::Node(Node {
            id: NodeId(quoted_id(name), None),
            attributes: vec![],
        }));
    }

    for (base, derived) in graph.edges() {
        stmts.push(Stmt::Edge(Edge {
            ty: EdgeTy::Pair(
                Vertex::N(NodeId(quoted_id(base), None)),
                Vertex::N(NodeId(quoted_id(derived), None)),
            ),
            attributes: vec![],
        }));
    }

    Graph::DiGraph {
        id: quoted_id(&graph.root),
        strict: true,
        stmts,
    }
}

/// Something that can turn a class graph into a file.
pub trait GraphRenderer {
    /// Extension of the files this renderer writes, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&mut self, graph: &ClassGraph, output: &Path) -> Result<()>;
}

/// Renders through Graphviz's `dot` layout, or writes DOT/JSON directly for
/// the formats that don't need a layout.
pub struct GraphvizRenderer {
    settings: RenderSettings,
    ctx: PrinterContext,
}

impl GraphvizRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        GraphvizRenderer {
            settings,
            ctx: PrinterContext::default(),
        }
    }
}

impl GraphRenderer for GraphvizRenderer {
    fn extension(&self) -> &'static str {
        self.settings.format.extension()
    }

    fn render(&mut self, graph: &ClassGraph, output: &Path) -> Result<()> {
        debug!(
            root = %graph.root,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "rendering {}",
            output.display()
        );

        let image_format = match self.settings.format {
            OutputFormat::Dot => {
                let source = to_dot(graph, &self.settings).print(&mut self.ctx);
                return write_file_ensuring_parent_dir(output, source.as_bytes());
            }
            OutputFormat::Json => {
                let pretty = serde_json::to_string_pretty(&graph.to_json()?)?;
                return write_file_ensuring_parent_dir(output, pretty.as_bytes());
            }
            OutputFormat::Png => Format::Png,
            OutputFormat::Svg => Format::Svg,
        };

        let dot_graph = to_dot(graph, &self.settings);
        exec(
            dot_graph,
            &mut self.ctx,
            vec![
                CommandArg::Layout(Layout::Dot),
                CommandArg::Format(image_format),
                CommandArg::Output(output.to_string_lossy().into_owned()),
            ],
        )
        .map_err(|e| {
            ToolError::transient(
                ErrorLayer::RenderLayer,
                format!(
                    "Graphviz could not render '{}' to {}: {}",
                    graph.root,
                    output.display(),
                    e
                ),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        class_graph::build_class_graph,
        hierarchy::ClassRegistry,
        lvl::{EntityClass, EntityClassKind},
        utils::temp_dir::TempDir,
    };

    fn ec(type_name: &str, base_name: &str) -> EntityClass {
        EntityClass {
            kind: EntityClassKind::Weapon,
            type_name: type_name.to_string(),
            base_name: base_name.to_string(),
            properties: vec![],
        }
    }

    fn sample_graph() -> ClassGraph {
        let classes = vec![
            ec("rep_weap_inf_rifle", "com_weap_inf_rifle"),
            ec("com_weap_inf_rifle", "cannon"),
        ];
        let registry = ClassRegistry::from_classes(&classes);
        build_class_graph(&registry, "cannon")
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("soldier", OutputFormat::Png.extension()), "soldier.png");
        assert_eq!(output_file_name("a/b", "svg"), "a_b.svg");
        assert_eq!(output_file_name("x", OutputFormat::Json.extension()), "x.json");
    }

    #[test]
    fn test_quoted_id_escapes_quotes() {
        match quoted_id("say \"hi\"") {
            Id::Escaped(s) => assert_eq!(s, "\"say \\\"hi\\\"\""),
            other => panic!("unexpected id {:?}", other),
        }
    }

    #[test]
    fn test_quoted_id_escapes_trailing_backslash() {
        match quoted_id("weap\\") {
            Id::Escaped(s) => assert_eq!(s, "\"weap\\\\\""),
            other => panic!("unexpected id {:?}", other),
        }
        match quoted_id("a\\\"b") {
            Id::Escaped(s) => assert_eq!(s, "\"a\\\\\\\"b\""),
            other => panic!("unexpected id {:?}", other),
        }
    }

    #[test]
    fn test_to_dot_structure() {
        let graph = sample_graph();
        match to_dot(&graph, &RenderSettings::default()) {
            Graph::DiGraph { id, strict, stmts } => {
                assert!(strict);
                assert_eq!(id, Id::Escaped("\"cannon\"".to_string()));
                // 2 attribute statements, 3 nodes, 2 edges.
                assert_eq!(stmts.len(), 7);
                assert_eq!(
                    stmts[0],
                    Stmt::GAttribute(GraphAttributes::Graph(vec![Attribute(
                        Id::Plain("dpi".to_string()),
                        Id::Escaped("\"320\"".to_string())
                    )]))
                );
                assert_eq!(
                    stmts[1],
                    Stmt::GAttribute(GraphAttributes::Node(vec![Attribute(
                        Id::Plain("shape".to_string()),
                        Id::Escaped("\"box\"".to_string())
                    )]))
                );
            }
            _ => panic!("expected a digraph"),
        }
    }

    #[test]
    fn test_render_dot_file() {
        let tmp = TempDir::new("swbf2-hierarchy-render-dot");
        let out = tmp.join("PlotOut").join("cannon.dot");
        let mut renderer = GraphvizRenderer::new(RenderSettings {
            format: OutputFormat::Dot,
            ..RenderSettings::default()
        });
        assert_eq!(renderer.extension(), "dot");
        renderer.render(&sample_graph(), &out).unwrap();

        let source = std::fs::read_to_string(&out).unwrap();
        assert!(source.starts_with("strict digraph"), "{}", source);
        assert!(source.contains("dpi"));
        assert!(source.contains("box"));
        assert!(source.contains("\"cannon\""));
        assert!(source.contains("->"));
    }

    #[test]
    fn test_render_json_file() {
        let tmp = TempDir::new("swbf2-hierarchy-render-json");
        let out = tmp.join("cannon.json");
        let mut renderer = GraphvizRenderer::new(RenderSettings {
            format: OutputFormat::Json,
            ..RenderSettings::default()
        });
        renderer.render(&sample_graph(), &out).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["root"], "cannon");
        assert_eq!(value["edges"].as_array().unwrap().len(), 2);
    }
}
