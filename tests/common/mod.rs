//! Helpers to write synthetic level archives for the integration tests.

#![allow(dead_code)]

use std::path::Path;

use swbf2_hierarchy::{
    class_graph::ClassGraph, error::Result, file_utils::write_file_ensuring_parent_dir,
    render::GraphRenderer,
};

pub fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

fn string_chunk(tag: &[u8; 4], value: &str) -> Vec<u8> {
    let mut payload = value.as_bytes().to_vec();
    payload.push(0);
    chunk(tag, &payload)
}

/// An `entc` chunk; an empty `base` omits the BASE chunk.
pub fn entity_class(type_name: &str, base: &str) -> Vec<u8> {
    let mut body = vec![];
    if !base.is_empty() {
        body.extend(string_chunk(b"BASE", base));
    }
    body.extend(string_chunk(b"TYPE", type_name));
    chunk(b"entc", &body)
}

/// A `lvl_` sub-level: name hash, body size, then the nested chunks.
pub fn sub_level(hash: u32, children: &[u8]) -> Vec<u8> {
    let mut payload = hash.to_le_bytes().to_vec();
    payload.extend_from_slice(&(children.len() as u32).to_le_bytes());
    payload.extend_from_slice(children);
    chunk(b"lvl_", &payload)
}

/// Wrap top-level chunks into a complete `ucfb` file.
pub fn level_file(chunks: &[Vec<u8>]) -> Vec<u8> {
    chunk(b"ucfb", &chunks.concat())
}

/// Write a level whose entity classes are the given (type, base) pairs.
pub fn write_level(path: &Path, classes: &[(&str, &str)]) {
    let chunks: Vec<Vec<u8>> = classes
        .iter()
        .map(|(type_name, base)| entity_class(type_name, base))
        .collect();
    write_file_ensuring_parent_dir(path, &level_file(&chunks)).unwrap();
}

/// Renderer standing in for Graphviz: records the graphs it was asked to draw
/// and drops a small placeholder at the output path.
#[derive(Default)]
pub struct RecordingRenderer {
    pub rendered: Vec<(String, Vec<(String, String)>)>,
}

impl GraphRenderer for RecordingRenderer {
    fn extension(&self) -> &'static str {
        "png"
    }

    fn render(&mut self, graph: &ClassGraph, output: &Path) -> Result<()> {
        self.rendered.push((graph.root.clone(), graph.list_edges()));
        write_file_ensuring_parent_dir(output, b"\x89PNG")
    }
}
