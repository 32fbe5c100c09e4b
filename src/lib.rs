extern crate clap;
extern crate petgraph;
extern crate serde;
extern crate serde_json;
#[macro_use]
extern crate lazy_static;
extern crate tracing;
extern crate tracing_subscriber;

pub mod class_graph;
pub mod cli;
pub mod error;
pub mod file_discovery;
pub mod file_utils;
pub mod hierarchy;
pub mod logging;
pub mod lvl;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod utils;
