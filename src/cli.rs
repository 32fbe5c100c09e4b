use std::path::PathBuf;

use clap::Parser;

use crate::{
    pipeline::{RunOptions, DEFAULT_OUTPUT_DIR},
    render::{OutputFormat, RenderSettings},
    report::DEFAULT_REPORT_FILE,
};

fn existing_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("Path does not exist: {}", s))
    }
}

fn positive_dpi(s: &str) -> Result<f32, String> {
    match s.parse::<f32>() {
        Ok(dpi) if dpi.is_finite() && dpi > 0.0 => Ok(dpi),
        _ => Err(format!("'{}' is not a positive number", s)),
    }
}

/// This tool plots the entity class hierarchy of all given *.lvl files.
///
/// One graph is written per root class (the engine class a chain of entity
/// classes ultimately derives from), and the list of root classes is written
/// to a text file.
#[derive(Debug, Parser)]
#[command(name = "swbf2-hierarchy", version, about)]
pub struct HierarchyCli {
    /// LVL file paths (file or directory, one or more)
    #[arg(short = 'f', long = "files", num_args = 1.., value_parser = existing_path)]
    pub files: Vec<PathBuf>,

    /// Only plot the given root classes
    #[arg(short = 'c', long = "rootClass", num_args = 1..)]
    pub root_classes: Vec<String>,

    /// For all given directories, crawling will be recursive (will include all
    /// sub-directories)
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Directory the plots are written to, created if missing
    #[arg(
        short = 'o',
        long = "output-dir",
        env = "SWBF2_HIERARCHY_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR
    )]
    pub output_dir: PathBuf,

    /// File the root class names are written to
    #[arg(long = "report", env = "SWBF2_HIERARCHY_REPORT", default_value = DEFAULT_REPORT_FILE)]
    pub report: PathBuf,

    /// Output format of the plots
    #[arg(long = "format", value_enum, default_value = "png")]
    pub format: OutputFormat,

    /// Rendering resolution passed to Graphviz
    #[arg(long = "dpi", value_parser = positive_dpi, default_value = "320")]
    pub dpi: f32,
}

impl HierarchyCli {
    pub fn to_run_options(&self) -> RunOptions {
        RunOptions {
            files: self.files.clone(),
            root_classes: if self.root_classes.is_empty() {
                None
            } else {
                Some(self.root_classes.clone())
            },
            recursive: self.recursive,
            output_dir: self.output_dir.clone(),
            report_path: self.report.clone(),
            render: RenderSettings {
                format: self.format,
                dpi: self.dpi,
                ..RenderSettings::default()
            },
        }
    }
}
