use std::{
    collections::BTreeSet,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{debug, error, info, info_span, warn};

use crate::{
    class_graph::build_class_graph,
    error::Result,
    file_discovery::{discover_files, LVL_EXTENSION},
    file_utils::ensure_dir,
    hierarchy::ClassRegistry,
    lvl::{Container, LogLevel, LoggerEntry},
    render::{output_file_name, GraphRenderer, RenderSettings},
    report::{write_root_classes, DEFAULT_REPORT_FILE},
};

/// Default directory the per-root plots are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "PlotOut";

/// Upper bound on how long the loading loop sleeps between redraws when no
/// loader job reports anything.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything a run needs, independent of how it was configured.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub files: Vec<PathBuf>,
    /// When set, replaces the discovered root classes wholesale.
    pub root_classes: Option<Vec<String>>,
    pub recursive: bool,
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub render: RenderSettings,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            files: vec![],
            root_classes: None,
            recursive: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            report_path: PathBuf::from(DEFAULT_REPORT_FILE),
            render: RenderSettings::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub levels_loaded: usize,
    pub classes: usize,
    /// The root classes that were plotted and written to the report.
    pub roots: BTreeSet<String>,
    pub rendered: Vec<PathBuf>,
    /// Roots whose rendering failed.
    pub failed: Vec<String>,
}

/// A single console line showing load progress that is redrawn in place.
struct ProgressLine {
    drawn: bool,
}

impl ProgressLine {
    const WIDTH: usize = 79;

    fn new() -> Self {
        ProgressLine { drawn: false }
    }

    fn draw(&mut self, fraction: f32) {
        let mut out = std::io::stdout().lock();
        let _ = write!(
            out,
            "\r{:width$}\r{} %",
            "",
            (fraction * 100.0) as u32,
            width = Self::WIDTH
        );
        let _ = out.flush();
        self.drawn = true;
    }

    /// Wipe the progress line so regular log output starts on a clean line.
    fn clear(&mut self) {
        if self.drawn {
            let mut out = std::io::stdout().lock();
            let _ = write!(out, "\r{:width$}\r", "", width = Self::WIDTH);
            let _ = out.flush();
            self.drawn = false;
        }
    }

    /// Keep the last drawn value visible and move to the next line.
    fn finish(&mut self) {
        if self.drawn {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out);
            let _ = out.flush();
            self.drawn = false;
        }
    }
}

fn forward_loader_log(entry: &LoggerEntry) {
    match entry.level {
        LogLevel::Info => info!("[lvl] {}", entry),
        LogLevel::Warning => warn!("[lvl] {}", entry),
        LogLevel::Error => error!("[lvl] {}", entry),
    }
}

/// Drain the container's log queue, returning whether anything was printed.
fn pull_loader_messages(container: &Container, progress: &mut ProgressLine) -> bool {
    let mut there_was_a_log = false;
    while let Some(entry) = container.next_log() {
        if !there_was_a_log {
            progress.clear();
        }
        forward_loader_log(&entry);
        there_was_a_log = true;
    }
    there_was_a_log
}

/// Schedule and load every file, showing progress and forwarding loader
/// diagnostics until all levels are done.
pub async fn load_levels(files: &[PathBuf]) -> Result<Container> {
    let mut container = Container::new();
    for path in files {
        container.add_level(path)?;
        info!("Schedule LVL: {}", path.display());
    }
    container.start_loading()?;
    drive_loading(&mut container).await;
    Ok(container)
}

/// Poll a started container to completion.  A loader job that died is logged;
/// whatever the other jobs loaded is still used.
async fn drive_loading(container: &mut Container) {
    let mut progress = ProgressLine::new();
    while !container.is_done() {
        pull_loader_messages(container, &mut progress);
        progress.draw(container.overall_progress());
        container.wait_for_activity(POLL_INTERVAL).await;
    }
    pull_loader_messages(container, &mut progress);
    progress.draw(container.overall_progress());
    progress.finish();

    if let Err(err) = container.finish().await {
        error!("[lvl] {}", err);
    }
    debug!(
        "at most {} levels were loading at the same time",
        container.peak_concurrent_loads()
    );
}

/// Plot one graph per root into `output_dir`.  A root that fails to render is
/// logged and recorded in the summary; the remaining roots still get drawn.
pub fn render_roots<R: GraphRenderer + ?Sized>(
    registry: &ClassRegistry,
    roots: &BTreeSet<String>,
    output_dir: &Path,
    renderer: &mut R,
    summary: &mut RunSummary,
) -> Result<()> {
    ensure_dir(output_dir)?;

    for root in roots {
        let _span = info_span!("root", root = %root).entered();
        let graph = build_class_graph(registry, root);
        let output = output_dir.join(output_file_name(root, renderer.extension()));
        match renderer.render(&graph, &output) {
            Ok(()) => {
                info!(
                    "Plotted '{}' ({} classes) to {}",
                    root,
                    graph.node_count(),
                    output.display()
                );
                summary.rendered.push(output);
            }
            Err(err) => {
                error!("Failed to plot '{}': {}", root, err);
                summary.failed.push(root.clone());
            }
        }
    }
    Ok(())
}

/// The whole batch: discover, load, crawl, plot, report.
pub async fn run<R: GraphRenderer + ?Sized>(
    opts: &RunOptions,
    renderer: &mut R,
) -> Result<RunSummary> {
    let lvl_files = discover_files(&opts.files, LVL_EXTENSION, opts.recursive);
    let container = load_levels(&lvl_files).await?;

    let registry = ClassRegistry::from_levels(container.levels());
    let mut roots = registry.crawl_root_classes();
    info!(
        "Found {} entity classes with {} root classes",
        registry.len(),
        roots.len()
    );

    if let Some(custom) = &opts.root_classes {
        if !custom.is_empty() {
            roots = custom.iter().cloned().collect();
        }
    }

    let mut summary = RunSummary {
        levels_loaded: container.levels().count(),
        classes: registry.len(),
        ..RunSummary::default()
    };

    render_roots(&registry, &roots, &opts.output_dir, renderer, &mut summary)?;
    write_root_classes(&opts.report_path, &roots)?;

    summary.roots = roots;
    Ok(summary)
}
