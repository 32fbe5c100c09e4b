use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::{error, info, warn};

use swbf2_hierarchy::{
    cli::HierarchyCli,
    logging::init_logging,
    pipeline::run,
    render::GraphvizRenderer,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = HierarchyCli::parse();

    // Nothing to do if no lvl files are given
    if cli.files.is_empty() {
        info!("No LVL files given!");
        let _ = HierarchyCli::command().print_help();
        return ExitCode::SUCCESS;
    }

    let opts = cli.to_run_options();
    let mut renderer = GraphvizRenderer::new(opts.render.clone());

    match run(&opts, &mut renderer).await {
        Ok(summary) => {
            info!(
                "Loaded {} levels with {} entity classes; plotted {} of {} root classes into {}",
                summary.levels_loaded,
                summary.classes,
                summary.rendered.len(),
                summary.roots.len(),
                opts.output_dir.display()
            );
            if !summary.failed.is_empty() {
                warn!("Could not plot: {}", summary.failed.join(", "));
            }
            info!("Root classes written to {}", opts.report_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
