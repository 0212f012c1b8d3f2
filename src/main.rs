use anyhow::{Context, Result};
use clap::Parser;
use ssim_regress::cli::RunArgs;
use ssim_regress::config::RunConfig;
use ssim_regress::console::ProcessConsole;
use ssim_regress::fetch::HttpFetcher;
use ssim_regress::logging;
use ssim_regress::metadata::load_metadata;
use ssim_regress::pipeline::{Pipeline, RunReport};
use std::process::ExitCode;

const EXIT_LIBRARY_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let args = RunArgs::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(report) if report.all_succeeded() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_LIBRARY_FAILED),
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(args: &RunArgs) -> Result<RunReport> {
    let metadata = load_metadata(&args.meta)?;
    let config = RunConfig::resolve(&args.console, args.tempdir.as_deref(), args.timeout_secs)?;
    tracing::info!(
        package = %metadata.package.name,
        version = %metadata.package.version,
        libraries = metadata.libraries.len(),
        work_dir = %config.work_dir.display(),
        "starting run"
    );

    let console = ProcessConsole::new(&config.console, config.timeout);
    let fetcher = HttpFetcher;
    let report = Pipeline::new(&console, &fetcher, config.work_dir.clone()).run(&metadata);

    print!("{}", report.render_summary());
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("write run report {}", path.display()))?;
    }
    Ok(report)
}
