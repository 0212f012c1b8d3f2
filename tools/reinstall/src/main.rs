use anyhow::Result;
use clap::Parser;
use ssim_regress::cli::ReinstallArgs;
use ssim_regress::config::resolve_executable;
use ssim_regress::console::ProcessConsole;
use ssim_regress::logging;
use ssim_regress::metadata::load_metadata;
use ssim_regress::reinstall::reinstall_from_folder;
use ssim_regress::PipelineError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = ReinstallArgs::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            // Metadata and executable problems are fatal; a failed install is not.
            let install_failed = err
                .downcast_ref::<PipelineError>()
                .is_some_and(|err| !err.is_fatal());
            if install_failed {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn run(args: &ReinstallArgs) -> Result<()> {
    let metadata = load_metadata(&args.meta)?;
    tracing::info!(package = %metadata.package.name, "package to reinstall");
    let Some(folder) = args.folder.as_deref().filter(|_| args.reinstall) else {
        tracing::info!("nothing to do without --reinstall");
        return Ok(());
    };

    let manager = resolve_executable(&args.packagemanager)?;
    let console = ProcessConsole::new(manager, None);
    reinstall_from_folder(&console, &metadata.package.name, folder)?;
    Ok(())
}
