//! prept's application entry point.
//! Parses the command line and runs the selected command.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use prept::{
    cli::{get_args, variable_pairs, Args, Commands},
    config::{find_config_file, BoilerplateConfig},
    error::{default_error_handler, Error, Result},
    install::{install, InstallRoot},
    logger::init_logger,
    processor::{ConsoleReporter, Processor},
    prompt::DialoguerPrompter,
    providers::ProviderRegistry,
};

fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Installs a Ctrl-C handler raising the returned flag.
fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        log::warn!("Could not install Ctrl-C handler: {e}");
    }
    flag
}

fn run(args: Args) -> Result<()> {
    let install_root = InstallRoot::from_override(args.home)?;
    let prompt = DialoguerPrompter::new();
    let reporter = ConsoleReporter;

    match args.command {
        Commands::New { boilerplate, output, var, yes } => {
            let config = BoilerplateConfig::resolve(&boilerplate, &install_root)?;
            let registry = ProviderRegistry::with_install_root(&install_root);
            println!("Generating project from boilerplate: {}", config.name());

            let output_dir = Processor::new(&config, &registry, &prompt, &reporter)
                .skip_overwrite_check(yes)
                .interrupt_flag(interrupt_flag())
                .generate(output.as_deref(), &variable_pairs(&var))?;

            println!(
                "Successfully generated project from '{}' in {}.",
                config.name(),
                output_dir.display()
            );
        }
        Commands::Install { path, yes } => {
            let config = BoilerplateConfig::load(&path)?;
            match install(&config, &install_root, &prompt, yes, &reporter)? {
                Some(target) => {
                    println!(
                        "Installed '{}' to {}. Use 'prept new {}' to bootstrap a project.",
                        config.name(),
                        target.display(),
                        config.name()
                    );
                }
                None => println!("Installation aborted with no changes."),
            }
        }
        Commands::Init { path, name, summary } => {
            if let Some(existing) = find_config_file(&path) {
                return Err(Error::ConfigExists { path: existing });
            }
            std::fs::create_dir_all(&path)?;
            let mut config = BoilerplateConfig::new(&path, &name)?;
            if let Some(summary) = summary {
                config = config.with_summary(summary);
            }
            config.save()?;
            println!("Initialized boilerplate '{}' in {}.", name, display(&path));
        }
    }

    Ok(())
}

fn display(path: &Path) -> String {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf()).display().to_string()
}
