use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;

use npm_outdated::config::{self, Config, Settings};
use npm_outdated::engine::{MANIFEST_FILE, Reconciler, Report, Workspace};
use npm_outdated::logging;
use npm_outdated::version::registries::NpmRegistry;

#[derive(Parser)]
#[command(name = "npm-outdated")]
#[command(version, about = "Report outdated and missing npm dependencies")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Include devDependencies
    #[arg(long, global = true, conflicts_with = "no_dev")]
    dev: bool,

    /// Skip devDependencies
    #[arg(long, global = true)]
    no_dev: bool,

    /// Also consider the beta dist-tag
    #[arg(long, global = true)]
    beta: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check each project once and exit
    Check {
        #[arg(value_name = "PROJECT", default_value = ".")]
        projects: Vec<PathBuf>,
    },
    /// Re-check projects whenever their package.json changes
    Watch {
        #[arg(value_name = "PROJECT", default_value = ".")]
        projects: Vec<PathBuf>,
    },
}

impl Cli {
    /// Apply the command line overrides on top of the configured settings
    fn settings(&self, mut settings: Settings) -> Settings {
        if self.dev {
            settings.check_dev_dependencies = true;
        }
        if self.no_dev {
            settings.check_dev_dependencies = false;
        }
        if self.beta {
            settings.use_beta_channel = true;
        }
        settings
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let config = Config::load(&config_path)?;
    let settings = cli.settings(config.settings);

    let _guard = logging::init(&config::log_path())?;
    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Check { projects } => runtime.block_on(check(&config, settings, projects)),
        Command::Watch { projects } => runtime.block_on(watch(&config, settings, projects)),
    }
}

fn reconciler(config: &Config) -> anyhow::Result<Arc<Reconciler>> {
    let registry =
        NpmRegistry::from_config(&config.registry).context("Failed to create registry client")?;
    Ok(Arc::new(Reconciler::new(Arc::new(registry))))
}

async fn check(
    config: &Config,
    settings: Settings,
    projects: Vec<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let reconciler = reconciler(config)?;
    let mut failed = false;

    for project in projects {
        let manifest = project.join(MANIFEST_FILE);
        if !manifest.is_file() {
            eprintln!("No {} found in {}", MANIFEST_FILE, project.display());
            failed = true;
            continue;
        }

        let results = reconciler.run(&manifest, &settings).await;
        failed |= results.unresolved().next().is_some();

        if let Some(notification) =
            Report::from_results(&results, &settings).notification(&manifest.display().to_string())
        {
            print!("{notification}");
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn watch(
    config: &Config,
    settings: Settings,
    projects: Vec<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
    let mut workspace = Workspace::new(reconciler(config)?, settings, config.watch, reports_tx);

    workspace.set_project_paths(projects);
    if workspace.is_empty() {
        anyhow::bail!("No {MANIFEST_FILE} found in the given projects");
    }

    loop {
        tokio::select! {
            report = reports_rx.recv() => match report {
                Some(report) => {
                    if let Some(notification) = report.notification() {
                        print!("{notification}");
                    }
                }
                None => break,
            },
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, stopping watchers");
                break;
            }
        }
    }

    workspace.dispose_all();
    Ok(ExitCode::SUCCESS)
}
