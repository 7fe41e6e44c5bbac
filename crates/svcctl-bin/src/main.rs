use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use svcctl_core::{Controller, Registry, Settings};
use svcctl_platform::{InstallSpec, Status};

mod heartbeat;

#[derive(Parser, Debug)]
#[command(name = "svcctl")]
#[command(about = "Install, start, stop and query background services")]
#[command(version)]
struct Cli {
    /// Path to settings file
    #[arg(long, env = "SVCCTL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Start/stop attempts before giving up
    #[arg(long, env = "SVCCTL_ATTEMPTS", global = true)]
    attempts: Option<u32>,

    /// Pause between start/stop attempts in milliseconds
    #[arg(long, env = "SVCCTL_DELAY_MS", global = true)]
    delay_ms: Option<u64>,

    /// Where the last started process id is recorded
    #[arg(long, env = "SVCCTL_PID_FILE", global = true)]
    pid_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SVCCTL_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a service with the system service manager
    Install {
        name: String,
        /// Executable the manager launches
        exec_path: PathBuf,
        display_name: Option<String>,
        /// Account the service runs as
        account: Option<String>,
        password: Option<String>,
        /// Extra arguments passed to the executable
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Start an installed service
    Start { name: String },
    /// Stop a running service
    Stop { name: String },
    /// Stop then start a service
    Restart { name: String },
    /// Print the service status
    Status {
        name: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the service registration
    #[command(alias = "uninstall")]
    Remove { name: String },
    /// Run the demo heartbeat service (interactively or under the manager)
    Run {
        /// Service name; defaults to the one in the settings file
        #[arg(long)]
        name: Option<String>,
        /// Heartbeat interval in seconds
        #[arg(long, default_value = "5")]
        interval_secs: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let settings = load_settings(&cli)?;
    let host = registry().detect()?;

    info!(
        "svcctl v{} (os={}, system={}, interactive={})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        host.name(),
        host.interactive(),
    );

    match cli.command {
        Commands::Run {
            name,
            interval_secs,
        } => {
            let mut config = settings.service.clone();
            if let Some(name) = name {
                config.name = name;
            }
            let program = Arc::new(heartbeat::Heartbeat::new(Duration::from_secs(
                interval_secs.max(1),
            )));
            let service = host.new_service(program, config)?;
            service.run()?;
        }
        command => {
            let controller = Controller::new(host, settings.retry, settings.pid_record());
            control(&controller, &settings, command)?;
        }
    }
    Ok(())
}

fn control(controller: &Controller, settings: &Settings, command: Commands) -> Result<()> {
    match command {
        Commands::Install {
            name,
            exec_path,
            display_name,
            account,
            password,
            args,
        } => {
            let mut config = settings.service.clone();
            config.name = name;
            config.executable = Some(exec_path);
            if let Some(display_name) = display_name {
                config.display_name = display_name;
            }
            if account.is_some() {
                config.user_name = account;
            }
            if !args.is_empty() {
                config.arguments = args;
            }
            let spec = InstallSpec::from_config(&config, password)?;
            controller
                .install(&spec)
                .with_context(|| format!("install of {} failed", spec.name))?;
            println!("install success");
        }
        Commands::Start { name } => {
            controller
                .start(&name)
                .with_context(|| format!("start of {} failed", name))?;
            println!("start success");
        }
        Commands::Stop { name } => {
            controller
                .stop(&name)
                .with_context(|| format!("stop of {} failed", name))?;
            println!("stop success");
        }
        Commands::Restart { name } => {
            controller
                .stop(&name)
                .with_context(|| format!("stop of {} failed", name))?;
            controller
                .start(&name)
                .with_context(|| format!("start of {} failed", name))?;
            println!("restart success");
        }
        Commands::Status { name, json } => {
            let (status, error) = match controller.status(&name) {
                Ok(status) => (status, None),
                Err(e) => (Status::Unknown, Some(e.to_string())),
            };
            let pid = match status {
                Status::Running => controller.process_id(&name).ok().flatten(),
                _ => None,
            };
            if json {
                let report = serde_json::json!({
                    "name": name,
                    "status": status,
                    "pid": pid,
                    "error": error,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match (pid, &error) {
                    (_, Some(e)) => println!("{}: {} ({})", name, status, e),
                    (Some(pid), None) => println!("{}: {} (pid {})", name, status, pid),
                    (None, None) => println!("{}: {}", name, status),
                }
            }
        }
        Commands::Remove { name } => {
            controller
                .uninstall(&name)
                .with_context(|| format!("remove of {} failed", name))?;
            println!("remove success");
        }
        Commands::Run { .. } => anyhow::bail!("run is not a control command"),
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = if path.exists() {
        info!("loading settings from {}", path.display());
        Settings::load(&path)?
    } else if cli.config.is_some() {
        anyhow::bail!("settings file {} not found", path.display());
    } else {
        Settings::default()
    };

    // CLI args override settings file
    if let Some(attempts) = cli.attempts {
        settings.retry.attempts = attempts;
    }
    if let Some(delay_ms) = cli.delay_ms {
        settings.retry.delay_ms = delay_ms;
    }
    if let Some(pid_file) = &cli.pid_file {
        settings.pid_file = pid_file.clone();
    }
    Ok(settings)
}

/// Service systems in detection order for this platform.
fn registry() -> Registry {
    let registry = Registry::new();

    #[cfg(target_os = "windows")]
    let registry = registry.register(Arc::new(svcctl_windows::WindowsSystem::new()));

    #[cfg(unix)]
    let registry = registry
        .register(Arc::new(svcctl_unix::systemd::SystemdSystem::new()))
        .register(Arc::new(svcctl_unix::launchd::LaunchdSystem::new()));

    registry
}
