//! Edge appliance: supervisor entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI, load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Resolve the profile and its service list
//!   6. Spawn SIGINT/SIGTERM → shutdown watcher
//!   7. Run services until they all exit

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use edge_appliance::config::{self, Config};
use edge_appliance::error::AppError;
use edge_appliance::logger;
use edge_appliance::profile::Profile;
use edge_appliance::supervisor::{self, health::HealthRegistry, registry};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = match parse_cli_args(std::env::args().skip(1))? {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Run(args) => args,
    };

    let config = config::load(args.config_path.as_deref())?;
    let profile = config.effective_profile(args.profile);

    if args.list_services {
        for entry in registry::services_for(profile)? {
            println!("{}", entry.name);
        }
        return Ok(());
    }

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(
        effective_log_level,
        args.log_level.is_some(),
        config.log_file.as_deref(),
    )?;

    info!(
        work_dir = %config.work_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        %profile,
        "config loaded"
    );

    let services = registry::services_for(profile)?;

    // Shared shutdown token: signals cancel it, every service watches it.
    let shutdown = CancellationToken::new();
    spawn_signal_watcher(shutdown.clone());

    print_startup_summary(&config, profile, &services);

    let health = HealthRegistry::new();
    let result = supervisor::run(
        services,
        Arc::new(config.services.clone()),
        health.clone(),
        shutdown,
        config.shutdown_grace,
    )
    .await;

    let snapshot = health.snapshot().await;
    debug!(
        health = %serde_json::to_string(&snapshot).unwrap_or_default(),
        "final service health"
    );

    result
}

/// Cancel `token` on Ctrl-C, and on SIGTERM where available.
fn spawn_signal_watcher(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => info!("SIGINT received, initiating shutdown"),
                        _ = term.recv() => info!("SIGTERM received, initiating shutdown"),
                    }
                }
                Err(e) => {
                    tracing::warn!("cannot install SIGTERM handler: {e}");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("SIGINT received, initiating shutdown");
                    }
                }
            }
        }
        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received, initiating shutdown");
            }
        }
        token.cancel();
    });
}

fn print_startup_summary(config: &Config, profile: Profile, services: &[registry::ServiceEntry]) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        if text.chars().count() >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let names = services.iter().map(|s| s.name).collect::<Vec<_>>().join(" → ");
    let svc = &config.services;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ Edge Appliance                                               ║");
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║   {}║", fit(format!("PID: {}", std::process::id())));
    println!("║   {}║", fit(format!("Profile: {profile}")));
    println!("║   {}║", fit(format!("Work dir: {}", config.work_dir.display())));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║   {}║", fit(format!("Services: {names}")));
    for s in services {
        let line = match s.name {
            "ela" => format!("ela: {}", svc.ela.endpoint),
            "eva" => format!("eva: {} images={}", svc.eva.endpoint, svc.eva.app_image_dir.display()),
            "eda" => format!("eda: {} dp={}", svc.eda.endpoint, svc.eda.dataplane_socket),
            other => other.to_string(),
        };
        println!("║   {}║", fit(line));
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
}

fn print_usage() {
    println!("Usage: edge-appliance [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -h, --help                 Print help");
    println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
    println!("  -p, --profile <cni|nts>    Deployment profile (overrides config and EDGE_PROFILE)");
    println!("  -l, --list-services        Print the profile's services in start order and exit");
    println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
}

#[derive(Debug)]
enum Command {
    Help,
    Run(CliArgs),
}

#[derive(Debug, Default)]
struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    profile: Option<Profile>,
    list_services: bool,
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<Command, AppError> {
    let mut verbosity = 0u8;
    let mut out = CliArgs::default();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-l" | "--list-services" => out.list_services = true,
            "-f" | "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| AppError::Config("-f/--config requires a path argument".into()))?;
                out.config_path = Some(path);
            }
            "-p" | "--profile" => {
                let name = iter
                    .next()
                    .ok_or_else(|| AppError::Config("-p/--profile requires a profile name".into()))?;
                out.profile = Some(name.parse()?);
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            other => {
                return Err(AppError::Config(format!(
                    "unknown argument '{other}' (see --help)"
                )));
            }
        }
    }

    // Each -v raises verbosity one tier:
    //   -v → warn, -vv → info, -vvv → debug, -vvvv+ → trace
    out.log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    Ok(Command::Run(out))
}
