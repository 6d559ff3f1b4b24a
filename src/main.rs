//! Entry point for the **twm** daemon.
//!
//! Resolves the configuration, builds the platform backends and runs the
//! [`Scheduler`](twm::scheduler::Scheduler) on the main thread.  Hotkeys are
//! delivered through the main thread's message queue, so everything that
//! touches the platform stays on this thread.

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use twm::config::Config;

#[derive(Debug, Parser)]
#[command(name = "twm", version, about)]
struct Args {
    /// Configuration file (TOML, or JSON when the name ends in `.json`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `twm=trace`.  `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the default configuration as TOML and exit.
    #[arg(long)]
    print_default_config: bool,
}

/// Load the configuration.
///
/// An explicit `--config` must load; the default location may be absent,
/// in which case the compiled-in defaults are used.
fn load_config(explicit: Option<PathBuf>) -> Result<(Config, Option<PathBuf>), String> {
    if let Some(path) = explicit {
        let config = Config::load(&path).map_err(|e| e.to_string())?;
        info!("loaded config from {}", path.display());
        return Ok((config, Some(path)));
    }
    let Some(path) = Config::default_path() else {
        info!("no config directory, using defaults");
        return Ok((Config::default(), None));
    };
    let config = Config::load_or_default(&path).map_err(|e| e.to_string())?;
    if path.exists() {
        info!("loaded config from {}", path.display());
    } else {
        info!("no config file at {}, using defaults", path.display());
    }
    Ok((config, Some(path)))
}

//  Main

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    if args.print_default_config {
        match Config::default().to_toml_string() {
            Ok(s) => print!("{}", s),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let (config, config_path) = match load_config(args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    run(config, config_path);
}

#[cfg(windows)]
fn run(config: Config, config_path: Option<PathBuf>) {
    use std::sync::atomic::Ordering;
    use twm::scheduler::Scheduler;
    use twm::win32::{Win32Hotkeys, Win32WindowService};

    let platform = match Win32WindowService::new() {
        Ok(p) => p,
        Err(e) => {
            error!("failed to initialise the window service: {}", e);
            std::process::exit(1);
        }
    };

    let mut scheduler = match Scheduler::new(platform, Win32Hotkeys::new(), config, config_path) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to start: {}", e);
            std::process::exit(1);
        }
    };
    info!("{} hotkey(s) registered", scheduler.hotkeys().hotkeys().len());

    let running = scheduler.running_flag();
    if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
        error!("failed to install the Ctrl-C handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = scheduler.run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn run(_config: Config, _config_path: Option<PathBuf>) {
    error!("twm needs the Win32 window service, which this platform does not have");
    std::process::exit(1);
}
