mod client;
mod config;
mod core;
mod daemon;
mod monitors;
mod notifiers;
mod scheduler;
mod state;
mod traits;
mod types;
mod utils;
mod voice;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod testing;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = PathBuf::from("config.toml");

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-V" => {
                println!("minderd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("minderd {}", env!("CARGO_PKG_VERSION"));
                println!("{}\n", env!("CARGO_PKG_DESCRIPTION"));
                println!("Usage: minderd [COMMAND]\n");
                println!("Commands:");
                println!("  init              Write a starter config.toml");
                println!("  install-service   Install as a system service (launchd/systemd)");
                println!("\nOptions:");
                println!("  -h, --help       Print help");
                println!("  -V, --version    Print version");
                return Ok(());
            }
            "init" => {
                if config::write_default_config(&config_path)? {
                    println!("Wrote starter config to {}", config_path.display());
                    println!("Edit it (base_url, api_key) and run: minderd");
                } else {
                    println!("{} already exists, leaving it alone", config_path.display());
                }
                return Ok(());
            }
            "install-service" => {
                return daemon::install_service();
            }
            other => {
                eprintln!("Unknown command: '{}'. See minderd --help.", other);
                std::process::exit(1);
            }
        }
    }

    let config = match config::AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path.display(), e);
            eprintln!("Run 'minderd init' to create a starter config.");
            std::process::exit(1);
        }
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(crate::core::run(config))
}
