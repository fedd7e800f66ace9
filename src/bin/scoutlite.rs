use clap::Parser;
use scoutlite::cli::{self, Cli};
use scoutlite::config::ScoutConfig;
use scoutlite::logger;
use std::process::ExitCode;

fn init_logging(cfg: &ScoutConfig) {
    // Without an explicit directory, stay quiet rather than dropping logs into the cwd.
    let res = if let Some(yaml) = std::env::var_os("SCOUTLITE_LOG_CONFIG") {
        logger::init_path(std::path::Path::new(&yaml))
    } else if cfg.logging.dir.is_some() {
        logger::configure_from(&cfg.logging)
    } else if std::env::var_os("SCOUTLITE_LOG_DIR").is_some() {
        logger::configure_from_env()
    } else {
        Ok(())
    };
    if let Err(e) = res {
        eprintln!("warning: logging not configured: {e}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match ScoutConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(cli::exit_status(&e));
        }
    };
    init_logging(&cfg);

    match cli::run(&cli, &cfg).await {
        Ok(out) => match serde_json::to_string_pretty(&out) {
            Ok(s) => {
                println!("{s}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::from(cli::exit_status(&e))
        }
    }
}
