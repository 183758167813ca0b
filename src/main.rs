use clap::Parser;
use log::{error, info, warn};
use sitecycle::configuration::config::Config;
use sitecycle::controller::controller_handler::Controller;
use std::path::Path;

#[derive(Parser)]
#[command(name = "sitecycle")]
#[command(version = "0.1.0")]
#[command(about = "Rotating website screenshot capture with bounded local and remote history")]
struct Args {
    config_file: String,

    /// Overrides `[web] port`
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Run a single capture and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    info!("Importing configuration");

    let args = Args::parse();

    if args.config_file.is_empty() {
        error!("No configuration file found");
        std::process::exit(1);
    }

    let mut config = match Config::from_file(Path::new(args.config_file.as_str())) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration from file: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.web.port = port;
    }

    info!("Configuration imported successfully");

    let mut controller = match Controller::new(config).await {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    if args.once {
        let outcome = controller.run_once().await;
        if !outcome.success {
            warn!(
                "Capture of {} failed: {}",
                outcome.url,
                outcome.error.unwrap_or_default()
            );
            std::process::exit(2);
        }
        return;
    }

    let result = tokio::spawn(async move {
        info!("Spawning the controller");
        controller.run().await
    });

    match result.await {
        Ok(Ok(())) => info!("Exited cleanly"),
        Ok(Err(e)) => {
            error!("Error occured in the controller process: {}, exiting...", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Error joining at the end of execution: {}", e);
            std::process::exit(1);
        }
    }
}
