use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use classchat::{
    ChannelTransport, ChatCommand, ChatEvent, ChatRequester, ChatRouter, Config, DiscoveryListener,
};

#[derive(Debug, Parser)]
#[command(name = "classchat", version, about = "Classroom chat")]
struct Args {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the teacher console and open sessions for incoming chat requests.
    Listen,
    /// Ask the teacher console for a chat.
    Request,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load_with_env(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    match args.command {
        Command::Listen => {
            if let Err(e) = classchat::logging::init(&config.logging) {
                eprintln!("Failed to initialize logging: {e}");
                classchat::logging::init_console_only(&config.logging.level);
            }
        }
        Command::Request => classchat::logging::init_console_only(&config.logging.level),
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let result = match args.command {
        Command::Listen => listen(config).await,
        Command::Request => request(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn request(config: &Config) -> classchat::Result<()> {
    let requester = ChatRequester::from_config(&config.discovery)?;
    requester.send().await?;
    Ok(())
}

async fn listen(config: Config) -> classchat::Result<()> {
    info!("classchat teacher console");

    if !config.discovery.enabled {
        warn!("Discovery is disabled, nothing to listen for");
        return Ok(());
    }

    let (transport, mut outbox) = ChannelTransport::new();
    let mut router = ChatRouter::from_config(transport, &config);

    let listener = DiscoveryListener::bind(&config.discovery).await?;
    let (tx, mut requests) = mpsc::channel(32);
    tokio::spawn(listener.run(tx));

    loop {
        tokio::select! {
            Some(found) = requests.recv() => {
                for event in router.focus_client(&found.identity) {
                    log_event(&event);
                }
            }
            Some(envelope) = outbox.recv() => {
                match ChatCommand::from_feature_message(&envelope.message) {
                    Ok(command) => info!("Deliver {} to {}", command.name(), envelope.target),
                    Err(e) => warn!("Undeliverable feature message: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

fn log_event(event: &ChatEvent) {
    match event {
        ChatEvent::SessionFocused { client_id } => info!("Chat open with {}", client_id),
        ChatEvent::Notification { client_name, .. } => info!("New message from {}", client_name),
        other => debug!("{:?}", other),
    }
}
