use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use palmctl_core::{Config, LandmarkStream};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

mod replay;

#[derive(Parser)]
#[command(name = "palmctl", about = "Hand-gesture media control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon status
    Status,
    /// Stop the daemon
    Stop,
    /// Run a recorded landmark stream through the controller
    Replay {
        /// JSON-lines recording ("-" for stdin)
        path: PathBuf,
        /// Print one JSON object per action instead of text
        #[arg(long)]
        json: bool,
    },
    /// List video capture devices
    Devices,
    /// Print the effective configuration as TOML
    Config,
}

// `#[zbus::proxy]` generates both `ControllerProxy` (async) and
// `ControllerProxyBlocking`; the CLI runs on tokio and uses the async one.
#[zbus::proxy(
    interface = "org.palmctl.Controller1",
    default_service = "org.palmctl.Controller1",
    default_path = "/org/palmctl/Controller1"
)]
trait Controller {
    async fn status(&self) -> zbus::Result<String>;
    async fn stop(&self) -> zbus::Result<bool>;
}

async fn connect() -> Result<ControllerProxy<'static>> {
    let conn = zbus::connection::Builder::session()?
        .method_timeout(Duration::from_secs(3))
        .build()
        .await
        .context("failed to connect to the session bus")?;
    Ok(ControllerProxy::new(&conn).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            let proxy = connect().await?;
            let status = proxy
                .status()
                .await
                .context("palmctld is not running")?;
            let value: serde_json::Value = serde_json::from_str(&status)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Stop => {
            let proxy = connect().await?;
            if proxy.stop().await.context("palmctld is not running")? {
                println!("palmctld stopping");
            }
        }
        Commands::Replay { path, json } => {
            let config = Config::load()?;
            let reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
                Box::new(std::io::stdin().lock())
            } else {
                let file = std::fs::File::open(&path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Box::new(BufReader::new(file))
            };
            tracing::debug!(path = %path.display(), mode = config.media_gesture_mode.as_str(), "replaying");
            let mut stream = LandmarkStream::new(reader, config.max_hands);
            let summary = replay::replay(&mut stream, &config)?;

            for event in &summary.events {
                if json {
                    println!("{}", serde_json::to_string(event)?);
                } else {
                    println!(
                        "frame {:>6}  {:>8} ms  {:?}{}",
                        event.frame,
                        event.at_ms,
                        event.action.action,
                        if event.action.delivered { "" } else { "  (suppressed)" }
                    );
                }
            }
            if !json {
                println!("{} frames, {} actions", summary.frames, summary.events.len());
            }
        }
        Commands::Devices => {
            let devices = palmctl_hw::camera::list_devices();
            if devices.is_empty() {
                println!("No video capture devices found");
            }
            for d in devices {
                println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
            }
        }
        Commands::Config => {
            let config = Config::load()?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
