use anyhow::{Context, Result};
use palmctl_core::Config;
use tracing_subscriber::EnvFilter;

mod dbus_interface;
mod engine;
mod extractor;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "palmctld starting");

    let config = Config::load().context("failed to load configuration")?;
    tracing::info!(
        camera_index = config.camera_index,
        media_gesture_mode = config.media_gesture_mode.as_str(),
        require_stable_gesture = config.require_stable_gesture,
        extractor = ?config.extractor_command,
        "configuration loaded"
    );

    let engine = engine::spawn_engine(&config).context("failed to start engine")?;
    let stopper = engine.stopper();

    let service = dbus_interface::ControllerService::new(engine.status(), engine.stopper());
    let _connection = match dbus_interface::serve(service).await {
        Ok(conn) => {
            tracing::info!(name = dbus_interface::BUS_NAME, "D-Bus interface registered");
            Some(conn)
        }
        Err(e) => {
            tracing::warn!(error = %e, "D-Bus unavailable; running without control interface");
            None
        }
    };

    tracing::info!("palmctld ready");

    let done = engine.wait();
    tokio::pin!(done);

    let result = tokio::select! {
        result = &mut done => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("interrupt received, stopping");
            stopper.stop();
            done.await
        }
    };

    let frames = result.context("engine stopped with an error")?;
    tracing::info!(frames, "palmctld shutting down");

    Ok(())
}
