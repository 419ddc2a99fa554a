use crate::engine::{StatusSnapshot, Stopper};
use tokio::sync::watch;
use zbus::interface;

pub const BUS_NAME: &str = "org.palmctl.Controller1";
pub const OBJECT_PATH: &str = "/org/palmctl/Controller1";

/// D-Bus interface for the palmctl daemon.
///
/// Bus name: org.palmctl.Controller1 (session bus)
/// Object path: /org/palmctl/Controller1
pub struct ControllerService {
    status: watch::Receiver<StatusSnapshot>,
    stopper: Stopper,
}

impl ControllerService {
    pub fn new(status: watch::Receiver<StatusSnapshot>, stopper: Stopper) -> Self {
        Self { status, stopper }
    }

    fn status_json(&self) -> Result<String, serde_json::Error> {
        let snapshot = self.status.borrow().clone();
        let mut value = serde_json::to_value(&snapshot)?;
        value["version"] = env!("CARGO_PKG_VERSION").into();
        serde_json::to_string(&value)
    }
}

#[interface(name = "org.palmctl.Controller1")]
impl ControllerService {
    /// Return the latest controller state as JSON.
    async fn status(&self) -> zbus::fdo::Result<String> {
        self.status_json()
            .map_err(|e| zbus::fdo::Error::Failed(format!("failed to encode status: {e}")))
    }

    /// Ask the engine to stop after the current frame.
    async fn stop(&self) -> zbus::fdo::Result<bool> {
        tracing::info!("stop requested over D-Bus");
        self.stopper.stop();
        Ok(true)
    }
}

/// Claim the bus name and serve the interface. The returned connection
/// must be kept alive for the service to stay registered.
pub async fn serve(service: ControllerService) -> zbus::Result<zbus::Connection> {
    zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
}
