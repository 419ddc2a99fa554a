//! Media keys over MPRIS on the D-Bus session bus.

use palmctl_core::sinks::{MediaKey, MediaKeyBackend, SinkError};

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

// `#[zbus::proxy]` generates both `PlayerProxy` (async) and
// `PlayerProxyBlocking`. The engine thread is synchronous, so only the
// blocking variant is used.
#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait Player {
    async fn next(&self) -> zbus::Result<()>;
    async fn previous(&self) -> zbus::Result<()>;
    async fn play_pause(&self) -> zbus::Result<()>;
    async fn stop(&self) -> zbus::Result<()>;
}

/// Sends keys to the first MPRIS player found on the session bus. The bus
/// connection and player are resolved lazily and re-resolved after a
/// failed call, so players started after the daemon are picked up.
#[derive(Default)]
pub struct MprisMediaKeys {
    connection: Option<zbus::blocking::Connection>,
    player: Option<PlayerProxyBlocking<'static>>,
}

impl MprisMediaKeys {
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&mut self) -> Result<zbus::blocking::Connection, SinkError> {
        if let Some(conn) = &self.connection {
            return Ok(conn.clone());
        }
        let conn = zbus::blocking::Connection::session().map_err(backend)?;
        self.connection = Some(conn.clone());
        Ok(conn)
    }

    fn player(&mut self) -> Result<&PlayerProxyBlocking<'static>, SinkError> {
        if self.player.is_none() {
            let conn = self.connection()?;
            let dbus = zbus::blocking::fdo::DBusProxy::new(&conn).map_err(backend)?;
            let names = dbus.list_names().map_err(backend)?;
            let name = pick_player(names.iter().map(|n| n.as_str()))
                .ok_or(SinkError::NoPlayer)?
                .to_string();
            tracing::info!(player = %name, "using MPRIS player");
            let proxy = PlayerProxyBlocking::builder(&conn)
                .destination(name)
                .and_then(|b| b.build())
                .map_err(backend)?;
            self.player = Some(proxy);
        }
        self.player.as_ref().ok_or(SinkError::NoPlayer)
    }
}

fn backend(e: impl std::fmt::Display) -> SinkError {
    SinkError::Backend(e.to_string())
}

/// First bus name that belongs to an MPRIS player, in sorted order so the
/// choice is stable across calls.
fn pick_player<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    names.filter(|n| n.starts_with(MPRIS_PREFIX)).min()
}

impl MediaKeyBackend for MprisMediaKeys {
    fn send(&mut self, key: MediaKey) -> Result<(), SinkError> {
        let player = self.player()?;
        let result = match key {
            MediaKey::Next => player.next(),
            MediaKey::Previous => player.previous(),
            MediaKey::PlayPause => player.play_pause(),
            MediaKey::Stop => player.stop(),
        };
        if let Err(e) = result {
            // The player may have exited; look it up again next time.
            self.player = None;
            return Err(backend(e));
        }
        Ok(())
    }
}
