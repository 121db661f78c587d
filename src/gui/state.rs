// Etat de l'application cote interface.
// Le thread graphique execute chaque action jusqu'au bout via block_on :
// les actions sont donc serialisees comme dans une boucle d'evenements unique.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigStore;
use crate::launcher::Launcher;
use crate::probe::HttpProbe;
use crate::session::{PortChange, Session};

pub type AppSession = Session<HttpProbe, Launcher>;

pub struct AppState {
    runtime: Runtime,
    session: AppSession,
    /// Annule les requetes HTTP encore en vol a la fermeture
    shutdown: CancellationToken,
    quit: AtomicBool,
    open_browser_on_start: bool,
    /// ID du menu item "Quitter" du systray
    /// Permet a la fenetre egui de traiter les evenements menu pendant qu'elle est ouverte
    #[cfg_attr(not(windows), allow(dead_code))]
    tray_quit_menu_id: Mutex<Option<String>>,
}

impl AppState {
    /// Cree le runtime tokio et la session (lecture du port configure)
    pub fn new(base_dir: &Path, open_browser_on_start: bool) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;
        let shutdown = CancellationToken::new();
        let probe = HttpProbe::new(shutdown.clone())?;
        let session = Session::new(ConfigStore::new(base_dir), probe, Launcher::new(base_dir));

        Ok(Self {
            runtime,
            session,
            shutdown,
            quit: AtomicBool::new(false),
            open_browser_on_start,
            tray_quit_menu_id: Mutex::new(None),
        })
    }

    pub fn port(&self) -> u16 {
        self.session.port()
    }

    /// Demarrage : sonde, lancement eventuel, navigateur
    pub fn startup(&self) {
        self.runtime
            .block_on(self.session.startup(self.open_browser_on_start));
    }

    pub fn open(&self) {
        self.runtime.block_on(self.session.open());
    }

    pub fn apply_port(&self, port: u16) -> Result<PortChange> {
        self.runtime.block_on(self.session.apply_port(port))
    }

    /// Demande d'arret au serveur, attente fixe, puis signal de fermeture
    pub fn quit(&self) {
        if self.should_quit() {
            return;
        }
        tracing::info!("{}", crate::t!("app.shutdown"));
        self.runtime.block_on(self.session.quit());
        self.shutdown.cancel();
        self.quit.store(true, Ordering::Relaxed);
    }

    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }

    #[cfg(windows)]
    pub fn set_tray_quit_menu_id(&self, id: String) {
        *self.tray_quit_menu_id.lock().unwrap_or_else(|e| e.into_inner()) = Some(id);
    }

    #[cfg(windows)]
    pub fn get_tray_quit_menu_id(&self) -> Option<String> {
        self.tray_quit_menu_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
