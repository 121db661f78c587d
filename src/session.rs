// Session du lanceur : port courant + composants.
// Chaque action du menu (Ouvrir, Parametres, Quitter) passe par cet objet.

use std::future::Future;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::config::ConfigStore;

/// Delai entre la requete d'arret du serveur et la fermeture du lanceur
pub const QUIT_GRACE: Duration = Duration::from_millis(1000);

/// Verification de l'etat du serveur via son API HTTP
pub trait ServerProbe {
    fn is_running(&self, port: u16) -> impl Future<Output = bool>;

    /// Demande d'arret, sans attendre de reponse
    fn request_quit(&self, port: u16);
}

/// Actions cote systeme : lancer le serveur, ouvrir une URL
pub trait ServerHost {
    fn launch(&self) -> impl Future<Output = ()>;

    fn open_url(&self, url: &str);
}

/// URL racine de l'interface web
pub fn root_url(port: u16) -> String {
    format!("http://localhost:{}/", port)
}

/// Resultat d'un changement de port reussi
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortChange {
    pub previous: u16,
    pub current: u16,
    /// Le serveur tournait sur l'ancien port : il faut le redemarrer
    pub restart_required: bool,
}

pub struct Session<P, H> {
    config: ConfigStore,
    probe: P,
    host: H,
    port: AtomicU16,
}

impl<P: ServerProbe, H: ServerHost> Session<P, H> {
    /// Cree la session en lisant le port depuis la configuration
    pub fn new(config: ConfigStore, probe: P, host: H) -> Self {
        let port = config.load();
        tracing::info!("{}", crate::t!("session.port_loaded", port, config.path().display()));
        Self {
            config,
            probe,
            host,
            port: AtomicU16::new(port),
        }
    }

    pub fn port(&self) -> u16 {
        self.port.load(Ordering::Relaxed)
    }

    /// Lance le serveur s'il ne repond pas sur le port courant
    pub async fn ensure_running(&self) {
        let port = self.port();
        if self.probe.is_running(port).await {
            tracing::debug!("{}", crate::t!("session.already_running", port));
        } else {
            tracing::info!("{}", crate::t!("session.launching", port));
            self.host.launch().await;
        }
    }

    /// Action "Ouvrir" : serveur demarre si besoin, puis navigateur
    pub async fn open(&self) {
        self.ensure_running().await;
        self.host.open_url(&root_url(self.port()));
    }

    /// Sequence de demarrage du lanceur
    pub async fn startup(&self, open_browser: bool) {
        if open_browser {
            self.open().await;
        } else {
            self.ensure_running().await;
        }
    }

    /// Action "Parametres" : enregistre le nouveau port.
    /// En cas d'echec d'ecriture, le port courant reste inchange.
    /// Le serveur deja lance n'est pas reconfigure.
    pub async fn apply_port(&self, new_port: u16) -> Result<PortChange> {
        self.config.save(new_port)?;

        let previous = self.port();
        let restart_required = self.probe.is_running(previous).await;
        self.port.store(new_port, Ordering::Relaxed);

        Ok(PortChange {
            previous,
            current: new_port,
            restart_required,
        })
    }

    /// Action "Quitter" : demande d'arret au serveur puis delai fixe.
    /// L'appelant ferme sa boucle d'evenements ensuite.
    pub async fn quit(&self) {
        self.probe.request_quit(self.port());
        tokio::time::sleep(QUIT_GRACE).await;
    }
}
