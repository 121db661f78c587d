// Configuration partagee avec le serveur YouAudio.
// Fichier JSON `youaudio/_internal/config.json` a cote du binaire du lanceur.
// Seule la cle `host_port` nous concerne ; les autres cles sont conservees telles quelles.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Port par defaut du serveur YouAudio
pub const DEFAULT_PORT: u16 = 9527;

const CONFIG_DIR: &str = "youaudio/_internal";
const CONFIG_FILE: &str = "config.json";

/// Contenu du fichier de configuration.
/// `extra` capture toutes les cles inconnues pour les reecrire a l'identique.
#[derive(Debug, Default, Deserialize, Serialize)]
struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host_port: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ServerConfig {
    /// Port configure, si la valeur est un entier representable en port TCP
    fn port(&self) -> Option<u16> {
        self.host_port
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok())
    }
}

/// Acces au fichier de configuration du serveur
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join(CONFIG_DIR).join(CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lit le port configure.
    /// Fichier absent : le port par defaut est retourne et ecrit sur disque.
    /// Fichier illisible ou sans `host_port` : port par defaut en memoire, fichier intact.
    pub fn load(&self) -> u16 {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("{}", crate::t!("config.creating_default", self.path.display()));
                if let Err(e) = self.save(DEFAULT_PORT) {
                    tracing::warn!("{}", crate::t!("config.save_failed", format!("{:#}", e)));
                }
                return DEFAULT_PORT;
            }
            Err(e) => {
                tracing::warn!("{}", crate::t!("config.read_failed", self.path.display(), e));
                return DEFAULT_PORT;
            }
        };

        match serde_json::from_str::<ServerConfig>(&content) {
            Ok(config) => match config.port() {
                Some(port) => port,
                None => {
                    tracing::warn!("{}", crate::t!("config.missing_port", DEFAULT_PORT));
                    DEFAULT_PORT
                }
            },
            Err(e) => {
                tracing::warn!("{}", crate::t!("config.parse_failed", e));
                DEFAULT_PORT
            }
        }
    }

    /// Ecrit le port dans le fichier en conservant les autres cles.
    /// Pas d'ecriture atomique : un arret brutal peut laisser un fichier tronque.
    pub fn save(&self, port: u16) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        // Contenu existant illisible : on repart d'un objet vide
        let mut config = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|c| serde_json::from_str::<ServerConfig>(&c).ok())
            .unwrap_or_default();
        config.host_port = Some(Value::from(port));

        let content = serde_json::to_string_pretty(&config)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;
        tracing::debug!("{}", crate::t!("config.saved", port, self.path.display()));
        Ok(())
    }
}
