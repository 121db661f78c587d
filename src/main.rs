// Point d'entree du lanceur YouAudio.
// Le thread principal gere l'interface (systray Windows ou fenetre egui ailleurs).
// Les appels HTTP tournent sur un runtime tokio pilote depuis ce meme thread.

// En mode release sur Windows, masquer la console
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod gui;
mod i18n;
mod launcher;
mod probe;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use single_instance::SingleInstance;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gui::state::AppState;

/// Nom du verrou inter-processus garantissant une seule instance
const INSTANCE_NAME: &str = "YouAudioTrayInstance";

#[derive(Parser, Debug)]
#[command(name = "youaudio-tray", about = "Tray launcher for the YouAudio server")]
struct Cli {
    /// Repertoire contenant `youaudio/` (defaut : repertoire de l'executable)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Langue de l'interface (defaut : selon la locale systeme)
    #[arg(long, value_parser = ["en", "zh"])]
    language: Option<String>,

    /// Filtre de traces (syntaxe EnvFilter)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Repertoire des journaux (defaut : <base-dir>/logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Ne pas ouvrir le navigateur au demarrage
    #[arg(long)]
    no_browser: bool,
}

fn main() {
    let cli = Cli::parse();

    // Traductions embarquees : sans elles, pas d'interface
    let language = cli
        .language
        .clone()
        .unwrap_or_else(|| i18n::detect_language().to_string());
    if let Err(e) = i18n::init(&language) {
        eprintln!("Failed to load translations: {:#}", e);
        gui::dialog::warning("YouAudio", &format!("Failed to load translations: {:#}", e));
        std::process::exit(1);
    }

    let base_dir = resolve_base_dir(cli.base_dir.as_deref()).unwrap_or_else(|e| {
        eprintln!("{:#}", e);
        PathBuf::from(".")
    });
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| base_dir.join("logs"));
    let _log_guard = init_logging(&log_dir, &cli.log_level);

    tracing::info!("{}", t!("app.starting", env!("CARGO_PKG_VERSION")));
    tracing::info!("{}", t!("app.base_dir", base_dir.display()));

    // Une seule instance : le verrou est libere par l'OS a la sortie du processus
    let instance = match SingleInstance::new(INSTANCE_NAME) {
        Ok(instance) if instance.is_single() => instance,
        Ok(_) => exit_already_running(None),
        Err(e) => exit_already_running(Some(e.to_string())),
    };

    let state = match AppState::new(&base_dir, !cli.no_browser) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("{}", t!("app.init_failed", format!("{:#}", e)));
            gui::dialog::warning("YouAudio", &t!("app.init_failed", format!("{:#}", e)));
            std::process::exit(1);
        }
    };

    // Bloquant jusqu'a "Quitter"
    gui::run_gui(state);

    tracing::info!("{}", t!("app.stopped"));
    drop(instance);
}

fn exit_already_running(cause: Option<String>) -> ! {
    match cause {
        Some(cause) => tracing::warn!("{}", t!("app.instance_check_failed", cause)),
        None => tracing::warn!("{}", t!("app.already_running")),
    }
    gui::dialog::warning("YouAudio", &t!("app.already_running"));
    std::process::exit(1);
}

/// Repertoire de base : option CLI ou repertoire de l'executable
fn resolve_base_dir(cli_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = cli_dir {
        return Ok(dir.to_path_buf());
    }
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("Executable has no parent directory: {}", exe.display()))
}

/// Initialise le logging : fichier journalier dans {log_dir}/AAAA/MM/,
/// plus stdout hors Windows release.
/// Si le repertoire de logs est inaccessible, seule la sortie stdout est conservee.
fn init_logging(log_dir: &Path, filter_str: &str) -> Option<WorkerGuard> {
    let now = Local::now();
    let log_dir = log_dir
        .join(now.format("%Y").to_string())
        .join(now.format("%m").to_string());

    let (file_layer, guard) = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            // Appender de fichier avec rotation quotidienne dans le repertoire mensuel
            let file_appender = tracing_appender::rolling::daily(&log_dir, "youaudio-tray");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
            (None, None)
        }
    };

    let stdout_layer = (cfg!(not(windows)) || cfg!(debug_assertions))
        .then(|| fmt::layer().with_ansi(false).with_target(false));

    let filter = EnvFilter::try_new(filter_str).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["youaudio-tray"]).unwrap();
        assert!(cli.base_dir.is_none());
        assert!(cli.language.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.no_browser);
    }

    #[test]
    fn cli_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["youaudio-tray", "--language", "de"]).is_err());
        let cli = Cli::try_parse_from(["youaudio-tray", "--language", "zh", "--no-browser"]).unwrap();
        assert_eq!(cli.language.as_deref(), Some("zh"));
        assert!(cli.no_browser);
    }

    #[test]
    fn base_dir_override_wins() {
        let dir = resolve_base_dir(Some(Path::new("/srv/youaudio"))).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/youaudio"));
        assert!(resolve_base_dir(None).unwrap().is_absolute());
    }
}
