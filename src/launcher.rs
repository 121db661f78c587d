// Lancement du serveur YouAudio et ouverture du navigateur.
// Le processus est detache : jamais attendu, code de sortie ignore.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::session::ServerHost;

/// Temps laisse au serveur pour demarrer apres le lancement
pub const LAUNCH_GRACE: Duration = Duration::from_millis(3000);

#[cfg(windows)]
const SERVER_EXE: &str = "youaudio.exe";
#[cfg(not(windows))]
const SERVER_EXE: &str = "youaudio";

/// Chemin de l'executable du serveur : `<base_dir>/youaudio/youaudio.exe`
pub fn server_executable(base_dir: &Path) -> PathBuf {
    base_dir.join("youaudio").join(SERVER_EXE)
}

/// Lanceur du serveur et du navigateur par defaut
#[derive(Debug, Clone)]
pub struct Launcher {
    exe: PathBuf,
    grace: Duration,
}

impl Launcher {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            exe: server_executable(base_dir),
            grace: LAUNCH_GRACE,
        }
    }

    #[cfg(test)]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Demarre le serveur sans garder de handle.
    /// Un echec est journalise puis ignore : la prochaine sonde le revelera.
    fn spawn_detached(&self) {
        let mut cmd = Command::new(&self.exe);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(
                winapi::um::winbase::DETACHED_PROCESS
                    | winapi::um::winbase::CREATE_NEW_PROCESS_GROUP,
            );
        }

        match cmd.spawn() {
            // Le Child est abandonne : le processus continue sans nous
            Ok(child) => {
                tracing::info!("{}", crate::t!("launcher.started", self.exe.display(), child.id()))
            }
            Err(e) => {
                tracing::warn!("{}", crate::t!("launcher.spawn_failed", self.exe.display(), e))
            }
        }
    }
}

impl ServerHost for Launcher {
    async fn launch(&self) {
        self.spawn_detached();
        tokio::time::sleep(self.grace).await;
    }

    fn open_url(&self, url: &str) {
        tracing::info!("{}", crate::t!("launcher.open_browser", url));
        if let Err(e) = open::that(url) {
            tracing::warn!("{}", crate::t!("launcher.browser_failed", url, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_lives_under_youaudio_dir() {
        let exe = server_executable(Path::new("/opt/tray"));
        assert_eq!(exe.parent(), Some(Path::new("/opt/tray/youaudio")));
        assert!(exe.file_name().unwrap().to_string_lossy().starts_with("youaudio"));
    }

    #[tokio::test]
    async fn missing_executable_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(dir.path()).with_grace(Duration::ZERO);
        launcher.launch().await;
    }

    #[tokio::test(start_paused = true)]
    async fn launch_waits_for_grace_period() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(dir.path());

        let started = tokio::time::Instant::now();
        launcher.launch().await;
        assert!(started.elapsed() >= LAUNCH_GRACE);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_spawns_the_server() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let exe = server_executable(dir.path());
        std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
        let marker = dir.path().join("started");
        std::fs::write(
            &exe,
            format!("#!/bin/sh\ntouch '{}'\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let launcher = Launcher::new(dir.path()).with_grace(Duration::ZERO);
        launcher.launch().await;

        let deadline = Instant::now() + Duration::from_secs(5);
        while !marker.exists() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(marker.exists());
    }
}
