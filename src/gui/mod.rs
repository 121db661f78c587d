// Module GUI — dispatch selon la plateforme.
// Windows : icone systray + fenetre de parametres a la demande
// Autres : fenetre egui de controle directement

pub mod dialog;
pub mod settings;
pub mod state;
pub mod window;

#[cfg(windows)]
pub mod tray;

use state::AppState;
use std::sync::Arc;

/// Infobulle de l'icone systray, avec le port courant
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn tray_tooltip(port: u16) -> String {
    format!("YouAudio :{}", port)
}

/// Lance l'interface graphique appropriee selon la plateforme.
/// La sequence de demarrage s'execute une fois l'interface affichee,
/// puis l'appel bloque jusqu'a "Quitter".
/// Doit etre appelee sur le thread principal.
pub fn run_gui(state: Arc<AppState>) {
    #[cfg(windows)]
    {
        tray::run_tray(state);
    }

    #[cfg(not(windows))]
    {
        window::run_control_window(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tooltip_shows_current_port() {
        assert_eq!(tray_tooltip(9527), "YouAudio :9527");
        assert_eq!(tray_tooltip(8080), "YouAudio :8080");
    }
}
