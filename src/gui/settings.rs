// Saisie du port dans la fenetre de parametres.
// Une valeur hors de [1024, 65535] n'atteint jamais la configuration.

use eframe::egui;
use thiserror::Error;

use crate::session::PortChange;

pub const MIN_PORT: u16 = 1024;
pub const MAX_PORT: u16 = 65535;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortInputError {
    #[error("not a port number: {0:?}")]
    NotANumber(String),
    #[error("port {0} is outside 1024-65535")]
    OutOfRange(u64),
}

/// Valide la saisie de l'utilisateur
pub fn validate_port_input(input: &str) -> Result<u16, PortInputError> {
    let trimmed = input.trim();
    let value: u64 = trimmed
        .parse()
        .map_err(|_| PortInputError::NotANumber(trimmed.to_string()))?;
    match u16::try_from(value) {
        Ok(port) if (MIN_PORT..=MAX_PORT).contains(&port) => Ok(port),
        _ => Err(PortInputError::OutOfRange(value)),
    }
}

/// Champ de saisie du port ; retourne la valeur si elle est valide
pub fn port_field(ui: &mut egui::Ui, input: &mut String) -> Option<u16> {
    ui.horizontal(|ui| {
        ui.label(crate::t!("settings.port_label"));
        ui.add(egui::TextEdit::singleline(input).desired_width(80.0));
    });

    match validate_port_input(input) {
        Ok(port) => Some(port),
        Err(_) => {
            ui.label(
                egui::RichText::new(crate::t!("settings.invalid_port", MIN_PORT, MAX_PORT))
                    .small()
                    .color(egui::Color32::from_rgb(220, 0, 0)),
            );
            None
        }
    }
}

/// Affiche le resultat d'un changement de port
pub fn report_port_change(result: &anyhow::Result<PortChange>) {
    match result {
        Ok(change) => {
            tracing::info!("{}", crate::t!("session.port_changed", change.previous, change.current));
            if change.restart_required {
                crate::gui::dialog::info(
                    &crate::t!("settings.port_changed_title"),
                    &crate::t!("settings.restart_required"),
                );
            }
        }
        Err(e) => {
            tracing::error!("{}", crate::t!("settings.save_failed_log", format!("{:#}", e)));
            crate::gui::dialog::warning(
                &crate::t!("settings.error_title"),
                &crate::t!("settings.save_failed"),
            );
        }
    }
}
