// Fenetres egui du lanceur.
// Windows : fenetre "Parametres" ouverte depuis le menu du systray.
// Autres plateformes : fenetre de controle avec Ouvrir / Parametres / Quitter.

use std::sync::Arc;

use eframe::egui;

use crate::gui::settings::{port_field, report_port_change};
use crate::gui::state::AppState;

/// Icone PNG embarquee pour la fenetre
const WINDOW_ICON_PNG: &[u8] = include_bytes!("../../icon.png");

/// Charge l'icone PNG et la convertit en IconData pour egui
fn load_window_icon() -> Option<egui::IconData> {
    match image::load_from_memory(WINDOW_ICON_PNG) {
        Ok(img) => {
            let img = img.into_rgba8();
            let (w, h) = img.dimensions();
            Some(egui::IconData {
                rgba: img.into_raw(),
                width: w,
                height: h,
            })
        }
        Err(e) => {
            tracing::warn!("{}", crate::t!("app.icon_failed", e));
            None
        }
    }
}

fn native_options(size: [f32; 2]) -> eframe::NativeOptions {
    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(size)
        .with_resizable(false)
        .with_always_on_top();
    if let Some(icon) = load_window_icon() {
        viewport = viewport.with_icon(Arc::new(icon));
    }
    eframe::NativeOptions {
        viewport,
        ..Default::default()
    }
}

/// Fenetre modale de changement de port. Bloquant jusqu'a sa fermeture.
#[cfg(windows)]
pub fn run_settings_window(state: Arc<AppState>) {
    let result = eframe::run_native(
        &crate::t!("settings.title"),
        native_options([320.0, 140.0]),
        Box::new(move |_cc| Ok(Box::new(SettingsApp::new(state)))),
    );
    if let Err(e) = result {
        tracing::error!("{}", crate::t!("app.window_failed", e));
    }
}

#[cfg(windows)]
struct SettingsApp {
    state: Arc<AppState>,
    port_input: String,
}

#[cfg(windows)]
impl SettingsApp {
    fn new(state: Arc<AppState>) -> Self {
        let port_input = state.port().to_string();
        Self { state, port_input }
    }

    /// Traite les evenements du menu systray pendant que la fenetre est ouverte
    /// Permet de quitter l'application meme si la fenetre de parametres est affichee
    fn drain_tray_menu_events(&self) {
        use tray_icon::menu::MenuEvent;
        use tray_icon::TrayIconEvent;

        if let Some(ref quit_id) = self.state.get_tray_quit_menu_id() {
            while let Ok(event) = MenuEvent::receiver().try_recv() {
                if event.id.as_ref() == quit_id.as_str() {
                    self.state.quit();
                }
            }
        }
        while TrayIconEvent::receiver().try_recv().is_ok() {}
    }
}

#[cfg(windows)]
impl eframe::App for SettingsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
        self.drain_tray_menu_events();

        let mut close = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            let port = port_field(ui, &mut self.port_input);
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(port.is_some(), egui::Button::new(crate::t!("settings.ok")))
                    .clicked()
                {
                    if let Some(port) = port {
                        report_port_change(&self.state.apply_port(port));
                    }
                    close = true;
                }
                if ui.button(crate::t!("settings.cancel")).clicked() {
                    close = true;
                }
            });
        });

        if close || self.state.should_quit() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

/// Fenetre de controle, utilisee a la place du systray. Bloquant jusqu'a Quitter.
#[cfg(not(windows))]
pub fn run_control_window(state: Arc<AppState>) {
    let result = eframe::run_native(
        &crate::t!("control.title"),
        native_options([340.0, 200.0]),
        Box::new(move |_cc| Ok(Box::new(ControlApp::new(state)))),
    );
    if let Err(e) = result {
        tracing::error!("{}", crate::t!("app.window_failed", e));
    }
}

/// Declenche la sequence de demarrage une fois qu'une image a ete affichee
#[cfg(not(windows))]
#[derive(Debug, Default)]
struct DeferredStartup {
    frames_shown: u8,
    done: bool,
}

#[cfg(not(windows))]
impl DeferredStartup {
    /// Appele a chaque image ; vrai une seule fois, a partir de la deuxieme
    fn tick(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.frames_shown = self.frames_shown.saturating_add(1);
        self.done = self.frames_shown >= 2;
        self.done
    }
}

#[cfg(not(windows))]
struct ControlApp {
    state: Arc<AppState>,
    port_input: String,
    startup: DeferredStartup,
}

#[cfg(not(windows))]
impl ControlApp {
    fn new(state: Arc<AppState>) -> Self {
        let port_input = state.port().to_string();
        Self {
            state,
            port_input,
            startup: DeferredStartup::default(),
        }
    }
}

#[cfg(not(windows))]
impl eframe::App for ControlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("YouAudio");
            ui.label(crate::t!("control.current_port", self.state.port()));
            ui.add_space(8.0);

            if ui.button(crate::t!("tray.open")).clicked() {
                self.state.open();
            }

            ui.add_space(8.0);
            ui.separator();
            ui.add_space(8.0);

            let port = port_field(ui, &mut self.port_input);
            if ui
                .add_enabled(port.is_some(), egui::Button::new(crate::t!("settings.ok")))
                .clicked()
            {
                if let Some(port) = port {
                    report_port_change(&self.state.apply_port(port));
                }
            }

            ui.add_space(8.0);
            ui.separator();

            if ui.button(crate::t!("tray.quit")).clicked() {
                self.state.quit();
            }
        });

        // La fenetre est deja visible quand la sonde et le lancement bloquent
        if self.startup.tick() {
            self.state.startup();
        } else if !self.startup.done {
            ctx.request_repaint();
        }

        if self.state.should_quit() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}
