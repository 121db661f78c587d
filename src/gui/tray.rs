// Icone systray Windows avec menu contextuel Ouvrir / Parametres / Quitter.
// Utilise tray-icon pour l'icone et une boucle de messages Win32.
// Double-clic sur l'icone : equivalent de "Ouvrir".

#![cfg(windows)]

use std::sync::Arc;
use tray_icon::{
    menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem},
    Icon, TrayIconBuilder, TrayIconEvent,
};

use crate::gui::state::AppState;

// Icone PNG embarquee dans le binaire
const ICON_PNG: &[u8] = include_bytes!("../../icon.png");

/// Decode un PNG en Icon compatible tray-icon
fn load_icon(png_data: &[u8]) -> anyhow::Result<Icon> {
    let img = image::load_from_memory(png_data)?.into_rgba8();
    let (w, h) = img.dimensions();
    Ok(Icon::from_rgba(img.into_raw(), w, h)?)
}

enum TrayAction {
    Open,
    Settings,
    Quit,
}

/// Lance la boucle systray Windows. Bloquant jusqu'a "Quitter".
pub fn run_tray(state: Arc<AppState>) {
    let open_item = MenuItem::new(crate::t!("tray.open"), true, None);
    let settings_item = MenuItem::new(crate::t!("tray.settings"), true, None);
    let quit_item = MenuItem::new(crate::t!("tray.quit"), true, None);

    let menu = Menu::new();
    let _ = menu.append(&open_item);
    let _ = menu.append(&settings_item);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&quit_item);

    let mut builder = TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip(super::tray_tooltip(state.port()));
    match load_icon(ICON_PNG) {
        Ok(icon) => builder = builder.with_icon(icon),
        Err(e) => tracing::warn!("{}", crate::t!("app.icon_failed", e)),
    }

    // Sans systray, l'application continue : le serveur et le navigateur restent utiles
    let tray_icon = match builder.build() {
        Ok(tray) => Some(tray),
        Err(e) => {
            tracing::error!("{}", crate::t!("app.tray_failed", e));
            None
        }
    };

    let open_id = open_item.id().clone();
    let settings_id = settings_item.id().clone();
    let quit_id = quit_item.id().clone();
    state.set_tray_quit_menu_id(quit_id.as_ref().to_string());

    state.startup();

    let mut shown_port = state.port();

    // Boucle de messages Win32 non-bloquante
    loop {
        // Traitement des messages Windows (necessaire pour le systray)
        unsafe {
            let mut msg: winapi::um::winuser::MSG = std::mem::zeroed();
            while winapi::um::winuser::PeekMessageW(
                &mut msg,
                std::ptr::null_mut(),
                0,
                0,
                winapi::um::winuser::PM_REMOVE,
            ) != 0
            {
                winapi::um::winuser::TranslateMessage(&msg);
                winapi::um::winuser::DispatchMessageW(&msg);
            }
        }

        let mut action = None;
        while let Ok(event) = TrayIconEvent::receiver().try_recv() {
            if matches!(event, TrayIconEvent::DoubleClick { .. }) {
                action = Some(TrayAction::Open);
            }
        }
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            if event.id == open_id {
                action = Some(TrayAction::Open);
            } else if event.id == settings_id {
                action = Some(TrayAction::Settings);
            } else if event.id == quit_id {
                action = Some(TrayAction::Quit);
            }
        }

        match action {
            Some(TrayAction::Open) => state.open(),
            Some(TrayAction::Settings) => {
                crate::gui::window::run_settings_window(Arc::clone(&state))
            }
            Some(TrayAction::Quit) => state.quit(),
            None => {}
        }

        if state.should_quit() {
            break;
        }

        // Infobulle synchronisee avec le port courant
        let port = state.port();
        if port != shown_port {
            shown_port = port;
            if let Some(tray) = &tray_icon {
                let _ = tray.set_tooltip(Some(super::tray_tooltip(port)));
            }
        }

        // Attendre 50ms pour ne pas saturer le CPU
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}
