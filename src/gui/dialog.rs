// Boites de message natives (rfd), bloquantes.

use rfd::{MessageButtons, MessageDialog, MessageLevel};

fn show(level: MessageLevel, title: &str, text: &str) {
    let _ = MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(text)
        .set_buttons(MessageButtons::Ok)
        .show();
}

pub fn info(title: &str, text: &str) {
    show(MessageLevel::Info, title, text);
}

pub fn warning(title: &str, text: &str) {
    show(MessageLevel::Warning, title, text);
}
