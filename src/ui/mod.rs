pub mod diagnostics_window;
pub mod fallback;
pub mod favorites_view;
pub mod random_quote;

use eframe::egui;

/// Placeholder shown where text will appear once loaded.
pub(crate) fn loading_line(ui: &mut egui::Ui, label: &str) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.weak(label);
    });
}

pub(crate) fn wikipedia_url(author: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", author.trim().replace(' ', "_"))
}
