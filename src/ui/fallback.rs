use crate::diagnostics::ErrorRecord;
use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    /// Remount the views from the store.
    Reload,
    /// Wipe the stored quote and favorites, then remount.
    Reset,
}

pub fn show(ui: &mut egui::Ui, record: &ErrorRecord) -> Option<FallbackAction> {
    let mut action = None;
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading(egui::RichText::new("Something went wrong").color(egui::Color32::LIGHT_RED));
        ui.label("The application hit an unexpected error. It has been logged for debugging.");
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Reload").clicked() {
                action = Some(FallbackAction::Reload);
            }
            if ui.button("Reset local data").clicked() {
                action = Some(FallbackAction::Reset);
            }
        });
    });
    ui.add_space(12.0);
    ui.collapsing("Error details", |ui| {
        ui.monospace(format!("{} [{}]", record.timestamp.to_rfc3339(), record.category));
        ui.monospace(&record.message);
        ui.monospace(&record.stack);
    });
    action
}
