use super::{loading_line, wikipedia_url};
use crate::app::Views;
use crate::diagnostics::{context, Diagnostics};
use crate::types::quote::Quote;
use eframe::egui;

enum RowAction {
    Remove(Quote),
    Translate(Quote),
}

pub fn show(ui: &mut egui::Ui, views: &mut Views, diagnostics: &Diagnostics) {
    let favorites = &views.favorites;
    let translations = &views.favorite_translations;
    ui.heading("Favorites");
    ui.separator();

    if favorites.is_empty() {
        ui.weak("No favorites yet. Save a quote from the Random Quote view.");
        return;
    }

    let mut action = None;
    egui::ScrollArea::vertical().id_source("favorites_scroll").auto_shrink([false, false]).show(ui, |ui| {
        for (index, fav) in favorites.list().iter().enumerate() {
            let key = fav.key();
            let translated = translations.translation(&key);
            ui.push_id(index, |ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        let text = if translated.quote.is_empty() { &fav.content } else { &translated.quote };
                        let author = if translated.author.is_empty() { &fav.author } else { &translated.author };
                        ui.label(format!("\u{201c}{}\u{201d}", text));
                        ui.horizontal(|ui| {
                            ui.weak(format!("- {}", author));
                            ui.hyperlink_to("Wiki", wikipedia_url(&fav.author));
                        });
                        if translations.is_translating(&key) {
                            loading_line(ui, "Translating...");
                        }
                        let error = translations.error(&key);
                        if !error.is_empty() {
                            ui.colored_label(egui::Color32::LIGHT_RED, error);
                        }
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Remove").clicked() {
                            action = Some(RowAction::Remove(fav.clone()));
                        }
                        let label = if translated.is_empty() && !translations.is_translating(&key) {
                            "Translate"
                        } else {
                            "Show original"
                        };
                        if ui.button(label).clicked() {
                            action = Some(RowAction::Translate(fav.clone()));
                        }
                    });
                });
            });
            ui.separator();
        }
    });

    match action {
        Some(RowAction::Remove(quote)) => {
            if let Err(e) = views.toggle_favorite(&quote) {
                diagnostics.log_error(&e, context(&[("operation", "toggle_favorite")]));
            }
        }
        Some(RowAction::Translate(quote)) => {
            views.favorite_translations.toggle(quote.key(), &quote.content, &quote.author);
        }
        None => {}
    }
}
