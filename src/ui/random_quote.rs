use super::{loading_line, wikipedia_url};
use crate::app::Views;
use crate::diagnostics::{context, Diagnostics};
use eframe::egui;

pub fn show(ui: &mut egui::Ui, views: &mut Views, diagnostics: &Diagnostics) {
    let Views { fetcher, current_translation: translation, favorites, .. } = &mut *views;
    translation.follow_quote(fetcher.quote());
    let quote = fetcher.quote().clone();
    let loading = fetcher.is_loading();
    let mut toggle_favorite = false;

    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.heading("Random Quote");
        ui.add_space(12.0);

        if !fetcher.error().is_empty() {
            ui.colored_label(egui::Color32::LIGHT_RED, fetcher.error());
            if ui.button("Retry").clicked() {
                fetcher.fetch();
            }
            ui.add_space(12.0);
        }

        egui::Frame::group(ui.style()).inner_margin(16.0).show(ui, |ui| {
            ui.set_max_width(560.0);
            if loading {
                loading_line(ui, "Loading quote...");
                loading_line(ui, "Loading author...");
                return;
            }
            if !quote.has_content() {
                ui.weak("No quote yet.");
                return;
            }

            let translated = translation.translation();
            let text = if translated.quote.is_empty() { &quote.content } else { &translated.quote };
            let author = if translated.author.is_empty() { &quote.author } else { &translated.author };
            ui.label(egui::RichText::new(format!("\u{201c}{}\u{201d}", text)).size(22.0));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(format!("- {}", author)).italics());
                ui.hyperlink_to("Wiki", wikipedia_url(&quote.author));
            });
            if translation.is_translating() {
                loading_line(ui, "Translating...");
            }
            if !translation.error().is_empty() {
                ui.colored_label(egui::Color32::LIGHT_RED, translation.error());
            }
        });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.add_enabled(!loading, egui::Button::new("New Quote")).clicked() {
                fetcher.fetch();
            }

            let saved = favorites.contains(&quote);
            let label = if saved { "Remove from favorites" } else { "Save to favorites" };
            if ui.add_enabled(quote.has_content() && !loading, egui::Button::new(label)).clicked() {
                toggle_favorite = true;
            }

            let translate_label = if translation.has_translation() || translation.is_translating() {
                "Show original"
            } else {
                "Translate"
            };
            if ui.add_enabled(quote.has_content() && !loading, egui::Button::new(translate_label)).clicked() {
                translation.toggle(&quote);
            }
        });
    });

    if toggle_favorite {
        if let Err(e) = views.toggle_favorite(&quote) {
            diagnostics.log_error(&e, context(&[("operation", "toggle_favorite")]));
        }
    }
}
