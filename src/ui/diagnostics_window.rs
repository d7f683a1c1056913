use crate::diagnostics::{ConnectivityReport, DiagnosticReport, ProbeStatus};
use eframe::egui;

/// Returns `true` when the user asks for a connectivity check.
pub fn show(
    ctx: &egui::Context,
    open: &mut bool,
    report: &DiagnosticReport,
    connectivity: Option<&ConnectivityReport>,
    checking: bool,
) -> bool {
    let mut requested = false;
    egui::Window::new("Diagnostics").open(open).default_width(420.0).show(ctx, |ui| {
        ui.label(format!("System health: {}/100", report.system_health));
        ui.label(format!("Uptime: {}s", report.uptime_ms / 1000));
        ui.label(format!("Errors logged: {}", report.total_errors));
        for (category, count) in &report.error_summary {
            ui.label(format!("  {}: {}", category, count));
        }

        ui.collapsing("Recent errors", |ui| {
            if report.recent_errors.is_empty() {
                ui.weak("None.");
            }
            for record in &report.recent_errors {
                ui.monospace(format!("{} [{}] {}", record.timestamp.format("%H:%M:%S"), record.category, record.message));
            }
        });

        match report.to_json() {
            Ok(json) => {
                if ui.button("Copy report as JSON").clicked() {
                    ui.output_mut(|o| o.copied_text = json);
                }
            }
            Err(e) => {
                ui.colored_label(egui::Color32::RED, format!("Report unavailable: {}", e));
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.add_enabled(!checking, egui::Button::new("Check connectivity")).clicked() {
                requested = true;
            }
            if checking {
                ui.spinner();
            }
        });
        if let Some(connectivity) = connectivity {
            egui::Grid::new("connectivity_grid").striped(true).show(ui, |ui| {
                for endpoint in &connectivity.endpoints {
                    ui.label(&endpoint.name);
                    let (text, color) = match endpoint.probe.status {
                        ProbeStatus::Success => (format!("HTTP {}", endpoint.probe.http_status), egui::Color32::GREEN),
                        ProbeStatus::Failed => ("unreachable".to_string(), egui::Color32::RED),
                    };
                    ui.colored_label(color, text);
                    ui.label(format!("{} ms", endpoint.probe.response_time_ms));
                    ui.end_row();
                }
            });
        }
    });
    requested
}
