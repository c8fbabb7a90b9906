use egui::{Color32, RichText};
use egui_plot::{Legend, Line, PlotPoints};

use super::{BrowserApp, PALETTE_ORANGE, TelemetryPanel};

impl BrowserApp {
    pub(crate) fn telemetry_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.applied_session else {
                ui.label(
                    RichText::new("Pick a year, event and session, then press Apply.")
                        .color(Color32::GRAY),
                );
                return;
            };

            ui.heading(
                RichText::new(format!(
                    "{} {} - {}",
                    session.year, session.event_name, session.session_type
                ))
                .color(PALETTE_ORANGE),
            );
            ui.label(RichText::new(&session.session_id).color(Color32::GRAY).small());
            ui.add_space(5.);

            match &self.telemetry_panel {
                TelemetryPanel::Idle => {}
                TelemetryPanel::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading telemetry...");
                    });
                }
                TelemetryPanel::Unavailable => {
                    ui.label(
                        RichText::new("Telemetry is only available through the browser API.")
                            .color(Color32::GRAY),
                    );
                }
                TelemetryPanel::Error { message } => {
                    ui.label(RichText::new(message).color(Color32::RED));
                }
                TelemetryPanel::Display { series } => {
                    if let Some(top_speed) = series.top_speed() {
                        ui.label(format!("Top speed: {:.1} km/h", top_speed));
                    }
                    let speed_points = PlotPoints::new(series.points());
                    egui_plot::Plot::new("speed_trace")
                        .legend(Legend::default())
                        .include_y(0.)
                        .x_axis_label("Distance (m)")
                        .y_axis_label("Speed (km/h)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Speed", speed_points).color(PALETTE_ORANGE));
                        });
                }
            }
        });
    }
}
