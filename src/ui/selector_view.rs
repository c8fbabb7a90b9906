use egui::{Button, Color32, RichText};
use egui_dropdown::DropDownBox;
use itertools::Itertools;
use log::debug;

use paddock::CatalogState;

use super::{BrowserApp, PALETTE_ORANGE};

impl BrowserApp {
    pub(crate) fn selector_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("session_selectors")
            .min_height(30.)
            .show(ctx, |ui| {
                ui.add_space(5.);
                ui.horizontal(|ui| {
                    self.show_selectors(ui);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .add_enabled(!self.browser.is_loading(), Button::new("Reload"))
                            .clicked()
                        {
                            self.browser.reload_catalog();
                        }
                        match self.browser.catalog_state() {
                            CatalogState::Loading => {
                                ui.spinner();
                            }
                            CatalogState::Ready(catalog) => {
                                ui.label(
                                    RichText::new(format!("{} sessions", catalog.len()))
                                        .color(Color32::GRAY),
                                );
                            }
                            CatalogState::Failed { .. } => {}
                        }
                    });
                });
                self.show_notice(ui);
                ui.add_space(5.);
            });
    }

    fn show_selectors(&mut self, ui: &mut egui::Ui) {
        let enabled = self.browser.selection_enabled();

        // the text buffers follow the selection so reloads and year changes clear them
        let selection = self.browser.selection();
        self.year_input = selection.selected_year().unwrap_or_default().to_string();
        self.event_input = selection.selected_event().unwrap_or_default().to_string();

        let years = self
            .browser
            .year_options()
            .into_iter()
            .map(str::to_string)
            .collect_vec();
        let previous_year = self.year_input.clone();
        ui.label(RichText::new("Year: ").color(Color32::WHITE));
        ui.add_enabled_ui(enabled, |ui| {
            ui.add(
                DropDownBox::from_iter(years, "year_dropbox", &mut self.year_input, |ui, text| {
                    ui.selectable_label(false, text)
                })
                .filter_by_input(false),
            );
        });
        if previous_year != self.year_input {
            self.browser.select_year(&self.year_input);
            self.event_input.clear();
        }

        let events = self
            .browser
            .event_options()
            .into_iter()
            .map(str::to_string)
            .collect_vec();
        let previous_event = self.event_input.clone();
        ui.label(RichText::new("Event: ").color(Color32::WHITE));
        ui.add_enabled_ui(enabled && !self.year_input.is_empty(), |ui| {
            ui.add(
                DropDownBox::from_iter(
                    events,
                    "event_dropbox",
                    &mut self.event_input,
                    |ui, text| ui.selectable_label(false, text),
                )
                .filter_by_input(false),
            );
        });
        if previous_event != self.event_input {
            self.browser.select_event(&self.event_input);
        }

        let sessions = self
            .browser
            .session_options()
            .into_iter()
            .map(|r| (r.session_id.clone(), r.session_type.clone()))
            .collect_vec();
        let selected_id = self
            .browser
            .selection()
            .selected_session_id()
            .map(str::to_string);
        let selected_text = selected_id
            .as_deref()
            .and_then(|id| sessions.iter().find(|(sid, _)| sid == id))
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| "Select a session".to_string());

        let mut clicked_session = None;
        ui.label(RichText::new("Session: ").color(Color32::WHITE));
        ui.add_enabled_ui(enabled && !self.event_input.is_empty(), |ui| {
            egui::ComboBox::from_id_salt("session_combobox")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (session_id, label) in &sessions {
                        let is_selected = selected_id.as_deref() == Some(session_id.as_str());
                        if ui.selectable_label(is_selected, label).clicked() {
                            clicked_session = Some(session_id.clone());
                        }
                    }
                });
        });
        if let Some(session_id) = clicked_session {
            self.browser.select_session(&session_id);
        }

        if ui
            .add_enabled(
                self.browser.can_commit(),
                Button::new(RichText::new("Apply").color(PALETTE_ORANGE)),
            )
            .clicked()
        {
            // stale selections surface through the notice banner
            if let Err(e) = self.browser.commit() {
                debug!("Selection not applied: {}", e);
            }
        }
    }

    fn show_notice(&mut self, ui: &mut egui::Ui) {
        let Some(notice) = self.browser.notice() else {
            return;
        };
        let color = if notice.is_error() {
            Color32::RED
        } else {
            Color32::GREEN
        };
        let message = notice.message();
        let mut dismissed = false;
        ui.horizontal(|ui| {
            ui.label(RichText::new(message).color(color));
            dismissed = ui.small_button("✖").clicked();
        });
        if dismissed {
            self.browser.dismiss_notice();
        }
    }
}
