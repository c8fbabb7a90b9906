use std::{path::PathBuf, sync::Arc};

use egui::{Button, Color32, RichText, TextEdit};

use paddock::{CacheConfigurator, PaddockError, flight::SingleFlight};

use super::{BrowserApp, PALETTE_ORANGE};

/// Outcome of a cache configuration request, tagged with the directory it was
/// submitted for.
pub(crate) struct ConfiguredCache {
    pub(crate) cache_dir: PathBuf,
    pub(crate) added: usize,
}

/// Path field and the configuration request it submits
pub(crate) struct CacheForm {
    pub(crate) path_input: String,
    request: SingleFlight<ConfiguredCache>,
}

impl CacheForm {
    pub(crate) fn new(path_input: String) -> Self {
        Self {
            path_input,
            request: SingleFlight::new("cache configuration"),
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.request.is_pending()
    }

    pub(crate) fn can_submit(&self) -> bool {
        !self.path_input.trim().is_empty() && !self.is_pending()
    }

    pub(crate) fn submit(&mut self, configurator: Arc<dyn CacheConfigurator>) {
        let cache_dir = PathBuf::from(self.path_input.trim());
        self.request.start(move || {
            let added = configurator.configure(&cache_dir)?;
            Ok(ConfiguredCache { cache_dir, added })
        });
    }

    pub(crate) fn poll(&mut self) -> Option<Result<ConfiguredCache, PaddockError>> {
        self.request.poll()
    }
}

impl BrowserApp {
    pub(crate) fn cache_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(RichText::new("FastF1 Browser").color(PALETTE_ORANGE).strong());
            ui.add_space(10.);
            ui.label("Point the browser at a FastF1 cache directory to list its sessions.");
            ui.add_space(5.);

            let is_pending = self.cache_form.is_pending();
            ui.horizontal(|ui| {
                ui.add_enabled(
                    !is_pending,
                    TextEdit::singleline(&mut self.cache_form.path_input)
                        .hint_text("Cache directory path")
                        .desired_width(360.),
                );
                if ui
                    .add_enabled(!is_pending, Button::new("Browse…"))
                    .clicked()
                    && let Some(folder) = rfd::FileDialog::new().pick_folder()
                {
                    self.cache_form.path_input = folder.display().to_string();
                }
                if ui
                    .add_enabled(self.cache_form.can_submit(), Button::new("Go"))
                    .clicked()
                {
                    self.cache_form.submit(Arc::clone(&self.configurator));
                }
                if is_pending {
                    ui.spinner();
                }
            });

            if let Some(notice) = self.browser.notice() {
                let color = if notice.is_error() {
                    Color32::RED
                } else {
                    Color32::GREEN
                };
                ui.add_space(5.);
                ui.label(RichText::new(notice.message()).color(color));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock::cache_config::LocalCacheConfigurator;
    use std::{fs::File, time::Duration};
    use tempfile::TempDir;

    #[test]
    fn test_result_carries_the_submitted_directory() {
        let cache = TempDir::new().unwrap();
        File::create(
            cache
                .path()
                .join("2024_2024-06-30_Austrian_Grand_Prix_R.ff1pkl"),
        )
        .unwrap();

        let mut form = CacheForm::new(cache.path().display().to_string());
        assert!(form.can_submit());
        form.submit(Arc::new(LocalCacheConfigurator));
        assert!(!form.can_submit());

        // edits made while the request runs do not change what was configured
        form.path_input = "/somewhere/else".to_string();
        let configured = form
            .request
            .wait(Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(configured.cache_dir, cache.path());
        assert_eq!(configured.added, 1);
    }

    #[test]
    fn test_blank_path_cannot_be_submitted() {
        let form = CacheForm::new("   ".to_string());
        assert!(!form.can_submit());
    }
}
