use std::{
    sync::{
        Arc,
        mpsc::{Receiver, Sender},
    },
    time::Duration,
};

use egui::{Color32, Visuals, style::Widgets};
use log::{error, info};

use cache_view::CacheForm;
use paddock::{
    AppConfig, CacheConfigurator, SessionBrowser, SessionRecord,
    flight::SingleFlight,
    telemetry::{TelemetryClient, TelemetrySeries},
};

mod cache_view;
mod selector_view;
mod telemetry_view;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_BROWN: Color32 = Color32::from_rgb(72, 30, 20);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
pub(crate) const PALETTE_ORANGE: Color32 = Color32::from_rgb(242, 97, 63);

const PENDING_REPAINT_MS: u64 = 100;

pub(crate) enum TelemetryPanel {
    Idle,
    Loading,
    Unavailable,
    Display { series: TelemetrySeries },
    Error { message: String },
}

/// Desktop front-end: cache configuration first, then the session cascade with
/// the telemetry of the applied session underneath.
pub(crate) struct BrowserApp {
    browser: SessionBrowser<Sender<SessionRecord>>,
    committed_rx: Receiver<SessionRecord>,
    configurator: Arc<dyn CacheConfigurator>,
    cache_form: CacheForm,
    year_input: String,
    event_input: String,
    applied_session: Option<SessionRecord>,
    telemetry_client: Option<TelemetryClient>,
    telemetry_request: SingleFlight<TelemetrySeries>,
    telemetry_panel: TelemetryPanel,
    app_config: AppConfig,
}

impl BrowserApp {
    pub(crate) fn new(
        browser: SessionBrowser<Sender<SessionRecord>>,
        committed_rx: Receiver<SessionRecord>,
        configurator: Arc<dyn CacheConfigurator>,
        telemetry_client: Option<TelemetryClient>,
        app_config: AppConfig,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let default_visuals = Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_MAROON,
            faint_bg_color: PALETTE_BLACK,
            extreme_bg_color: PALETTE_BROWN,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            widgets: Widgets::dark(),
            striped: false,
            ..Default::default()
        };
        cc.egui_ctx.set_visuals(default_visuals);

        let cache_path_input = app_config
            .last_cache_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        Self {
            browser,
            committed_rx,
            configurator,
            cache_form: CacheForm::new(cache_path_input),
            year_input: String::new(),
            event_input: String::new(),
            applied_session: None,
            telemetry_client,
            telemetry_request: SingleFlight::new("telemetry"),
            telemetry_panel: TelemetryPanel::Idle,
            app_config,
        }
    }

    fn process_background_results(&mut self) {
        if let Some(result) = self.cache_form.poll() {
            let result = result.map(|configured| {
                self.app_config.last_cache_dir = Some(configured.cache_dir);
                if let Err(e) = self.app_config.save() {
                    error!("Error while saving config file: {}", e);
                }
                configured.added
            });
            self.browser.cache_configured(result);
        }

        self.browser.poll();

        // one notification per Apply click; the newest one wins
        while let Ok(record) = self.committed_rx.try_recv() {
            self.show_session(record);
        }

        if let Some(result) = self.telemetry_request.poll() {
            self.telemetry_panel = match result {
                Ok(series) => TelemetryPanel::Display { series },
                Err(e) => TelemetryPanel::Error {
                    message: format!("Could not load telemetry: {}", e.detail()),
                },
            };
        }
    }

    fn show_session(&mut self, record: SessionRecord) {
        info!("Showing session {}", record.session_id);
        match &self.telemetry_client {
            Some(client) => {
                let client = client.clone();
                let session_id = record.session_id.clone();
                self.telemetry_request.start(move || client.fetch(&session_id));
                self.telemetry_panel = TelemetryPanel::Loading;
            }
            None => {
                self.telemetry_request.cancel();
                self.telemetry_panel = TelemetryPanel::Unavailable;
            }
        }
        self.applied_session = Some(record);
    }

    fn has_pending_work(&self) -> bool {
        self.cache_form.is_pending()
            || self.browser.is_loading()
            || self.telemetry_request.is_pending()
    }
}

impl eframe::App for BrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_background_results();

        match self.browser.lifecycle() {
            paddock::Lifecycle::AwaitingCacheConfiguration => self.cache_view(ctx),
            paddock::Lifecycle::Ready => {
                self.selector_view(ctx);
                self.telemetry_view(ctx);
            }
        }

        if self.has_pending_work() {
            ctx.request_repaint_after(Duration::from_millis(PENDING_REPAINT_MS));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.app_config.save() {
            error!("Error while saving config file: {}", e);
        }
    }
}
