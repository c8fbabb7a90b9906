use log::info;
use serde::{Deserialize, Serialize};

use crate::{PaddockError, api::ApiClient};

pub const TELEMETRY_PATH: &str = "/telemetry";

/// Speed trace of a session, sampled against distance travelled
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySeries {
    pub session_id: String,
    /// Distance from the start of the lap, m
    pub distance: Vec<f64>,
    /// Car speed, km/h
    pub speed: Vec<f64>,
}

impl TelemetrySeries {
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.distance
            .iter()
            .zip(self.speed.iter())
            .map(|(d, s)| [*d, *s])
            .collect()
    }

    pub fn top_speed(&self) -> Option<f64> {
        self.speed.iter().copied().reduce(f64::max)
    }
}

/// Fetches telemetry for committed sessions from the browser API
#[derive(Clone, Debug)]
pub struct TelemetryClient {
    client: ApiClient,
}

impl TelemetryClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn fetch(&self, session_id: &str) -> Result<TelemetrySeries, PaddockError> {
        let series: TelemetrySeries = self
            .client
            .get(TELEMETRY_PATH, &[("session_id", session_id)])?;
        info!(
            "Fetched {} telemetry samples for {}",
            series.distance.len(),
            session_id
        );
        Ok(series)
    }
}
