use crate::{
    Config, FetchError, ForecastRequest,
    provider::cwa::{CityForecast, CwaProvider},
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod cwa;

/// A source of per-city forecasts.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Fetch the forecast for `request.city`.
    ///
    /// Returns `Ok(None)` when the response carries no location with exactly that name.
    async fn get_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<Option<CityForecast>, FetchError>;
}

/// Construct the CWA provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<CwaProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No CWA API key configured.\n\
                 Hint: set API_KEY (e.g. in .env) or run `forecast configure`."
        )
    })?;

    let provider = CwaProvider::with_timeout(
        api_key.to_owned(),
        config.endpoint.clone(),
        Duration::from_secs(config.fetch.timeout_secs),
    )?;

    Ok(provider)
}
