use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    error::FetchError,
    model::{ForecastEntry, ForecastRecord, ForecastRequest, TimeSlot},
};

use super::ForecastProvider;

/// A weather element of the CWA 36-hour forecast dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    /// Sky condition.
    Wx,
    /// Probability of precipitation.
    PoP,
    MinT,
    MaxT,
    /// Comfort index.
    CI,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wx,
        Element::PoP,
        Element::MinT,
        Element::MaxT,
        Element::CI,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Element::Wx => "Wx",
            Element::PoP => "PoP",
            Element::MinT => "MinT",
            Element::MaxT => "MaxT",
            Element::CI => "CI",
        }
    }

    /// Attach the display unit the persisted table uses.
    pub fn format(self, raw: &str) -> String {
        match self {
            Element::PoP => format!("{raw}%"),
            Element::MinT | Element::MaxT => format!("{raw}°C"),
            Element::Wx | Element::CI => raw.to_string(),
        }
    }
}

/// All forecast series the API returned for one location.
#[derive(Debug, Clone)]
pub struct CityForecast {
    location_name: String,
    elements: Vec<CwaElement>,
}

impl CityForecast {
    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Build the table row for a single time slot.
    pub fn record_at(&self, slot: TimeSlot) -> Result<ForecastRecord, FetchError> {
        Ok(ForecastRecord {
            condition: self.value_at(Element::Wx, slot)?,
            precipitation_probability: self.value_at(Element::PoP, slot)?,
            min_temperature: self.value_at(Element::MinT, slot)?,
            max_temperature: self.value_at(Element::MaxT, slot)?,
            comfort_index: self.value_at(Element::CI, slot)?,
            city: self.location_name.clone(),
        })
    }

    /// One entry per time slot present in every element.
    pub fn timeline(&self) -> Result<Vec<ForecastEntry>, FetchError> {
        let mut slots = usize::MAX;
        for element in Element::ALL {
            slots = slots.min(self.series(element)?.len());
        }

        (0..slots)
            .map(|i| {
                let slot = TimeSlot::new(i);
                let window = self.slot(Element::Wx, slot)?;
                Ok(ForecastEntry {
                    start_time: window.start_time.clone(),
                    end_time: window.end_time.clone(),
                    condition: self.value_at(Element::Wx, slot)?,
                    precipitation_probability: self.value_at(Element::PoP, slot)?,
                    min_temperature: self.value_at(Element::MinT, slot)?,
                    max_temperature: self.value_at(Element::MaxT, slot)?,
                    comfort_index: self.value_at(Element::CI, slot)?,
                    city: Some(self.location_name.clone()),
                })
            })
            .collect()
    }

    fn series(&self, element: Element) -> Result<&[CwaTime], FetchError> {
        self.elements
            .iter()
            .find(|e| e.element_name == element.code())
            .map(|e| e.time.as_slice())
            .ok_or_else(|| FetchError::MissingElement {
                city: self.location_name.clone(),
                element: element.code(),
            })
    }

    fn slot(&self, element: Element, slot: TimeSlot) -> Result<&CwaTime, FetchError> {
        let series = self.series(element)?;
        series.get(slot.index()).ok_or(FetchError::SlotOutOfRange {
            element: element.code(),
            slot,
            available: series.len(),
        })
    }

    fn value_at(&self, element: Element, slot: TimeSlot) -> Result<String, FetchError> {
        let window = self.slot(element, slot)?;
        Ok(element.format(&window.parameter.parameter_name))
    }
}

/// Decode a `F-C0032-001` response body and pick the location named `city`.
///
/// The match is exact and case-sensitive.
pub fn parse_response(body: &str, city: &str) -> Result<Option<CityForecast>, FetchError> {
    let parsed: CwaResponse = serde_json::from_str(body)?;

    let found = parsed
        .records
        .location
        .into_iter()
        .find(|loc| loc.location_name == city)
        .map(|loc| CityForecast {
            location_name: loc.location_name,
            elements: loc.weather_element,
        });

    Ok(found)
}

#[derive(Debug, Clone)]
pub struct CwaProvider {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl CwaProvider {
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            http: Client::new(),
        }
    }

    pub fn with_timeout(
        api_key: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            endpoint,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_body(&self) -> Result<String, FetchError> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("Authorization", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(%status, "CWA request rejected");
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        debug!(bytes = body.len(), "received CWA response");
        Ok(body)
    }
}

#[async_trait]
impl ForecastProvider for CwaProvider {
    #[instrument(skip(self), fields(endpoint = %self.endpoint, city = %request.city))]
    async fn get_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<Option<CityForecast>, FetchError> {
        let body = self.fetch_body().await?;
        let forecast = parse_response(&body, &request.city)?;

        if forecast.is_none() {
            warn!("city not present in CWA response");
        }

        Ok(forecast)
    }
}

#[derive(Debug, Deserialize)]
struct CwaResponse {
    records: CwaRecords,
}

#[derive(Debug, Deserialize)]
struct CwaRecords {
    #[serde(default)]
    location: Vec<CwaLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CwaLocation {
    location_name: String,
    #[serde(default)]
    weather_element: Vec<CwaElement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CwaElement {
    element_name: String,
    #[serde(default)]
    time: Vec<CwaTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CwaTime {
    start_time: String,
    end_time: String,
    parameter: CwaParameter,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CwaParameter {
    parameter_name: String,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
