use serde::{Deserialize, Serialize};

/// Which entry of each element's time series to read.
///
/// The CWA 36-hour dataset publishes three consecutive 12-hour windows per
/// element; the fetcher reads the third one unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSlot(usize);

impl TimeSlot {
    pub const FIRST: TimeSlot = TimeSlot(0);
    pub const SECOND: TimeSlot = TimeSlot(1);
    pub const THIRD: TimeSlot = TimeSlot(2);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl Default for TimeSlot {
    fn default() -> Self {
        Self::THIRD
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0 + 1)
    }
}

#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub city: String,
}

impl ForecastRequest {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

/// One row of the persisted table: a city's forecast for a single time slot.
///
/// Field order is the column order of the CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(rename = "天氣狀態")]
    pub condition: String,
    #[serde(rename = "降雨機率")]
    pub precipitation_probability: String,
    #[serde(rename = "最低溫度")]
    pub min_temperature: String,
    #[serde(rename = "最高溫度")]
    pub max_temperature: String,
    #[serde(rename = "天氣體感")]
    pub comfort_index: String,
    #[serde(rename = "城市")]
    pub city: String,
}

/// One time window of the JSON dataset read by the question-answering shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "天氣狀態")]
    pub condition: String,
    #[serde(rename = "降雨機率")]
    pub precipitation_probability: String,
    #[serde(rename = "最低溫度")]
    pub min_temperature: String,
    #[serde(rename = "最高溫度")]
    pub max_temperature: String,
    #[serde(rename = "天氣體感")]
    pub comfort_index: String,
    #[serde(rename = "城市", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}
