use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::bail;
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, CsvTableStore, ForecastProvider, ForecastRecord, ForecastRequest, JsonDatasetStore,
    SaveOutcome, TimeSlot,
    provider::provider_from_config,
    rag::{
        OllamaEmbedder, OllamaGenerator,
        shell::{open_chain, run_shell},
    },
    save_record,
};
use inquire::{Password, PasswordDisplayMode, Text};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "CWA forecast fetcher and weather Q&A shell")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the CWA API key and default city in the config file.
    Configure,

    /// Fetch a city's forecast and upsert it into the CSV table.
    Fetch {
        /// City name exactly as CWA spells it, e.g. "臺中市". Defaults to the configured city.
        city: Option<String>,

        /// CSV table to upsert into.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also merge every time slot into this JSON dataset.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Zero-based time slot stored in the table (the default 2 is the third window).
        #[arg(long)]
        slot: Option<usize>,
    },

    /// Answer questions about a saved JSON dataset.
    Ask {
        /// Dataset written by `forecast fetch --json`.
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Fetch {
                city,
                csv,
                json,
                slot,
            } => fetch(config, city, csv, json, slot).await,
            Command::Ask { data } => ask(&config, data).await,
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("CWA API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message("Issued at https://opendata.cwa.gov.tw/user/authkey")
        .prompt()?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    let city = Text::new("Default city:")
        .with_default(&config.fetch.city)
        .prompt()?;

    config.set_api_key(api_key.to_string());
    config.fetch.city = city.trim().to_string();

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn fetch(
    mut config: Config,
    city: Option<String>,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
    slot: Option<usize>,
) -> anyhow::Result<()> {
    config.apply_env();

    let city = city.unwrap_or_else(|| config.fetch.city.clone());
    let slot = slot.map(TimeSlot::new).unwrap_or(config.fetch.time_slot);
    let csv_path = csv.unwrap_or_else(|| config.fetch.csv_path.clone());

    let provider = provider_from_config(&config)?;
    let forecast = provider.get_forecast(&ForecastRequest::new(&city)).await?;

    let record = forecast.as_ref().map(|f| f.record_at(slot)).transpose()?;
    match &record {
        Some(record) => println!("{}", summary(record)),
        None => println!("{}", missing_city_message(&city)),
    }

    let store = CsvTableStore::new(csv_path.clone());
    let outcome = save_record(&store, record)?;
    println!("{}", save_message(outcome, &csv_path));

    if let (Some(path), Some(forecast)) = (json, forecast) {
        let entries = forecast.timeline()?;
        let slots = entries.len();
        JsonDatasetStore::new(path.clone()).merge_city(forecast.location_name(), entries)?;
        println!("{slots} 個時段的預報已寫入 {}", path.display());
    }

    Ok(())
}

async fn ask(config: &Config, data: Option<PathBuf>) -> anyhow::Result<()> {
    let assistant = &config.assistant;
    let store = JsonDatasetStore::new(data.unwrap_or_else(|| assistant.dataset_path.clone()));

    let embedder = OllamaEmbedder::from_config(assistant)?;
    let generator = OllamaGenerator::from_config(assistant)?;

    let mut stdout = io::stdout();
    let Some(chain) = open_chain(&store, embedder, generator, assistant.top_k, &mut stdout).await?
    else {
        return Ok(());
    };

    run_shell(&chain, io::stdin().lock(), stdout).await
}

fn missing_city_message(city: &str) -> String {
    format!("找不到 {city} 的天氣資訊")
}

fn save_message(outcome: SaveOutcome, csv_path: &Path) -> String {
    match outcome {
        SaveOutcome::Skipped => "沒有天氣資訊可以儲存".to_string(),
        SaveOutcome::Inserted | SaveOutcome::Updated => {
            format!("天氣資訊已儲存至 {}", csv_path.display())
        }
    }
}

fn summary(record: &ForecastRecord) -> String {
    format!(
        "{}：{}，降雨機率 {}，氣溫 {} ~ {}，{}",
        record.city,
        record.condition,
        record.precipitation_probability,
        record.min_temperature,
        record.max_temperature,
        record.comfort_index,
    )
}
