//! Retrieval-augmented question answering over a saved forecast dataset.
//!
//! The model stack is reached only through [`Embedder`], [`Retriever`] and
//! [`Generator`], so the templating and chain logic run without a live backend.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{error::RagError, model::ForecastEntry};

pub mod index;
pub mod ollama;
pub mod prompt;
pub mod shell;

pub use index::VectorIndex;
pub use ollama::{OllamaEmbedder, OllamaGenerator};

/// Turns texts into vectors, one per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

/// Finds the stored texts most relevant to a query, best first.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RagError>;
}

/// Completes a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

/// Render one dataset entry as the sentence that gets indexed.
pub fn describe(entry: &ForecastEntry) -> String {
    let sentence = format!(
        "時間：從 {} 到 {}，天氣狀態：{}，降雨機率：{}，最低溫度：{}，最高溫度：{}，天氣體感：{}。",
        entry.start_time,
        entry.end_time,
        entry.condition,
        entry.precipitation_probability,
        entry.min_temperature,
        entry.max_temperature,
        entry.comfort_index,
    );

    match &entry.city {
        Some(city) => format!("城市：{city}，{sentence}"),
        None => sentence,
    }
}

/// Retrieve, stuff the hits into the prompt, generate.
#[derive(Debug)]
pub struct QaChain<R, G> {
    retriever: R,
    generator: G,
    top_k: usize,
}

impl<R: Retriever, G: Generator> QaChain<R, G> {
    pub fn new(retriever: R, generator: G, top_k: usize) -> Self {
        Self {
            retriever,
            generator,
            top_k,
        }
    }

    #[instrument(skip(self), fields(top_k = self.top_k))]
    pub async fn ask(&self, question: &str) -> Result<String, RagError> {
        let documents = self.retriever.retrieve(question, self.top_k).await?;
        debug!(hits = documents.len(), "retrieved context");

        let prompt = prompt::render(&documents.join("\n\n"), question);
        self.generator.generate(&prompt).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn entry(city: Option<&str>) -> ForecastEntry {
        ForecastEntry {
            start_time: "2024-01-15 18:00:00".into(),
            end_time: "2024-01-16 06:00:00".into(),
            condition: "多雲".into(),
            precipitation_probability: "20%".into(),
            min_temperature: "18°C".into(),
            max_temperature: "25°C".into(),
            comfort_index: "舒適".into(),
            city: city.map(str::to_string),
        }
    }

    #[test]
    fn describe_embeds_every_field() {
        assert_eq!(
            describe(&entry(None)),
            "時間：從 2024-01-15 18:00:00 到 2024-01-16 06:00:00，天氣狀態：多雲，降雨機率：20%，最低溫度：18°C，最高溫度：25°C，天氣體感：舒適。"
        );
    }

    #[test]
    fn describe_prefixes_city_when_known() {
        let sentence = describe(&entry(Some("臺中市")));
        assert!(sentence.starts_with("城市：臺中市，時間：從 2024-01-15 18:00:00"));
    }

    #[tokio::test]
    async fn ask_stuffs_top_k_documents_into_prompt() {
        let retriever = FixedRetriever(vec!["第一筆".into(), "第二筆".into(), "第三筆".into()]);
        let chain = QaChain::new(retriever, RecordingGenerator::default(), 2);

        let answer = chain.ask("明天會下雨嗎？").await.unwrap();
        assert_eq!(answer, "遊客服務中心關心您");

        let prompts = chain.generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("天氣資料：\n第一筆\n\n第二筆\n"));
        assert!(!prompts[0].contains("第三筆"));
        assert!(prompts[0].contains("問題：明天會下雨嗎？"));
    }
}
