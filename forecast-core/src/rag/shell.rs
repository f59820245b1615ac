use std::io::{BufRead, Write};

use anyhow::Result;

use crate::{error::StoreError, store::JsonDatasetStore};

use super::{Embedder, Generator, QaChain, Retriever, VectorIndex, describe};

/// Inputs that end the session, compared case-insensitively.
pub const EXIT_WORDS: [&str; 2] = ["exit", "q"];

/// Load the dataset and index it.
///
/// A missing dataset is reported on `out` and yields `Ok(None)` without
/// touching the embedder.
pub async fn open_chain<E, G, W>(
    store: &JsonDatasetStore,
    embedder: E,
    generator: G,
    top_k: usize,
    out: &mut W,
) -> Result<Option<QaChain<VectorIndex<E>, G>>>
where
    E: Embedder,
    G: Generator,
    W: Write,
{
    let entries = match store.load() {
        Ok(entries) => entries,
        Err(StoreError::NotFound(path)) => {
            tracing::warn!(path = %path.display(), "dataset missing");
            writeln!(
                out,
                "錯誤：找不到 {} 檔案。請先執行 forecast fetch --json {} 來生成資料。",
                path.display(),
                path.display(),
            )?;
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let documents: Vec<String> = entries.iter().map(describe).collect();
    let index = VectorIndex::build(embedder, documents).await?;

    Ok(Some(QaChain::new(index, generator, top_k)))
}

/// Read questions from `input` until an exit word or end of input, answering each on `out`.
pub async fn run_shell<R, G, I, W>(chain: &QaChain<R, G>, input: I, mut out: W) -> Result<()>
where
    R: Retriever,
    G: Generator,
    I: BufRead,
    W: Write,
{
    writeln!(out, "（輸入 'exit' 或 'q' 來結束程式）")?;

    let mut lines = input.lines();
    loop {
        write!(out, "\n您的問題是：")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;
        let question = line.trim();

        if is_exit(question) {
            break;
        }
        if question.is_empty() {
            continue;
        }

        let answer = chain.ask(question).await?;
        writeln!(out, "\n模型回答：")?;
        writeln!(out, "{answer}")?;
    }

    Ok(())
}

fn is_exit(input: &str) -> bool {
    let lowered = input.to_lowercase();
    EXIT_WORDS.contains(&lowered.as_str())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::RagError,
        model::ForecastEntry,
        rag::testing::{FixedRetriever, KeywordEmbedder, RecordingGenerator},
    };

    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl<'a> Embedder for &'a CountingEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    fn entry(condition: &str) -> ForecastEntry {
        ForecastEntry {
            start_time: "2024-01-15 18:00:00".into(),
            end_time: "2024-01-16 06:00:00".into(),
            condition: condition.into(),
            precipitation_probability: "60%".into(),
            min_temperature: "15°C".into(),
            max_temperature: "19°C".into(),
            comfort_index: "寒冷".into(),
            city: None,
        }
    }

    fn chain() -> QaChain<FixedRetriever, RecordingGenerator> {
        QaChain::new(
            FixedRetriever(vec!["時間：從 A 到 B，天氣狀態：陰短暫雨".into()]),
            RecordingGenerator::default(),
            4,
        )
    }

    #[tokio::test]
    async fn missing_dataset_prints_message_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDatasetStore::new(dir.path().join("weather_data.json"));
        let embedder = CountingEmbedder::default();
        let mut out = Vec::new();

        let chain = open_chain(&store, &embedder, RecordingGenerator::default(), 4, &mut out)
            .await
            .expect("missing file is not an error");

        assert!(chain.is_none());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("錯誤：找不到"));
        assert!(text.contains("weather_data.json"));
    }

    #[tokio::test]
    async fn existing_dataset_builds_chain() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDatasetStore::new(dir.path().join("weather_data.json"));
        store.save(&[entry("陰短暫雨"), entry("晴")]).unwrap();
        let mut out = Vec::<u8>::new();

        let chain = open_chain(&store, KeywordEmbedder, RecordingGenerator::default(), 1, &mut out)
            .await
            .unwrap()
            .expect("chain should build");

        assert!(out.is_empty());
        let answer = chain.ask("會下雨嗎？").await.unwrap();
        assert_eq!(answer, "遊客服務中心關心您");
    }

    #[tokio::test]
    async fn empty_dataset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDatasetStore::new(dir.path().join("weather_data.json"));
        store.save(&[]).unwrap();

        let result = open_chain(
            &store,
            KeywordEmbedder,
            RecordingGenerator::default(),
            4,
            &mut Vec::<u8>::new(),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn shell_answers_until_exit_word() {
        let chain = chain();
        let input = "明天要帶傘嗎？\n\nQ\n還會再問嗎？\n".as_bytes();
        let mut out = Vec::new();

        run_shell(&chain, input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("（輸入 'exit' 或 'q' 來結束程式）"));
        assert_eq!(text.matches("模型回答：").count(), 1);
        assert!(text.contains("遊客服務中心關心您"));

        let prompts = chain.generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("明天要帶傘嗎？"));
    }

    #[tokio::test]
    async fn shell_stops_at_end_of_input() {
        let chain = chain();
        let mut out = Vec::<u8>::new();

        run_shell(&chain, "有多冷？".as_bytes(), &mut out).await.unwrap();

        assert_eq!(chain.generator.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn exit_words_are_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("q"));
        assert!(!is_exit("quit"));
        assert!(!is_exit(""));
    }
}
