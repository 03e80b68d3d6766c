

use std::sync::Arc;

use prequery::llm::OllamaProvider;
use prequery::{PreprocessConfig, QueryPreprocessor};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Reads one utterance per line on stdin and writes one JSON object per line
/// holding both the full and the enhanced preprocessing result.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("prequery=info".parse()?))
        .init();

    let config = PreprocessConfig::from_env();
    config.validate()?;

    let llm = OllamaProvider::new(config.llm_base_url.clone(), config.llm_model.clone(), config.rewrite_temperature);
    let preprocessor = QueryPreprocessor::with_default_tables(config).with_llm(Arc::new(llm));
    info!("prequery ready, reading utterances from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let preprocessed = preprocessor.preprocess(&line, None).await;
        let enhanced = preprocessor.enhanced_preprocess(&line);
        let record = json!({ "preprocessed": preprocessed, "enhanced": enhanced });

        let mut out = serde_json::to_string(&record)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}
