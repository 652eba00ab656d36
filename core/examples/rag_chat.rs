//! Indexes a few documents (or files passed as glob patterns) and asks the
//! local chat server a question with retrieved context.
//!
//! ```text
//! cargo run --example rag_chat -- "./notes/**/*.md"
//! ```
//!
//! Expects an OpenAI-compatible server on `JARVIS_LLM_URL`
//! (default `http://127.0.0.1:1234/v1/chat/completions`).

use jarvis_rag::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().init();

    let config = RagConfig::from_env()?;
    let client = Client::from_config(&config)?;
    let kb = client.knowledge();
    kb.warm_up().await?;

    let patterns: Vec<String> = std::env::args().skip(1).collect();
    if patterns.is_empty() {
        kb.add_document(
            "mikmak",
            "Mikmak",
            "A mikmak is a small wooden spoon used for stirring tea, from the Tigrinya word for stirring.",
        )
        .await?;
        kb.add_document(
            "office-hours",
            "Office hours",
            "The office is open from 9am to 5pm on weekdays and closed on public holidays.",
        )
        .await?;
    } else {
        let report = kb.ingest(&FileLoader::new(patterns)?).await?;
        for (id, e) in &report.failed {
            eprintln!("skipped {id}: {e}");
        }
    }

    let stats = kb.get_stats().await;
    println!("indexed {} documents", stats.total_documents);

    for hit in kb.search("What's a mikmak?").await? {
        println!("{:.3}  {}", hit.score, hit.title);
    }

    let health = client.health().await;
    if !health.llm_connected {
        eprintln!("chat server unreachable: {:?}", health.llm_error);
        return Ok(());
    }

    let reply = client
        .prompt("What's a mikmak?")
        .history(vec![
            Message::User("Hi JARVIS".into()),
            Message::Assistant("Hello! How can I help?".into()),
        ])
        .send()
        .await?;
    println!("{reply}");
    Ok(())
}
