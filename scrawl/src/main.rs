use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrawl::{Config, DocumentKind, ExtractionRequest, ExtractionRouter, ExtractionStrategy};

#[derive(Parser)]
#[command(name = "scrawl")]
#[command(about = "Extract text from printed or handwritten documents")]
struct Args {
    /// File to extract text from
    path: PathBuf,

    /// Treat the file as handwritten (remote OCR with local fallback)
    #[arg(long)]
    handwritten: bool,

    /// Print a JSON object instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    path: &'a str,
    kind: DocumentKind,
    #[serde(flatten)]
    strategy: ExtractionStrategy,
    text: &'a str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the extracted text.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrawl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    let router = ExtractionRouter::from_config(&config)?;

    let request = ExtractionRequest::from_flag(&args.path, args.handwritten);
    let strategy = router.plan(&request)?;
    let text = router.extract(&request).await?;

    if args.json {
        let output = JsonOutput {
            path: &args.path.to_string_lossy(),
            kind: request.kind(),
            strategy,
            text: &text,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
