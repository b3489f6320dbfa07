use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod csv_io;
mod db;
mod keywords;
mod lexicon;
mod models;
mod normalize;
mod pipeline;
mod report;
mod sentiment;
mod themes;

use keywords::{KeywordConfig, KeywordExtractor};
use lexicon::LexiconAnalyzer;
use pipeline::PipelineOutput;
use themes::Taxonomy;

#[derive(Parser)]
#[command(name = "bank-review-insights")]
#[command(about = "Sentiment, theme and keyword annotation for mobile banking app reviews", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PipelineArgs {
    /// Raw review CSV (review,rating,date,bank,source)
    #[arg(long)]
    input: PathBuf,
    /// JSON theme taxonomy; the built-in table is used when omitted
    #[arg(long)]
    taxonomy: Option<PathBuf>,
    #[arg(long, default_value_t = 20)]
    top_n: usize,
    #[arg(long, default_value_t = 0.8)]
    max_df: f64,
    #[arg(long, default_value_t = 2)]
    min_df: usize,
    #[arg(long, default_value_t = 2)]
    ngram_max: usize,
    /// Replace the English stop-word list with one word per line from this file
    #[arg(long)]
    stop_words: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate reviews and write the results as CSV
    Annotate {
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, default_value = "reviews_annotated.csv")]
        out: PathBuf,
        #[arg(long, default_value = "bank_keywords.csv")]
        keywords_out: PathBuf,
    },
    /// Annotate reviews and load them into Postgres
    Load {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Annotate reviews and write a markdown report
    Report {
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print the built-in theme taxonomy as JSON
    Taxonomy,
}

fn run_pipeline(args: &PipelineArgs) -> anyhow::Result<PipelineOutput> {
    let taxonomy = match &args.taxonomy {
        Some(path) => Taxonomy::from_path(path)
            .with_context(|| format!("invalid taxonomy {}", path.display()))?,
        None => Taxonomy::default(),
    };

    let config = KeywordConfig {
        top_n: args.top_n,
        max_df: args.max_df,
        min_df: args.min_df,
        ngram_range: (1, args.ngram_max),
    };
    let mut extractor = KeywordExtractor::new(config).context("invalid keyword settings")?;
    if let Some(path) = &args.stop_words {
        let words = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read stop words from {}", path.display()))?;
        extractor = extractor.with_stop_words(
            words
                .lines()
                .map(str::trim)
                .filter(|word| !word.is_empty()),
        );
    }
    tracing::info!(
        themes = ?taxonomy.theme_names().collect::<Vec<_>>(),
        "using theme taxonomy"
    );

    let batch = csv_io::read_raw_reviews_from_path(&args.input)?;
    if batch.malformed > 0 {
        println!("Skipped {} malformed CSV rows.", batch.malformed);
    }

    let output = pipeline::run(&batch.rows, &LexiconAnalyzer::new(), &taxonomy, &extractor);
    let counts = &output.counts;
    println!(
        "Read {} rows, kept {} after normalization ({} dropped).",
        counts.input,
        counts.normalized,
        counts.dropped_total()
    );
    for (label, count) in &counts.labels {
        println!("- {label}: {count}");
    }

    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Annotate {
            pipeline,
            out,
            keywords_out,
        } => {
            let output = run_pipeline(&pipeline)?;
            csv_io::write_annotated_to_path(&out, &output.reviews)?;
            csv_io::write_keywords_to_path(&keywords_out, &output.keywords)?;
            println!(
                "Annotated reviews written to {}, keywords to {}.",
                out.display(),
                keywords_out.display()
            );
        }
        Commands::Load { pipeline } => {
            let database_url = std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set to a production Postgres instance")?;
            let output = run_pipeline(&pipeline)?;

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await
                .context("failed to connect to Postgres")?;

            let run_id = Uuid::new_v4();
            let summary = db::load(&pool, run_id, &output.reviews, &output.keywords).await?;
            println!(
                "Run {run_id}: {} banks created, {} reviews inserted ({} skipped), {} keyword rows.",
                summary.banks_created,
                summary.reviews_inserted,
                summary.reviews_skipped,
                summary.keyword_rows
            );
        }
        Commands::Report { pipeline, out } => {
            let output = run_pipeline(&pipeline)?;
            let report = report::build_report(
                &pipeline.input.display().to_string(),
                &output.counts,
                &output.reviews,
                &output.keywords,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Taxonomy => {
            println!("{}", serde_json::to_string_pretty(&Taxonomy::default())?);
        }
    }

    Ok(())
}
