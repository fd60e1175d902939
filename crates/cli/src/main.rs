use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{ItemId, Query, RatingIndex, UserId};
use predictor::{CollaborativeFilter, Explanation, PredictionConfig};
use rand::Rng;
use serde_json::json;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Rating predictor using user-based collaborative filtering
#[derive(Parser)]
#[command(name = "rating-predict")]
#[command(about = "Predict user ratings with user-based collaborative filtering", long_about = None)]
struct Cli {
    /// Input with training ratings, a `test dataset` line, then queries (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSON file with prediction parameters; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ConfigOverrides {
    /// Maximum number of neighbors per prediction
    #[arg(long)]
    neighbors: Option<usize>,

    /// Minimum similarity for a neighbor
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<f64>,

    /// Lowest presentable rating
    #[arg(long)]
    min_rating: Option<f64>,

    /// Highest presentable rating
    #[arg(long)]
    max_rating: Option<f64>,

    /// Decimal places in the output
    #[arg(long)]
    precision: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict every query in the input and print one rating per line (default)
    Run,

    /// Show how a single prediction is formed
    Explain {
        /// User to predict for
        #[arg(long, allow_hyphen_values = true)]
        user_id: UserId,

        /// Item to predict
        #[arg(long, allow_hyphen_values = true)]
        item_id: ItemId,

        /// Print the explanation and effective config as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print dataset statistics
    Stats,

    /// Time random predictions against the loaded data
    Benchmark {
        /// Number of predictions to make
        #[arg(long, default_value = "1000")]
        requests: usize,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries predictions
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let start = Instant::now();
    let (data_index, queries) = match &cli.input {
        Some(path) => RatingIndex::load_from_file(path)
            .with_context(|| format!("Failed to load ratings from {}", path.display()))?,
        None => RatingIndex::load_from_reader(io::stdin().lock())
            .context("Failed to load ratings from stdin")?,
    };
    info!(elapsed = ?start.elapsed(), queries = queries.len(), "Ratings loaded");

    let filter = CollaborativeFilter::with_config(Arc::new(data_index), config)
        .context("Invalid prediction configuration")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let stdout = io::stdout();
            handle_run(&filter, &queries, BufWriter::new(stdout.lock()))?
        }
        Commands::Explain {
            user_id,
            item_id,
            json,
        } => handle_explain(&filter, user_id, item_id, json)?,
        Commands::Stats => handle_stats(&filter, queries.len()),
        Commands::Benchmark { requests } => handle_benchmark(&filter, requests)?,
    }

    Ok(())
}

/// Start from the config file (or defaults) and apply flag overrides
fn build_config(cli: &Cli) -> Result<PredictionConfig> {
    let mut config = match &cli.config {
        Some(path) => PredictionConfig::from_json_file(path)?,
        None => PredictionConfig::default(),
    };

    let overrides = &cli.overrides;
    if let Some(neighbors) = overrides.neighbors {
        config = config.with_neighbors(neighbors);
    }
    if let Some(threshold) = overrides.threshold {
        config = config.with_similarity_threshold(threshold);
    }
    if overrides.min_rating.is_some() || overrides.max_rating.is_some() {
        let min_rating = overrides.min_rating.unwrap_or(config.min_rating);
        let max_rating = overrides.max_rating.unwrap_or(config.max_rating);
        config = config.with_rating_range(min_rating, max_rating);
    }
    if let Some(precision) = overrides.precision {
        config = config.with_precision(precision);
    }

    config.validate()?;
    Ok(config)
}

/// Handle the 'run' command: one formatted prediction per query, in query order
fn handle_run(filter: &CollaborativeFilter, queries: &[Query], mut out: impl Write) -> Result<()> {
    let start = Instant::now();
    let predictions = filter.predict_batch(queries);

    for prediction in predictions {
        writeln!(out, "{}", filter.format(prediction))?;
    }
    out.flush()?;

    info!(
        predictions = queries.len(),
        cached_pairs = filter.cached_pairs(),
        elapsed = ?start.elapsed(),
        "Predictions written"
    );
    Ok(())
}

/// Handle the 'explain' command
fn handle_explain(
    filter: &CollaborativeFilter,
    user_id: UserId,
    item_id: ItemId,
    json: bool,
) -> Result<()> {
    let explanation = filter.explain(user_id, item_id);
    if json {
        let stdout = io::stdout();
        write_explanation_json(filter, &explanation, stdout.lock())?;
    } else {
        print_explanation(filter, &explanation);
    }
    Ok(())
}

fn write_explanation_json(
    filter: &CollaborativeFilter,
    explanation: &Explanation,
    mut out: impl Write,
) -> Result<()> {
    let report = json!({
        "config": filter.config(),
        "explanation": explanation,
        "presented": filter.format(explanation.raw),
    });
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(filter: &CollaborativeFilter, query_count: usize) {
    let data_index = filter.data_index();
    let (users, items, ratings) = data_index.counts();

    println!("{}", "Dataset statistics:".bold().blue());
    println!("{}Users: {}", "• ".green(), users);
    println!("{}Items: {}", "• ".green(), items);
    println!("{}Ratings: {}", "• ".green(), ratings);
    println!("{}Queries: {}", "• ".green(), query_count);
    println!("{}Global mean rating: {:.3}", "• ".cyan(), data_index.global_mean());

    if users > 0 && items > 0 {
        let density = ratings as f64 / (users as f64 * items as f64);
        println!("{}Matrix density: {:.4}%", "• ".cyan(), density * 100.0);
    }
}

/// Handle the 'benchmark' command
fn handle_benchmark(filter: &CollaborativeFilter, requests: usize) -> Result<()> {
    let data_index = filter.data_index();
    let user_ids: Vec<UserId> = data_index.users().map(|u| u.id).collect();
    let mut item_ids: Vec<ItemId> = data_index.items().collect();
    item_ids.sort_unstable();

    if user_ids.is_empty() || item_ids.is_empty() || requests == 0 {
        bail!("Benchmark needs at least one user, one item and one request");
    }

    // Draw random (user, item) pairs from the loaded data
    let mut rng = rand::rng();
    let queries: Vec<Query> = (0..requests)
        .map(|_| {
            let user_id = user_ids[rng.random_range(0..user_ids.len())];
            let item_id = item_ids[rng.random_range(0..item_ids.len())];
            Query::new(user_id, item_id)
        })
        .collect();

    let mut timings: Vec<Duration> = queries
        .iter()
        .map(|&query| {
            let start = Instant::now();
            std::hint::black_box(filter.predict(query));
            start.elapsed()
        })
        .collect();

    let total_time: Duration = timings.iter().sum();
    let avg_latency = average_latency(total_time, timings.len());
    timings.sort();
    let p50 = timings[timings.len() / 2];
    let p95 = timings[((timings.len() as f64 * 0.95) as usize).min(timings.len() - 1)];
    let p99 = timings[((timings.len() as f64 * 0.99) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} predictions/second", throughput);
    println!("Cached similarity pairs: {}", filter.cached_pairs());

    Ok(())
}

fn average_latency(total_time: Duration, count: usize) -> Duration {
    total_time.div_f64(count as f64)
}

/// Helper function to format and print an explanation
fn print_explanation(filter: &CollaborativeFilter, explanation: &Explanation) {
    println!(
        "{}",
        format!(
            "Prediction for user {} on item {}:",
            explanation.user_id, explanation.item_id
        )
        .bold()
        .blue()
    );
    println!("{}User mean: {:.3}", "• ".green(), explanation.user_mean);
    println!("{}Neighbors used: {}", "• ".green(), explanation.contributions.len());

    for (rank, contribution) in explanation.contributions.iter().enumerate() {
        let deviation = format!("{:+.3}", contribution.deviation);
        let deviation = if contribution.deviation >= 0.0 {
            deviation.green()
        } else {
            deviation.red()
        };
        println!(
            "  {}. user {} - similarity {:.3}, rated {:.1}, deviation {}",
            (rank + 1).to_string().green(),
            contribution.neighbor.user_id,
            contribution.neighbor.similarity,
            contribution.rating,
            deviation
        );
    }

    if explanation.is_fallback() {
        println!("{}", "No usable neighbor weight; falling back to the user mean".yellow());
    }
    println!("{}Raw prediction: {:.3}", "• ".cyan(), explanation.raw);
    println!(
        "{}Presented: {}",
        "• ".cyan(),
        filter.format(explanation.raw).bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const INPUT: &str = "1 1 5\n1 2 3\n2 1 4\n2 2 2\n2 3 4\ntest dataset\n1 3\n2 1\n9 9\n";

    fn config_from_args(args: &[&str]) -> Result<PredictionConfig> {
        let cli = Cli::try_parse_from(std::iter::once("rating-predict").chain(args.iter().copied()))?;
        build_config(&cli)
    }

    fn create_test_filter() -> (CollaborativeFilter, Vec<Query>) {
        let (data_index, queries) = RatingIndex::load_from_reader(INPUT.as_bytes()).unwrap();
        (CollaborativeFilter::new(Arc::new(data_index)), queries)
    }

    #[test]
    fn test_build_config_defaults() {
        assert_eq!(config_from_args(&[]).unwrap(), PredictionConfig::default());
    }

    #[test]
    fn test_build_config_min_rating_only() {
        let config = config_from_args(&["--min-rating", "2"]).unwrap();
        assert_eq!(config.min_rating, 2.0);
        assert_eq!(config.max_rating, 5.0);
    }

    #[test]
    fn test_build_config_both_bounds() {
        let config = config_from_args(&["--min-rating", "0.5", "--max-rating", "10"]).unwrap();
        assert_eq!(config.min_rating, 0.5);
        assert_eq!(config.max_rating, 10.0);
    }

    #[test]
    fn test_build_config_rejects_inverted_bounds() {
        assert!(config_from_args(&["--min-rating", "4", "--max-rating", "2"]).is_err());
    }

    #[test]
    fn test_build_config_negative_threshold() {
        let config = config_from_args(&["--threshold", "-0.5", "--neighbors", "3"]).unwrap();
        assert_eq!(config.similarity_threshold, -0.5);
        assert_eq!(config.neighbors, 3);
    }

    #[test]
    fn test_build_config_flags_override_file() {
        let path = std::env::temp_dir().join(format!("rating-predict-{}.json", std::process::id()));
        fs::write(&path, r#"{ "neighbors": 40, "max_rating": 10.0 }"#).unwrap();

        let result = config_from_args(&["--config", path.to_str().unwrap(), "--min-rating", "2"]);
        fs::remove_file(&path).unwrap();

        let config = result.unwrap();
        assert_eq!(config.neighbors, 40);
        assert_eq!(config.min_rating, 2.0);
        assert_eq!(config.max_rating, 10.0);
    }

    #[test]
    fn test_explain_accepts_negative_ids() {
        let cli = Cli::try_parse_from(["rating-predict", "explain", "--user-id", "-1", "--item-id", "5"])
            .unwrap();
        match cli.command {
            Some(Commands::Explain { user_id, item_id, json }) => {
                assert_eq!((user_id, item_id), (-1, 5));
                assert!(!json);
            }
            _ => panic!("expected explain command"),
        }
    }

    #[test]
    fn test_handle_run_writes_lines_in_query_order() {
        let (filter, queries) = create_test_filter();
        let mut out = Vec::new();
        handle_run(&filter, &queries, &mut out).unwrap();

        // Unknown user 9 has mean 0.0, clamped up to the minimum rating
        assert_eq!(String::from_utf8(out).unwrap(), "4.7\n4.3\n1.0\n");
    }

    #[test]
    fn test_handle_run_no_queries() {
        let (filter, _) = create_test_filter();
        let mut out = Vec::new();
        handle_run(&filter, &[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_average_latency_large_count() {
        // 2^32 truncates to zero as a u32 divisor
        let count = 1usize << 32;
        let total = Duration::from_secs(count as u64);
        assert_eq!(average_latency(total, count), Duration::from_secs(1));
        assert_eq!(average_latency(Duration::from_secs(6), 3), Duration::from_secs(2));
    }

    #[test]
    fn test_explanation_json() {
        let (filter, _) = create_test_filter();
        let explanation = filter.explain(1, 3);
        let mut out = Vec::new();
        write_explanation_json(&filter, &explanation, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["presented"], "4.7");
        assert_eq!(value["config"]["neighbors"], 120);
        assert_eq!(value["explanation"]["user_id"], 1);
        assert_eq!(value["explanation"]["contributions"][0]["neighbor"]["user_id"], 2);
    }
}
