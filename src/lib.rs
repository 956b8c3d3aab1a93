pub mod aggregate;
pub mod cli;
pub mod dataset;
pub mod io_utils;
pub mod query;
pub mod suggest;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    aggregate::{CountEntry, aggregate, overview, percent},
    cli::{AnalyticsArgs, Cli, Commands, InputArgs, OverviewArgs, SearchArgs},
    dataset::{Dataset, Product},
    query::{FilterSpec, filter_by_categories, search},
    suggest::suggest,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("infact", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Overview(args) => handle_overview(&args),
        Commands::Search(args) => handle_search(&args),
        Commands::Analytics(args) => handle_analytics(&args),
    }
}

fn load_dataset(args: &InputArgs) -> Result<Dataset> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = Dataset::load(&args.input, args.delimiter, encoding)
        .with_context(|| format!("Loading dataset from {:?}", args.input))?;
    info!(
        "Loaded {} product(s) from '{}'",
        dataset.len(),
        args.input.display()
    );
    Ok(dataset)
}

fn handle_overview(args: &OverviewArgs) -> Result<()> {
    let dataset = load_dataset(&args.input)?;
    let stats = overview(&dataset);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    let headers = vec![
        "metric".to_string(),
        "count".to_string(),
        "share".to_string(),
    ];
    let rows = vec![
        vec![
            "total products".to_string(),
            stats.total.to_string(),
            String::new(),
        ],
        vec![
            "harmful".to_string(),
            stats.harmful.to_string(),
            format!("{:.1}%", stats.harmful_share()),
        ],
        vec![
            "safe".to_string(),
            stats.safe.to_string(),
            format!("{:.1}%", stats.safe_share()),
        ],
    ];
    table::print_table(&headers, &rows);
    info!(
        "Dataset spans {} categor(ies)",
        dataset.categories().len()
    );
    Ok(())
}

fn handle_search(args: &SearchArgs) -> Result<()> {
    let dataset = load_dataset(&args.input)?;
    let spec = FilterSpec {
        category: args.category.clone(),
        harmful: args.harmful,
        query: args.query.clone(),
    };
    let results = search(&dataset, &spec);

    // Relaxed token fallback, still inside the category/harm filters.
    let mut suggestions: Vec<&Product> = Vec::new();
    if results.is_empty()
        && let Some(query) = spec.active_query()
    {
        let base = search(&dataset, &spec.without_query());
        suggestions = suggest(query, &base);
    }

    if args.json {
        let shown = results.iter().take(args.limit).collect::<Vec<_>>();
        let payload = serde_json::json!({
            "found": results.len(),
            "matches": shown,
            "suggestions": suggestions,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if results.is_empty() {
        if let Some(query) = spec.active_query() {
            println!("No products found matching '{query}'.");
            if suggestions.is_empty() {
                println!("Try a different search term or adjust filters.");
            } else {
                println!("You might be interested in:");
                for product in &suggestions {
                    println!("- {} ({})", product.product_name, product.brand);
                }
            }
        } else {
            println!("No products matched the active filters.");
        }
        return Ok(());
    }

    info!("Found {} matching product(s)", results.len());
    let headers = vec![
        "product".to_string(),
        "brand".to_string(),
        "category".to_string(),
        "harmful".to_string(),
        "harmful ingredients".to_string(),
        "total ingredients".to_string(),
        "nutritional impact".to_string(),
        "healthy alternative".to_string(),
    ];
    let rows = results
        .iter()
        .take(args.limit)
        .map(|product| {
            vec![
                product.product_name.clone(),
                product.brand.clone(),
                product.category.clone(),
                product.is_harmful.clone(),
                product.harmful_ingredient_count.to_string(),
                product.total_ingredients.to_string(),
                product.nutritional_impact.clone(),
                product.healthy_alternatives.clone(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_analytics(args: &AnalyticsArgs) -> Result<()> {
    let dataset = load_dataset(&args.input)?;
    let records = filter_by_categories(&dataset, &args.categories);
    let summary = aggregate(&records);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Products by category");
    table::print_table(
        &histogram_headers("category"),
        &histogram_rows(&summary.category_histogram, records.len()),
    );
    println!();
    println!("Harmful vs safe");
    table::print_table(
        &histogram_headers("harmful"),
        &histogram_rows(&summary.harm_histogram, records.len()),
    );
    println!();
    println!("Top brands");
    let brand_headers = vec!["brand".to_string(), "count".to_string()];
    let brand_rows = summary
        .brand_leaderboard
        .iter()
        .map(|entry| vec![entry.value.clone(), entry.count.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&brand_headers, &brand_rows);

    info!(
        "Aggregated {} product(s) across {} categor(ies)",
        records.len(),
        summary.category_histogram.len()
    );
    Ok(())
}

fn histogram_headers(label: &str) -> Vec<String> {
    vec![label.to_string(), "count".to_string(), "percent".to_string()]
}

fn histogram_rows(entries: &[CountEntry], total: usize) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|entry| {
            vec![
                entry.value.clone(),
                entry.count.to_string(),
                format!("{:.2}%", percent(entry.count, total)),
            ]
        })
        .collect()
}
