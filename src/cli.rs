use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::query::HarmFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Explore food-product safety datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show dataset totals and the harmful-vs-safe split
    Overview(OverviewArgs),
    /// Search products by name with optional category and harm filters
    Search(SearchArgs),
    /// Aggregate category, harm, and brand distributions
    Analytics(AnalyticsArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV file ('-' reads from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct OverviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit the statistics as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Substring to match against product names (case-insensitive)
    #[arg(short = 'q', long)]
    pub query: Option<String>,
    /// Restrict matches to an exact category value
    #[arg(short = 'c', long)]
    pub category: Option<String>,
    /// Restrict matches by harm flag ('yes' or 'no')
    #[arg(long, value_parser = parse_harm_filter)]
    pub harmful: Option<HarmFilter>,
    /// Maximum number of matches to display
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
    /// Emit matches (and any suggestions) as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Restrict analytics to these categories (repeatable)
    #[arg(short = 'c', long = "category", action = clap::ArgAction::Append)]
    pub categories: Vec<String>,
    /// Emit the summary as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

fn parse_harm_filter(value: &str) -> Result<HarmFilter, String> {
    value.parse()
}
