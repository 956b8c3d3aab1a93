//! Aggregation engine: value counts, the brand leaderboard, and dataset
//! overview statistics.
//!
//! All reductions here are pure and deterministic: counts are ordered by
//! descending frequency with ties broken by first encounter in the input,
//! so identical input always yields identical output.

use std::{cmp::Reverse, collections::HashMap};

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Product};

/// Number of brands kept on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub category_histogram: Vec<CountEntry>,
    pub harm_histogram: Vec<CountEntry>,
    pub brand_leaderboard: Vec<CountEntry>,
}

/// Computes the three chart summaries over an already filtered (or full)
/// record list.
pub fn aggregate(records: &[&Product]) -> Summary {
    Summary {
        category_histogram: value_counts(records, |product| product.category.as_str(), None),
        harm_histogram: value_counts(records, |product| product.is_harmful.as_str(), None),
        brand_leaderboard: value_counts(
            records,
            |product| product.brand.as_str(),
            Some(LEADERBOARD_SIZE),
        ),
    }
}

fn value_counts<'a, F>(records: &[&'a Product], key: F, top: Option<usize>) -> Vec<CountEntry>
where
    F: Fn(&'a Product) -> &'a str,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for &product in records {
        let value = key(product);
        let slot = counts.entry(value).or_insert(0);
        if *slot == 0 {
            order.push(value);
        }
        *slot += 1;
    }
    // Stable sort keeps first-encounter order among equal counts.
    order.sort_by_key(|value| Reverse(counts[value]));
    if let Some(limit) = top
        && order.len() > limit
    {
        order.truncate(limit);
    }
    order
        .into_iter()
        .map(|value| CountEntry {
            value: value.to_string(),
            count: counts[value],
        })
        .collect()
}

/// Headline counts shown on the overview screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total: usize,
    pub harmful: usize,
    pub safe: usize,
}

impl DatasetStats {
    pub fn harmful_share(&self) -> f64 {
        percent(self.harmful, self.total)
    }

    pub fn safe_share(&self) -> f64 {
        percent(self.safe, self.total)
    }
}

pub fn overview(dataset: &Dataset) -> DatasetStats {
    let mut stats = DatasetStats {
        total: dataset.len(),
        harmful: 0,
        safe: 0,
    };
    for product in dataset.products() {
        if product.is_flagged_harmful() {
            stats.harmful += 1;
        } else if product.is_flagged_safe() {
            stats.safe += 1;
        }
    }
    stats
}

pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    }
}
