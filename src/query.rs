//! Filter engine: composable category, harm-flag, and substring filters.
//!
//! All filters AND together, are commutative and idempotent, preserve the
//! dataset's row order, and never mutate the underlying [`Dataset`]. The
//! substring match is a raw case-insensitive literal test, never a pattern
//! match, so symbols in the query carry no special meaning.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Product};

/// Harm-flag constraint, matched case-insensitively against `is_harmful`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmFilter {
    Yes,
    No,
}

impl HarmFilter {
    pub fn matches(self, flag: &str) -> bool {
        match self {
            HarmFilter::Yes => flag.eq_ignore_ascii_case("yes"),
            HarmFilter::No => flag.eq_ignore_ascii_case("no"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HarmFilter::Yes => "Yes",
            HarmFilter::No => "No",
        }
    }
}

impl FromStr for HarmFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(HarmFilter::Yes),
            "no" | "n" => Ok(HarmFilter::No),
            other => Err(format!("Expected 'yes' or 'no', got '{other}'")),
        }
    }
}

/// Conjunction of optional constraints; an absent field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Exact, case-sensitive category match.
    pub category: Option<String>,
    /// Harm-flag match.
    pub harmful: Option<HarmFilter>,
    /// Case-insensitive literal substring match against `product_name`.
    pub query: Option<String>,
}

impl FilterSpec {
    /// The query constraint, if it is non-empty after trimming.
    pub fn active_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
    }

    /// The same spec with the substring constraint removed. Used to keep the
    /// category/harm filters in force when falling back to suggestions.
    pub fn without_query(&self) -> FilterSpec {
        FilterSpec {
            query: None,
            ..self.clone()
        }
    }
}

/// Returns the ordered subsequence of the dataset matching all active
/// criteria in `spec`.
pub fn search<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> Vec<&'a Product> {
    let lowered_query = spec.active_query().map(str::to_lowercase);
    dataset
        .products()
        .iter()
        .filter(|product| {
            spec.category
                .as_deref()
                .is_none_or(|category| product.category == category)
                && spec
                    .harmful
                    .is_none_or(|harm| harm.matches(&product.is_harmful))
                && lowered_query
                    .as_deref()
                    .is_none_or(|query| product.product_name.to_lowercase().contains(query))
        })
        .collect()
}

/// Membership filter over a category set; an empty set matches everything.
pub fn filter_by_categories<'a>(dataset: &'a Dataset, categories: &[String]) -> Vec<&'a Product> {
    if categories.is_empty() {
        return dataset.products().iter().collect();
    }
    dataset
        .products()
        .iter()
        .filter(|product| categories.iter().any(|category| *category == product.category))
        .collect()
}
