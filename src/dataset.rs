//! Dataset loading and the in-memory product table.
//!
//! [`Dataset::load()`] reads a CSV file into an ordered, immutable collection
//! of [`Product`] records. Column headers are normalized (trim, lowercase,
//! spaces to underscores) before any field access, missing text cells become
//! the `"N/A"` sentinel, and the two ingredient-count columns are coerced to
//! non-negative integers with a logged warning (and a default of 0) on any
//! value that fails to parse.
//!
//! [`DatasetCache`] is an explicitly owned cache keyed by path and file
//! modification time. It is an optimization only; correctness never depends
//! on it.

use std::{
    collections::HashMap,
    fs,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use encoding_rs::Encoding;
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io_utils;

/// Sentinel stored in text fields whose source cell is missing or empty.
pub const MISSING_SENTINEL: &str = "N/A";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open dataset file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?} as tabular data")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to decode {path:?}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("dataset {path:?} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
}

/// One row of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_name: String,
    pub brand: String,
    pub category: String,
    /// Literal harm flag, nominally "Yes" or "No"; compared case-insensitively.
    pub is_harmful: String,
    pub total_ingredients: u32,
    pub harmful_ingredient_count: u32,
    pub nutritional_impact: String,
    pub healthy_alternatives: String,
}

impl Product {
    pub fn is_flagged_harmful(&self) -> bool {
        self.is_harmful.eq_ignore_ascii_case("yes")
    }

    pub fn is_flagged_safe(&self) -> bool {
        self.is_harmful.eq_ignore_ascii_case("no")
    }
}

/// Ordered, immutable collection of [`Product`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    products: Vec<Product>,
}

impl Dataset {
    /// Reads a CSV file (or stdin for the `-` path) into a `Dataset`.
    pub fn load(
        path: &Path,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    ) -> Result<Self, LoadError> {
        let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
        let reader: Box<dyn Read> = if io_utils::is_dash(path) {
            Box::new(std::io::stdin().lock())
        } else {
            Box::new(BufReader::new(fs::File::open(path).map_err(|source| {
                LoadError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            })?))
        };
        let mut csv_reader = io_utils::open_csv_reader(reader, delimiter, true);

        let raw_headers = csv_reader
            .byte_headers()
            .map_err(|source| LoadError::Malformed {
                path: path.to_path_buf(),
                source,
            })?
            .clone();
        let headers = decode(&raw_headers, encoding, path)?
            .iter()
            .map(|name| normalize_header(name))
            .collect::<Vec<_>>();
        let columns = ColumnMap::resolve(&headers, path)?;

        let mut products = Vec::new();
        for (row_idx, record) in csv_reader.byte_records().enumerate() {
            let record = record.map_err(|source| LoadError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
            let decoded = decode(&record, encoding, path)?;
            products.push(columns.build_product(&decoded, row_idx + 2));
        }
        Ok(Self { products })
    }

    /// Wraps an already materialized record list. No normalization is applied;
    /// the records are assumed to be well-formed.
    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Sorted, de-duplicated category values.
    pub fn categories(&self) -> Vec<String> {
        self.products
            .iter()
            .map(|product| product.category.as_str())
            .unique()
            .sorted()
            .map(str::to_string)
            .collect()
    }
}

/// Trim, lowercase, and replace spaces with underscores.
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn decode(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
    path: &Path,
) -> Result<Vec<String>, LoadError> {
    io_utils::decode_record(record, encoding).map_err(|err| LoadError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

struct ColumnMap {
    product_name: usize,
    brand: usize,
    category: usize,
    is_harmful: Option<usize>,
    harmful_ingredient_count: Option<usize>,
    total_ingredients: Option<usize>,
    nutritional_impact: Option<usize>,
    healthy_alternatives: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String], path: &Path) -> Result<Self, LoadError> {
        let required = |column: &str| {
            find(headers, column).ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
        };
        Ok(Self {
            product_name: required("product_name")?,
            brand: required("brand")?,
            category: required("category")?,
            // Legacy exports spell this column with a trailing question mark.
            is_harmful: headers
                .iter()
                .position(|h| h == "is_harmful" || h == "is_harmful?"),
            harmful_ingredient_count: find(headers, "harmful_ingredient_count"),
            total_ingredients: find(headers, "total_ingredients"),
            nutritional_impact: find(headers, "nutritional_impact"),
            healthy_alternatives: find(headers, "healthy_alternatives"),
        })
    }

    fn build_product(&self, record: &[String], row_number: usize) -> Product {
        Product {
            product_name: text_field(record, Some(self.product_name)),
            brand: text_field(record, Some(self.brand)),
            category: text_field(record, Some(self.category)),
            // "No" is synthesized only when the whole column is absent; an
            // empty cell stays a missing value like any other text field.
            is_harmful: match self.is_harmful {
                Some(index) => text_field(record, Some(index)),
                None => "No".to_string(),
            },
            total_ingredients: count_field(
                record,
                self.total_ingredients,
                "total_ingredients",
                row_number,
            ),
            harmful_ingredient_count: count_field(
                record,
                self.harmful_ingredient_count,
                "harmful_ingredient_count",
                row_number,
            ),
            nutritional_impact: text_field(record, self.nutritional_impact),
            healthy_alternatives: text_field(record, self.healthy_alternatives),
        }
    }
}

fn find(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

fn text_field(record: &[String], index: Option<usize>) -> String {
    match index.and_then(|idx| record.get(idx)) {
        Some(value) if !value.trim().is_empty() => value.clone(),
        _ => MISSING_SENTINEL.to_string(),
    }
}

fn count_field(record: &[String], index: Option<usize>, column: &str, row_number: usize) -> u32 {
    let Some(raw) = index.and_then(|idx| record.get(idx)) else {
        return 0;
    };
    let raw = raw.trim();
    if raw.is_empty() || raw == MISSING_SENTINEL {
        return 0;
    }
    match coerce_count(raw) {
        Some(value) => value,
        None => {
            warn!("Row {row_number}: '{raw}' is not a non-negative integer for {column}; using 0");
            0
        }
    }
}

fn coerce_count(raw: &str) -> Option<u32> {
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value as u32),
        _ => None,
    }
}

/// Explicitly owned dataset cache keyed by path + modification time.
///
/// Stdin loads bypass the cache. A path whose modification time cannot be
/// read is reloaded on every call.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    modified: SystemTime,
    dataset: Arc<Dataset>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(
        &mut self,
        path: &Path,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    ) -> Result<Arc<Dataset>, LoadError> {
        if io_utils::is_dash(path) {
            return Ok(Arc::new(Dataset::load(path, delimiter, encoding)?));
        }
        let modified = fs::metadata(path).ok().and_then(|meta| meta.modified().ok());
        if let Some(modified) = modified
            && let Some(entry) = self.entries.get(path)
            && entry.modified == modified
        {
            return Ok(Arc::clone(&entry.dataset));
        }
        let dataset = Arc::new(Dataset::load(path, delimiter, encoding)?);
        if let Some(modified) = modified {
            self.entries.insert(
                path.to_path_buf(),
                CacheEntry {
                    modified,
                    dataset: Arc::clone(&dataset),
                },
            );
        }
        Ok(dataset)
    }
}
