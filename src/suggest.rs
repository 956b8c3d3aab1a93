//! Suggestion fallback for zero-result searches.
//!
//! When a non-empty substring query finds nothing, the query is relaxed to a
//! token-level OR match: a record qualifies if any whitespace-separated token
//! of the query occurs in its product name, case-insensitively. The caller
//! passes in the records that already survived the category/harm filters, so
//! suggestions never resurrect products the user explicitly filtered out.
//! An empty suggestion list is a normal terminal state, not a failure.

use crate::dataset::Product;

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

pub fn suggest<'a>(query: &str, records: &[&'a Product]) -> Vec<&'a Product> {
    let tokens = query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>();
    if tokens.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|product| {
            let name = product.product_name.to_lowercase();
            tokens.iter().any(|token| name.contains(token.as_str()))
        })
        .copied()
        .take(MAX_SUGGESTIONS)
        .collect()
}
