//! Read-only projections of the catalog for display.

use std::fmt;
use std::str::FromStr;

use crate::domain::Product;
use crate::error::ValidationError;

/// Which products to show by stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockFilter {
    #[default]
    All,
    InStock,
    OutOfStock,
}

impl StockFilter {
    pub fn admits(self, in_stock: bool) -> bool {
        match self {
            StockFilter::All => true,
            StockFilter::InStock => in_stock,
            StockFilter::OutOfStock => !in_stock,
        }
    }
}

impl fmt::Display for StockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StockFilter::All => "all",
            StockFilter::InStock => "inStock",
            StockFilter::OutOfStock => "outOfStock",
        })
    }
}

impl FromStr for StockFilter {
    type Err = ValidationError;

    /// Accepts `all`, `inStock` and `outOfStock`, ignoring case, `-` and `_`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let normalized: String = text
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "all" => Ok(StockFilter::All),
            "instock" => Ok(StockFilter::InStock),
            "outofstock" => Ok(StockFilter::OutOfStock),
            _ => Err(ValidationError::UnknownFilter(text.to_string())),
        }
    }
}

/// Products whose name contains `search_term` (ignoring case; empty matches
/// everything) and whose stock status passes `filter`, in source order.
pub fn project<'a>(products: &'a [Product], search_term: &str, filter: StockFilter) -> Vec<&'a Product> {
    let needle = search_term.to_lowercase();
    products
        .iter()
        .filter(|product| needle.is_empty() || product.name.to_lowercase().contains(&needle))
        .filter(|product| filter.admits(product.in_stock))
        .collect()
}
