//! Portfolio valuation over a price snapshot
//!
//! Pure functions: they never fail. Until the snapshot covers every held
//! asset, totals are zero and the distribution is empty. Arithmetic that
//! would overflow `Decimal` is treated the same way.

use super::Holding;
use crate::feed::Symbol;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Price of one unit of `asset` in `quote`, if known
fn unit_price(prices: &HashMap<Symbol, Decimal>, asset: &str, quote: &str) -> Option<Decimal> {
    if asset.eq_ignore_ascii_case(quote) {
        Some(Decimal::ONE)
    } else {
        prices.get(&Symbol::pair(asset, quote)).copied()
    }
}

/// Per-holding value in quote currency, or `None` if any price is missing
fn quote_values(
    holdings: &[Holding],
    prices: &HashMap<Symbol, Decimal>,
    quote: &str,
) -> Option<Vec<Decimal>> {
    holdings
        .iter()
        .map(|h| unit_price(prices, &h.asset, quote).and_then(|price| h.free.checked_mul(price)))
        .collect()
}

fn checked_total(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(*value))
}

/// Total portfolio value in the quote currency
pub fn total_in_quote(holdings: &[Holding], prices: &HashMap<Symbol, Decimal>, quote: &str) -> Decimal {
    quote_values(holdings, prices, quote)
        .and_then(|values| checked_total(&values))
        .unwrap_or(Decimal::ZERO)
}

/// Total portfolio value expressed in `reference` (e.g. BTC)
///
/// Computed as the quote total divided by the `reference`/`quote` price.
pub fn total_in_reference(
    holdings: &[Holding],
    prices: &HashMap<Symbol, Decimal>,
    quote: &str,
    reference: &str,
) -> Decimal {
    let Some(reference_price) = unit_price(prices, reference, quote) else {
        return Decimal::ZERO;
    };
    if reference_price.is_zero() {
        return Decimal::ZERO;
    }

    quote_values(holdings, prices, quote)
        .and_then(|values| checked_total(&values))
        .and_then(|total| total.checked_div(reference_price))
        .unwrap_or(Decimal::ZERO)
}

/// Value of each holding in quote currency, in holding order
pub fn distribution_in_quote(
    holdings: &[Holding],
    prices: &HashMap<Symbol, Decimal>,
    quote: &str,
) -> Vec<(String, Decimal)> {
    match quote_values(holdings, prices, quote) {
        Some(values) => holdings
            .iter()
            .map(|h| h.asset.clone())
            .zip(values)
            .collect(),
        None => Vec::new(),
    }
}

/// Everything the presentation layer shows for one refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub quote_asset: String,
    pub reference_asset: String,
    pub total_quote: Decimal,
    pub total_reference: Decimal,
    /// Spot price of the highlighted pair, zero until known
    pub highlight: Option<(Symbol, Decimal)>,
    pub distribution: Vec<(String, Decimal)>,
}

impl PortfolioSummary {
    pub fn compute(
        holdings: &[Holding],
        prices: &HashMap<Symbol, Decimal>,
        quote: &str,
        reference: &str,
        highlight: Option<&Symbol>,
    ) -> Self {
        Self {
            quote_asset: quote.to_string(),
            reference_asset: reference.to_string(),
            total_quote: total_in_quote(holdings, prices, quote),
            total_reference: total_in_reference(holdings, prices, quote, reference),
            highlight: highlight.map(|symbol| {
                (
                    symbol.clone(),
                    prices.get(symbol).copied().unwrap_or(Decimal::ZERO),
                )
            }),
            distribution: distribution_in_quote(holdings, prices, quote),
        }
    }

    /// Whether the snapshot covered every holding
    pub fn is_complete(&self) -> bool {
        !self.distribution.is_empty()
    }
}
