//! Return and volatility transforms over a daily price series.
//!
//! Every function here is a pure function of its inputs.

use core_types::{date_to_millis, EnrichedPricePoint, PricePoint};

/// Trading days per year, used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Natural-log returns of consecutive prices.
///
/// The output has the same length as `prices`. Index 0 has no prior day and is
/// `0.0`; so is any index where either price is not strictly positive and finite.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(prices.len());
    for (i, &price) in prices.iter().enumerate() {
        if i == 0 {
            returns.push(0.0);
            continue;
        }
        let prev = prices[i - 1];
        if is_valid_price(prev) && is_valid_price(price) {
            returns.push((price / prev).ln());
        } else {
            returns.push(0.0);
        }
    }
    returns
}

/// Trailing-window standard deviation of `returns`.
///
/// Index `i` holds the population standard deviation (divisor `window`) of
/// `returns[i + 1 - window..=i]`, multiplied by `sqrt(252)` when `annualize` is set.
/// Indices before `window - 1`, and windows containing a missing or non-finite
/// return, yield `None`. A `window` of zero yields `None` everywhere.
pub fn rolling_volatility(returns: &[Option<f64>], window: usize, annualize: bool) -> Vec<Option<f64>> {
    let scale = if annualize { TRADING_DAYS_PER_YEAR.sqrt() } else { 1.0 };

    (0..returns.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &returns[i + 1 - window..=i];
            let values: Option<Vec<f64>> = slice
                .iter()
                .map(|r| r.filter(|v| v.is_finite()))
                .collect();
            values.map(|v| population_std_dev(&v) * scale)
        })
        .collect()
}

/// Builds the enriched series from raw observations.
///
/// Input order is never trusted: points are sorted by date, and for a repeated
/// date the last observation wins. Non-finite prices cannot be placed on a chart
/// and are dropped. The first point has no log return, so with it excluded the
/// first complete volatility window ends at index `window`.
pub fn enrich_series(prices: &[PricePoint], window: usize, annualize: bool) -> Vec<EnrichedPricePoint> {
    let mut sorted: Vec<PricePoint> = prices
        .iter()
        .copied()
        .filter(|p| {
            let keep = p.price.is_finite();
            if !keep {
                tracing::warn!(date = %p.date, "Dropping price point with non-finite price.");
            }
            keep
        })
        .collect();
    // Stable sort keeps the feed order among equal dates, so the later one wins below.
    sorted.sort_by_key(|p| p.date);

    let mut unique: Vec<PricePoint> = Vec::with_capacity(sorted.len());
    for point in sorted {
        match unique.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => unique.push(point),
        }
    }

    let closes: Vec<f64> = unique.iter().map(|p| p.price).collect();
    let returns: Vec<Option<f64>> = log_returns(&closes)
        .into_iter()
        .enumerate()
        .map(|(i, r)| (i > 0).then_some(r))
        .collect();
    let volatility = rolling_volatility(&returns, window, annualize);

    unique
        .iter()
        .zip(returns)
        .zip(volatility)
        .map(|((p, log_return), rolling_volatility)| EnrichedPricePoint {
            date: p.date,
            price: p.price,
            timestamp: date_to_millis(p.date),
            log_return,
            rolling_volatility,
        })
        .collect()
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

fn population_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
