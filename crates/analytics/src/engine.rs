use crate::calculator::enrich_series;
use crate::error::AnalyticsError;
use core_types::{EnrichedPricePoint, PricePoint};
use std::sync::Arc;

/// Memoizing front for [`enrich_series`].
///
/// The enriched series is rebuilt only when the raw price input changes identity
/// (a different `Arc`) or when the window parameters change. Otherwise the cached
/// series is handed out again, so downstream consumers can compare by pointer.
#[derive(Debug)]
pub struct AnalyticsEngine {
    window: usize,
    annualize: bool,
    cache: Option<CachedSeries>,
    recomputations: u64,
}

#[derive(Debug)]
struct CachedSeries {
    input: Arc<[PricePoint]>,
    window: usize,
    annualize: bool,
    output: Arc<[EnrichedPricePoint]>,
}

impl AnalyticsEngine {
    pub fn new(window: usize, annualize: bool) -> Result<Self, AnalyticsError> {
        validate_window(window)?;
        Ok(Self {
            window,
            annualize,
            cache: None,
            recomputations: 0,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn annualize(&self) -> bool {
        self.annualize
    }

    /// Changes the rolling parameters. The cache is invalidated lazily on the next read.
    pub fn set_params(&mut self, window: usize, annualize: bool) -> Result<(), AnalyticsError> {
        validate_window(window)?;
        self.window = window;
        self.annualize = annualize;
        Ok(())
    }

    /// The enriched series for `prices`, computed whole or served from cache.
    pub fn enriched(&mut self, prices: &Arc<[PricePoint]>) -> Arc<[EnrichedPricePoint]> {
        if let Some(cached) = &self.cache {
            if Arc::ptr_eq(&cached.input, prices) && cached.window == self.window && cached.annualize == self.annualize {
                return Arc::clone(&cached.output);
            }
        }

        let output: Arc<[EnrichedPricePoint]> = enrich_series(prices, self.window, self.annualize).into();
        self.recomputations += 1;
        tracing::debug!(
            points = output.len(),
            window = self.window,
            annualize = self.annualize,
            "Recomputed enriched series."
        );

        self.cache = Some(CachedSeries {
            input: Arc::clone(prices),
            window: self.window,
            annualize: self.annualize,
            output: Arc::clone(&output),
        });
        output
    }

    /// How many times the series has actually been rebuilt.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

fn validate_window(window: usize) -> Result<(), AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::InvalidParameter("rolling window must be at least 1".to_string()));
    }
    Ok(())
}
