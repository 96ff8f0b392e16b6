use core_types::{EnrichedPricePoint, Scale, SeriesField};
use serde::ser::{Serialize, SerializeTuple, Serializer};

/// Padding that keeps extrema off the edge of a secondary axis.
pub const DEFAULT_PADDING: f64 = 0.05;
/// Padding used for the primary (left) axis.
pub const PRIMARY_PADDING: f64 = 0.10;

/// Numeric bounds handed to an axis.
///
/// `Auto` lets the renderer choose; it serializes as `["auto", "auto"]` and
/// explicit bounds as `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisDomain {
    Auto,
    Bounds { min: f64, max: f64 },
}

impl AxisDomain {
    /// Log axes cannot show non-positive values; such bounds fall back to `Auto`.
    pub fn for_scale(self, scale: Scale) -> Self {
        match (self, scale) {
            (AxisDomain::Bounds { min, .. }, Scale::Log) if min <= 0.0 => AxisDomain::Auto,
            _ => self,
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            AxisDomain::Auto => None,
            AxisDomain::Bounds { min, max } => Some((min, max)),
        }
    }
}

impl Serialize for AxisDomain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        match *self {
            AxisDomain::Auto => {
                tuple.serialize_element("auto")?;
                tuple.serialize_element("auto")?;
            }
            AxisDomain::Bounds { min, max } => {
                tuple.serialize_element(&min)?;
                tuple.serialize_element(&max)?;
            }
        }
        tuple.end()
    }
}

/// Bounds of `field` over `points`, padded by 5% of the range on each side.
pub fn padded_domain(points: &[EnrichedPricePoint], field: SeriesField) -> AxisDomain {
    padded_domain_with(points, field, DEFAULT_PADDING)
}

/// Bounds of `field` over `points`, padded by `ratio` of the range on each side.
///
/// Missing and non-finite values are ignored; if none remain the result is `Auto`.
pub fn padded_domain_with(points: &[EnrichedPricePoint], field: SeriesField, ratio: f64) -> AxisDomain {
    let (lo, hi) = points
        .iter()
        .filter_map(|p| p.value(field))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if lo > hi {
        return AxisDomain::Auto;
    }
    let pad = (hi - lo) * ratio;
    AxisDomain::Bounds { min: lo - pad, max: hi + pad }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(price: f64, log_return: Option<f64>, vol: Option<f64>) -> EnrichedPricePoint {
        EnrichedPricePoint {
            date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
            price,
            timestamp: 0,
            log_return,
            rolling_volatility: vol,
        }
    }

    #[test]
    fn pads_five_percent_of_the_range() {
        let points = [point(50.0, None, None), point(150.0, None, None), point(100.0, None, None)];
        assert_eq!(
            padded_domain(&points, SeriesField::Price),
            AxisDomain::Bounds { min: 45.0, max: 155.0 }
        );
    }

    #[test]
    fn primary_variant_uses_its_own_ratio() {
        let points = [point(50.0, None, None), point(150.0, None, None)];
        assert_eq!(
            padded_domain_with(&points, SeriesField::Price, PRIMARY_PADDING),
            AxisDomain::Bounds { min: 40.0, max: 160.0 }
        );
    }

    #[test]
    fn missing_values_are_skipped() {
        let points = [point(1.0, None, None), point(1.0, Some(0.02), None), point(1.0, Some(-0.02), None)];
        let (min, max) = padded_domain(&points, SeriesField::LogReturn).bounds().unwrap();
        assert!((min + 0.022).abs() < 1e-12);
        assert!((max - 0.022).abs() < 1e-12);
    }

    #[test]
    fn empty_value_set_is_auto() {
        assert_eq!(padded_domain(&[], SeriesField::Price), AxisDomain::Auto);
        let points = [point(1.0, None, None), point(2.0, None, Some(f64::NAN))];
        assert_eq!(padded_domain(&points, SeriesField::RollingVolatility), AxisDomain::Auto);
    }

    #[test]
    fn single_value_has_zero_width() {
        let points = [point(80.0, None, None)];
        assert_eq!(
            padded_domain(&points, SeriesField::Price),
            AxisDomain::Bounds { min: 80.0, max: 80.0 }
        );
    }

    #[test]
    fn log_scale_rejects_non_positive_bounds() {
        let domain = AxisDomain::Bounds { min: -0.1, max: 0.2 };
        assert_eq!(domain.for_scale(Scale::Log), AxisDomain::Auto);
        assert_eq!(domain.for_scale(Scale::Linear), domain);
    }

    #[test]
    fn serializes_like_the_renderer_expects() {
        assert_eq!(serde_json::to_string(&AxisDomain::Auto).unwrap(), r#"["auto","auto"]"#);
        assert_eq!(
            serde_json::to_string(&AxisDomain::Bounds { min: 1.5, max: 2.0 }).unwrap(),
            "[1.5,2.0]"
        );
    }
}
