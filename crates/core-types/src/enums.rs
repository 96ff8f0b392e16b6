use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The quantity the primary chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Price,
    Volatility,
}

/// Whether the price feed is requested as levels or as returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMode {
    #[default]
    Price,
    Returns,
}

/// Y-axis scale of the primary chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

/// Volatility classification of a regime interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeKind {
    High,
    Low,
}

/// Selects a numeric column of an enriched series, e.g. for axis bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesField {
    Price,
    LogReturn,
    RollingVolatility,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Price => "price",
            Metric::Volatility => "volatility",
        }
    }

    /// The series column the primary line is drawn from for this metric.
    pub fn primary_field(&self) -> SeriesField {
        match self {
            Metric::Price => SeriesField::Price,
            Metric::Volatility => SeriesField::LogReturn,
        }
    }
}

impl ReturnMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnMode::Price => "price",
            ReturnMode::Returns => "returns",
        }
    }
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Log => "log",
        }
    }
}

impl RegimeKind {
    /// Human-readable badge text.
    pub fn label(&self) -> &'static str {
        match self {
            RegimeKind::High => "High Volatility",
            RegimeKind::Low => "Low Volatility",
        }
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(Metric::Price),
            "volatility" => Ok(Metric::Volatility),
            _ => Err(CoreError::UnknownVariant { kind: "metric", value: s.to_string() }),
        }
    }
}

impl FromStr for ReturnMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(ReturnMode::Price),
            "returns" => Ok(ReturnMode::Returns),
            _ => Err(CoreError::UnknownVariant { kind: "return mode", value: s.to_string() }),
        }
    }
}

impl FromStr for Scale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Scale::Linear),
            "log" => Ok(Scale::Log),
            _ => Err(CoreError::UnknownVariant { kind: "scale", value: s.to_string() }),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Volatility".parse::<Metric>(), Ok(Metric::Volatility));
        assert_eq!(" returns ".parse::<ReturnMode>(), Ok(ReturnMode::Returns));
        assert_eq!("LOG".parse::<Scale>(), Ok(Scale::Log));
    }

    #[test]
    fn rejects_unknown_values() {
        let err = "candles".parse::<Metric>().unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownVariant { kind: "metric", value: "candles".to_string() }
        );
    }

    #[test]
    fn serializes_to_wire_names() {
        assert_eq!(serde_json::to_string(&Scale::Log).unwrap(), "\"log\"");
        assert_eq!(serde_json::to_string(&SeriesField::LogReturn).unwrap(), "\"log_return\"");
    }

    #[test]
    fn regime_kinds_have_badge_labels() {
        assert_eq!(RegimeKind::High.label(), "High Volatility");
        assert_eq!(RegimeKind::Low.label(), "Low Volatility");
    }
}
