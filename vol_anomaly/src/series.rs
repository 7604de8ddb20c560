use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::stats;

/// Scale applied to fractional returns before fitting
pub const PERCENT: f64 = 100.0;

/// A single observation of the asset price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Ordered price history with strictly increasing timestamps and positive prices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting non-positive prices and unordered timestamps
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(PipelineError::InvalidParameters(format!(
                    "price at index {} must be positive and finite, got {}",
                    i, point.price
                )));
            }
        }
        if let Some(i) = points
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(PipelineError::InvalidParameters(format!(
                "timestamps must be strictly increasing (index {})",
                i + 1
            )));
        }
        Ok(PriceSeries { points })
    }

    /// Build a series from bare prices spaced one day apart, starting at `start`
    pub fn from_daily_prices(start: DateTime<Utc>, prices: &[f64]) -> Result<Self> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                timestamp: start + chrono::Duration::days(i as i64),
                price,
            })
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Most recent observation, the anchor of any simulation
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// Percentage returns derived from a price series
///
/// One element shorter than its source; `values[i]` is the move from
/// price `i` to price `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Compute `100 × (p[i+1] - p[i]) / p[i]` for every consecutive pair
    pub fn from_prices(prices: &PriceSeries) -> Result<Self> {
        Self::from_raw_prices(&prices.prices())
    }

    /// Same as [`ReturnSeries::from_prices`] on a bare price slice
    pub fn from_raw_prices(prices: &[f64]) -> Result<Self> {
        if prices.len() < 2 {
            return Err(PipelineError::InsufficientData {
                required: 2,
                actual: prices.len(),
            });
        }
        let values = prices
            .windows(2)
            .map(|pair| PERCENT * (pair[1] - pair[0]) / pair[0])
            .collect();
        Ok(ReturnSeries { values })
    }

    /// Wrap returns that are already in percent
    pub fn from_percent(values: Vec<f64>) -> Self {
        ReturnSeries { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean return in percent
    pub fn mean(&self) -> f64 {
        stats::mean(&self.values)
    }

    /// Mean return as a fraction, the drift input of the simulator
    pub fn mean_fraction(&self) -> f64 {
        self.mean() / PERCENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn returns_are_one_shorter_and_in_percent() {
        let returns = ReturnSeries::from_raw_prices(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns.values()[0], 10.0, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[1], -10.0, epsilon = 1e-12);
        assert_relative_eq!(returns.mean_fraction(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn returns_round_trip_to_prices() {
        let prices = vec![50000.0, 50500.0, 49800.25, 51234.5, 51000.0, 53999.99];
        let returns = ReturnSeries::from_raw_prices(&prices).unwrap();

        let mut rebuilt = vec![prices[0]];
        for r in returns.values() {
            let prev = *rebuilt.last().unwrap();
            rebuilt.push(prev * (1.0 + r / 100.0));
        }
        for (a, b) in prices.iter().zip(rebuilt.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn single_price_is_insufficient() {
        assert_eq!(
            ReturnSeries::from_raw_prices(&[100.0]),
            Err(PipelineError::InsufficientData {
                required: 2,
                actual: 1
            })
        );
        assert!(ReturnSeries::from_raw_prices(&[]).is_err());
    }

    #[test]
    fn price_series_rejects_non_positive_price() {
        let err = PriceSeries::from_daily_prices(start(), &[100.0, 0.0, 101.0]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameters(_)));
    }

    #[test]
    fn price_series_rejects_repeated_timestamp() {
        let t = start();
        let points = vec![
            PricePoint {
                timestamp: t,
                price: 1.0,
            },
            PricePoint {
                timestamp: t,
                price: 2.0,
            },
        ];
        assert!(PriceSeries::new(points).is_err());
    }

    #[test]
    fn daily_series_keeps_order() {
        let series = PriceSeries::from_daily_prices(start(), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last().unwrap().price, 3.0);
        assert_eq!(
            series.points()[2].timestamp - series.points()[0].timestamp,
            chrono::Duration::days(2)
        );
    }
}
