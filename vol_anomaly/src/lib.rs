//! Volatility anomaly detection with Monte Carlo price projection
//!
//! Fits a GARCH(1,1) model to the percentage returns of a price series,
//! compares the one-step volatility forecast with a rolling historical
//! baseline, and only when the forecast is anomalously high projects an
//! ensemble of future prices and its percentile bands.
//!
//! Stages:
//! - `series`: prices → percentage returns
//! - `garch`: maximum-likelihood GARCH(1,1) fit and forecast
//! - `anomaly`: forecast vs scaled rolling baseline
//! - `simulation`: parallel geometric Brownian motion paths
//! - `summary`: expected path and percentile bands
//! - `pipeline`: the `compute` entry point tying them together

pub mod anomaly;
pub mod error;
pub mod garch;
pub mod optimize;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod series;
pub mod simulation;
pub mod stats;
pub mod summary;

pub use anomaly::{AnomalyAssessment, AnomalyDetector};
pub use error::{PipelineError, Result};
pub use garch::{GarchModel, GarchParams, VolatilityForecast};
pub use params::{FitOptions, PipelineConfig, SamplingInterval};
pub use pipeline::{compute, Projection, Report};
pub use series::{PricePoint, PriceSeries, ReturnSeries};
pub use simulation::{PathEnsemble, PathSimulator, SimulationParams};
pub use summary::{summarize, summarize_with, PathSummary, TerminalOutlook};
