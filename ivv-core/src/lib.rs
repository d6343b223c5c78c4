//! Core library for the `ivv` travel viability pipeline.
//!
//! This crate defines:
//! - Configuration: city roster, upstream endpoints, retry budget
//! - A retrying HTTP client and the weather, currency and local-time sources built on it
//! - The IVV scoring function and threshold alerts
//! - Per-city processing, the pipeline run, and persistence of its results
//!
//! It is used by `ivv-cli`, but can also be driven by other schedulers or services.

pub mod alert;
pub mod config;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod processor;
pub mod provider;
pub mod score;
pub mod store;

pub use config::{Config, Endpoints, RetrySettings};
pub use http::{RetryPolicy, RetryingClient};
pub use model::{CityTarget, CurrencySample, Observation, RunBatch, WeatherSample};
pub use pipeline::{Pipeline, run_once};
pub use processor::{CityProcessor, CityReport};
pub use provider::{CurrencySource, LocalTimeSource, SourceKind, Sources, WeatherSource};
pub use score::{IvvLabel, ScoreResult, score};
pub use store::{PersistSummary, Store, StoreError};
