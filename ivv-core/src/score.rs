//! Travel viability index (IVV).
//!
//! Blends a climate sub-score (temperature distance from 20 °C and worst-case
//! rain probability) with a currency sub-score (penalizing a weakening local
//! currency). Missing inputs fall back to the values in the table below, and
//! these defaults are part of the scoring contract:
//!
//! | input                     | when missing | effect                    |
//! |---------------------------|--------------|---------------------------|
//! | precipitation probability | 0 %          | no rain penalty           |
//! | temperature               | 20 °C        | perfect temperature score |
//! | currency variation        | n/a          | currency score of 1.0     |

use serde::{Deserialize, Serialize};

pub const IDEAL_TEMPERATURE_C: f64 = 20.0;
const TEMPERATURE_TOLERANCE_C: f64 = 40.0;

const TEMPERATURE_WEIGHT: f64 = 0.6;
const DRYNESS_WEIGHT: f64 = 0.4;
const CLIMATE_WEIGHT: f64 = 0.7;
const CURRENCY_WEIGHT: f64 = 0.3;

/// Ordered categorical band of the index, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IvvLabel {
    Verde,
    Amarillo,
    Naranja,
    Rojo,
}

impl IvvLabel {
    /// Band lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::Verde
        } else if score >= 0.50 {
            Self::Amarillo
        } else if score >= 0.25 {
            Self::Naranja
        } else {
            Self::Rojo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verde => "verde",
            Self::Amarillo => "amarillo",
            Self::Naranja => "naranja",
            Self::Rojo => "rojo",
        }
    }
}

impl std::fmt::Display for IvvLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Rounded to 3 decimals.
    pub score: f64,
    pub label: IvvLabel,
}

pub fn temperature_score(temperature_c: Option<f64>) -> f64 {
    let t = temperature_c.unwrap_or(IDEAL_TEMPERATURE_C);
    (1.0 - (t - IDEAL_TEMPERATURE_C).abs() / TEMPERATURE_TOLERANCE_C).max(0.0)
}

pub fn climate_score(precipitation_pct: Option<f64>, temperature_c: Option<f64>) -> f64 {
    let p_norm = (precipitation_pct.unwrap_or(0.0) / 100.0).clamp(0.0, 1.0);
    TEMPERATURE_WEIGHT * temperature_score(temperature_c) + DRYNESS_WEIGHT * (1.0 - p_norm)
}

/// 1.0 unless the local currency lost value; a 10 % drop or worse scores 0.
pub fn currency_score(variation_pct: Option<f64>) -> f64 {
    match variation_pct {
        Some(v) if v < 0.0 => (1.0 + v / 10.0).max(0.0),
        _ => 1.0,
    }
}

/// Compute the index for one city. Pure and deterministic.
pub fn score(
    precipitation_pct: Option<f64>,
    temperature_c: Option<f64>,
    variation_pct: Option<f64>,
) -> ScoreResult {
    let climate = climate_score(precipitation_pct, temperature_c);
    let currency = currency_score(variation_pct);
    let value = CLIMATE_WEIGHT * climate + CURRENCY_WEIGHT * currency;

    ScoreResult {
        score: round3(value),
        label: IvvLabel::from_score(value),
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
