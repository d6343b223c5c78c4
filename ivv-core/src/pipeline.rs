use anyhow::Context;
use chrono::{SubsecRound, Utc};
use tracing::Instrument;

use crate::{
    Config,
    model::{CityTarget, RunBatch},
    processor::CityProcessor,
    provider::sources_from_config,
    store::{PersistSummary, Store},
};

/// One pass over the roster, city by city, in roster order.
#[derive(Debug)]
pub struct Pipeline {
    roster: Vec<CityTarget>,
    processor: CityProcessor,
}

impl Pipeline {
    pub fn new(roster: Vec<CityTarget>, processor: CityProcessor) -> Self {
        Self { roster, processor }
    }

    /// Process every city and collect the observations that could be built.
    ///
    /// A city without weather data is skipped; the rest of the run continues.
    pub async fn run(&self) -> RunBatch {
        let started_at = Utc::now().trunc_subsecs(0);
        let span = tracing::info_span!("run", started_at = %started_at.to_rfc3339());

        async {
            tracing::info!(cities = self.roster.len(), "pipeline started");

            let mut observations = Vec::with_capacity(self.roster.len());
            for city in &self.roster {
                if let Some(report) = self.processor.process(city, started_at).await {
                    observations.push(report.observation);
                }
            }

            tracing::info!(
                observations = observations.len(),
                skipped = self.roster.len() - observations.len(),
                "pipeline finished"
            );

            RunBatch {
                started_at,
                observations,
            }
        }
        .instrument(span)
        .await
    }
}

/// Run one full collection cycle: validate config, fetch, score, persist.
///
/// Returns `None` when no city produced an observation, in which case nothing is written.
pub async fn run_once(config: &Config) -> anyhow::Result<Option<PersistSummary>> {
    config.validate()?;

    let sources = sources_from_config(config).context("Failed to build data sources")?;
    let pipeline = Pipeline::new(config.cities.clone(), CityProcessor::new(sources));

    let batch = pipeline.run().await;
    if batch.is_empty() {
        tracing::warn!("no observations collected, nothing persisted");
        return Ok(None);
    }

    let summary = Store::new(&config.data_dir)
        .persist(&batch)
        .context("Failed to persist run")?;

    Ok(Some(summary))
}
