use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ivv_core::{Config, Observation, Store, run_once, score};
use std::path::PathBuf;

use crate::logging;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ivv", version, about = "Travel viability index pipeline")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one collection cycle over every configured city and persist the results.
    Run,

    /// Write a config file with the default city roster.
    Init {
        /// Overwrite an existing file without asking.
        #[arg(long)]
        force: bool,
    },

    /// Show the most recent rows of the cumulative table.
    Show {
        /// Only rows for this city (case-insensitive).
        #[arg(long)]
        city: Option<String>,

        /// Number of rows to print.
        #[arg(long, default_value_t = 20)]
        last: usize,
    },

    /// Evaluate the index for hand-entered inputs; omitted inputs use the scoring defaults.
    Score {
        /// Maximum precipitation probability, in percent.
        #[arg(long, allow_hyphen_values = true)]
        precip: Option<f64>,

        /// Temperature in °C.
        #[arg(long, allow_hyphen_values = true)]
        temp: Option<f64>,

        /// Day-over-day currency variation, in percent.
        #[arg(long, allow_hyphen_values = true)]
        variation: Option<f64>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Run => {
                let config = load_config(self.config.as_ref())?;
                logging::init(config.log_file.as_deref())?;

                if let Err(e) = run_once(&config).await {
                    tracing::error!(error = %format!("{e:#}"), "pipeline run failed");
                    return Err(e);
                }
            }
            Command::Init { force } => {
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };

                if path.exists() && !force {
                    let overwrite = inquire::Confirm::new(&format!(
                        "{} already exists. Overwrite it?",
                        path.display()
                    ))
                    .with_default(false)
                    .prompt()?;

                    if !overwrite {
                        println!("Left {} unchanged.", path.display());
                        return Ok(());
                    }
                }

                Config::default().save_to(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
            Command::Show { city, last } => {
                let config = load_config(self.config.as_ref())?;
                let rows = Store::new(&config.data_dir)
                    .read_history()
                    .context("Failed to read the cumulative table")?;

                let rows: Vec<&Observation> = rows
                    .iter()
                    .filter(|o| city.as_ref().is_none_or(|c| o.city.eq_ignore_ascii_case(c)))
                    .collect();

                if rows.is_empty() {
                    println!("No observations yet. Run `ivv run` first.");
                    return Ok(());
                }

                print_table(&rows[rows.len().saturating_sub(last)..]);
            }
            Command::Score {
                precip,
                temp,
                variation,
            } => {
                let result = score(precip, temp, variation);
                println!("{:.3} {}", result.score, result.label);
            }
        }

        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn print_table(rows: &[&Observation]) {
    println!(
        "{:<17} {:<14} {:>7} {:>6} {:>7} {:>10} {:>7} {:>6}  {}",
        "run (UTC)", "city", "temp", "rain%", "ccy", "rate", "var%", "ivv", "label"
    );

    for o in rows {
        println!(
            "{:<17} {:<14} {:>7} {:>6} {:>7} {:>10} {:>7} {:>6.3}  {}",
            o.timestamp_utc.format("%Y-%m-%d %H:%M").to_string(),
            o.city,
            opt(o.temperature_c, 1),
            opt(o.precipitation_pct, 0),
            o.currency,
            opt(o.exchange_rate, 4),
            opt(o.variation_pct, 2),
            o.ivv_score,
            o.ivv_label,
        );
    }
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn score_accepts_negative_variation() {
        let cli = Cli::try_parse_from(["ivv", "score", "--temp", "-5", "--variation", "-3.5"])
            .expect("negative values must parse");

        match cli.command {
            Command::Score {
                precip,
                temp,
                variation,
            } => {
                assert_eq!(precip, None);
                assert_eq!(temp, Some(-5.0));
                assert_eq!(variation, Some(-3.5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["ivv", "run", "--config", "/etc/ivv.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ivv.toml")));
        assert!(matches!(cli.command, Command::Run));
    }

    #[test]
    fn missing_values_render_as_dash() {
        assert_eq!(opt(None, 2), "-");
        assert_eq!(opt(Some(12.3456), 2), "12.35");
    }
}
