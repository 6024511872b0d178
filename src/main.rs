use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use rusty_snab::config::EvaluationConfig;
use rusty_snab::decoder::{compare_labels, spikes_to_labels, spikes_to_labels_ttfs, spikes_to_rates};
use rusty_snab::energy::model::{FittedEnergyModel, MeasurementSession};
use rusty_snab::energy::network::NetworkSummary;
use rusty_snab::error::SNABError;
use rusty_snab::statistics::{calculate_statistics, Statistics};
use rusty_snab::wta::summed_bins;

#[derive(Parser, Debug)]
#[command(name = "snab-eval", about = "Evaluate spiking neural network benchmark recordings")]
struct Args {
    /// The evaluation configuration (JSON), defaults are used if omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the log to this file instead of the standard error
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Statistics of a JSON array of values
    Stats {
        #[arg(long)]
        input: PathBuf,
        /// Ignore NaN values, i.e., treat the values as repeated runs of a benchmark
        #[arg(long)]
        repeats: bool,
    },
    /// Winner-take-all metrics of two populations
    Wta {
        /// JSON object with `population_a`, `population_b` (spike trains) and `simulation_length`
        #[arg(long)]
        input: PathBuf,
    },
    /// Decode the spike trains of an output population into labels (or rates)
    Decode {
        /// JSON array of spike trains, one per output neuron
        #[arg(long)]
        input: PathBuf,
        /// The presentation time of a sample
        #[arg(long)]
        duration: f64,
        /// The pause between two samples
        #[arg(long, default_value = "0.0")]
        pause: f64,
        /// The number of samples
        #[arg(long)]
        batch_size: usize,
        /// JSON array of target labels, to report the number of correct labels
        #[arg(long)]
        target: Option<PathBuf>,
        /// Use time-to-first-spike decoding
        #[arg(long)]
        ttfs: bool,
        /// Output the rates instead of the labels
        #[arg(long)]
        rates: bool,
    },
    /// Fit an energy model on a measurement session
    Fit {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Estimate the energy of a simulated network
    Energy {
        /// The fitted energy model
        #[arg(long)]
        model: PathBuf,
        /// The network summary
        #[arg(long)]
        network: PathBuf,
    },
}

#[derive(Deserialize, Debug)]
struct WtaInput {
    population_a: Vec<Vec<f64>>,
    population_b: Vec<Vec<f64>>,
    simulation_length: f64,
}

#[derive(Serialize, Debug)]
struct DecodeOutput {
    labels: Vec<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correct: Option<usize>,
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<(), SNABError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let encoder = || Box::new(PatternEncoder::new("{l} - {m}\n"));

    let appender: Box<dyn Append> = match log_file {
        Some(path) => Box::new(FileAppender::builder().encoder(encoder()).build(path)?),
        None => Box::new(
            ConsoleAppender::builder()
                .encoder(encoder())
                .target(Target::Stderr)
                .build(),
        ),
    };

    let config = Config::builder()
        .appender(Appender::builder().build("main", appender))
        .build(Root::builder().appender("main").build(level))
        .map_err(|e| SNABError::IOError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| SNABError::IOError(e.to_string()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SNABError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), SNABError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), SNABError> {
    let args = Args::parse();
    init_logging(args.verbose, args.log_file.as_deref())?;
    log::debug!("{:?}", args);

    let config = match &args.config {
        Some(path) => EvaluationConfig::from_file(path)?,
        None => EvaluationConfig::default(),
    };

    match args.command {
        Command::Stats { input, repeats } => {
            let values: Vec<f64> = read_json(&input)?;
            if repeats {
                match Statistics::from_repeats(&values) {
                    Some(stats) => print_json(&stats)?,
                    None => log::warn!("No run reported a value!"),
                }
            } else {
                print_json(&calculate_statistics(&values))?;
            }
        }
        Command::Wta { input } => {
            let input: WtaInput = read_json(&input)?;
            let bins_a = summed_bins(
                &input.population_a,
                config.wta_start,
                input.simulation_length,
                config.wta_bin_size,
            )?;
            let bins_b = summed_bins(
                &input.population_b,
                config.wta_start,
                input.simulation_length,
                config.wta_bin_size,
            )?;
            log::info!("Binning: done! {} bins per population", bins_a.len());

            let metrics = config
                .wta_evaluator()
                .evaluate(&bins_a, &bins_b, config.wta_bin_size)?;
            if metrics.is_nan() {
                log::warn!("No population spiked, the WTA metrics are undefined");
            }
            print_json(&metrics)?;
        }
        Command::Decode {
            input,
            duration,
            pause,
            batch_size,
            target,
            ttfs,
            rates,
        } => {
            let signals: Vec<Vec<f64>> = read_json(&input)?;
            if rates {
                let rates =
                    spikes_to_rates(&signals, duration, pause, batch_size, config.label_norm)?;
                return print_json(&rates);
            }

            let labels = if ttfs {
                spikes_to_labels_ttfs(&signals, duration, pause, batch_size)?
            } else {
                spikes_to_labels(&signals, duration, pause, batch_size)?
            };
            let correct = match target {
                Some(path) => {
                    let target: Vec<u16> = read_json(&path)?;
                    let correct = compare_labels(&target, &labels)?;
                    log::info!("{} out of {} labels are correct", correct, target.len());
                    Some(correct)
                }
                None => None,
            };
            print_json(&DecodeOutput { labels, correct })?;
        }
        Command::Fit { input, output } => {
            let session: MeasurementSession = read_json(&input)?;
            let model = session.fit()?;
            let file = File::create(&output)?;
            serde_json::to_writer_pretty(file, &model)?;
            log::info!("Energy model saving: done! Saved to {}", output.display());
        }
        Command::Energy { model, network } => {
            let model: FittedEnergyModel = read_json(&model)?;
            let network: NetworkSummary = read_json(&network)?;
            network.validate()?;

            let breakdown = model.breakdown(&network);
            log::info!("Estimated energy: {} mJ", breakdown.total());
            print_json(&breakdown)?;
        }
    }

    Ok(())
}
