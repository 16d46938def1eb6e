use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dibdump::PixelEncoding;
use env_logger::Env;
use log::info;
use machine_learning::training::TrainingReport;

use orchestrator::{
    Pipeline, PipelineEvent, TrainOptions, cases,
    configs::{NetworkConfig, PipelineConfig},
};

#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(version)]
#[command(about = "Trains perceptrons to reproduce bitmaps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the activations of a bitmap as a single case
    Encode {
        image: PathBuf,
        activations: PathBuf,
        #[arg(long, default_value_t = PixelEncoding::Gray)]
        encoding: PixelEncoding,
    },
    /// Rebuild a bitmap with the dimensions of IMAGE from the first case of OUTPUTS
    Decode {
        image: PathBuf,
        outputs: PathBuf,
        out_image: PathBuf,
        #[arg(long, default_value_t = PixelEncoding::Gray)]
        encoding: PixelEncoding,
    },
    /// Build a combined network file training the activations as both inputs and truths
    Merge {
        activations: PathBuf,
        template: PathBuf,
        output: PathBuf,
    },
    /// Train a perceptron on separate activations and truths files
    Train {
        network: PathBuf,
        activations: PathBuf,
        truths: PathBuf,
        outputs: PathBuf,
        #[command(flatten)]
        options: TrainArgs,
    },
    /// Train a perceptron from a network file carrying its own cases
    TrainCombined {
        network: PathBuf,
        outputs: PathBuf,
        #[command(flatten)]
        options: TrainArgs,
    },
    /// Encode, train, decode and display a bitmap
    Run {
        /// JSON pipeline config, every field is optional
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long)]
        image: Option<PathBuf>,
        /// Don't open the images once done
        #[arg(long)]
        no_open: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Seed for the initial weights and the shuffling
    #[arg(long)]
    seed: Option<u64>,
    /// Start from a weights snapshot instead of random weights
    #[arg(long, value_name = "FILE")]
    weights: Option<PathBuf>,
    /// Save the trained weights as a snapshot
    #[arg(long, value_name = "FILE")]
    save_weights: Option<PathBuf>,
    /// Shuffle the cases before every step
    #[arg(long)]
    shuffle: bool,
}

impl From<TrainArgs> for TrainOptions {
    fn from(args: TrainArgs) -> Self {
        Self {
            seed: args.seed,
            weights_in: args.weights,
            weights_out: args.save_weights,
            shuffle: args.shuffle,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Encode {
            image,
            activations,
            encoding,
        } => {
            orchestrator::encode(&image, &activations, encoding)?;
        }
        Command::Decode {
            image,
            outputs,
            out_image,
            encoding,
        } => {
            orchestrator::decode(&image, &outputs, &out_image, encoding)?;
        }
        Command::Merge {
            activations,
            template,
            output,
        } => {
            let rows = cases::read_cases(&activations)?;
            let values = rows
                .first()
                .with_context(|| format!("{} holds no activations", activations.display()))?;

            let template = NetworkConfig::load(&template)?;
            NetworkConfig::merge_activations(values, &template)?.save(&output)?;
            info!("wrote combined network file {}", output.display());
        }
        Command::Train {
            network,
            activations,
            truths,
            outputs,
            options,
        } => {
            let report =
                orchestrator::train_files(&network, &activations, &truths, &outputs, &options.into())?;
            print_report(&report);
        }
        Command::TrainCombined {
            network,
            outputs,
            options,
        } => {
            let report = orchestrator::train_combined(&network, &outputs, &options.into())?;
            print_report(&report);
        }
        Command::Run {
            config,
            image,
            no_open,
            seed,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::load(&path)
                    .with_context(|| format!("loading pipeline config {}", path.display()))?,
                None => PipelineConfig::default(),
            };

            config.image = image.or(config.image);
            config.seed = seed.or(config.seed);
            config.open_viewer &= !no_open;

            let pipeline = Pipeline::new(config)?;
            let report = pipeline.run(|event| {
                if let PipelineEvent::StageFinished(stage) = event {
                    println!("{stage}: done");
                }
            })?;

            print_report(&report);
        }
    }

    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!("Terminated because {}", report.stop);
    println!("Number of iterations: {}", report.steps);
    match report.error {
        Some(error) => println!("Error: {error}"),
        None => println!("Error: not measured"),
    }
    println!("Time: {:?}", report.elapsed);
}
