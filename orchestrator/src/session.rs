use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use dibdump::{Bitmap, PixelEncoding};
use log::{debug, info, trace};
use machine_learning::{
    arch::{Model, ModelSnapshot, Sequential, loss::HalfSse},
    initialization::ParamGen,
    training::{Trainer, TrainingReport},
};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    OrchestratorError, Result, cases,
    configs::{Adapter, NetworkConfig},
};

/// Settings of a training session that aren't part of the network file.
#[derive(Debug, Clone, Default)]
pub struct TrainOptions {
    /// Seeds the weight initialization and the shuffling, OS entropy is used if `None`.
    pub seed: Option<u64>,
    /// Starts from the weights of a snapshot instead of random ones.
    pub weights_in: Option<PathBuf>,
    /// Saves a snapshot of the trained weights.
    pub weights_out: Option<PathBuf>,
    /// Shuffles the cases before every step instead of visiting them in file order.
    pub shuffle: bool,
}

/// Trains a perceptron described by a network file on separate activations and truths files,
/// then writes the trained network's outputs for every case.
///
/// # Arguments
/// * `network` - The network file.
/// * `activations` - The inputs of every case, one case per line.
/// * `truths` - The expected outputs of every case, one case per line.
/// * `outputs` - Where to write the outputs of every case after training.
/// * `options` - The session settings not covered by the network file.
pub fn train_files(
    network: &Path,
    activations: &Path,
    truths: &Path,
    outputs: &Path,
    options: &TrainOptions,
) -> Result<TrainingReport> {
    let config = NetworkConfig::load(network)?;
    let inputs = cases::read_cases(activations)?;
    let truths = cases::read_cases(truths)?;

    train_cases(&config, &inputs, &truths, outputs, options)
}

/// Trains a perceptron described by a combined network file, one carrying its own cases.
pub fn train_combined(
    network: &Path,
    outputs: &Path,
    options: &TrainOptions,
) -> Result<TrainingReport> {
    let config = NetworkConfig::load(network)?;
    if !config.is_combined() {
        return Err(OrchestratorError::InvalidConfig(format!(
            "{} has no inline training cases",
            network.display()
        )));
    }

    let (inputs, truths) = config.split_cases();
    train_cases(&config, &inputs, &truths, outputs, options)
}

fn train_cases(
    config: &NetworkConfig,
    inputs: &[Vec<f32>],
    truths: &[Vec<f32>],
    outputs: &Path,
    options: &TrainOptions,
) -> Result<TrainingReport> {
    let adapter = Adapter::new();
    adapter.validate(config)?;

    let dataset = adapter.adapt_dataset(config, inputs, truths)?;
    let model = adapter.adapt_model(config)?;
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut params = match &options.weights_in {
        Some(path) => load_weights(path, &model)?,
        None => {
            let mut params = vec![0.; model.size()];
            adapter
                .adapt_param_gen(config, params.len(), StdRng::from_rng(&mut rng))?
                .fill(&mut params)?;
            params
        }
    };

    info!(
        inputs = config.inputs,
        outputs = config.outputs,
        cases = config.num_cases,
        params = params.len();
        "training perceptron with hidden layers {:?}",
        config.hidden
    );

    let mut trainer = Trainer::new(
        model,
        adapter.adapt_optimizer(config),
        dataset,
        HalfSse,
        adapter.adapt_trainer_config(config, options.shuffle),
        rng,
    );

    let report = trainer.train(&mut params)?;
    let y_pred = trainer.predict_cases(&params)?;

    for (i, row) in y_pred.rows().into_iter().enumerate() {
        trace!(case = i; "outputs {row}");
    }

    cases::write_cases(outputs, y_pred.rows().into_iter().map(|row| row.to_vec()))?;
    debug!("wrote {} output cases to {}", y_pred.nrows(), outputs.display());

    if let Some(path) = &options.weights_out {
        save_weights(path, &trainer.model().snapshot(&params)?)?;
    }

    Ok(report)
}

/// Reads a weights snapshot and checks it fits `model`.
pub fn load_weights(path: &Path, model: &Sequential) -> Result<Vec<f32>> {
    let file = File::open(path).map_err(OrchestratorError::io(path))?;
    let snapshot: ModelSnapshot = serde_json::from_reader(BufReader::new(file))?;

    Ok(model.params_from(&snapshot)?)
}

/// Writes a weights snapshot as JSON.
pub fn save_weights(path: &Path, snapshot: &ModelSnapshot) -> Result<()> {
    let file = File::create(path).map_err(OrchestratorError::io(path))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush().map_err(OrchestratorError::io(path))?;
    debug!("saved weights to {}", path.display());
    Ok(())
}

/// Writes the activations of a bitmap as a single case.
///
/// # Returns
/// The width and height of the bitmap.
pub fn encode(image: &Path, activations: &Path, encoding: PixelEncoding) -> Result<(u32, u32)> {
    let bitmap = Bitmap::open(image)?;
    let values = encoding.encode(&bitmap);

    cases::write_cases(activations, [values.as_slice()])?;
    info!(
        "encoded {}x{} bitmap {} into {} {encoding} activations",
        bitmap.width(),
        bitmap.height(),
        image.display(),
        values.len()
    );

    Ok((bitmap.width(), bitmap.height()))
}

/// Rebuilds a bitmap with the dimensions of `image` from the first case of `outputs`.
pub fn decode(
    image: &Path,
    outputs: &Path,
    out_image: &Path,
    encoding: PixelEncoding,
) -> Result<()> {
    let original = Bitmap::open(image)?;
    let rows = cases::read_cases(outputs)?;

    let Some(values) = rows.first() else {
        return Err(OrchestratorError::InvalidConfig(format!(
            "{} holds no outputs",
            outputs.display()
        )));
    };

    encoding
        .decode(original.width(), original.height(), values)?
        .save(out_image)?;

    info!("decoded {} into {}", outputs.display(), out_image.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use dibdump::Rgb;

    use super::*;

    const OR2_NETWORK: &str = "2\n1 2\n1\n4\n1.0\n0.01\n10000\n-1\n1\n";
    const OR2_ACTIVATIONS: &str = "0 0\n0 1\n1 0\n1 1\n";
    const OR2_TRUTHS: &str = "0\n1\n1\n1\n";

    fn options(seed: u64) -> TrainOptions {
        TrainOptions {
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn train_files_writes_one_output_line_per_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name);

        fs::write(path("net.txt"), OR2_NETWORK).unwrap();
        fs::write(path("acts.txt"), OR2_ACTIVATIONS).unwrap();
        fs::write(path("truths.txt"), OR2_TRUTHS).unwrap();

        let report = train_files(
            &path("net.txt"),
            &path("acts.txt"),
            &path("truths.txt"),
            &path("outs.txt"),
            &options(3),
        )
        .unwrap();

        assert!(report.steps > 0);

        let outputs = cases::read_cases(path("outs.txt")).unwrap();
        assert_eq!(outputs.len(), 4);
        assert!(outputs.iter().all(|row| row.len() == 1));
        assert!(outputs.iter().flatten().all(|&y| (0. ..=1.).contains(&y)));
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let net = dir.path().join("net.txt");
        fs::write(&net, "2\n1 2\n1\n4\n0 0 0\n0 1 1\n1 0 1\n1 1 1\n1.0\n0.01\n50\n-1\n1\n").unwrap();

        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");
        let a = train_combined(&net, &first, &options(11)).unwrap();
        let b = train_combined(&net, &second, &options(11)).unwrap();

        assert_eq!(a.error, b.error);
        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn train_combined_needs_inline_cases() {
        let dir = tempfile::tempdir().unwrap();
        let net = dir.path().join("net.txt");
        fs::write(&net, OR2_NETWORK).unwrap();

        let err = train_combined(&net, &dir.path().join("o.txt"), &options(0)).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn saved_weights_reproduce_the_trained_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name);

        fs::write(path("train.txt"), "2\n1 2\n1\n2\n0 0 0\n1 1 1\n1.0\n0.0\n3\n-1\n1\n").unwrap();
        fs::write(path("frozen.txt"), "2\n1 2\n1\n2\n0 0 0\n1 1 1\n1.0\n0.0\n0\n-1\n1\n").unwrap();

        let save = TrainOptions {
            weights_out: Some(path("weights.json")),
            ..options(5)
        };
        let trained = train_combined(&path("train.txt"), &path("o1.txt"), &save).unwrap();
        assert_eq!(trained.steps, 3);

        let resume = TrainOptions {
            weights_in: Some(path("weights.json")),
            ..options(99)
        };
        let frozen = train_combined(&path("frozen.txt"), &path("o2.txt"), &resume).unwrap();
        assert_eq!(frozen.steps, 0);

        let saved = cases::read_cases(path("o1.txt")).unwrap();
        let reloaded = cases::read_cases(path("o2.txt")).unwrap();
        for (a, b) in saved.iter().flatten().zip(reloaded.iter().flatten()) {
            assert!((a - b).abs() < 1e-5, "{a} != {b}");
        }
    }

    #[test]
    fn shuffled_training_writes_outputs_in_case_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name);
        let network = |steps: usize| {
            format!("1\n1 2\n1\n4\n-3 0\n-1 0\n1 1\n3 1\n1.0\n0.0\n{steps}\n-1\n1\n")
        };

        fs::write(path("train.txt"), network(5)).unwrap();
        fs::write(path("frozen.txt"), network(0)).unwrap();

        let shuffled = TrainOptions {
            weights_out: Some(path("weights.json")),
            shuffle: true,
            ..options(8)
        };
        train_combined(&path("train.txt"), &path("o1.txt"), &shuffled).unwrap();

        let frozen = TrainOptions {
            weights_in: Some(path("weights.json")),
            ..options(0)
        };
        train_combined(&path("frozen.txt"), &path("o2.txt"), &frozen).unwrap();

        let trained = cases::read_cases(path("o1.txt")).unwrap();
        let in_order = cases::read_cases(path("o2.txt")).unwrap();
        assert_eq!(trained.len(), 4);
        for (a, b) in trained.iter().flatten().zip(in_order.iter().flatten()) {
            assert!((a - b).abs() < 1e-5, "{trained:?} != {in_order:?}");
        }
    }

    #[test]
    fn mismatched_weights_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("weights.json");
        fs::write(&weights, r#"{"layers":[{"dim":[1,1],"weights":[[0.5]]}]}"#).unwrap();

        let model = Sequential::perceptron(2, &[2], 1, Default::default()).unwrap();
        assert!(matches!(
            load_weights(&weights, &model),
            Err(OrchestratorError::Ml(_))
        ));
    }

    #[test]
    fn encode_and_decode_go_through_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("in.bmp");
        let acts = dir.path().join("acts.txt");
        let out = dir.path().join("out.bmp");

        let pixels = vec![Rgb::gray(0), Rgb::gray(255), Rgb::gray(255), Rgb::gray(0)];
        Bitmap::new(2, 2, pixels.clone()).unwrap().save(&image).unwrap();

        assert_eq!(encode(&image, &acts, PixelEncoding::Gray).unwrap(), (2, 2));
        assert_eq!(cases::read_cases(&acts).unwrap().len(), 1);

        decode(&image, &acts, &out, PixelEncoding::Gray).unwrap();
        assert_eq!(Bitmap::open(&out).unwrap().pixels(), pixels.as_slice());
    }

    #[test]
    fn decode_rejects_short_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("in.bmp");
        let outs = dir.path().join("outs.txt");

        Bitmap::new(2, 1, vec![Rgb::gray(9); 2]).unwrap().save(&image).unwrap();
        fs::write(&outs, "0.5\n").unwrap();

        let err = decode(&image, &outs, &dir.path().join("o.bmp"), PixelEncoding::Gray);
        assert!(matches!(err, Err(OrchestratorError::Bitmap(_))));
    }
}
