use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use log::{info, warn};
use machine_learning::training::TrainingReport;

use crate::{
    OrchestratorError, Result, TrainOptions,
    configs::PipelineConfig,
    session::{decode, encode, train_files},
};

/// The steps of a pipeline run, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Bitmap to activations and truths, plus the network file sized to the image.
    Encode,
    Train,
    /// Trained outputs back to a bitmap.
    Decode,
    /// Opening the original and the reproduced bitmaps.
    Display,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Encode => "encode",
            Stage::Train => "train",
            Stage::Decode => "decode",
            Stage::Display => "display",
        };

        f.write_str(s)
    }
}

/// Progress notifications of `Pipeline::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    StageStarted(Stage),
    StageFinished(Stage),
}

/// Opens an image for the user to look at.
pub type Viewer = fn(&Path) -> io::Result<()>;

/// Teaches a perceptron to reproduce a bitmap: encodes the image, trains an autoencoder on its
/// activations, decodes the trained outputs into a new image and opens both images.
pub struct Pipeline {
    config: PipelineConfig,
    image: PathBuf,
    viewer: Viewer,
}

impl Pipeline {
    /// Creates a new `Pipeline`.
    ///
    /// # Returns
    /// The pipeline or an error if the config names no image.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let Some(image) = config.image.clone() else {
            return Err(OrchestratorError::InvalidConfig(
                "the pipeline needs an image".into(),
            ));
        };

        Ok(Self {
            config,
            image,
            viewer: system_viewer,
        })
    }

    /// Replaces the system's default viewer used by the display stage.
    pub fn with_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage in order, stopping at the first one that fails.
    ///
    /// # Arguments
    /// * `observer` - Called as each stage starts and finishes.
    ///
    /// # Returns
    /// The report of the training stage or the error of the failing stage.
    pub fn run<F>(&self, mut observer: F) -> Result<TrainingReport>
    where
        F: FnMut(PipelineEvent),
    {
        let config = &self.config;
        let activations = config.in_work_dir(&config.activations);
        let truths = config.in_work_dir(&config.truths);
        let network = config.in_work_dir(&config.network);
        let outputs = config.in_work_dir(&config.outputs);
        let out_image = config.in_work_dir(&config.out_image);

        self.stage(Stage::Encode, &mut observer, || {
            fs::create_dir_all(&config.work_dir).map_err(OrchestratorError::io(&config.work_dir))?;

            let (width, height) = encode(&self.image, &activations, config.encoding)?;
            fs::copy(&activations, &truths).map_err(OrchestratorError::io(&truths))?;

            let n = config.encoding.activations(width, height);
            config.network_config(n).save(&network)
        })?;

        let report = self.stage(Stage::Train, &mut observer, || {
            let options = TrainOptions {
                seed: config.seed,
                weights_out: config.weights.as_ref().map(|w| config.in_work_dir(w)),
                ..Default::default()
            };

            train_files(&network, &activations, &truths, &outputs, &options)
        })?;

        self.stage(Stage::Decode, &mut observer, || {
            decode(&self.image, &outputs, &out_image, config.encoding)
        })?;

        self.stage(Stage::Display, &mut observer, || {
            if config.open_viewer {
                view(self.viewer, &self.image);
                view(self.viewer, &out_image);
            } else {
                info!("viewer disabled, reproduced image at {}", out_image.display());
            }

            Ok(())
        })?;

        Ok(report)
    }

    fn stage<T, F, O>(&self, stage: Stage, observer: &mut O, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
        O: FnMut(PipelineEvent),
    {
        info!("{stage} stage started");
        observer(PipelineEvent::StageStarted(stage));

        let value = f().map_err(|source| OrchestratorError::Stage {
            stage,
            source: Box::new(source),
        })?;

        info!("{stage} stage finished");
        observer(PipelineEvent::StageFinished(stage));
        Ok(value)
    }
}

fn system_viewer(path: &Path) -> io::Result<()> {
    open::that(path)
}

/// Opens `path` with `viewer`, failing to do so isn't fatal.
fn view(viewer: Viewer, path: &Path) {
    if let Err(e) = viewer(path) {
        warn!("could not open {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipelines_need_an_image() {
        assert!(matches!(
            Pipeline::new(PipelineConfig::default()),
            Err(OrchestratorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_images_fail_the_encode_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            image: Some(dir.path().join("missing.bmp")),
            work_dir: dir.path().join("work"),
            open_viewer: false,
            ..Default::default()
        };

        let mut events = Vec::new();
        let err = Pipeline::new(config)
            .unwrap()
            .run(|e| events.push(e))
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::Stage {
                stage: Stage::Encode,
                ..
            }
        ));
        assert_eq!(events, vec![PipelineEvent::StageStarted(Stage::Encode)]);
    }

    #[test]
    fn viewer_failures_only_warn() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("in.bmp");
        dibdump::Bitmap::new(2, 1, vec![dibdump::Rgb::gray(40), dibdump::Rgb::gray(200)])
            .unwrap()
            .save(&image)
            .unwrap();

        let config = PipelineConfig {
            image: Some(image),
            work_dir: dir.path().join("work"),
            max_steps: 10,
            seed: Some(1),
            open_viewer: true,
            ..Default::default()
        };

        let mut events = Vec::new();
        Pipeline::new(config)
            .unwrap()
            .with_viewer(|path| {
                Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no viewer for {}", path.display()),
                ))
            })
            .run(|e| events.push(e))
            .unwrap();

        assert_eq!(
            events.last(),
            Some(&PipelineEvent::StageFinished(Stage::Display))
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Display.to_string(), "display");
    }
}
