use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use dibdump::PixelEncoding;
use serde::{Deserialize, Serialize};

use super::NetworkConfig;
use crate::{OrchestratorError, Result};

/// The settings of a full encode, train, decode and display run.
///
/// Every file but `image` lives in `work_dir` unless given as an absolute path. Missing fields
/// take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// The bitmap the perceptron learns to reproduce.
    pub image: Option<PathBuf>,
    pub work_dir: PathBuf,
    pub activations: PathBuf,
    pub truths: PathBuf,
    pub network: PathBuf,
    pub outputs: PathBuf,
    pub out_image: PathBuf,
    /// Where to save the trained weights, if anywhere.
    pub weights: Option<PathBuf>,
    pub encoding: PixelEncoding,
    pub hidden_layers: Vec<usize>,
    pub lambda: f32,
    pub min_error: f32,
    pub max_steps: usize,
    pub low: f32,
    pub high: f32,
    pub seed: Option<u64>,
    /// Whether to open the original and the reproduced image once done.
    pub open_viewer: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image: None,
            work_dir: PathBuf::from("bmp"),
            activations: PathBuf::from("bmpTrialCases.txt"),
            truths: PathBuf::from("bmpTruths.txt"),
            network: PathBuf::from("bmpInputsFile.txt"),
            outputs: PathBuf::from("bmpFinalOuts.txt"),
            out_image: PathBuf::from("out.bmp"),
            weights: None,
            encoding: PixelEncoding::Gray,
            hidden_layers: vec![8],
            lambda: 1.0,
            min_error: 0.01,
            max_steps: 10_000,
            low: -1.0,
            high: 1.0,
            seed: None,
            open_viewer: true,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON pipeline config.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(OrchestratorError::io(path))?;

        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Resolves a file name against the working directory.
    pub fn in_work_dir<P: AsRef<Path>>(&self, file: P) -> PathBuf {
        self.work_dir.join(file)
    }

    /// The network file describing an autoencoder of `activations` nodes trained on one case.
    pub fn network_config(&self, activations: usize) -> NetworkConfig {
        NetworkConfig {
            inputs: activations,
            hidden: self.hidden_layers.clone(),
            outputs: activations,
            num_cases: 1,
            lambda: self.lambda,
            min_error: self.min_error,
            max_steps: self.max_steps,
            low: self.low,
            high: self.high,
            cases: Vec::new(),
        }
    }
}
