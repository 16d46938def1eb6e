use std::fs;

use dibdump::{Bitmap, PixelEncoding, Rgb};
use orchestrator::{
    OrchestratorError, Pipeline, PipelineEvent, Stage, cases,
    configs::{NetworkConfig, PipelineConfig},
};

fn gradient(width: u32, height: u32) -> Bitmap {
    let n = width * height;
    let pixels = (0..n).map(|i| Rgb::gray((i * 255 / (n - 1)) as u8)).collect();

    Bitmap::new(width, height, pixels).unwrap()
}

fn config(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        image: Some(dir.join("dadA.bmp")),
        work_dir: dir.join("bmp"),
        hidden_layers: vec![4],
        max_steps: 200,
        seed: Some(42),
        open_viewer: false,
        ..Default::default()
    }
}

#[test]
fn stages_run_in_order_and_leave_their_files() {
    let dir = tempfile::tempdir().unwrap();
    gradient(3, 2).save(dir.path().join("dadA.bmp")).unwrap();

    let config = config(dir.path());
    let mut events = Vec::new();
    let report = Pipeline::new(config.clone())
        .unwrap()
        .run(|e| events.push(e))
        .unwrap();

    let expected: Vec<_> = [Stage::Encode, Stage::Train, Stage::Decode, Stage::Display]
        .into_iter()
        .flat_map(|s| [PipelineEvent::StageStarted(s), PipelineEvent::StageFinished(s)])
        .collect();
    assert_eq!(events, expected);
    assert!(report.steps > 0);

    let work = dir.path().join("bmp");
    let activations = cases::read_cases(work.join("bmpTrialCases.txt")).unwrap();
    let truths = cases::read_cases(work.join("bmpTruths.txt")).unwrap();
    assert_eq!(activations.len(), 1);
    assert_eq!(activations[0].len(), 6);
    assert_eq!(activations, truths);

    let network = NetworkConfig::load(work.join("bmpInputsFile.txt")).unwrap();
    assert_eq!((network.inputs, network.outputs), (6, 6));
    assert_eq!(network.hidden, vec![4]);
    assert_eq!(network.max_steps, 200);

    let outputs = cases::read_cases(work.join("bmpFinalOuts.txt")).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].len(), 6);

    let reproduced = Bitmap::open(work.join("out.bmp")).unwrap();
    assert_eq!((reproduced.width(), reproduced.height()), (3, 2));
}

#[test]
fn rgb_pipelines_train_three_activations_per_pixel() {
    let dir = tempfile::tempdir().unwrap();
    gradient(2, 2).save(dir.path().join("dadA.bmp")).unwrap();

    let config = PipelineConfig {
        encoding: PixelEncoding::Rgb,
        weights: Some("weights.json".into()),
        ..config(dir.path())
    };
    Pipeline::new(config).unwrap().run(|_| {}).unwrap();

    let work = dir.path().join("bmp");
    let network = NetworkConfig::load(work.join("bmpInputsFile.txt")).unwrap();
    assert_eq!(network.inputs, 12);
    assert!(work.join("weights.json").exists());
    assert!(work.join("out.bmp").exists());
}

#[test]
fn a_failing_stage_stops_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    gradient(2, 2).save(dir.path().join("dadA.bmp")).unwrap();

    let config = PipelineConfig {
        lambda: -1.,
        ..config(dir.path())
    };

    let mut events = Vec::new();
    let err = Pipeline::new(config)
        .unwrap()
        .run(|e| events.push(e))
        .unwrap_err();

    assert!(
        matches!(
            err,
            OrchestratorError::Stage {
                stage: Stage::Train,
                ..
            }
        ),
        "{err}"
    );
    assert_eq!(
        events.last(),
        Some(&PipelineEvent::StageStarted(Stage::Train))
    );
    assert!(!dir.path().join("bmp").join("out.bmp").exists());
}

#[test]
fn configs_load_from_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    fs::write(&path, r#"{ "image": "dadA.bmp", "hidden_layers": [5, 3], "open_viewer": false }"#)
        .unwrap();

    let config = PipelineConfig::load(&path).unwrap();
    assert_eq!(config.hidden_layers, vec![5, 3]);
    assert!(!config.open_viewer);

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        PipelineConfig::load(&path),
        Err(OrchestratorError::Json(_))
    ));
}
