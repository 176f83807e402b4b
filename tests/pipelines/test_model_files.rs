// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Local model file resolution and config.json parsing

use std::fs;
use text_analysis_api::pipelines::{HfModelConfig, ModelSource, OnnxTextClassifier};

#[test]
fn test_resolve_prefers_root_then_onnx_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("onnx")).unwrap();
    fs::write(dir.path().join("onnx/model.onnx"), b"graph").unwrap();
    fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();

    let source = ModelSource::local(dir.path());

    assert_eq!(
        source.resolve("model.onnx").unwrap(),
        dir.path().join("onnx/model.onnx")
    );
    assert_eq!(
        source.resolve("tokenizer.json").unwrap(),
        dir.path().join("tokenizer.json")
    );

    fs::write(dir.path().join("model.onnx"), b"graph").unwrap();
    assert_eq!(
        source.resolve("model.onnx").unwrap(),
        dir.path().join("model.onnx")
    );
}

#[test]
fn test_tokenizer_is_not_searched_in_onnx_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("onnx")).unwrap();
    fs::write(dir.path().join("onnx/tokenizer.json"), b"{}").unwrap();

    let err = ModelSource::local(dir.path())
        .resolve("tokenizer.json")
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_missing_file_without_download() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = ModelSource::local(dir.path()).with_hub_repo("Xenova/gpt2");
    source.allow_download = false;

    let err = source.resolve("config.json").unwrap_err();
    assert!(err.to_string().contains("config.json"));
}

#[test]
fn test_config_labels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "architectures": ["DistilBertForSequenceClassification"],
            "model_type": "distilbert",
            "id2label": {"0": "NEGATIVE", "1": "POSITIVE"},
            "vocab_size": 30522
        }"#,
    )
    .unwrap();

    let config = HfModelConfig::from_file(&path).unwrap();

    assert_eq!(config.label_for(0), "NEGATIVE");
    assert_eq!(config.label_for(1), "POSITIVE");
    assert_eq!(config.label_for(2), "LABEL_2");
    assert!(!config.is_multi_label());
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "not json").unwrap();

    let err = HfModelConfig::from_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse model config"));
}

#[test]
fn test_classifier_load_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let err = OnnxTextClassifier::load("sst2", &ModelSource::local(dir.path()), 1).unwrap_err();
    assert!(err.to_string().contains("model.onnx"));
}
