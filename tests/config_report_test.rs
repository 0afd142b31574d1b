use planar_target_localization::config::{LocalizerConfig, MIN_CORRESPONDENCES};
use planar_target_localization::io::{
    object_from_json, object_to_json, write_detailed_report, write_report, FrameReport,
};

#[test]
fn test_config_defaults() {
    let config = LocalizerConfig::default();
    assert_eq!(config.detector.threshold, 20);
    assert_eq!(config.detector.max_features, 500);
    assert_eq!(config.matcher.distance_multiple, 3.0);
    assert_eq!(config.ransac.max_iters, 1000);
    assert_eq!(config.ransac.inlier_threshold, 3.0);
    assert_eq!(MIN_CORRESPONDENCES, 4);
}

#[test]
fn test_config_json_round_trip() {
    let mut config = LocalizerConfig::default();
    config.detector.threshold = 35;
    config.matcher.distance_multiple = 2.5;
    config.ransac.seed = 99;

    let path = std::env::temp_dir().join("ptl_config_round_trip.json");
    let path = path.to_str().unwrap();
    object_to_json(path, &config);
    let loaded: LocalizerConfig = object_from_json(path);

    assert_eq!(loaded.detector.threshold, 35);
    assert_eq!(loaded.matcher.distance_multiple, 2.5);
    assert_eq!(loaded.ransac.seed, 99);
    assert_eq!(loaded.ransac.max_iters, config.ransac.max_iters);
}

#[test]
fn test_partial_config_falls_back_to_defaults() {
    let path = std::env::temp_dir().join("ptl_config_partial.json");
    std::fs::write(&path, r#"{"matcher": {"distance_multiple": 4.0}}"#).unwrap();
    let loaded: LocalizerConfig = object_from_json(path.to_str().unwrap());

    assert_eq!(loaded.matcher.distance_multiple, 4.0);
    assert_eq!(loaded.detector.threshold, 20);
    assert_eq!(loaded.ransac.max_iters, 1000);
}

fn sample_reports() -> Vec<FrameReport> {
    vec![
        FrameReport {
            index: 0,
            time_ns: 0,
            located: true,
            skip_reason: None,
            n_keypoints: 120,
            n_matches: 80,
            n_good_matches: 30,
            n_inliers: 25,
            corners: Some([[10.0, 10.0], [110.0, 10.0], [110.0, 90.0], [10.0, 90.0]]),
        },
        FrameReport {
            index: 1,
            time_ns: 100000000,
            located: false,
            skip_reason: Some("no keypoints in frame".to_string()),
            n_keypoints: 0,
            n_matches: 0,
            n_good_matches: 0,
            n_inliers: 0,
            corners: None,
        },
    ]
}

#[test]
fn test_detailed_report_contents() {
    let path = std::env::temp_dir().join("ptl_report.json");
    let path = path.to_str().unwrap();
    write_detailed_report(path, "reference.png", sample_reports()).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(report["frames_total"], 2);
    assert_eq!(report["frames_located"], 1);
    assert_eq!(report["reference"], "reference.png");
    assert!((report["localization_rate"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    assert!((report["mean_inliers"].as_f64().unwrap() - 25.0).abs() < 1e-9);
    assert_eq!(report["frames"][1]["skip_reason"], "no keypoints in frame");
    assert!(report["frames"][1]["corners"].is_null());
}

#[test]
fn test_text_summary() {
    let path = std::env::temp_dir().join("ptl_summary.txt");
    let path = path.to_str().unwrap();
    write_report(path, &sample_reports());

    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("Frames processed: 2"));
    assert!(text.contains("Frames localized: 1"));
    assert!(text.contains("no keypoints in frame"));
}
