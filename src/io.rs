use std::io::Write;

use glam::Vec2;
use serde::{de::DeserializeOwned, Serialize};

use crate::pipeline::{FrameResult, LocalizeOutcome};

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &str, object: &T) {
    let j = serde_json::to_string_pretty(object).unwrap();
    let mut file = std::fs::File::create(output_path).unwrap();
    file.write_all(j.as_bytes()).unwrap();
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &str) -> T {
    let contents =
        std::fs::read_to_string(file_path).expect("Should have been able to read the file");
    serde_json::from_str(&contents).unwrap()
}

/// Per-frame entry of the detailed localization report.
#[derive(serde::Serialize)]
pub struct FrameReport {
    pub index: usize,
    pub time_ns: i64,
    pub located: bool,
    pub skip_reason: Option<String>,
    pub n_keypoints: usize,
    pub n_matches: usize,
    pub n_good_matches: usize,
    pub n_inliers: usize,
    pub corners: Option<[[f32; 2]; 4]>,
}

impl FrameReport {
    pub fn from_result(index: usize, time_ns: i64, result: &FrameResult) -> FrameReport {
        let (located, skip_reason, corners) = match &result.outcome {
            LocalizeOutcome::Located { corners, .. } => {
                (true, None, Some(corners.map(|c: Vec2| [c.x, c.y])))
            }
            LocalizeOutcome::Skipped(reason) => (false, Some(reason.to_string()), None),
        };
        FrameReport {
            index,
            time_ns,
            located,
            skip_reason,
            n_keypoints: result.stats.n_keypoints,
            n_matches: result.stats.n_matches,
            n_good_matches: result.stats.n_good_matches,
            n_inliers: result.stats.n_inliers,
            corners,
        }
    }
}

#[derive(serde::Serialize)]
struct LocalizationReport {
    timestamp: String,
    reference: String,
    frames_total: usize,
    frames_located: usize,
    localization_rate: f64,
    mean_good_matches: f64,
    mean_inliers: f64,
    frames: Vec<FrameReport>,
}

/// Writes the detailed per-frame report as JSON.
pub fn write_detailed_report(
    output_path: &str,
    reference: &str,
    frames: Vec<FrameReport>,
) -> std::io::Result<()> {
    use std::time::SystemTime;

    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let frames_total = frames.len();
    let frames_located = frames.iter().filter(|f| f.located).count();
    let located_f = frames.iter().filter(|f| f.located);
    let mean_good_matches = mean(located_f.clone().map(|f| f.n_good_matches as f64));
    let mean_inliers = mean(located_f.map(|f| f.n_inliers as f64));

    let report = LocalizationReport {
        timestamp: timestamp.to_string(),
        reference: reference.to_string(),
        frames_total,
        frames_located,
        localization_rate: if frames_total > 0 {
            frames_located as f64 / frames_total as f64
        } else {
            0.0
        },
        mean_good_matches,
        mean_inliers,
        frames,
    };

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// Writes a short text summary of a localization run.
pub fn write_report(output_path: &str, frames: &[FrameReport]) {
    let frames_total = frames.len();
    let frames_located = frames.iter().filter(|f| f.located).count();
    let mean_inliers = mean(frames.iter().filter(|f| f.located).map(|f| f.n_inliers as f64));

    let mut s = String::new();
    s += format!("Frames processed: {}\n", frames_total).as_str();
    s += format!("Frames localized: {}\n", frames_located).as_str();
    s += format!(
        "    mean inliers per localized frame: {:.2}\n\n",
        mean_inliers
    )
    .as_str();
    for f in frames.iter().filter(|f| !f.located) {
        s += format!(
            "frame {:06}: skipped ({})\n",
            f.index,
            f.skip_reason.as_deref().unwrap_or("unknown")
        )
        .as_str();
    }
    let mut file = std::fs::File::create(output_path).unwrap();
    file.write_all(s.as_bytes()).unwrap();
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n > 0 { sum / n as f64 } else { 0.0 }
}
