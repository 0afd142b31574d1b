use serde::{Deserialize, Serialize};

/// Minimum number of correspondences a homography needs. Four point pairs
/// pin down the eight degrees of freedom.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Detector settings. `threshold` is the sensitivity knob: a circle pixel
/// must differ from the center by more than this to count toward the
/// segment test, so a higher threshold retains fewer keypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub threshold: u8,
    pub max_features: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            max_features: 500,
        }
    }
}

/// Match filter settings. A match survives only if its distance is below
/// `distance_multiple` times the smallest distance in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub distance_multiple: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            distance_multiple: 3.0,
        }
    }
}

/// RANSAC settings for homography fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    pub max_iters: usize,
    /// Reprojection distance in pixels below which a correspondence counts
    /// as an inlier.
    pub inlier_threshold: f64,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            inlier_threshold: 3.0,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
    pub detector: DetectorConfig,
    pub matcher: MatcherConfig,
    pub ransac: RansacConfig,
}
