use glam::Vec2;
use image::RgbImage;
use nalgebra as na;

use crate::config::LocalizerConfig;
use crate::detector::FeatureDetector;
use crate::features::ImageFeatures;
use crate::homography::{estimate_homography, project_corners, EstimationError};
use crate::matching::{filter_matches, match_descriptors};
use crate::overlay;

/// Startup failure while preparing the reference target. Fatal: frame
/// processing must not begin without a usable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceError {
    EmptyImage,
    /// The reference has no detectable structure, so no frame could ever
    /// be matched against it.
    NoStructure,
}

impl std::fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceError::EmptyImage => write!(f, "reference image is empty"),
            ReferenceError::NoStructure => {
                write!(f, "no keypoints detected in the reference image")
            }
        }
    }
}

impl std::error::Error for ReferenceError {}

/// Why a frame was emitted without an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoKeypoints,
    NotEnoughCorrespondences,
    DegenerateGeometry,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoKeypoints => write!(f, "no keypoints in frame"),
            SkipReason::NotEnoughCorrespondences => write!(f, "not enough correspondences"),
            SkipReason::DegenerateGeometry => write!(f, "degenerate correspondence geometry"),
        }
    }
}

/// The reference image with its one-time-computed features and corner
/// quad. Immutable once built; shared read-only by every frame.
pub struct ReferenceTarget {
    pub image: RgbImage,
    pub features: ImageFeatures,
    /// Reference boundary in fixed order: top-left, top-right,
    /// bottom-right, bottom-left.
    pub corners: [Vec2; 4],
}

impl ReferenceTarget {
    pub fn from_image(
        image: RgbImage,
        detector: &FeatureDetector,
    ) -> Result<ReferenceTarget, ReferenceError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ReferenceError::EmptyImage);
        }
        let gray = image::imageops::grayscale(&image);
        let features = detector.detect_and_describe(&gray);
        if features.is_empty() {
            return Err(ReferenceError::NoStructure);
        }
        let w = image.width() as f32;
        let h = image.height() as f32;
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(w, 0.0),
            Vec2::new(w, h),
            Vec2::new(0.0, h),
        ];
        Ok(ReferenceTarget {
            image,
            features,
            corners,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub n_keypoints: usize,
    pub n_matches: usize,
    pub n_good_matches: usize,
    pub n_inliers: usize,
}

#[derive(Debug, Clone)]
pub enum LocalizeOutcome {
    Located {
        /// Projected reference corners in stream coordinates.
        corners: [Vec2; 4],
        homography: na::Matrix3<f64>,
    },
    Skipped(SkipReason),
}

/// Everything one frame produced. All of it is per-frame data; nothing
/// here feeds back into the next frame.
pub struct FrameResult {
    pub outcome: LocalizeOutcome,
    /// The match composite with the quad overlay when located, otherwise
    /// the input frame unchanged.
    pub annotated: RgbImage,
    pub stats: FrameStats,
    /// Stream-side keypoint positions, for visualization.
    pub frame_keypoints: Vec<Vec2>,
    /// Good-match endpoints (reference px, stream px), for visualization.
    pub match_segments: Vec<(Vec2, Vec2)>,
}

impl FrameResult {
    pub fn is_located(&self) -> bool {
        matches!(self.outcome, LocalizeOutcome::Located { .. })
    }
}

/// Per-frame localization pipeline over a fixed reference target.
///
/// Holds only read-only state (config, detector pattern, reference
/// features); `localize` is pure per frame and reseeds its RANSAC RNG
/// from the config each call, so identical frames give identical results.
pub struct Localizer {
    config: LocalizerConfig,
    detector: FeatureDetector,
    target: ReferenceTarget,
}

impl Localizer {
    pub fn new(config: LocalizerConfig, reference: RgbImage) -> Result<Localizer, ReferenceError> {
        let detector = FeatureDetector::new(&config.detector);
        let target = ReferenceTarget::from_image(reference, &detector)?;
        log::info!(
            "reference target ready: {} keypoints, {}x{} px",
            target.features.len(),
            target.image.width(),
            target.image.height()
        );
        Ok(Localizer {
            config,
            detector,
            target,
        })
    }

    pub fn target(&self) -> &ReferenceTarget {
        &self.target
    }

    /// Runs extract, match, filter, estimate, project, render on one
    /// frame. Any per-frame failure short-circuits to the unmodified
    /// frame with a [`SkipReason`]; nothing aborts the caller's loop.
    pub fn localize(&self, frame: &RgbImage) -> FrameResult {
        let gray = image::imageops::grayscale(frame);
        let frame_features = self.detector.detect_and_describe(&gray);
        let mut stats = FrameStats {
            n_keypoints: frame_features.len(),
            ..Default::default()
        };
        let frame_keypoints: Vec<Vec2> = frame_features.keypoints.iter().map(|k| k.p2d).collect();
        log::trace!("extract: {} frame keypoints", stats.n_keypoints);

        if frame_features.is_empty() {
            return self.skipped(frame, SkipReason::NoKeypoints, stats, frame_keypoints);
        }

        let matches = match_descriptors(
            &self.target.features.descriptors,
            &frame_features.descriptors,
        );
        stats.n_matches = matches.len();
        log::trace!("match: {} candidates", stats.n_matches);

        let good = filter_matches(&matches, self.config.matcher.distance_multiple);
        stats.n_good_matches = good.len();
        log::trace!("filter: {} good matches", stats.n_good_matches);

        let pairs: Vec<(Vec2, Vec2)> = good
            .iter()
            .map(|m| {
                (
                    self.target.features.keypoints[m.query_idx].p2d,
                    frame_features.keypoints[m.target_idx].p2d,
                )
            })
            .collect();

        let estimate = match estimate_homography(&pairs, &self.config.ransac) {
            Ok(estimate) => estimate,
            Err(err) => {
                log::debug!("estimation failed: {err}");
                let reason = match err {
                    EstimationError::NotEnoughCorrespondences { .. } => {
                        SkipReason::NotEnoughCorrespondences
                    }
                    EstimationError::DegenerateGeometry => SkipReason::DegenerateGeometry,
                };
                let mut result = self.skipped(frame, reason, stats, frame_keypoints);
                result.match_segments = pairs;
                return result;
            }
        };
        stats.n_inliers = estimate.n_inliers;

        let Some(corners) = project_corners(&estimate.h, &self.target.corners) else {
            log::debug!("corner projection hit the plane at infinity");
            let mut result =
                self.skipped(frame, SkipReason::DegenerateGeometry, stats, frame_keypoints);
            result.match_segments = pairs;
            return result;
        };

        let composite = overlay::draw_matches(
            &self.target.image,
            frame,
            &self.target.features.keypoints,
            &frame_features.keypoints,
            &good,
        );
        let annotated = overlay::draw_quad(&composite, &corners, self.target.image.width() as f32);

        FrameResult {
            outcome: LocalizeOutcome::Located {
                corners,
                homography: estimate.h,
            },
            annotated,
            stats,
            frame_keypoints,
            match_segments: pairs,
        }
    }

    fn skipped(
        &self,
        frame: &RgbImage,
        reason: SkipReason,
        stats: FrameStats,
        frame_keypoints: Vec<Vec2>,
    ) -> FrameResult {
        FrameResult {
            outcome: LocalizeOutcome::Skipped(reason),
            annotated: frame.clone(),
            stats,
            frame_keypoints,
            match_segments: Vec::new(),
        }
    }
}
