use glam;

/// Number of bytes in a binary descriptor (256 comparison bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// A detected corner with its response strength and patch orientation.
#[derive(Debug, Clone, Copy)]
pub struct KeyPoint {
    pub p2d: glam::Vec2,
    /// Corner response, higher is stronger.
    pub response: f32,
    /// Patch orientation in radians, from the intensity centroid.
    pub angle: f32,
}

impl KeyPoint {
    pub fn new(x: f32, y: f32) -> KeyPoint {
        KeyPoint {
            p2d: glam::Vec2::new(x, y),
            response: 0.0,
            angle: 0.0,
        }
    }
}

/// 256-bit binary appearance descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor(pub [u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    pub fn hamming_distance(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Keypoints and descriptors detected in one image.
///
/// The two sequences are parallel: `descriptors[i]` describes
/// `keypoints[i]`, and their lengths are always equal.
#[derive(Debug, Clone, Default)]
pub struct ImageFeatures {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Vec<Descriptor>,
}

impl ImageFeatures {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// A correspondence between a query descriptor and its nearest target
/// descriptor. Indices point into the respective keypoint sequences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptorMatch {
    pub query_idx: usize,
    pub target_idx: usize,
    pub distance: f32,
}

impl DescriptorMatch {
    pub fn new(query_idx: usize, target_idx: usize, distance: f32) -> DescriptorMatch {
        DescriptorMatch {
            query_idx,
            target_idx,
            distance,
        }
    }
}
