use std::path::{Path, PathBuf};

use glob::glob;
use image::{ImageReader, RgbImage};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

/// One decoded frame from the frame directory.
pub struct LoadedFrame {
    pub index: usize,
    pub time_ns: i64,
    pub path: PathBuf,
    pub image: RgbImage,
}

/// Parses the timestamp from a file path.
///
/// Assumes the filename (without extension) is a timestamp in
/// nanoseconds; falls back to an index-derived time otherwise.
fn path_to_timestamp(path: &Path, index: usize) -> i64 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or(index as i64 * 100000000)
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg"] {
            if p.as_os_str().to_string_lossy().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Loads a directory of frames standing in for the external video source.
///
/// Frames are matched by extension, sorted by path, sampled with
/// `start_idx`/`step`, and decoded in parallel with a progress bar. The
/// returned frames are ordered by their position in the sequence.
pub fn load_frames(root_folder: &str, start_idx: usize, step: usize) -> Vec<LoadedFrame> {
    log::trace!("loading frames from {root_folder}");
    let img_paths = glob(format!("{}/*", root_folder).as_str()).expect("failed");
    let mut sorted_path: Vec<PathBuf> = img_paths.into_iter().filter_map(img_filter).collect();
    sorted_path.sort();

    let new_paths: Vec<_> = sorted_path
        .iter()
        .skip(start_idx)
        .step_by(step.max(1))
        .enumerate()
        .collect();
    new_paths
        .par_iter()
        .progress_count(new_paths.len() as u64)
        .map(|(index, path)| {
            let image = ImageReader::open(path)
                .unwrap()
                .decode()
                .unwrap()
                .to_rgb8();
            LoadedFrame {
                index: *index,
                time_ns: path_to_timestamp(path, *index),
                path: (*path).clone(),
                image,
            }
        })
        .collect()
}
