use std::path::Path;
use std::time::Instant;

use clap::Parser;
use image::{DynamicImage, ImageReader};
use planar_target_localization::config::LocalizerConfig;
use planar_target_localization::data_loader::load_frames;
use planar_target_localization::io::{self, FrameReport};
use planar_target_localization::pipeline::Localizer;
use planar_target_localization::visualization::*;

#[derive(Parser)]
#[command(version, about, author)]
struct PtlCli {
    /// path to the reference image to locate
    reference: String,

    /// path to the frame folder
    frames: String,

    /// localizer config JSON (defaults apply when omitted)
    #[arg(long)]
    config: Option<String>,

    /// detector sensitivity threshold override
    #[arg(long)]
    threshold: Option<u8>,

    /// good-match distance multiple override
    #[arg(long)]
    distance_multiple: Option<f32>,

    /// RANSAC inlier tolerance override, in pixels
    #[arg(long)]
    inlier_threshold: Option<f64>,

    /// RANSAC seed override
    #[arg(long)]
    seed: Option<u64>,

    /// mirror frames horizontally before localization
    #[arg(long)]
    flip: bool,

    /// starting frame index
    #[arg(long, default_value = "0")]
    start_idx: usize,

    /// frame sampling step
    #[arg(long, default_value = "1")]
    step: usize,

    /// folder for annotated output frames
    #[arg(long)]
    output_dir: Option<String>,

    /// detailed JSON report output path
    #[arg(long, default_value = "localization_report.json")]
    report: String,

    /// text summary output path
    #[arg(long, default_value = "localization_summary.txt")]
    summary: String,

    /// save a rerun recording to this .rrd file
    #[arg(long)]
    rrd: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = PtlCli::parse();

    let mut config: LocalizerConfig = match &cli.config {
        Some(path) => io::object_from_json(path),
        None => LocalizerConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.detector.threshold = threshold;
    }
    if let Some(distance_multiple) = cli.distance_multiple {
        config.matcher.distance_multiple = distance_multiple;
    }
    if let Some(inlier_threshold) = cli.inlier_threshold {
        config.ransac.inlier_threshold = inlier_threshold;
    }
    if let Some(seed) = cli.seed {
        config.ransac.seed = seed;
    }

    let reference = ImageReader::open(&cli.reference)?.decode()?.to_rgb8();
    let localizer = Localizer::new(config, reference)?;

    let recording = match &cli.rrd {
        Some(path) => Some(rerun::RecordingStreamBuilder::new("localization").save(path)?),
        None => None,
    };
    if let Some(dir) = &cli.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let frames = load_frames(&cli.frames, cli.start_idx, cli.step);
    if frames.is_empty() {
        return Err(format!("no frames found under {}", cli.frames).into());
    }

    let now = Instant::now();
    let mut reports = Vec::new();
    for frame in &frames {
        let image = if cli.flip {
            image::imageops::flip_horizontal(&frame.image)
        } else {
            frame.image.clone()
        };
        let result = localizer.localize(&image);

        if let Some(recording) = &recording {
            recording.set_time(
                "stable",
                rerun::TimeCell::from_timestamp_nanos_since_epoch(frame.time_ns),
            );
            log_image_as_compressed(
                recording,
                "/cam0",
                &DynamicImage::ImageRgb8(image.clone()),
                image::ImageFormat::Png,
            );
            log_frame_result(recording, "/cam0", frame.time_ns, &result);
        }
        if let Some(dir) = &cli.output_dir {
            result
                .annotated
                .save(Path::new(dir).join(format!("{:06}.png", frame.index)))?;
        }
        reports.push(FrameReport::from_result(frame.index, frame.time_ns, &result));
    }
    let duration_sec = now.elapsed().as_secs_f64();
    println!("localizing took {:.6} sec", duration_sec);
    println!("avg: {} sec", duration_sec / frames.len() as f64);

    let located = reports.iter().filter(|r| r.located).count();
    println!("localized {}/{} frames", located, reports.len());

    io::write_report(&cli.summary, &reports);
    io::write_detailed_report(&cli.report, &cli.reference, reports)?;
    Ok(())
}
