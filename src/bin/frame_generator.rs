use std::path::Path;

use clap::{Parser, Subcommand};
use image::{ImageReader, Rgb, RgbImage};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic frame sequence with ground-truth corners
    Generate {
        /// Reference image to embed in each frame
        reference: String,

        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Number of frames to generate
        #[arg(short, long, default_value = "20")]
        num_frames: usize,

        /// Frame width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "480")]
        height: u32,

        /// Minimum reference scale inside the frame
        #[arg(long, default_value = "1.0")]
        min_scale: f32,

        /// Maximum reference scale inside the frame
        #[arg(long, default_value = "1.0")]
        max_scale: f32,

        /// RNG seed for placement
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

#[derive(serde::Serialize)]
struct GroundTruthFrame {
    frame: usize,
    scale: f32,
    /// Embedded reference corners: top-left, top-right, bottom-right,
    /// bottom-left, in frame pixels.
    corners: [[f32; 2]; 4],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            reference,
            output,
            num_frames,
            width,
            height,
            min_scale,
            max_scale,
            seed,
        } => {
            generate_frames(
                &reference, &output, num_frames, width, height, min_scale, max_scale, seed,
            )?;
        }
    }

    Ok(())
}

fn generate_frames(
    reference_path: &str,
    output_dir: &str,
    num_frames: usize,
    width: u32,
    height: u32,
    min_scale: f32,
    max_scale: f32,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;

    let reference = ImageReader::open(reference_path)?.decode()?.to_rgb8();
    fs::create_dir_all(output_dir)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ground_truth = Vec::new();

    for frame_idx in 0..num_frames {
        let scale = if max_scale > min_scale {
            rng.random_range(min_scale..max_scale)
        } else {
            min_scale
        };
        let sw = ((reference.width() as f32 * scale) as u32).clamp(1, width);
        let sh = ((reference.height() as f32 * scale) as u32).clamp(1, height);
        let scaled = image::imageops::resize(
            &reference,
            sw,
            sh,
            image::imageops::FilterType::Triangle,
        );

        let dx = rng.random_range(0..(width - sw).max(1));
        let dy = rng.random_range(0..(height - sh).max(1));

        let mut canvas = RgbImage::from_pixel(width, height, Rgb([20, 20, 20]));
        image::imageops::replace(&mut canvas, &scaled, dx as i64, dy as i64);

        let filename = format!("{:06}.png", frame_idx);
        canvas.save(Path::new(output_dir).join(filename))?;

        let (x0, y0) = (dx as f32, dy as f32);
        let (x1, y1) = ((dx + sw) as f32, (dy + sh) as f32);
        ground_truth.push(GroundTruthFrame {
            frame: frame_idx,
            scale,
            corners: [[x0, y0], [x1, y0], [x1, y1], [x0, y1]],
        });
    }

    fs::write(
        Path::new(output_dir).join("ground_truth.json"),
        serde_json::to_string_pretty(&ground_truth)?,
    )?;

    println!("Generated {} frames in {}", num_frames, output_dir);
    Ok(())
}
