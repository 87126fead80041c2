use clap::Parser;
use coco_test_dev::image_utils::image_conversion::to_preview_image;
use coco_test_dev::{CocoTestDevDataset, DatasetConfig, Split};
use log::info;
use ndarray::Axis;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coco-test-dev")]
#[command(about = "Load the COCO test-dev2017 split and iterate over it in batches")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset root holding images/ and annotations/
    #[arg(long)]
    root: Option<PathBuf>,

    /// Split name (only test2017 is available)
    #[arg(long)]
    split: Option<Split>,

    /// Square side length images are resized to
    #[arg(long)]
    resize: Option<u32>,

    /// Skip the download step even if the data is missing
    #[arg(long)]
    no_download: bool,

    /// Keep the .zip archives after extracting them
    #[arg(long)]
    keep_archives: bool,

    #[arg(long, default_value_t = 1)]
    batch_size: usize,

    /// Stop after this many samples
    #[arg(long)]
    limit: Option<usize>,

    /// Write the first sample, de-normalized, to this image file
    #[arg(long)]
    save_preview: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DatasetConfig::from_json_file(path)?,
        None => DatasetConfig::default(),
    };
    if let Some(root) = cli.root {
        config.root = root;
    }
    if let Some(split) = cli.split {
        config.split = split;
    }
    if let Some(resize) = cli.resize {
        config.resize = resize;
    }
    if cli.no_download {
        config.download = false;
    }
    if cli.keep_archives {
        config.remove_compressed_files = false;
    }

    let dataset = CocoTestDevDataset::new(config)?;
    let limit = cli.limit.unwrap_or(dataset.len());
    let mut seen = 0;
    for (i, batch) in dataset.batches(cli.batch_size).limit(limit).enumerate() {
        let batch = batch?;
        if i == 0 {
            if let Some(path) = &cli.save_preview {
                to_preview_image(batch.images.index_axis(Axis(0), 0)).save(path)?;
                info!("Wrote preview to {}", path.display());
            }
        }
        let counts: Vec<usize> = batch.boxes.iter().map(|b| b.nrows()).collect();
        info!(
            "batch {}: images {:?}, boxes per image {:?}",
            i,
            batch.images.shape(),
            counts
        );
        seen += batch.len();
    }
    info!("Iterated {} of {} samples", seen, dataset.len());
    Ok(())
}
