use std::{error::Error, path::PathBuf, str::FromStr};

use clap::Parser;
use egopose_pipeline::{run_pipeline, AnnoType, PipelineConfig, Split, Step};

/// Ground-truth preparation pipeline for ego-camera hand-pose data.
#[derive(Debug, Parser)]
#[command(author, version, about = "Ego-camera hand-pose ground-truth preparation pipeline")]
struct Args {
    /// Root directory of the capture dataset (contains takes.json).
    #[arg(long)]
    data_dir: PathBuf,

    /// Output directory for all ground-truth artifacts.
    #[arg(long)]
    gt_output_dir: PathBuf,

    /// Pipeline steps to run, in order: aria_calib, gt_anno, raw_image,
    /// undistorted_image.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "aria_calib,gt_anno,raw_image,undistorted_image"
    )]
    steps: Vec<String>,

    /// Splits to process.
    #[arg(long, value_delimiter = ',', default_value = "train,val,test")]
    splits: Vec<String>,

    /// Annotation types to process.
    #[arg(long, value_delimiter = ',', default_value = "manual")]
    anno_types: Vec<String>,

    /// Keep the sensor's portrait orientation instead of rotating to
    /// landscape.
    #[arg(long)]
    portrait_view: bool,
}

fn parse_list<T: FromStr<Err = String>>(values: &[String]) -> Result<Vec<T>, Box<dyn Error>> {
    values
        .iter()
        .map(|v| v.parse::<T>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

fn config_from_args(args: &Args) -> Result<PipelineConfig, Box<dyn Error>> {
    Ok(PipelineConfig {
        data_dir: args.data_dir.clone(),
        gt_output_dir: args.gt_output_dir.clone(),
        steps: parse_list::<Step>(&args.steps)?,
        splits: parse_list::<Split>(&args.splits)?,
        anno_types: parse_list::<AnnoType>(&args.anno_types)?,
        portrait_view: args.portrait_view,
    })
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = config_from_args(&args)?;
    run_pipeline(&config)?;
    Ok(())
}
