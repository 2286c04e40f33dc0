//! Build the dataset from sorted folders and train a filename classifier.

use std::path::PathBuf;

use filesorter::config::{self, SorterConfig};
use filesorter::dataset::LabelMode;
use filesorter::logging::{self, Console};
use filesorter::ml::Strategy;
use filesorter::pipeline::{BuildRequest, ModelBuilder, TrainOutcome, UnsortedSource};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init(Console::Stdout) {
        eprintln!("Logging disabled: {err}");
    }

    let mut settings = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    apply_overrides(&mut settings, &options);
    let settings = settings.normalized();

    let request = BuildRequest {
        sorted_dirs: options.sorted.clone(),
        unsorted: options.unsorted.clone().map(UnsortedSource::Directory),
    };
    let report = ModelBuilder::new(settings)
        .build(&request)
        .map_err(|err| format!("[{}] {err}", err.kind()))?;

    match &report.outcome {
        TrainOutcome::Skipped { path } => {
            println!(
                "model already exists at {} (use --rebuild to retrain)",
                path.display()
            );
        }
        TrainOutcome::Trained {
            model,
            cross_validation,
        } => {
            println!("dataset: {}", report.dataset_path.display());
            println!("model:   {}", report.model_path.display());
            println!("strategy: {}  labels: {}", model.strategy, model.n_classes());
            match cross_validation {
                Some(cv) => {
                    println!("cross-validation over {} folds:", cv.folds.len());
                    println!("  micro accuracy: {:.4}", cv.mean_micro_accuracy());
                    println!("  macro accuracy: {:.4}", cv.mean_macro_accuracy());
                    println!("  log-loss:       {:.4}", cv.mean_log_loss());
                    println!("  top-3 accuracy: {:.4}", cv.mean_top3_accuracy());
                }
                None => println!("cross-validation skipped (see log)"),
            }
        }
    }
    if !report.unsorted.is_empty() {
        println!("unsorted files ready: {}", report.unsorted.len());
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    sorted: Vec<PathBuf>,
    unsorted: Option<PathBuf>,
    strategy: Option<Strategy>,
    rebuild: bool,
    leaf_labels: bool,
    folds: Option<usize>,
    config: Option<PathBuf>,
}

fn apply_overrides(settings: &mut SorterConfig, options: &CliOptions) {
    if let Some(strategy) = options.strategy {
        settings.strategy = strategy;
    }
    if options.rebuild {
        settings.rebuild_model = true;
    }
    if options.leaf_labels {
        settings.label_mode = LabelMode::LeafName;
    }
    if let Some(folds) = options.folds {
        settings.cross_validation_folds = folds;
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--sorted" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--sorted requires a value".to_string())?;
                options.sorted.push(PathBuf::from(value));
            }
            "--unsorted" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--unsorted requires a value".to_string())?;
                options.unsorted = Some(PathBuf::from(value));
            }
            "--strategy" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--strategy requires a value".to_string())?;
                options.strategy = Some(
                    Strategy::from_id(value)
                        .ok_or_else(|| format!("Invalid --strategy value: {value}"))?,
                );
            }
            "--rebuild" => options.rebuild = true,
            "--leaf-labels" => options.leaf_labels = true,
            "--folds" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--folds requires a value".to_string())?;
                options.folds = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --folds value: {value}"))?,
                );
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    if options.sorted.is_empty() {
        return Err(help_text());
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "filesorter-train",
        "",
        "Builds a Label;FileName dataset from sorted folders and trains a filename classifier.",
        "",
        "Usage:",
        "  filesorter-train --sorted <dir> [--sorted <dir>...] [options]",
        "",
        "Options:",
        "  --sorted <dir>      Folder of already-sorted files; its path is the label (repeatable).",
        "  --unsorted <dir>    Folder of files to classify later; checked before training.",
        "  --strategy <id>     maxent | ova (default: ova).",
        "  --rebuild           Retrain even if the model file exists.",
        "  --leaf-labels       Use the folder name instead of the full path as label.",
        "  --folds <n>         Cross-validation folds (default: 6).",
        "  --config <file>     Settings file (default: config.toml in the app folder).",
    ]
    .join("\n")
}
