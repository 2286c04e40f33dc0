//! Classify files with a trained model and print `filename;label` lines.

use std::path::PathBuf;

use filesorter::classifier::Sorter;
use filesorter::config;
use filesorter::dataset::base_name;
use filesorter::logging::{self, Console};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init(Console::Stderr) {
        eprintln!("Logging disabled: {err}");
    }

    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    let model_path = match &options.model {
        Some(path) => path.clone(),
        None => settings.resolved_model_path().map_err(|err| err.to_string())?,
    };
    let threshold = options.threshold.unwrap_or(settings.confidence_threshold);
    let sorter = Sorter::load(&model_path)
        .map_err(|err| format!("[{}] {err}", err.kind()))?
        .with_threshold(threshold);

    if options.top3 {
        for path in &options.paths {
            let ranked = sorter
                .predict_one(path)
                .map_err(|err| format!("[{}] {err}", err.kind()))?;
            let entries: Vec<String> = ranked
                .entries
                .iter()
                .map(|entry| format!("{}={:.3}", entry.label, entry.score))
                .collect();
            println!("{};{}", base_name(path), entries.join(";"));
        }
        return Ok(());
    }

    let sorted = sorter
        .predict_all(&options.paths)
        .map_err(|err| format!("[{}] {err}", err.kind()))?;
    for file in sorted {
        println!("{};{}", file.filename, file.label);
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    model: Option<PathBuf>,
    threshold: Option<f32>,
    top3: bool,
    paths: Vec<String>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                options.model = Some(PathBuf::from(value));
            }
            "--threshold" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--threshold requires a value".to_string())?;
                let threshold = value
                    .parse::<f32>()
                    .map_err(|_| format!("Invalid --threshold value: {value}"))?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(format!("--threshold must be within 0..=1, got {value}"));
                }
                options.threshold = Some(threshold);
            }
            "--top3" => options.top3 = true,
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            path => options.paths.push(path.to_string()),
        }
        idx += 1;
    }
    if options.paths.is_empty() {
        return Err(help_text());
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "filesorter-sort",
        "",
        "Predicts a label for each file name using a trained model.",
        "",
        "Usage:",
        "  filesorter-sort [options] <path>...",
        "",
        "Options:",
        "  --model <file>      Model artifact (default: from config.toml).",
        "  --threshold <f32>   Minimum top score to assign a label (default: 0.3).",
        "  --top3              Print the three best labels with scores instead.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn collects_paths_and_options() {
        let options =
            parse_args(args(&["--model", "m.zip", "a.txt", "--threshold", "0.5", "b.txt"])).unwrap();
        assert_eq!(options.model, Some(PathBuf::from("m.zip")));
        assert_eq!(options.threshold, Some(0.5));
        assert_eq!(options.paths, vec!["a.txt", "b.txt"]);
        assert!(!options.top3);
    }

    #[test]
    fn rejects_bad_threshold_and_unknown_flags() {
        assert!(parse_args(args(&["--threshold", "1.5", "a.txt"])).is_err());
        assert!(parse_args(args(&["--verbose", "a.txt"])).is_err());
        assert!(parse_args(args(&["--top3"])).is_err());
    }
}
