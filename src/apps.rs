use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};

use crate::assembler::GenerationResult;
use crate::catalog::ProfileCatalog;
use crate::config::GeneratorConfig;
use crate::errors::GenerationError;
use crate::generator::{GenerationRequest, PaperGenerator};
use crate::heuristics::format_u128_with_commas;
use crate::metrics::marks_spread;
use crate::partition::PoolReport;
use crate::source::FileItemSource;

#[derive(Debug, Parser)]
#[command(
    name = "generate_paper",
    disable_help_subcommand = true,
    about = "Generate an exam paper from a directory of question files",
    long_about = "Select questions from JSON item files so the paper meets its profile's mark totals, per-section sums, and count bounds.",
    after_help = "Item files are *.json (object or array) and *.jsonl, read recursively in path order. Set RUST_LOG=debug to see per-attempt events."
)]
struct GeneratePaperCli {
    #[arg(long, help = "Paper id to generate, e.g. chemistry-2")]
    paper: Option<String>,
    #[arg(
        long = "topic",
        value_name = "TOPIC",
        help = "Topic id scoping the pool, repeat as needed"
    )]
    topics: Vec<String>,
    #[arg(
        long = "items-dir",
        value_name = "PATH",
        help = "Directory holding question item files"
    )]
    items_dir: Option<PathBuf>,
    #[arg(long, help = "Deterministic seed; random when omitted")]
    seed: Option<u64>,
    #[arg(
        long = "max-attempts",
        value_parser = parse_positive_usize,
        help = "Full attempts before giving up"
    )]
    max_attempts: Option<usize>,
    #[arg(
        long = "max-nodes",
        value_parser = parse_positive_usize,
        help = "Subset-search node budget per requirement per attempt"
    )]
    max_nodes: Option<usize>,
    #[arg(
        long = "prefer",
        value_name = "ITEM_ID",
        help = "Item id to prefer where the profile honours hints, repeat as needed"
    )]
    prefer: Vec<String>,
    #[arg(
        long = "profile-file",
        value_name = "PATH",
        help = "JSON file with extra profiles, repeat as needed"
    )]
    profile_files: Vec<PathBuf>,
    #[arg(long, help = "Print the result as JSON")]
    json: bool,
    #[arg(
        long = "validate-only",
        help = "Only check that the pool can satisfy the paper"
    )]
    validate_only: bool,
    #[arg(long = "list-papers", help = "List known paper ids and exit")]
    list_papers: bool,
}

/// Parse `args_iter` as `generate_paper` flags and run one generation.
pub fn run_generate_paper<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<GeneratePaperCli, _>(
        std::iter::once("generate_paper".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut catalog = ProfileCatalog::builtin();
    for path in &cli.profile_files {
        catalog.load_json_file(path)?;
    }
    if cli.list_papers {
        for id in catalog.ids() {
            let profile = catalog.get(id)?;
            println!("{id:<16} {:>4} marks  {}", profile.total_marks, profile.title);
        }
        return Ok(());
    }

    let paper = cli
        .paper
        .ok_or_else(|| GenerationError::Configuration("--paper is required".into()))?;
    let items_dir = cli
        .items_dir
        .ok_or_else(|| GenerationError::Configuration("--items-dir is required".into()))?;

    let mut config = GeneratorConfig {
        seed: cli.seed.unwrap_or_else(rand::random),
        ..GeneratorConfig::default()
    };
    if let Some(max_attempts) = cli.max_attempts {
        config.max_attempts = max_attempts;
    }
    if let Some(max_nodes) = cli.max_nodes {
        config.search.max_nodes = max_nodes;
    }

    let source = FileItemSource::new(items_dir);
    let request = GenerationRequest::new(paper, cli.topics).with_preferred_items(cli.prefer);
    let mut generator = PaperGenerator::with_catalog(config, catalog);

    if cli.validate_only {
        let report = generator.validate_pool(&request, &source)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_pool_report(&report);
        }
        return Ok(());
    }

    match generator.generate(&request, &source) {
        Ok(result) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result, generator.config().seed);
            }
        }
        Err(GenerationError::Exhausted {
            paper,
            attempts,
            bucket_sizes,
        }) => {
            eprintln!(
                "Could not generate '{paper}' in {attempts} attempts. Bucket sizes: {bucket_sizes}. Add questions to the short buckets or raise --max-attempts."
            );
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn print_pool_report(report: &PoolReport) {
    println!("=== pool check: {} ===", report.paper);
    println!("pool size: {}", report.pool_size);
    println!();
    println!("[BUCKETS]");
    for (name, size) in &report.bucket_sizes.0 {
        println!("  {name:<28} {size}");
    }
    println!();
    println!("[REQUIREMENTS]");
    for capacity in &report.requirements {
        println!(
            "  {:<20} available {:>5} (needs {:>3})  marks {}",
            capacity.requirement,
            capacity.available,
            capacity.required,
            format_u128_with_commas(u128::from(capacity.available_marks))
        );
    }
}

fn print_result(result: &GenerationResult, seed: u64) {
    println!("=== {} ({}) ===", result.title, result.paper);
    println!(
        "seed: {seed}  attempts: {}  elapsed: {:.2?}",
        result.stats.attempts, result.stats.elapsed
    );
    println!();
    for item in &result.items {
        println!(
            "{:>3}. {:<28} {:>3} marks  [{}]",
            item.number, item.item_id, item.marks, item.requirement
        );
    }
    println!();
    println!("[REQUIREMENTS]");
    for report in &result.requirements {
        let target = if report.target_min == report.target_max {
            report.target_min.to_string()
        } else {
            format!("{}..={}", report.target_min, report.target_max)
        };
        println!(
            "  {:<20} {:>3} items  {:>3} marks (target {target}, {})",
            report.name, report.count, report.sum, report.strategy
        );
    }
    if let Some(spread) = marks_spread(result) {
        println!(
            "  largest share {:.1}%  smallest share {:.1}%",
            spread.max_share * 100.0,
            spread.min_share * 100.0
        );
    }
    println!();
    println!(
        "total: {} / {} marks  valid: {}",
        result.stats.total_marks,
        result.stats.target_total,
        result.is_valid()
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter()
            .map(|arg| arg.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn help_exits_cleanly() {
        assert!(run_generate_paper(args(&["--help"])).is_ok());
    }

    #[test]
    fn zero_attempts_flag_is_rejected() {
        assert!(run_generate_paper(args(&["--max-attempts", "0"])).is_err());
    }

    #[test]
    fn missing_paper_is_a_configuration_error() {
        let err = run_generate_paper(args(&["--items-dir", "."])).unwrap_err();
        assert!(err.to_string().contains("--paper"));
    }

    #[test]
    fn generates_from_items_dir() {
        let temp = tempfile::tempdir().unwrap();
        let lines: Vec<String> = [10, 11, 11, 12, 13, 13, 10]
            .iter()
            .enumerate()
            .map(|(idx, marks)| format!(r#"{{"id":"c{idx}","topic":"chem","marks":{marks}}}"#))
            .collect();
        fs::write(temp.path().join("chem.jsonl"), lines.join("\n")).unwrap();
        let dir = temp.path().to_string_lossy().to_string();
        run_generate_paper(args(&[
            "--paper",
            "chemistry-2",
            "--topic",
            "chem",
            "--items-dir",
            &dir,
            "--seed",
            "7",
        ]))
        .unwrap();
        run_generate_paper(args(&[
            "--paper",
            "chemistry-2",
            "--topic",
            "chem",
            "--items-dir",
            &dir,
            "--validate-only",
            "--json",
        ]))
        .unwrap();
    }
}
