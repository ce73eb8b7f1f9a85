#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # parsons
//!
//! Command line access to the Parsons problem engine: check a solution
//! against a problem file, inspect paired distractors, simplify a problem by
//! combining lines, or generate a problem from plain source code.

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use parsons::{
    combiner::combine_blocks,
    config::{self, EngineConfig},
    error::Outcome,
    generator::generate_problem,
    pairing::identify_pairs,
    problem::{ParsonsSettings, ProblemFile},
    validator::{LineResult, validate_lines},
};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};
use tracing::metadata::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Validate a solution file against a problem
    Check {
        /// Path to the problem JSON
        problem:  String,
        /// Path to the solution text
        solution: String,
        /// Print the full report as JSON
        json:     bool,
    },
    /// Print the paired groups of a problem
    Pairs(String),
    /// Combine adjacent solution lines and print the new definition
    Simplify {
        /// Path to the problem JSON
        problem:   String,
        /// Number of merges to attempt
        times:     usize,
        /// Override for the fewest solution lines that may still be combined
        min_lines: Option<usize>,
    },
    /// Build a problem from plain source code
    Generate {
        /// Path to the source file
        source: String,
        /// Shuffle seed for distractors
        seed:   u64,
        /// Identifier of the generated problem
        id:     String,
    },
}

/// One row of the `check` table.
#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Line")]
    /// * `line`: one-based line number
    line:     usize,
    #[tabled(rename = "Expected")]
    /// * `expected`: the expected line
    expected: String,
    #[tabled(rename = "Yours")]
    /// * `yours`: the submitted line
    yours:    String,
    #[tabled(rename = "Status")]
    /// * `status`: match, indentation or text
    status:   String,
}

impl From<&LineResult> for LineRow {
    fn from(result: &LineResult) -> Self {
        let status = if result.is_match() {
            "ok"
        } else if result.text_matches {
            "indentation"
        } else {
            "wrong"
        };
        Self {
            line:     result.index + 1,
            expected: result.expected.clone().unwrap_or_default(),
            yours:    result.rendered.clone().unwrap_or_default(),
            status:   status.to_string(),
        }
    }
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses a problem file path
    fn p() -> impl Parser<String> {
        positional("PROBLEM").help("Path to a problem JSON file")
    }

    let check = {
        let problem = p();
        let solution = positional::<String>("SOLUTION").help("Path to a text file with the solution");
        let json = long("json").help("Print the full report as JSON").switch();
        construct!(Cmd::Check {
            json,
            problem,
            solution
        })
    }
    .to_options()
    .command("check")
    .help("Validate a solution against a problem");

    let pairs = construct!(Cmd::Pairs(p()))
        .to_options()
        .command("pairs")
        .help("Show paired distractor groups");

    let simplify = {
        let times = long("times")
            .short('n')
            .help("Number of merges to attempt")
            .argument::<usize>("N")
            .fallback(1);
        let min_lines = long("min-lines")
            .help("Fewest solution lines that may still be combined")
            .argument::<usize>("N")
            .optional();
        let problem = p();
        construct!(Cmd::Simplify {
            times,
            min_lines,
            problem
        })
    }
    .to_options()
    .command("simplify")
    .help("Combine adjacent solution lines");

    let generate = {
        let seed = long("seed")
            .help("Seed for shuffling distractors")
            .argument::<u64>("SEED")
            .fallback(0);
        let id = long("id")
            .help("Identifier of the generated problem")
            .argument::<String>("ID")
            .fallback("generated".to_string());
        let source = positional::<String>("SOURCE").help("Path to a Python source file");
        construct!(Cmd::Generate { seed, id, source })
    }
    .to_options()
    .command("generate")
    .help("Generate a problem from source code");

    let cmd = construct!([check, pairs, simplify, generate]);

    cmd.to_options()
        .descr("Adaptive arrangement and validation for Parsons problems")
        .run()
}

/// Reads a problem file.
fn load(path: &str) -> Result<ProblemFile> {
    ProblemFile::load(path).with_context(|| format!("Failed to load problem `{path}`"))
}

/// Validates `solution` against `problem` and prints the outcome.
fn check(problem: &str, solution: &str, json: bool) -> Result<()> {
    let definition = load(problem)?.definition();
    let text = std::fs::read_to_string(solution)
        .with_context(|| format!("Failed to read solution `{solution}`"))?;
    let rendered: Vec<String> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();

    let report = validate_lines(
        &rendered,
        &definition.expected_lines(),
        definition.indent_unit(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let rows: Vec<LineRow> = report.line_results.iter().map(LineRow::from).collect();
    let verdict = if report.is_correct {
        "Correct".green().bold()
    } else {
        "Incorrect".red().bold()
    };
    eprintln!(
        "{}",
        Table::new(&rows)
            .with(Panel::header(format!("Check {solution}")))
            .with(Panel::footer(format!("Score: {:.2}", report.score)))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(40).keep_words(true)))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(Style::modern())
    );
    eprintln!("{verdict}");

    for hint in &report.hints {
        eprintln!("{} {}", "hint:".yellow(), hint.message);
    }
    for line in &report.comparison.missing_lines {
        eprintln!("{} {line}", "missing:".red());
    }
    for line in &report.comparison.extra_lines {
        eprintln!("{} {line}", "extra:".red());
    }
    if !report.is_correct {
        eprintln!("{}", report.diff);
    }
    Ok(())
}

/// Prints the paired groups of `problem`.
fn pairs(problem: &str) -> Result<()> {
    let mut definition = load(problem)?.definition();
    let groups = identify_pairs(&mut definition);

    if groups.is_empty() {
        eprintln!("No paired groups.");
    }
    for group in &groups {
        println!("{} {}", format!("group {}", group.id).bold(), group.color.dimmed());
        for member in group.members() {
            let marker = if member == group.correct { "+".green() } else { "-".red() };
            println!("  {marker} {}", definition.lines[member].display_text());
        }
    }
    Ok(())
}

/// Runs the combiner on `problem` and prints the resulting definition.
fn simplify(problem: &str, times: usize, min_lines: Option<usize>) -> Result<()> {
    if let Some(min_combinable_lines) = min_lines {
        config::set(EngineConfig {
            min_combinable_lines,
            ..config::get()
        });
    }

    let definition = load(problem)?.definition();
    match combine_blocks(&definition, times, &config::get()) {
        Outcome::Applied(combined) => {
            for merge in &combined.merges {
                eprintln!(
                    "{} `{}` + `{}` (score {})",
                    "merged".green(),
                    merge.first,
                    merge.second,
                    merge.score
                );
            }
            println!("{}", combined.definition.to_source());
        }
        Outcome::NotApplied(reason) => eprintln!("{} {reason}", "not applied:".yellow()),
    }
    Ok(())
}

/// Generates a problem file from `source` and prints it as JSON.
fn generate(source: &str, seed: u64, id: String) -> Result<()> {
    let code = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read source `{source}`"))?;
    let definition = generate_problem(&code, seed);

    let problem = ProblemFile::builder()
        .id(id)
        .title(source)
        .parsons_settings(
            ParsonsSettings::builder()
                .initial(definition.to_source())
                .options(definition.options.clone())
                .build(),
        )
        .build();
    println!("{}", serde_json::to_string_pretty(&problem)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = std::env::var("PARSONS_LOG")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match options() {
        Cmd::Check {
            problem,
            solution,
            json,
        } => check(&problem, &solution, json)?,
        Cmd::Pairs(problem) => pairs(&problem)?,
        Cmd::Simplify {
            problem,
            times,
            min_lines,
        } => simplify(&problem, times, min_lines)?,
        Cmd::Generate { source, seed, id } => generate(&source, seed, id)?,
    };

    Ok(())
}
