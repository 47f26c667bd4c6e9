//! Linearize solved load cases from the command line

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use scl_linearizer::case::read_case_parameters;
use scl_linearizer::mesh::io::read_node_ids;
use scl_linearizer::prelude::*;
use scl_linearizer::results::write_summary_csv;

#[derive(Parser, Debug)]
#[command(name = "scl-linearize", about = "Stress linearization along stress classification lines")]
struct Args {
    /// Node file of the first surface (`id, x, y, z` per row)
    #[arg(long)]
    first: PathBuf,

    /// Node file of the second surface
    #[arg(long)]
    second: PathBuf,

    /// Node file with the coordinates of every node
    #[arg(long)]
    locations: PathBuf,

    /// Directory of `<case>.json` nodal results
    #[arg(long, short = 'r')]
    results: PathBuf,

    /// Case names to linearize
    #[arg(required = true)]
    cases: Vec<String>,

    /// Case parameters as JSON, case name to parameters; they become
    /// columns of the summary table
    #[arg(long, short = 'p')]
    parameters: Option<PathBuf>,

    /// Element connectivity, needed for graph pairing
    #[arg(long)]
    connectivity: Option<PathBuf>,

    /// Linearization options as JSON
    #[arg(long, short = 'o')]
    options: Option<PathBuf>,

    /// Node ids restricting the evaluation, one per row
    #[arg(long, short = 's')]
    subset: Option<PathBuf>,

    /// Integration points per line, overrides the options file
    #[arg(long, short = 'n')]
    npoints: Option<usize>,

    /// Cache directory, overrides the options file
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Recompute every case
    #[arg(long)]
    no_cache: bool,

    /// Summary table to write
    #[arg(long, default_value = "linearized_summary.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut options = match &args.options {
        Some(path) => LinearizationOptions::from_json_file(path)
            .with_context(|| format!("reading options from {}", path.display()))?,
        None => LinearizationOptions::default(),
    };
    if let Some(npoints) = args.npoints {
        options = options.with_npoints(npoints);
    }
    if let Some(path) = &args.subset {
        let subset = read_node_ids(path).with_context(|| format!("reading subset {}", path.display()))?;
        options = options.with_subset(subset);
    }
    if let Some(dir) = &args.cache_dir {
        options = options.with_cache_dir(dir);
    }
    if args.no_cache {
        options = options.without_cache();
    }

    let geometry = Geometry::from_files(&args.first, &args.second, &args.locations, args.connectivity.as_deref())
        .context("loading geometry")?;
    let linearizer = Linearizer::new(geometry, options).context("setting up linearizer")?;
    let provider = JsonFieldProvider::new(&args.results);

    let parameters = match &args.parameters {
        Some(path) => read_case_parameters(path)
            .with_context(|| format!("reading case parameters from {}", path.display()))?,
        None => Default::default(),
    };
    let cases: Vec<CaseSpec> = args
        .cases
        .iter()
        .map(|name| {
            let params = parameters.get(name).cloned().unwrap_or_else(|| {
                if args.parameters.is_some() {
                    log::warn!("no parameters for case '{name}'");
                }
                CaseParameters::new()
            });
            CaseSpec::new(name.clone(), params)
        })
        .collect();
    let report = CaseBatch::new(&linearizer, &provider)
        .run(&cases)
        .context("linearizing cases")?;

    println!(
        "{:<24} {:>14} {:>14} {:>14}",
        "case", "membrane", "bending", "linearized"
    );
    for summary in &report.summaries {
        println!(
            "{:<24} {:>14.4e} {:>14.4e} {:>14.4e}",
            summary.case, summary.stress.membrane, summary.stress.bending, summary.stress.linearized
        );
    }
    for failure in &report.failures {
        println!("{:<24} skipped: {}", failure.case, failure.error);
    }

    write_summary_csv(&args.output, &report.summaries)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}
