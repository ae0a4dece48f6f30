use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use dw_harmonize::{
    read_table, write_dim_country, write_table, write_unmatched, CountryResolver,
    HarmonizeConfig, Harmonizer, MatchMethod, UnmatchedReport, DIM_COUNTRY_FILE, UNMATCHED_FILE,
};

#[derive(Parser, Debug)]
#[command(
    name = "dw-harmonize",
    version,
    about = "Country-name harmonization for the warehouse ETL"
)]
struct Cli {
    /// JSON config overriding aliases, qualifiers, thresholds and exclusions
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build Dim_Country.csv from the reference dataset
    DimCountry {
        #[arg(long)]
        reference: PathBuf,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Resolve names and print iso3 / canonical name / method
    Resolve {
        #[arg(long)]
        reference: PathBuf,

        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Harmonize source CSVs into STAGING_<source>.csv files
    Harmonize {
        #[arg(long)]
        reference: PathBuf,

        /// Source CSV, repeatable
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// Column holding the raw country name
        #[arg(long)]
        name_column: String,

        /// Column holding a claimed ISO3 code, used as a fallback
        #[arg(long)]
        iso3_column: Option<String>,

        /// Source label (defaults to the input file stem)
        #[arg(long)]
        source: Option<String>,

        /// Drop rows whose name did not resolve
        #[arg(long)]
        drop_unresolved: bool,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::DimCountry { reference, out } => run_dim_country(&reference, &out, config),
        Command::Resolve { reference, names } => run_resolve(&reference, &names, config),
        Command::Harmonize {
            reference,
            inputs,
            name_column,
            iso3_column,
            source,
            drop_unresolved,
            out,
        } => {
            let resolver = load_resolver(&reference, config)?;
            let harmonizer = Harmonizer::new(&resolver).drop_unresolved(drop_unresolved);
            let mut report = UnmatchedReport::new();

            println!("🌍 Harmonizing {} source(s)", inputs.len());
            for input in &inputs {
                let label = source_label(source.as_deref(), input, inputs.len());
                let table = read_table(input)
                    .with_context(|| format!("failed to read source {}", input.display()))?;
                let harmonized = harmonizer
                    .harmonize_table(&label, &table, &name_column, iso3_column.as_deref())
                    .with_context(|| format!("failed to harmonize {}", input.display()))?;

                let staging = out.join(format!("STAGING_{}.csv", label));
                write_table(&staging, &harmonized.table)
                    .with_context(|| format!("failed to write {}", staging.display()))?;

                report.add_source(&resolver, &label, harmonized.unresolved_names.as_slice());
                println!(
                    "✓ {} (match rate {:.1}%) → {}",
                    harmonized.summary.summary(),
                    harmonized.summary.match_rate() * 100.0,
                    staging.display()
                );
            }

            let unmatched_path = out.join(UNMATCHED_FILE);
            write_unmatched(&unmatched_path, &report.entries())
                .with_context(|| format!("failed to write {}", unmatched_path.display()))?;
            println!("✓ {} → {}", report.summary(), unmatched_path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<HarmonizeConfig> {
    match path {
        Some(path) => HarmonizeConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(HarmonizeConfig::default()),
    }
}

fn load_resolver(reference: &Path, config: HarmonizeConfig) -> Result<CountryResolver> {
    let resolver = CountryResolver::from_reference(reference, config)
        .with_context(|| format!("failed to load reference {}", reference.display()))?;
    if resolver.registry().is_empty() {
        eprintln!("⚠️  Reference dataset produced an empty registry; nothing will resolve");
    }
    Ok(resolver)
}

fn run_dim_country(reference: &Path, out: &Path, config: HarmonizeConfig) -> Result<()> {
    let resolver = load_resolver(reference, config)?;
    let path = out.join(DIM_COUNTRY_FILE);
    let written = write_dim_country(&path, resolver.registry())
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("✓ {} countries → {}", written, path.display());
    println!("✓ {} lookup keys", resolver.lookup().len());
    if !resolver.lookup().collisions().is_empty() {
        println!("⚠️  {} name collisions (see log)", resolver.lookup().collisions().len());
    }
    Ok(())
}

fn run_resolve(reference: &Path, names: &[String], config: HarmonizeConfig) -> Result<()> {
    let resolver = load_resolver(reference, config)?;
    let suggestion_cutoff = resolver.config().suggestion_threshold;

    for name in names {
        let resolution = resolver.resolve(name);
        match resolution.method {
            MatchMethod::Unresolved => {
                let hint = resolver
                    .best_candidate(name, suggestion_cutoff)
                    .map(|c| format!(" (closest: {} {} {:.3})", c.iso3, c.canonical_name, c.score))
                    .unwrap_or_default();
                println!("{}\t-\t-\tunresolved{}", name, hint);
            }
            method => println!(
                "{}\t{}\t{}\t{:?} {:.3}",
                name, resolution.iso3, resolution.canonical_name, method, resolution.score
            ),
        }
    }
    Ok(())
}

/// `--source` applies to a single input; with several, each uses its file stem.
fn source_label(source: Option<&str>, input: &Path, input_count: usize) -> String {
    match source {
        Some(label) if input_count == 1 => label.to_string(),
        _ => input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string()),
    }
}
