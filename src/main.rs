use analytics::StatisticalAccount;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use configuration::{load_config, AnalysisOverrides, ConfigurationStore};
use core_types::AnalysisSession;
use formula::{CompiledFormula, SignificanceCatalog};
use layout::{display_integer, OutOfRange, ReportSection, ResultPresenter};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Yieldbook reporting tool.
fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Report(args) => handle_report(args),
        Commands::Formula(args) => handle_formula(args),
        Commands::Catalog => {
            handle_catalog();
            Ok(())
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Expected yields, cut flows and significances of a collider analysis.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report of a measured analysis session.
    Report(ReportArgs),
    /// Check a significance formula and show its suggested uncertainty.
    Formula(FormulaArgs),
    /// List the significance shapes with a known uncertainty formula.
    Catalog,
}

#[derive(Parser)]
struct ReportArgs {
    /// The session JSON written by the cut engine.
    #[arg(long)]
    session: PathBuf,

    /// The analysis configuration file.
    #[arg(long, default_value = "yieldbook.toml")]
    config: PathBuf,

    /// Show event files relative to this directory.
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    overrides: AnalysisOverrides,
}

#[derive(Parser)]
struct FormulaArgs {
    /// A formula over S, B, ES and EB, e.g. "S/sqrt(S+B)".
    formula: String,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

fn handle_report(args: ReportArgs) -> Result<()> {
    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?
        .apply_overrides(&args.overrides)
        .context("Invalid command-line override")?;
    let store = ConfigurationStore::new(config);
    let snapshot = store.snapshot();

    tracing::info!(
        lumi = snapshot.lumi(),
        normalize = %snapshot.normalize(),
        significance = %snapshot.significance_formula(),
        error = %snapshot.error_formula(),
        "Configuration loaded."
    );

    let session = load_session(&args.session)?;
    let account = StatisticalAccount::new(&session, snapshot);
    let mut presenter = ResultPresenter::new(&account);
    if let Some(dir) = args.base_dir {
        presenter = presenter.with_base_dir(dir);
    }

    let sections = presenter.build_report()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
    } else {
        for section in &sections {
            print_section(section);
        }
    }
    Ok(())
}

fn handle_formula(args: FormulaArgs) -> Result<()> {
    let compiled = CompiledFormula::compile(&args.formula)
        .with_context(|| format!("'{}' is not a valid formula", args.formula))?;

    println!("Formula:        {compiled}");
    println!("Canonical form: {}", compiled.canonical_form());
    match SignificanceCatalog::standard().suggest_error_formula(&compiled) {
        Some(suggestion) => {
            let note = if suggestion.swapped {
                " (signal and background exchanged)"
            } else {
                ""
            };
            println!("Matches:        {}{note}", suggestion.shape);
            println!("Error formula:  {}", suggestion.error_formula);
        }
        None => println!("No known uncertainty formula; set one explicitly."),
    }
    Ok(())
}

fn handle_catalog() {
    for shape in SignificanceCatalog::standard().known_significance_formulas() {
        println!("{shape}");
    }
}

fn load_session(path: &Path) -> Result<AnalysisSession> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open session file {}", path.display()))?;
    let session: AnalysisSession = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse session file {}", path.display()))?;
    tracing::info!(
        datasets = session.datasets.len(),
        cuts = session.cuts.len(),
        "Session loaded."
    );
    Ok(session)
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_section(section: &ReportSection) {
    match section {
        ReportSection::Dataset { summary, files } => {
            println!("\nDataset {} ({})", summary.name, summary.sample_type);
            if let Ok(n) = summary.generated_events.parse::<i64>() {
                println!("  Generated events:    {}", display_integer(n));
            }
            if let Some(xsection) = &summary.imposed_xsection {
                println!("  Imposed xsection:    {xsection} pb");
            }
            if let Some(weight) = &summary.imposed_weight {
                println!("  Imposed weight:      {weight}");
            }
            println!("  Normalized events:   {}", summary.normalization);
            println!("  Event weight ratio:  {}", summary.event_weight_ratio);
            if summary.insufficient_statistics {
                println!("  Warning: too few generated events for this luminosity.");
            }

            let mut table = new_table(vec!["File", "Events", "Cross section (pb)", "Neg. weights (%)"]);
            for row in files {
                table.add_row(vec![
                    row.path.as_str(),
                    row.nevents.as_str(),
                    row.cross_section.as_str(),
                    row.negative_weights.as_str(),
                ]);
            }
            println!("{table}");
        }
        ReportSection::Histogram { observable, table: stats } => {
            println!("\nHistogram {observable}");
            let mut table = new_table(vec![
                "Dataset", "Integral", "Entries/event", "Mean", "RMS", "Underflow (%)", "Overflow (%)",
            ]);
            for row in &stats.rows {
                let color = match row.out_of_range {
                    OutOfRange::Low => Color::Green,
                    OutOfRange::Moderate => Color::DarkYellow,
                    OutOfRange::High => Color::Red,
                };
                table.add_row(vec![
                    Cell::new(&row.dataset),
                    Cell::new(&row.integral),
                    Cell::new(&row.entries_per_event),
                    Cell::new(&row.mean),
                    Cell::new(&row.rms),
                    Cell::new(&row.underflow_percent).fg(color),
                    Cell::new(&row.overflow_percent).fg(color),
                ]);
            }
            println!("{table}");
            print_warnings(&stats.warnings);
        }
        ReportSection::Cut { name, regions, .. } => {
            println!("\nCut {name}");
            for (region, efficiencies) in regions {
                println!("  Region {region}");
                let mut table = new_table(vec![
                    "Dataset", "Events kept", "Events rejected", "Efficiency", "Cumul. efficiency",
                ]);
                for row in &efficiencies.rows {
                    table.add_row(vec![
                        row.dataset.as_str(),
                        row.kept.as_str(),
                        row.rejected.as_str(),
                        row.efficiency.as_str(),
                        row.cumulative_efficiency.as_str(),
                    ]);
                }
                println!("{table}");
                print_warnings(&efficiencies.warnings);
            }
        }
        ReportSection::ObjectDefinition { description } => {
            println!("\nObject definition: {description}");
        }
        ReportSection::CutFlow {
            region,
            significance_formula,
            rows,
        } => {
            println!("\nCut flow of region {region}");
            let mut table = new_table(vec!["Step", "Signal (S)", "Background (B)", significance_formula.as_str()]);
            for row in rows {
                table.add_row(vec![
                    row.label.as_str(),
                    row.signal.as_str(),
                    row.background.as_str(),
                    row.significance.as_str(),
                ]);
            }
            println!("{table}");
        }
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("  Warning: {warning}");
    }
}
