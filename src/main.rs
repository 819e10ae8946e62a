// Command-line entry point.
//
// `build` loads the period exports, writes the comparison table and a JSON
// summary, and prints a markdown preview. `fields` lists what a lookup sheet
// offers for enrichment; `classify` shows how file names map to periods.
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use period_report::config::ReportConfig;
use period_report::lookup::{apply_lookup, LookupDataset};
use period_report::types::{ClassifiedFileRow, RunSummary};
use period_report::{loader, output, period, pipeline, util};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "period-report",
    version,
    about = "Year-over-year and period-over-period product comparison"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the comparison table from period exports.
    Build(BuildArgs),
    /// List the selectable columns of a lookup sheet.
    Fields {
        lookup: PathBuf,
    },
    /// Show the period each file name maps to.
    Classify {
        names: Vec<String>,
    },
}

#[derive(Debug, clap::Args)]
struct BuildArgs {
    /// Period exports (CSV) whose names contain 同期, 上期 or 当期.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// JSON settings file.
    #[arg(long, env = "PERIOD_REPORT_CONFIG")]
    config: Option<PathBuf>,
    /// 1-based row holding the column labels.
    #[arg(long)]
    header_row: Option<usize>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    report_name: Option<String>,
    /// Lookup sheet used to append extra columns.
    #[arg(long)]
    lookup: Option<PathBuf>,
    /// Column indices of the lookup sheet to append (see `fields`).
    #[arg(long, value_delimiter = ',')]
    select: Vec<usize>,
    /// Extract and aggregate files in parallel.
    #[arg(long)]
    parallel: bool,
    /// Number of product rows to preview.
    #[arg(long)]
    preview: Option<usize>,
}

impl BuildArgs {
    fn config(&self) -> anyhow::Result<ReportConfig> {
        let mut cfg = match &self.config {
            Some(path) => ReportConfig::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ReportConfig::default(),
        };
        if let Some(n) = self.header_row {
            cfg.header_row = n;
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(name) = &self.report_name {
            cfg.report_name = name.clone();
        }
        if let Some(n) = self.preview {
            cfg.preview_rows = n;
        }
        cfg.parallel |= self.parallel;
        Ok(cfg)
    }
}

fn handle_build(args: BuildArgs) -> anyhow::Result<()> {
    let cfg = args.config()?;
    let inputs = loader::load_inputs(&args.files)?;
    if inputs.is_empty() {
        bail!("no CSV export with 同期, 上期 or 当期 in its name was given");
    }

    println!("Processing {} files (header row {})...", inputs.len(), cfg.header_row);
    let report = pipeline::build_report(&inputs, cfg.header_row, cfg.parallel)?;
    let mut table = report.table;

    let mut lookup_columns = Vec::new();
    if args.lookup.is_some() || !args.select.is_empty() {
        let dataset = match &args.lookup {
            Some(path) => {
                let sheet = loader::load_sheet(path)
                    .with_context(|| format!("reading lookup sheet {}", path.display()))?;
                Some(LookupDataset::from_sheet(&sheet)?)
            }
            None => None,
        };
        table = apply_lookup(table, dataset.as_ref(), &args.select)?;
        if let Some(ds) = &dataset {
            lookup_columns = args.select.iter().map(|&i| ds.headers[i].clone()).collect();
        }
    }

    let today = chrono::Local::now().date_naive();
    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;
    let report_file = cfg
        .output_dir
        .join(util::report_file_name(&cfg.report_name, today, "csv"));
    output::write_table(&report_file, &table)
        .with_context(|| format!("writing {}", report_file.display()))?;

    let summary = RunSummary {
        report_file: report_file.display().to_string(),
        generated_on: today.format("%Y-%m-%d").to_string(),
        header_row: cfg.header_row,
        files: report.files,
        total_products: table.product_count(),
        lookup_columns,
    };
    let summary_file = cfg
        .output_dir
        .join(util::report_file_name(&cfg.report_name, today, "summary.json"));
    output::write_json(&summary_file, &summary)?;

    println!(
        "Done: {} products across {} periods.\n",
        util::format_int(summary.total_products),
        table.period_count
    );
    println!("{}\n", output::preview_table(&table, cfg.preview_rows));
    println!("(Full table exported to {})", report_file.display());
    println!("(Summary written to {})", summary_file.display());
    Ok(())
}

fn handle_fields(path: PathBuf) -> anyhow::Result<()> {
    let sheet = loader::load_sheet(&path)
        .with_context(|| format!("reading lookup sheet {}", path.display()))?;
    let dataset = LookupDataset::from_sheet(&sheet)?;
    println!(
        "{} rows keyed by \"{}\"\n",
        util::format_int(dataset.len()),
        dataset.headers[dataset.id_column]
    );
    println!("{}", output::preview_table_rows(&dataset.selectable_fields()));
    Ok(())
}

fn handle_classify(names: Vec<String>) {
    let rows: Vec<ClassifiedFileRow> = names
        .into_iter()
        .map(|file| ClassifiedFileRow {
            role: period::classify_period(&file)
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            accepted: period::is_candidate_file(&file),
            file,
        })
        .collect();
    println!("{}", output::preview_table_rows(&rows));
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Build(args) => handle_build(args),
        Command::Fields { lookup } => handle_fields(lookup),
        Command::Classify { names } => {
            handle_classify(names);
            Ok(())
        }
    }
}
