//! inslens CLI binary.
//!
//! Loads reporting-form tables, runs queries and prints or exports the
//! resulting tables.

mod query;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use inslens::Session;
use inslens_data::{InsurerDirectory, LineHierarchy, ReportingForm};
use inslens_metrics::MetricRegistry;
use inslens_output::{ExportFormat, Exporter};
use inslens_pipeline::{load_start_quarter, start_quarter};
use query::{DataArgs, QueryArgs, load_config};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inslens")]
#[command(about = "Insurance market analytics over quarterly regulator reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Fixed-width tables
    Text,
    /// Markdown tables
    Markdown,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    PrettyJson,
    /// CSV
    Csv,
}

impl OutputFormat {
    const fn export(self) -> Option<ExportFormat> {
        match self {
            Self::Text | Self::Markdown => None,
            Self::Json => Some(ExportFormat::Json),
            Self::PrettyJson => Some(ExportFormat::PrettyJson),
            Self::Csv => Some(ExportFormat::Csv),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print or export the tables
    Run {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Pipeline configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Line hierarchy JSON
        #[arg(long = "lines-file")]
        lines_file: Option<PathBuf>,

        /// Insurer directory JSON
        #[arg(long = "insurers-file")]
        insurers_file: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Export the processed long-format records instead of segment tables
        #[arg(long)]
        processed: bool,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List metric definitions
    Metrics {
        /// Only metrics of this reporting form
        #[arg(long)]
        form: Option<ReportingForm>,

        /// Extra definitions JSON registered on top of the standard set
        #[arg(long)]
        extensions: Option<PathBuf>,
    },

    /// Print the order in which metrics are materialized
    Resolve {
        /// Metric codes
        #[arg(value_delimiter = ',', required = true)]
        metrics: Vec<String>,

        /// Reporting form whose base metrics count as available
        #[arg(long, default_value = "0420162")]
        form: ReportingForm,
    },

    /// Print the resolved first quarter of a query
    Periods {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        query: QueryArgs,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            data,
            query,
            config,
            lines_file,
            insurers_file,
            format,
            processed,
            output,
        } => {
            let mut session = Session::new(data.load()?, query.params()?)
                .with_pipeline(MetricRegistry::try_standard()?, load_config(config.as_deref())?);
            if let Some(path) = lines_file {
                session = session.with_lines(LineHierarchy::load(path)?);
            }
            if let Some(path) = insurers_file {
                session = session.with_insurers(InsurerDirectory::load(path)?);
            }
            run_query(&mut session, format, processed, output)?;
        }
        Commands::Metrics { form, extensions } => {
            let registry = match extensions {
                Some(path) => MetricRegistry::standard_with_extensions(path)?,
                None => MetricRegistry::try_standard()?,
            };
            list_metrics(&registry, form);
        }
        Commands::Resolve { metrics, form } => {
            let registry = MetricRegistry::try_standard()?;
            let available: HashSet<String> = registry
                .for_form(form)
                .into_iter()
                .filter(|d| d.is_base())
                .map(|d| d.code.clone())
                .collect();
            let order = registry.required_metrics(&metrics, &available)?;
            for (i, code) in order.iter().enumerate() {
                let marker = if available.contains(code) { "base" } else { "derived" };
                println!("{:>3}. {:<36} {}", i + 1, code, marker);
            }
        }
        Commands::Periods { data, query } => {
            let params = query.params()?;
            let inputs = data.load()?;
            let frame = inputs
                .get(params.reporting_form)
                .ok_or_else(|| format!("no table loaded for form {}", params.reporting_form))?;
            let available = frame.quarters()?;
            let start = start_quarter(
                &available,
                params.end_quarter,
                params.period_type,
                params.num_periods,
            );
            println!("Form:       {}", params.reporting_form);
            println!("Period:     {} x{}", params.period_type, params.num_periods);
            println!("End:        {}", params.end_quarter);
            println!("Start:      {}", start);
            println!("Load from:  {}", load_start_quarter(start, params.period_type));
        }
    }

    Ok(())
}

fn run_query(
    session: &mut Session,
    format: OutputFormat,
    processed: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .map_err(|e| e.to_string())?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Processing form {} ({}, {} periods)",
        session.params().reporting_form,
        session.params().period_type,
        session.params().num_periods
    ));
    let reports = match session.run() {
        Ok(reports) => reports,
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };
    pb.finish_with_message(format!(
        "Processed {} rows into {} segment(s)",
        session.context().processed().height(),
        reports.len()
    ));

    let content = match (format.export(), processed) {
        (Some(export), true) => session
            .context()
            .processed()
            .records()?
            .export_to_string(export)?,
        (Some(ExportFormat::Csv), false) => reports
            .iter()
            .map(|r| r.table.export_to_string(ExportFormat::Csv))
            .collect::<Result<Vec<String>, _>>()?
            .join("\n"),
        (Some(export), false) => reports.export_to_string(export)?,
        (None, _) => {
            if reports.is_empty() {
                "No data for the selected parameters.\n".to_string()
            } else {
                reports
                    .iter()
                    .map(|r| match format {
                        OutputFormat::Markdown => r.table.to_markdown(&r.title),
                        _ => r.table.to_ascii_table(&r.title),
                    })
                    .collect::<Vec<String>>()
                    .join("\n")
            }
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, content)?;
            info!(path = %path.display(), "output written");
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn list_metrics(registry: &MetricRegistry, form: Option<ReportingForm>) {
    let definitions = match form {
        Some(form) => registry.for_form(form),
        None => registry.definitions().iter().collect(),
    };
    println!("{:<36} {:<14} {:<8} Label", "Code", "Kind", "Source");
    println!("{}", "-".repeat(80));
    for def in &definitions {
        let source = if def.is_base() { "base" } else { "derived" };
        println!(
            "{:<36} {:<14} {:<8} {}",
            def.code,
            def.kind.to_string(),
            source,
            def.label
        );
    }
    println!("\n{} metric(s)", definitions.len());
}
