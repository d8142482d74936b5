//! fundseries CLI: normalize fund and index price histories.
//!
//! Commands:
//! - `run`: process the instrument catalog into canonical series files
//! - `decode`: normalize one raw payload and print the canonical JSON
//! - `correct`: drop known-bad entries from an already persisted file
//! - `catalog`: list catalog instruments and their sources

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use std::path::{Path, PathBuf};

use fundseries_core::{
    CanonicalDate, Correction, CorrectionSet, DateFormat, RecordFormat, SeriesBuilder,
    SourceFormat, UnitSuffix,
};
use fundseries_runner::{
    run_catalog, to_persisted_json, Catalog, OutputSink, OverwritePolicy, RunConfig, RunReport,
    RunSummary, SourceSpec, StdoutProgress,
};

const DEFAULT_CONFIG: &str = "fundseries.toml";

#[derive(Parser)]
#[command(
    name = "fundseries",
    about = "fundseries CLI: canonical price histories for funds and indices"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the instrument catalog into canonical series files.
    Run {
        /// Path to a TOML run config. Defaults to ./fundseries.toml when present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a TOML instrument catalog. Defaults to the built-in catalog.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Only process these instruments (repeatable).
        #[arg(long)]
        only: Vec<String>,

        /// Overwrite existing files in every category.
        #[arg(long, default_value_t = false)]
        overwrite: bool,

        /// Process instruments one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Offline mode: skip instruments that need the network.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Raw payload directory (overrides config).
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Output directory (overrides config).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Write a JSON run report here.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Also print each series as JSON.
        #[arg(long, default_value_t = false)]
        print: bool,
    },
    /// Normalize one raw payload file and print canonical JSON to stdout.
    Decode {
        /// Payload shape, e.g. comma_separated_with_header.
        #[arg(long)]
        format: SourceFormat,

        /// Override the shape's date grammar (iso_ymd, us_slash, epoch_millis,
        /// display_already_canonical).
        #[arg(long)]
        date_format: Option<DateFormat>,

        /// Strip a trailing unit marker of this many characters (0 disables).
        #[arg(long)]
        unit_suffix: Option<usize>,

        /// Payload file.
        file: PathBuf,
    },
    /// Remove known-bad entries from a persisted series file.
    Correct {
        /// Instrument name.
        #[arg(long)]
        name: String,

        /// Canonical date to drop, e.g. "Jan 26, 2016" (repeatable).
        #[arg(long = "date")]
        dates: Vec<String>,

        /// Raw key to drop, exactly as it appears in the file (repeatable).
        #[arg(long = "raw")]
        raws: Vec<String>,

        /// Path to a TOML run config, for the data directory.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Catalog to take corrections from when none are given.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output directory (overrides config).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List catalog instruments and their sources.
    Catalog {
        /// Path to a TOML instrument catalog. Defaults to the built-in catalog.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            catalog,
            only,
            overwrite,
            sequential,
            offline,
            raw_dir,
            data_dir,
            report,
            print,
        } => {
            let mut config = load_config(config.as_deref())?;
            if overwrite {
                config.overwrite = OverwritePolicy::all();
            }
            if sequential {
                config.parallel = false;
            }
            if offline {
                config.offline = true;
            }
            if let Some(dir) = raw_dir {
                config.raw_dir = dir;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            run_cmd(&config, catalog.as_deref(), &only, report.as_deref(), print)
        }
        Commands::Decode {
            format,
            date_format,
            unit_suffix,
            file,
        } => run_decode(format, date_format, unit_suffix, &file),
        Commands::Correct {
            name,
            dates,
            raws,
            config,
            catalog,
            data_dir,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            run_correct(&config, catalog.as_deref(), &name, &dates, raws)
        }
        Commands::Catalog { catalog } => run_list_catalog(catalog.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => Ok(RunConfig::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            Ok(RunConfig::from_file(Path::new(DEFAULT_CONFIG))?)
        }
        None => Ok(RunConfig::default()),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    Ok(match path {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::builtin()?,
    })
}

fn run_cmd(
    config: &RunConfig,
    catalog_path: Option<&Path>,
    only: &[String],
    report_path: Option<&Path>,
    print: bool,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let summary = run_catalog(config, &catalog, only, &StdoutProgress)?;

    if print {
        print_series(&summary)?;
    }

    if let Some(path) = report_path {
        let report = RunReport::from_summary(&summary)?;
        report.save(path)?;
        println!("Report saved to: {}", path.display());
    }

    if !summary.all_succeeded() {
        for (name, err) in summary.errors() {
            eprintln!("Error for {name}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn print_series(summary: &RunSummary) -> Result<()> {
    for run in &summary.runs {
        if let Ok(done) = &run.result {
            println!();
            println!("{}", run.name);
            println!("{}", to_persisted_json(&done.instrument.series)?);
        }
    }
    Ok(())
}

fn run_decode(
    format: SourceFormat,
    date_format: Option<DateFormat>,
    unit_suffix: Option<usize>,
    file: &Path,
) -> Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;

    let defaults = format.record_format();
    let record_format = RecordFormat {
        date: date_format.unwrap_or(defaults.date),
        unit_suffix: unit_suffix.map(UnitSuffix::Chars).or(defaults.unit_suffix),
    };

    let outcome = SeriesBuilder::new(record_format).build_payload(format, &payload)?;
    let report = &outcome.report;
    if report.rejected > 0 {
        warn!(
            "rejected {}/{} records: {}",
            report.rejected,
            report.total,
            report.sample_summary()
        );
    }

    println!("{}", to_persisted_json(&outcome.series)?);
    Ok(())
}

fn run_correct(
    config: &RunConfig,
    catalog_path: Option<&Path>,
    name: &str,
    dates: &[String],
    raws: Vec<String>,
) -> Result<()> {
    let mut corrections = CorrectionSet::new();
    for date in dates {
        let date = date
            .parse::<CanonicalDate>()
            .with_context(|| format!("--date '{date}' is not a canonical date"))?;
        corrections.insert(Correction::Date(date));
    }
    corrections.extend(raws.into_iter().map(Correction::Raw));

    if corrections.is_empty() {
        let catalog = load_catalog(catalog_path)?;
        let Some(spec) = catalog.get(name) else {
            bail!("'{name}' is not in the catalog; pass --date or --raw");
        };
        corrections = spec.correction_set();
        if corrections.is_empty() {
            bail!("'{name}' has no catalog corrections; pass --date or --raw");
        }
    }

    let sink = OutputSink::new(&config.data_dir, config.overwrite);
    let removed = sink.apply_corrections(name, &corrections)?;

    if removed.is_empty() {
        println!("Nothing to remove from {}", sink.path_for(name).display());
    } else {
        println!(
            "Removed {} entr{} from {}:",
            removed.len(),
            if removed.len() == 1 { "y" } else { "ies" },
            sink.path_for(name).display()
        );
        for key in &removed {
            println!("  {key:?}");
        }
    }
    Ok(())
}

fn run_list_catalog(catalog_path: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;

    println!("Instruments: {}", catalog.len());
    println!();
    println!("{:<56} {:<12} {:<28} Source", "Name", "Category", "Format");
    println!("{}", "-".repeat(120));
    for spec in &catalog.instruments {
        let source = match &spec.source {
            SourceSpec::File { .. } => {
                format!("file: {}", spec.raw_file_name().unwrap_or_default())
            }
            SourceSpec::Uitf { bank_id, fund_id } => {
                format!("uitf: bank {bank_id}, fund {fund_id}")
            }
        };
        let corrections = if spec.corrections.is_empty() {
            String::new()
        } else {
            format!(" [{} correction(s)]", spec.corrections.len())
        };
        println!(
            "{:<56} {:<12} {:<28} {source}{corrections}",
            spec.name,
            spec.category.as_str(),
            spec.format.as_str()
        );
    }
    Ok(())
}
