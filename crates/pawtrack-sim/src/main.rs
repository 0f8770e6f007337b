//! pawtrack-sim - synthetic activity journals
//!
//! Usage:
//!   pawtrack-sim generate --scenario appetite-loss --subjects 3 > journal.jsonl
//!   pawtrack-sim detect --input journal.jsonl
//!   pawtrack-sim list

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pawtrack_core::DetectorConfig;
use pawtrack_sim::{JournalGenerator, Scenario, detect_journal, list_scenarios, read_journal};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "pawtrack-sim")]
#[command(about = "Synthetic pet activity journals with known anomalies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a generated journal as JSON lines
    Generate {
        /// Scenario shaping the journal
        #[arg(short, long, default_value = "steady")]
        scenario: String,

        /// Number of subjects, named `<prefix>-1`, `<prefix>-2`, ...
        #[arg(long, default_value = "1")]
        subjects: usize,

        /// Subject name prefix
        #[arg(long, default_value = "pet")]
        prefix: String,

        /// Half-window length in days; twice this many days are generated
        #[arg(long, default_value = "7")]
        window_days: u64,

        /// Last generated day (YYYY-MM-DD), defaults to today in UTC
        #[arg(long)]
        today: Option<NaiveDate>,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Relative standard deviation of each logged amount
        #[arg(long, default_value = "0.1")]
        noise: f64,
    },

    /// Read JSON lines and print one alert report per subject
    Detect {
        /// Journal file, stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Detector configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Evaluation day (YYYY-MM-DD), defaults to today in UTC
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Pretty-print each report
        #[arg(long)]
        pretty: bool,
    },

    /// List available scenarios
    List,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            scenario,
            subjects,
            prefix,
            window_days,
            today,
            seed,
            noise,
        } => run_generate(&scenario, subjects, &prefix, window_days, today, seed, noise),
        Commands::Detect {
            input,
            config,
            today,
            pretty,
        } => run_detect(input, config, today, pretty),
        Commands::List => {
            run_list();
            Ok(())
        }
    }
}

fn run_generate(
    scenario: &str,
    subjects: usize,
    prefix: &str,
    window_days: u64,
    today: Option<NaiveDate>,
    seed: u64,
    noise: f64,
) -> Result<(), Box<dyn Error>> {
    let scenario = Scenario::from_name(scenario)
        .ok_or_else(|| format!("Unknown scenario '{}', see `pawtrack-sim list`", scenario))?;
    if window_days == 0 {
        return Err("window-days must be at least 1".into());
    }
    let today = today.unwrap_or_else(|| Utc::now().date_naive());

    info!(
        scenario = scenario.name(),
        subjects,
        window_days,
        %today,
        seed,
        "Generating journal"
    );

    let mut generator = JournalGenerator::new(seed).with_noise(noise);
    let mut out = BufWriter::new(io::stdout().lock());
    let mut total = 0usize;

    for i in 1..=subjects {
        let subject_id = format!("{}-{}", prefix, i);
        for event in generator.generate(&subject_id, scenario, today, window_days) {
            serde_json::to_writer(&mut out, &event)?;
            out.write_all(b"\n")?;
            total += 1;
        }
    }
    out.flush()?;

    info!(events = total, "Journal written");
    Ok(())
}

fn run_detect(
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    today: Option<NaiveDate>,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    let config = match config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };

    let events = match input {
        Some(path) => read_journal(BufReader::new(File::open(path)?))?,
        None => read_journal(io::stdin().lock())?,
    };

    // an explicit day is evaluated as of its last second
    let now = match today {
        Some(day) => day
            .and_hms_opt(23, 59, 59)
            .map(|t| t.and_utc())
            .unwrap_or_else(Utc::now),
        None => Utc::now(),
    };

    let reports = detect_journal(events, &config, &now);
    let mut out = BufWriter::new(io::stdout().lock());
    for report in &reports {
        if pretty {
            serde_json::to_writer_pretty(&mut out, report)?;
        } else {
            serde_json::to_writer(&mut out, report)?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let alerts: usize = reports.iter().map(|r| r.alerts.len()).sum();
    info!(subjects = reports.len(), alerts, "Detection complete");
    Ok(())
}

fn run_list() {
    println!("Available scenarios:");
    for (name, description) in list_scenarios() {
        println!("  {:18} {}", name, description);
    }
    println!("\nUsage: pawtrack-sim generate --scenario <SCENARIO> | pawtrack-sim detect");
}
