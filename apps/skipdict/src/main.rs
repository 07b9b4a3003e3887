use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use skipdict_config::{DriverConfig, load_or_default, save_config};
use skipdict_core::{DuplicatePolicy, SkipDict};
use skipdict_logging::{LogEntry, LogFormat, LogLevel, Logger};
use skipdict_stress::{StressReport, run_stress};

#[derive(Parser, Debug)]
#[command(name = "skipdict")]
#[command(about = "Exercise a skip list dictionary: stress workload, demo and config.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bulk-load random keys, then search, delete and reinsert them in rounds.
    Stress {
        /// YAML or JSON driver config. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Keys held throughout the run.
        #[arg(long)]
        sample_size: Option<usize>,
        #[arg(long)]
        rounds: Option<usize>,
        /// Draw keys from 0..KEY_SPACE.
        #[arg(long)]
        key_space: Option<u32>,
        /// Seed for the key stream.
        #[arg(long)]
        seed: Option<u64>,
        /// "allow_fifo" or "overwrite"
        #[arg(long)]
        policy: Option<DuplicatePolicy>,
        /// Skip the structural check after each phase.
        #[arg(long)]
        no_verify: bool,
        #[arg(long)]
        log_level: Option<LogLevel>,
        /// "plain", "json" or "compact"
        #[arg(long)]
        log_format: Option<LogFormat>,
        /// Print the report as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Insert, search, delete and destroy on a handful of keys.
    Demo {
        /// Seed for node levels.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Write the default driver config.
    InitConfig {
        /// Destination; `.json` writes JSON, anything else YAML.
        #[arg(long, default_value = "skipdict.yaml")]
        out: PathBuf,
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Stress {
            config,
            sample_size,
            rounds,
            key_space,
            seed,
            policy,
            no_verify,
            log_level,
            log_format,
            json,
        } => {
            let mut driver = load_or_default(config.as_deref())?;
            if let Some(n) = sample_size {
                driver.stress.sample_size = n;
            }
            if let Some(n) = rounds {
                driver.stress.rounds = n;
            }
            if let Some(n) = key_space {
                driver.stress.key_space = n;
            }
            if seed.is_some() {
                driver.stress.seed = seed;
            }
            if let Some(policy) = policy {
                driver.dict.duplicate_policy = policy;
            }
            if no_verify {
                driver.stress.verify = false;
            }
            if let Some(level) = log_level {
                driver.logging.level = level;
            }
            if let Some(format) = log_format {
                driver.logging.format = format;
            }
            stress(&driver, json)?;
        }

        Command::Demo { seed } => demo(seed)?,

        Command::InitConfig { out, force } => init_config(&out, force)?,
    }

    Ok(())
}

fn stress(driver: &DriverConfig, json: bool) -> Result<()> {
    let mut logger = Logger::to_writer(driver.logging.clone(), io::stderr());
    let report = run_stress(driver, &mut logger)?;

    let mut out = io::stdout().lock();
    if json {
        let text = serde_json::to_string_pretty(&report).context("serialize report")?;
        writeln!(out, "{text}")?;
    } else {
        print_summary(&mut out, &report)?;
    }

    if !report.is_clean() {
        logger.log(
            LogEntry::with_component(LogLevel::Error, "cli", "stress run found errors")
                .field("misses", report.total_misses()),
        )?;
        bail!(
            "stress run found {} errors (seed {}, policy {})",
            report.total_misses(),
            report.seed,
            report.policy
        );
    }
    Ok(())
}

fn print_summary(out: &mut impl Write, report: &StressReport) -> Result<()> {
    writeln!(out, "seed:        {}", report.seed)?;
    writeln!(out, "policy:      {}", report.policy)?;
    writeln!(
        out,
        "sample size: {} ({} inserted, {} overwritten)",
        report.sample_size, report.inserted, report.overwritten
    )?;
    for round in &report.rounds {
        writeln!(
            out,
            "round {}:     {} search misses, {} wrong values, {} delete misses, len {}, level {}",
            round.round, round.search_misses, round.wrong_values, round.delete_misses, round.len, round.level
        )?;
    }
    writeln!(
        out,
        "final:       len {}, level {}, {:.3} links/entry",
        report.final_stats.len,
        report.final_stats.level,
        report.final_stats.links_per_entry()
    )?;
    writeln!(out, "released:    {}", report.released)?;
    writeln!(out, "elapsed:     {} ms", report.elapsed_ms)?;
    writeln!(out, "result:      {}", if report.is_clean() { "ok" } else { "FAILED" })?;
    Ok(())
}

fn demo(seed: u64) -> Result<()> {
    let mut out = io::stdout().lock();
    let mut dict = SkipDict::seeded(DuplicatePolicy::Overwrite, seed);

    for key in [5, 1, 9, 3] {
        let added = dict.insert(key, key * 10)?;
        writeln!(out, "insert {key} -> {}", if added { "new" } else { "replaced" })?;
    }
    writeln!(out, "search 9 -> {}", describe(dict.search(&9)?))?;
    writeln!(out, "delete 1 -> {}", if dict.delete(&1)? { "removed" } else { "absent" })?;
    writeln!(out, "search 1 -> {}", describe(dict.search(&1)?))?;

    let keys: Vec<String> = dict.keys()?.map(ToString::to_string).collect();
    writeln!(out, "keys: [{}]", keys.join(", "))?;
    writeln!(out, "level: {}", dict.level()?)?;

    dict.verify()?;
    writeln!(out, "destroy -> released {}", dict.destroy())?;
    Ok(())
}

fn describe(value: Option<&i32>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "absent".to_string(),
    }
}

fn init_config(out: &Path, force: bool) -> Result<()> {
    if out.exists() && !force {
        bail!("{} already exists; pass --force to replace it", out.display());
    }
    save_config(&DriverConfig::default(), out)?;
    println!("wrote {}", out.display());
    Ok(())
}
