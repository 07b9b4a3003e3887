//! Stress workload for a skip list dictionary.
//!
//! The run mirrors the classic acceptance driver: bulk-insert
//! `sample_size` random keys bound to themselves, then for each round
//! search every key and check its value, delete each key and reinsert a
//! fresh random one in its slot. The dictionary is destroyed at the end.
//! Every miss is counted rather than aborting, so a report shows the whole
//! picture; a failed structural check does abort.

use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use skipdict_config::DriverConfig;
use skipdict_core::{DictStats, DuplicatePolicy, SkipDict};
use skipdict_logging::{LogEntry, LogLevel, LogSink, Logger};

const COMPONENT: &str = "stress";

/// Counters for one search-then-churn round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: usize,
    pub search_misses: usize,
    pub wrong_values: usize,
    pub delete_misses: usize,
    /// Dictionary size after the round.
    pub len: usize,
    pub level: usize,
}

impl RoundReport {
    pub fn is_clean(&self) -> bool {
        self.search_misses == 0 && self.wrong_values == 0 && self.delete_misses == 0
    }
}

/// Outcome of a whole stress run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressReport {
    /// Seed of the key stream; rerunning with it reproduces the run.
    pub seed: u64,
    pub policy: DuplicatePolicy,
    pub sample_size: usize,
    /// Bulk-load inserts that linked a new node.
    pub inserted: usize,
    /// Bulk-load inserts that replaced an existing value.
    pub overwritten: usize,
    pub rounds: Vec<RoundReport>,
    /// Shape just before teardown.
    pub final_stats: DictStats,
    /// Entries released by the final destroy.
    pub released: usize,
    pub elapsed_ms: u64,
}

impl StressReport {
    /// No misses, no wrong values, and teardown released every entry.
    pub fn is_clean(&self) -> bool {
        self.rounds.iter().all(RoundReport::is_clean) && self.released == self.final_stats.len
    }

    pub fn total_misses(&self) -> usize {
        self.rounds
            .iter()
            .map(|r| r.search_misses + r.wrong_values + r.delete_misses)
            .sum()
    }
}

struct Workload {
    rng: StdRng,
    key_space: u32,
}

impl Workload {
    fn next_key(&mut self) -> i32 {
        let key = self.rng.random_range(0..self.key_space);
        // key_space is validated to fit in i32
        key as i32
    }
}

/// Run the workload described by `config`, logging each phase.
pub fn run_stress<S: LogSink>(config: &DriverConfig, logger: &mut Logger<S>) -> Result<StressReport> {
    config.validate().context("stress config")?;
    let started = Instant::now();

    let stress = &config.stress;
    let seed = stress.seed.unwrap_or_else(rand::random);
    let mut options = config.dict.clone();
    if options.seed.is_none() {
        options.seed = Some(seed.wrapping_add(1));
    }
    let policy = options.duplicate_policy;

    let mut dict: SkipDict<i32, i32> = SkipDict::with_options(&options).context("build dictionary")?;
    let mut work = Workload {
        rng: StdRng::seed_from_u64(seed),
        key_space: stress.key_space,
    };

    logger.log(
        LogEntry::with_component(LogLevel::Info, COMPONENT, "starting stress run")
            .field("seed", seed)
            .field("sample_size", stress.sample_size)
            .field("rounds", stress.rounds)
            .field("policy", policy.to_string()),
    )?;

    let mut keys = Vec::with_capacity(stress.sample_size);
    let mut inserted = 0;
    for _ in 0..stress.sample_size {
        let key = work.next_key();
        if dict.insert(key, key).context("bulk insert")? {
            inserted += 1;
        }
        keys.push(key);
    }
    let overwritten = stress.sample_size - inserted;
    if stress.verify {
        dict.verify().context("verify after bulk insert")?;
    }
    logger.log(
        LogEntry::with_component(LogLevel::Info, COMPONENT, "bulk insert complete")
            .field("inserted", inserted)
            .field("overwritten", overwritten)
            .field("level", dict.level()?),
    )?;

    let mut rounds = Vec::with_capacity(stress.rounds);
    for round in 0..stress.rounds {
        let report = run_round(&mut dict, &mut keys, &mut work, round, logger)?;
        if stress.verify {
            dict.verify().with_context(|| format!("verify after round {round}"))?;
        }
        let level = if report.is_clean() { LogLevel::Info } else { LogLevel::Warn };
        logger.log(
            LogEntry::with_component(level, COMPONENT, "round complete")
                .field("round", round)
                .field("search_misses", report.search_misses)
                .field("wrong_values", report.wrong_values)
                .field("delete_misses", report.delete_misses)
                .field("len", report.len)
                .field("level", report.level),
        )?;
        rounds.push(report);
    }

    let final_stats = dict.stats()?;
    let released = dict.destroy();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    logger.log(
        LogEntry::with_component(LogLevel::Info, COMPONENT, "dictionary destroyed")
            .field("released", released)
            .field("elapsed_ms", elapsed_ms),
    )?;

    Ok(StressReport {
        seed,
        policy,
        sample_size: stress.sample_size,
        inserted,
        overwritten,
        rounds,
        final_stats,
        released,
        elapsed_ms,
    })
}

fn run_round<S: LogSink>(
    dict: &mut SkipDict<i32, i32>,
    keys: &mut [i32],
    work: &mut Workload,
    round: usize,
    logger: &mut Logger<S>,
) -> Result<RoundReport> {
    let mut report = RoundReport {
        round,
        ..RoundReport::default()
    };

    for (index, &key) in keys.iter().enumerate() {
        match dict.search(&key)? {
            None => {
                report.search_misses += 1;
                logger.log(
                    LogEntry::with_component(LogLevel::Debug, COMPONENT, "search miss")
                        .field("round", round)
                        .field("index", index)
                        .field("key", key),
                )?;
            }
            Some(&value) if value != key => {
                report.wrong_values += 1;
                logger.log(
                    LogEntry::with_component(LogLevel::Debug, COMPONENT, "search returned wrong value")
                        .field("round", round)
                        .field("key", key)
                        .field("value", value),
                )?;
            }
            Some(_) => {}
        }
    }

    for (index, slot) in keys.iter_mut().enumerate() {
        if !dict.delete(slot)? {
            report.delete_misses += 1;
            logger.log(
                LogEntry::with_component(LogLevel::Debug, COMPONENT, "delete miss")
                    .field("round", round)
                    .field("index", index)
                    .field("key", *slot),
            )?;
        }
        let key = work.next_key();
        dict.insert(key, key)?;
        *slot = key;
    }

    report.len = dict.len()?;
    report.level = dict.level()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skipdict_config::StressConfig;
    use skipdict_core::MAX_LEVEL;
    use skipdict_logging::{LogCollector, LoggingConfig};

    fn small_config(policy: DuplicatePolicy, key_space: u32) -> DriverConfig {
        let mut config = DriverConfig {
            stress: StressConfig {
                sample_size: 512,
                rounds: 3,
                key_space,
                seed: Some(7),
                verify: true,
            },
            ..DriverConfig::default()
        };
        config.dict.duplicate_policy = policy;
        config
    }

    fn collecting(level: LogLevel) -> Logger<LogCollector> {
        Logger::new(LoggingConfig::new().with_level(level), LogCollector::new())
    }

    #[test]
    fn fifo_run_is_clean() {
        let config = small_config(DuplicatePolicy::AllowFifo, skipdict_config::DEFAULT_KEY_SPACE);
        let report = run_stress(&config, &mut collecting(LogLevel::Info)).unwrap();

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.inserted, 512);
        assert_eq!(report.rounds.len(), 3);
        assert_eq!(report.final_stats.len, 512);
        assert_eq!(report.released, 512);
        assert!(report.rounds.iter().all(|r| r.len == 512));
    }

    #[test]
    fn default_bulk_run_is_clean() {
        let mut config = DriverConfig::default();
        config.stress.seed = Some(0x5EED);
        assert_eq!(config.stress.sample_size, 65_536);
        assert_eq!(config.stress.rounds, 4);
        assert!(config.stress.verify);

        let report = run_stress(&config, &mut collecting(LogLevel::Info)).unwrap();

        assert!(report.is_clean(), "{:?}", report.rounds);
        assert_eq!(report.rounds.len(), 4);
        assert!(report.rounds.iter().all(|r| r.len == 65_536 && r.level <= MAX_LEVEL));
        assert_eq!(report.final_stats.len, 65_536);
        assert!(report.final_stats.level <= MAX_LEVEL);
        assert_eq!(report.released, 65_536);
    }

    #[test]
    fn fifo_run_with_colliding_keys_is_clean() {
        let config = small_config(DuplicatePolicy::AllowFifo, 16);
        let report = run_stress(&config, &mut collecting(LogLevel::Info)).unwrap();

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.inserted, 512);
        assert_eq!(report.final_stats.len, 512);
    }

    #[test]
    fn overwrite_run_with_colliding_keys_reports_delete_misses() {
        let config = small_config(DuplicatePolicy::Overwrite, 16);
        let mut logger = collecting(LogLevel::Debug);
        let report = run_stress(&config, &mut logger).unwrap();

        assert!(report.overwritten > 0);
        assert!(!report.is_clean());
        assert!(report.rounds.iter().any(|r| r.delete_misses > 0));
        assert!(report.final_stats.len <= 16);

        let collector = logger.into_sink();
        assert!(!collector.filter_by_level(LogLevel::Debug).is_empty());
        assert!(!collector.filter_by_level(LogLevel::Warn).is_empty());
    }

    #[test]
    fn same_seed_reproduces_run() {
        let config = small_config(DuplicatePolicy::AllowFifo, 1000);
        let first = run_stress(&config, &mut collecting(LogLevel::Error)).unwrap();
        let second = run_stress(&config, &mut collecting(LogLevel::Error)).unwrap();

        assert_eq!(first.seed, second.seed);
        assert_eq!(first.rounds, second.rounds);
        assert_eq!(first.final_stats, second.final_stats);
    }

    #[test]
    fn logs_each_phase() {
        let config = small_config(DuplicatePolicy::AllowFifo, skipdict_config::DEFAULT_KEY_SPACE);
        let mut logger = collecting(LogLevel::Info);
        run_stress(&config, &mut logger).unwrap();

        let collector = logger.into_sink();
        let messages: Vec<&str> = collector
            .filter_by_component("stress")
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(messages.first(), Some(&"starting stress run"));
        assert_eq!(messages.iter().filter(|m| **m == "round complete").count(), 3);
        assert_eq!(messages.last(), Some(&"dictionary destroyed"));
    }

    #[test]
    fn zero_rounds_only_loads_and_destroys() {
        let mut config = small_config(DuplicatePolicy::AllowFifo, skipdict_config::DEFAULT_KEY_SPACE);
        config.stress.rounds = 0;
        let report = run_stress(&config, &mut collecting(LogLevel::Info)).unwrap();

        assert!(report.rounds.is_empty());
        assert_eq!(report.released, 512);
        assert!(report.is_clean());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = small_config(DuplicatePolicy::AllowFifo, 16);
        config.stress.sample_size = 0;
        let err = run_stress(&config, &mut collecting(LogLevel::Info)).unwrap_err();
        assert!(format!("{err:#}").contains("sample_size"));
    }

    #[test]
    fn report_serializes_to_json() {
        let config = small_config(DuplicatePolicy::AllowFifo, 1000);
        let report = run_stress(&config, &mut collecting(LogLevel::Error)).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["seed"], 7);
        assert_eq!(json["policy"], "allow_fifo");
        assert_eq!(json["rounds"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["final_stats"]["len"], 512);
    }
}
