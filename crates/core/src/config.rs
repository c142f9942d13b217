//! Layered configuration for the MMC market-making client.
//!
//! Configuration is loaded in layers with increasing priority:
//! 1. Compiled-in defaults
//! 2. TOML configuration file (if provided)
//! 3. Environment variable overrides (prefix `MMC_`, nested with `__`)
//!
//! The engine section models the exchange contract (price grid, throttle
//! behaviour, acknowledgement pacing); the sim section controls the driver
//! loop only.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Exchange-contract and engine parameters.
    pub engine: EngineConfig,
    /// Driver loop parameters.
    pub sim: SimConfig,
}

/// Engine parameters: the exchange contract as seen by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Highest quotable price; the grid is `1..=upper_price`.
    pub upper_price: i64,
    /// Probability that the rate window is closed on a fresh send attempt.
    pub throttle_closed_probability: f64,
    /// Upper bound on instructions dispatched per queue drain.
    pub max_drain_per_tick: u32,
    /// Upper bound on operations acknowledged per tick.
    pub max_acks_per_tick: u32,
    /// Live-order count beyond which finalised orders are disposed.
    pub order_gc_threshold: usize,
    /// Quote history length that triggers truncation.
    pub quote_history_limit: usize,
    /// Number of oldest quote operations removed per truncation.
    pub quote_history_truncate: usize,
}

/// Driver loop parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Number of ticks to run. `0` means run until interrupted.
    pub ticks: u64,
    /// Upper bound on generated actions per tick.
    pub max_actions_per_tick: u32,
    /// Print the price ladder after every tick.
    #[serde(default)]
    pub print_book: bool,
}

impl AppConfig {
    /// Load configuration using layered sources.
    ///
    /// 1. Compiled-in defaults.
    /// 2. TOML file at `config_path` (if `Some`).
    /// 3. Environment variable overrides with prefix `MMC_` and `__` as the
    ///    nesting separator (e.g., `MMC_ENGINE__UPPER_PRICE=15`).
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder()
            // ── Layer 1: compiled-in defaults ───────────────────────
            .set_default("engine.upper_price", 9i64)?
            .set_default("engine.throttle_closed_probability", 0.15)?
            .set_default("engine.max_drain_per_tick", 10i64)?
            .set_default("engine.max_acks_per_tick", 10i64)?
            .set_default("engine.order_gc_threshold", 1000i64)?
            .set_default("engine.quote_history_limit", 200i64)?
            .set_default("engine.quote_history_truncate", 150i64)?
            .set_default("sim.ticks", 500i64)?
            .set_default("sim.max_actions_per_tick", 10i64)?
            .set_default("sim.print_book", false)?;

        // ── Layer 2: TOML file ─────────────────────────────────────
        if let Some(path) = config_path {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            builder = builder.add_source(File::with_name(path_str).required(true));
        }

        // ── Layer 3: env var overrides (MMC_ prefix) ───────────────
        // The prefix separator must be set explicitly to `_` because the
        // `config` crate defaults it to the nesting separator when one is
        // provided.
        builder = builder.add_source(
            Environment::with_prefix("MMC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: AppConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate configuration invariants.
    fn validate(&self) -> Result<()> {
        let e = &self.engine;
        if e.upper_price < 2 {
            bail!("engine.upper_price must be at least 2 (a quote needs bid < ask)");
        }
        if !(0.0..=1.0).contains(&e.throttle_closed_probability) {
            bail!("engine.throttle_closed_probability must be within [0, 1]");
        }
        if e.quote_history_truncate >= e.quote_history_limit {
            bail!("engine.quote_history_truncate must be below engine.quote_history_limit");
        }
        if self.sim.max_actions_per_tick == 0 {
            bail!("sim.max_actions_per_tick must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Global mutex to serialize tests that manipulate environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn clear_env() {
        std::env::remove_var("MMC_ENGINE__UPPER_PRICE");
        std::env::remove_var("MMC_ENGINE__THROTTLE_CLOSED_PROBABILITY");
        std::env::remove_var("MMC_SIM__TICKS");
    }

    /// Helper: create a temporary TOML config file and return its path.
    fn write_temp_toml(content: &str) -> (tempfile::NamedTempFile, PathBuf) {
        let mut f = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp file");
        write!(f, "{}", content).expect("write temp file");
        let path = f.path().to_path_buf();
        (f, path)
    }

    #[test]
    fn test_load_defaults_only() {
        let _lock = lock_env();
        clear_env();

        let cfg = AppConfig::load(None).expect("load defaults");
        assert_eq!(cfg.engine.upper_price, 9);
        assert!((cfg.engine.throttle_closed_probability - 0.15).abs() < 1e-12);
        assert_eq!(cfg.engine.max_drain_per_tick, 10);
        assert_eq!(cfg.engine.max_acks_per_tick, 10);
        assert_eq!(cfg.engine.order_gc_threshold, 1000);
        assert_eq!(cfg.engine.quote_history_limit, 200);
        assert_eq!(cfg.engine.quote_history_truncate, 150);
        assert_eq!(cfg.sim.ticks, 500);
        assert_eq!(cfg.sim.max_actions_per_tick, 10);
        assert!(!cfg.sim.print_book);
    }

    #[test]
    fn test_load_from_toml() {
        let _lock = lock_env();
        clear_env();

        let toml_content = r#"
[engine]
upper_price = 15
throttle_closed_probability = 0.30

[sim]
ticks = 100
print_book = true
"#;
        let (_f, path) = write_temp_toml(toml_content);
        let cfg = AppConfig::load(Some(path)).expect("load from toml");

        assert_eq!(cfg.engine.upper_price, 15);
        assert!((cfg.engine.throttle_closed_probability - 0.30).abs() < 1e-12);
        assert_eq!(cfg.sim.ticks, 100);
        assert!(cfg.sim.print_book);
        // Untouched keys keep their defaults.
        assert_eq!(cfg.engine.max_drain_per_tick, 10);
    }

    #[test]
    fn test_env_var_overrides() {
        let _lock = lock_env();
        clear_env();
        std::env::set_var("MMC_ENGINE__UPPER_PRICE", "21");

        let cfg = AppConfig::load(None).expect("load with env override");
        assert_eq!(cfg.engine.upper_price, 21);

        clear_env();
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let _lock = lock_env();
        clear_env();

        let toml_content = r#"
[engine]
throttle_closed_probability = 1.5
"#;
        let (_f, path) = write_temp_toml(toml_content);
        let result = AppConfig::load(Some(path));
        assert!(result.is_err());
        let msg = format!("{}", result.unwrap_err());
        assert!(msg.contains("throttle_closed_probability"));
    }

    #[test]
    fn test_invalid_truncation_rejected() {
        let _lock = lock_env();
        clear_env();

        let toml_content = r#"
[engine]
quote_history_limit = 100
quote_history_truncate = 100
"#;
        let (_f, path) = write_temp_toml(toml_content);
        assert!(AppConfig::load(Some(path)).is_err());
    }

    #[test]
    fn test_upper_price_too_small_rejected() {
        let _lock = lock_env();
        clear_env();

        let toml_content = r#"
[engine]
upper_price = 1
"#;
        let (_f, path) = write_temp_toml(toml_content);
        assert!(AppConfig::load(Some(path)).is_err());
    }
}
