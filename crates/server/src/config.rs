use std::{collections::HashMap, fs, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use server_api::SimulatedLatency;
use storage::{SeedOptions, DEFAULT_ORG_COUNT};
use tracing::warn;

pub const SETTINGS_FILE: &str = "flags-server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub org_count: usize,
    pub seed: Option<u64>,
    pub read_delay_ms: u64,
    pub write_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let latency = SimulatedLatency::default();
        Self {
            server_bind: "127.0.0.1:4000".into(),
            org_count: DEFAULT_ORG_COUNT,
            seed: None,
            read_delay_ms: latency.read.as_millis() as u64,
            write_delay_ms: latency.write.as_millis() as u64,
        }
    }
}

impl Settings {
    pub fn seed_options(&self) -> SeedOptions {
        SeedOptions {
            org_count: self.org_count,
            seed: self.seed,
        }
    }

    pub fn latency(&self) -> SimulatedLatency {
        SimulatedLatency {
            read: Duration::from_millis(self.read_delay_ms),
            write: Duration::from_millis(self.write_delay_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    org_count: Option<usize>,
    seed: Option<u64>,
    read_delay_ms: Option<u64>,
    write_delay_ms: Option<u64>,
}

/// Defaults, then `flags-server.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file(&mut settings, &raw).with_context(|| format!("failed to parse {SETTINGS_FILE}"))?;
    }

    let env: HashMap<String, String> = std::env::vars().collect();
    apply_env(&mut settings, |name| env.get(name).cloned());

    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.org_count {
        settings.org_count = v;
    }
    if let Some(v) = file_cfg.seed {
        settings.seed = Some(v);
    }
    if let Some(v) = file_cfg.read_delay_ms {
        settings.read_delay_ms = v;
    }
    if let Some(v) = file_cfg.write_delay_ms {
        settings.write_delay_ms = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("FLAGS_SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = parse_env(&lookup, "APP__ORG_COUNT") {
        settings.org_count = v;
    }
    if let Some(v) = parse_env(&lookup, "APP__SEED") {
        settings.seed = Some(v);
    }
    if let Some(v) = parse_env(&lookup, "APP__READ_DELAY_MS") {
        settings.read_delay_ms = v;
    }
    if let Some(v) = parse_env(&lookup, "APP__WRITE_DELAY_MS") {
        settings.write_delay_ms = v;
    }
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
