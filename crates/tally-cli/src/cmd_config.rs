use clap::Subcommand;
use std::path::Path;
use tally_store::{paths::write_atomic, TallyConfig, TallyPaths};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (source, api_url, api_token, timeout_secs)
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

const KNOWN_KEYS: [&str; 4] = ["source", "api_url", "api_token", "timeout_secs"];

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    let paths = TallyPaths::discover(repo_root);
    let out = match cmd {
        ConfigCmd::Set { key, value } => set(&paths, &key, &value)?,
        ConfigCmd::Get { key } => get(&paths, &key)?,
        ConfigCmd::List => list(&paths)?,
    };
    print!("{out}");
    Ok(())
}

// ── Command Implementations ──

type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// The raw key/value map in `.tally/config.json`; empty when the file is absent.
fn read_config(paths: &TallyPaths) -> anyhow::Result<ConfigMap> {
    let content = match std::fs::read_to_string(&paths.config_json) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigMap::new()),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str(&content)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} is not a JSON object", paths.config_json.display()),
    }
}

/// Numbers stay numbers for numeric keys; everything else is stored as text.
fn parse_value(key: &str, s: &str) -> serde_json::Value {
    match key {
        "timeout_secs" => match s.parse::<u64>() {
            Ok(n) => serde_json::Value::Number(n.into()),
            Err(_) => serde_json::Value::String(s.to_string()),
        },
        _ => serde_json::Value::String(s.to_string()),
    }
}

/// `tally config set <key> <value>`
pub fn set(paths: &TallyPaths, key: &str, value: &str) -> anyhow::Result<String> {
    if !KNOWN_KEYS.contains(&key) {
        anyhow::bail!("unknown config key '{key}' (known: {})", KNOWN_KEYS.join(", "));
    }
    let mut config = read_config(paths)?;
    config.insert(key.to_string(), parse_value(key, value));
    let json = serde_json::to_string_pretty(&config)?;
    // Reject values the loader would refuse before they reach disk.
    TallyConfig::from_json(&json)?;
    write_atomic(&paths.config_json, json.as_bytes())?;
    Ok(format!("{key} = {value}\n"))
}

/// `tally config get <key>`
pub fn get(paths: &TallyPaths, key: &str) -> anyhow::Result<String> {
    let config = read_config(paths)?;
    Ok(match config.get(key) {
        Some(val) => format!("{val}\n"),
        None => "(not set)\n".to_string(),
    })
}

/// `tally config list`
pub fn list(paths: &TallyPaths) -> anyhow::Result<String> {
    let config = read_config(paths)?;
    if config.is_empty() {
        return Ok("(no config set)\n".to_string());
    }
    let mut out = String::new();
    for (k, v) in &config {
        out.push_str(&format!("{k} = {v}\n"));
    }
    Ok(out)
}
