use albumart_core::{ClientConfig, DatasetConfig};
use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Keys whose values are never echoed back by `config get/list`
const SECRET_KEYS: &[&str] = &["client.client_secret"];

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub color_enabled: bool,
    pub progress_enabled: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color_enabled: true,
            progress_enabled: true,
        }
    }
}

/// Values given on the command line, applied over every other layer
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub concurrency: Option<usize>,
    pub artist_column: Option<usize>,
    pub track_column: Option<usize>,
    pub column_label: Option<String>,
}

impl AppConfig {
    /// Apply CLI argument overrides to the configuration
    pub fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(client_id) = &overrides.client_id {
            self.client.client_id = Some(client_id.clone());
        }
        if let Some(client_secret) = &overrides.client_secret {
            self.client.client_secret = Some(client_secret.clone());
        }
        if let Some(concurrency) = overrides.concurrency {
            self.client.max_concurrent_rows = concurrency;
        }
        if let Some(column) = overrides.artist_column {
            self.dataset.artist_column = column;
        }
        if let Some(column) = overrides.track_column {
            self.dataset.track_column = column;
        }
        if let Some(label) = &overrides.column_label {
            self.dataset.column_label = label.clone();
        }
    }
}

/// Configuration manager that handles XDG-compliant paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new ConfigManager with default XDG-compliant paths
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    fn default_config_path() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return PathBuf::from(xdg_config).join("albumart/config.toml");
        }

        #[cfg(target_os = "linux")]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config/albumart/config.toml")
        }

        #[cfg(not(target_os = "linux"))]
        {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("albumart")
                .join("config.toml")
        }
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    ///
    /// CLI flags are applied afterwards with [`AppConfig::apply_cli_overrides`].
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment = figment.merge(Env::prefixed("ALBUMART_").split("__"));

        figment.extract().context("Failed to load configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = self.load_as_toml()?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        let rendered = render_scalar(current)
            .ok_or_else(|| anyhow::anyhow!("Value at '{}' is not a simple type", key))?;
        Ok(mask_secret(key, rendered))
    }

    /// Set a configuration value by key (dot notation)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.validate_config_value(key, value)?;

        let mut config = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, sections)) = parts.split_last() else {
            anyhow::bail!("Empty key");
        };

        let mut current = &mut config;
        for part in sections {
            let toml::Value::Table(table) = current else {
                anyhow::bail!("Invalid key path: expected table at '{}'", part);
            };
            current = table
                .entry(part.to_string())
                .or_insert(toml::Value::Table(toml::map::Map::new()));
        }

        let toml::Value::Table(table) = current else {
            anyhow::bail!("Cannot set value on non-table");
        };
        table.insert(last.to_string(), self.parse_config_value(key, value)?);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(&self.config_path, toml_string)?;

        Ok(())
    }

    /// List all configuration values
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = self.load_as_toml()?;

        let mut items = Vec::new();
        Self::collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items
            .into_iter()
            .map(|(key, value)| {
                let value = mask_secret(&key, value);
                (key, value)
            })
            .collect())
    }

    fn load_as_toml(&self) -> Result<toml::Value> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        Ok(toml::from_str(&toml_string)?)
    }

    /// Recursively collect all key-value pairs from TOML
    fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
        if let toml::Value::Table(table) = value {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                Self::collect_values(val, new_prefix, items);
            }
        } else if let Some(rendered) = render_scalar(value) {
            items.push((prefix, rendered));
        }
    }

    /// Validate a configuration value
    fn validate_config_value(&self, key: &str, value: &str) -> Result<()> {
        match key {
            "client.client_id" | "client.client_secret" => {
                if value.trim().is_empty() {
                    anyhow::bail!("{} must not be empty", key);
                }
            }
            "client.token_url" | "client.search_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    anyhow::bail!("{} must be an http(s) URL", key);
                }
            }
            "client.request_timeout_seconds" => {
                let timeout: u64 = value
                    .parse()
                    .context("request_timeout_seconds must be a positive integer")?;
                if timeout == 0 {
                    anyhow::bail!("request_timeout_seconds must be greater than 0");
                }
            }
            "client.max_concurrent_rows" => {
                let rows: usize = value
                    .parse()
                    .context("max_concurrent_rows must be a positive integer")?;
                if rows == 0 {
                    anyhow::bail!("max_concurrent_rows must be greater than 0");
                }
            }
            "dataset.artist_column" | "dataset.track_column" => {
                let _: usize = value
                    .parse()
                    .context("Column index must be a non-negative integer")?;
            }
            "dataset.column_label" => {
                if value.is_empty() {
                    anyhow::bail!("column_label must not be empty");
                }
            }
            "output.color_enabled" | "output.progress_enabled" => {
                let _: bool = value.parse().context("Value must be 'true' or 'false'")?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Parse a value to the appropriate TOML type
    fn parse_config_value(&self, key: &str, value: &str) -> Result<toml::Value> {
        match key {
            k if k.ends_with("_seconds") || k.ends_with("_rows") || k.ends_with("_column") => {
                let num: i64 = value.parse().context("Expected integer value")?;
                Ok(toml::Value::Integer(num))
            }
            k if k.ends_with("_enabled") => {
                let bool_val: bool = value
                    .parse()
                    .context("Expected boolean value (true/false)")?;
                Ok(toml::Value::Boolean(bool_val))
            }
            // Ids, secrets and labels can look numeric but are strings
            k if k.starts_with("client.") || k == "dataset.column_label" => {
                Ok(toml::Value::String(value.to_string()))
            }
            _ => {
                if let Ok(b) = value.parse::<bool>() {
                    Ok(toml::Value::Boolean(b))
                } else if let Ok(i) = value.parse::<i64>() {
                    Ok(toml::Value::Integer(i))
                } else {
                    Ok(toml::Value::String(value.to_string()))
                }
            }
        }
    }
}

fn render_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn mask_secret(key: &str, value: String) -> String {
    if SECRET_KEYS.contains(&key) && !value.is_empty() {
        "********".to_string()
    } else {
        value
    }
}

/// Load configuration from the default location
pub fn get_config() -> Result<AppConfig> {
    ConfigManager::new().load()
}

/// Interactive setup wizard for the catalog client credentials
pub async fn interactive_init(force: bool) -> Result<()> {
    println!("{}", "Album Art Setup".bold());
    println!("{}", "===============".bold());
    println!();

    let mut config_mgr = ConfigManager::new();
    let current = config_mgr.load().ok();

    let configured = current
        .as_ref()
        .map(|c| c.client.client_id.is_some() && c.client.client_secret.is_some())
        .unwrap_or(false);

    if !force && configured {
        let reconfigure = Confirm::new()
            .with_prompt("Configuration already exists. Reconfigure?")
            .default(false)
            .interact()
            .context("Failed to read input")?;

        if !reconfigure {
            println!("Setup cancelled.");
            return Ok(());
        }
    }

    println!("This tool requires a registered application on the catalog's");
    println!("developer dashboard (client id and client secret).");
    println!();

    let default_id = current.as_ref().and_then(|c| c.client.client_id.clone());
    let client_id: String = match default_id {
        Some(existing) => Input::new()
            .with_prompt("Client id")
            .default(existing)
            .interact_text()
            .context("Failed to read client id")?,
        None => Input::new()
            .with_prompt("Client id")
            .interact_text()
            .context("Failed to read client id")?,
    };

    let client_secret = Password::new()
        .with_prompt("Client secret")
        .interact()
        .context("Failed to read client secret")?;

    config_mgr.set("client.client_id", &client_id)?;
    config_mgr.set("client.client_secret", &client_secret)?;

    println!();
    println!("{}", "✓ Configuration saved".green());
    println!(
        "Config file: {}",
        config_mgr.get_config_path().display()
    );
    println!();
    println!("You can now use:");
    println!("  albumart enrich <input.csv> <output.csv>");

    Ok(())
}
