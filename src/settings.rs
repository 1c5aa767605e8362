use clap::Args;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Prefix of the nested environment overrides, e.g. `HARBOR_MCP_SERVER__PORT`
const ENV_PREFIX: &str = "HARBOR_MCP";

/// Environment variable naming a config file when `--config` is not given
pub const CONFIG_FILE_ENV: &str = "HARBOR_MCP_CONFIG";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub harbor: HarborSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HarborSettings {
    /// Base URL of the registry, with or without the `/api/v2.0` suffix
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Skip TLS certificate verification for the registry
    #[serde(default)]
    pub insecure: bool,
}

/// Bind address of the SSE transport
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Command-line overrides, applied last
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsOverrides {
    /// Path to a TOML or YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Harbor URL (e.g. https://harbor.example.com)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Harbor username
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Harbor password
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Skip TLS certificate verification for the registry
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Host to bind the SSE transport to
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind the SSE transport to
    #[arg(long, global = true)]
    pub port: Option<u16>,
}

impl Settings {
    /// Load settings from the config file, the process environment and `overrides`
    pub fn new(overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::load(overrides, &vars)
    }

    /// Layering, lowest precedence first: config file (`--config` or
    /// `HARBOR_MCP_CONFIG`), `HARBOR_MCP_*` variables,
    /// `HARBOR_URL`/`HARBOR_USERNAME`/`HARBOR_PASSWORD`, command-line flags.
    pub fn load(
        overrides: &SettingsOverrides,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_file = overrides
            .config
            .clone()
            .or_else(|| vars.get(CONFIG_FILE_ENV).map(PathBuf::from));
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::Message(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            tracing::info!("Loading config file: {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        // The config file variable shares the prefix but is not a setting
        let mut prefixed = vars.clone();
        prefixed.remove(CONFIG_FILE_ENV);
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(Some(prefixed.into_iter().collect())),
        );

        let config = builder.build()?;

        // Deserialize and collect unused fields
        let mut unused_fields = Vec::new();
        let mut settings: Settings = serde_ignored::deserialize(config, |path| {
            unused_fields.push(path.to_string());
        })
        .map_err(|e| ConfigError::Message(format!("Failed to deserialize settings: {}", e)))?;

        for field in &unused_fields {
            tracing::warn!("Unknown configuration field: {}", field);
        }

        // Conventional variables take precedence over the file and HARBOR_MCP_HARBOR__*
        let conventional = [
            ("HARBOR_URL", &mut settings.harbor.url),
            ("HARBOR_USERNAME", &mut settings.harbor.username),
            ("HARBOR_PASSWORD", &mut settings.harbor.password),
        ];
        for (name, target) in conventional {
            if let Some(value) = vars.get(name).filter(|v| !v.is_empty()) {
                *target = value.clone();
            }
        }

        settings.apply(overrides);
        settings.validate()?;

        Ok(settings)
    }

    fn apply(&mut self, overrides: &SettingsOverrides) {
        if let Some(url) = &overrides.url {
            self.harbor.url = url.clone();
        }
        if let Some(username) = &overrides.username {
            self.harbor.username = username.clone();
        }
        if let Some(password) = &overrides.password {
            self.harbor.password = password.clone();
        }
        if overrides.insecure {
            self.harbor.insecure = true;
        }
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("url", &self.harbor.url, "HARBOR_URL", "--url"),
            ("username", &self.harbor.username, "HARBOR_USERNAME", "--username"),
            ("password", &self.harbor.password, "HARBOR_PASSWORD", "--password"),
        ];
        for (field, value, var, flag) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Harbor {} not configured. Set {} environment variable, pass {} or set [harbor] {} in config",
                    field, var, flag, field
                )));
            }
        }

        if !self.harbor.url.starts_with("http://") && !self.harbor.url.starts_with("https://") {
            return Err(ConfigError::Message(format!(
                "Harbor url must start with http:// or https://, got '{}'",
                self.harbor.url
            )));
        }

        Ok(())
    }
}
