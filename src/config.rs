use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_VAR: &str = "COURIER_CONFIG";
pub const PORT_VAR: &str = "COURIER_PORT";
pub const BACKLOG_VAR: &str = "COURIER_BACKLOG";

/// Largest accepted `parser.growth_factor`.
pub const MAX_GROWTH_FACTOR: f64 = 16.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub parser: ParserConfig,
}

/// Listening socket settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port bound on all IPv4 interfaces.
    pub port: u16,
    /// Pending connections the kernel queues before `accept`.
    pub backlog: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            backlog: 1024,
        }
    }
}

/// Request parse buffer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Bytes allocated for the parse buffer before the first read.
    pub initial_capacity: usize,
    /// Multiplier applied to the buffer capacity each time a read fills it.
    pub growth_factor: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1600,
            growth_factor: 1.95,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Loads configuration using `lookup` to resolve environment variables.
    ///
    /// The YAML file named by `COURIER_CONFIG` (if any) is read first, then
    /// `COURIER_PORT` and `COURIER_BACKLOG` override the listening settings.
    pub fn load_from<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_yaml(&raw).with_context(|| format!("parsing config file {path}"))?
            }
            None => Self::default(),
        };

        if let Some(port) = lookup(PORT_VAR) {
            cfg.server.port = port
                .parse()
                .with_context(|| format!("invalid {PORT_VAR}: {port:?}"))?;
        }
        if let Some(backlog) = lookup(BACKLOG_VAR) {
            cfg.server.backlog = backlog
                .parse()
                .with_context(|| format!("invalid {BACKLOG_VAR}: {backlog:?}"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a YAML document. Missing sections and fields take defaults.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.server.backlog >= 1, "server.backlog must be at least 1");
        ensure!(
            self.parser.initial_capacity >= 1,
            "parser.initial_capacity must be at least 1"
        );
        ensure!(
            self.parser.growth_factor.is_finite()
                && self.parser.growth_factor > 1.0
                && self.parser.growth_factor <= MAX_GROWTH_FACTOR,
            "parser.growth_factor must be in (1.0, {MAX_GROWTH_FACTOR}], got {}",
            self.parser.growth_factor
        );
        Ok(())
    }
}
