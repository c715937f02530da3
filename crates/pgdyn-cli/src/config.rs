use serde::Deserialize;
use std::path::Path;

use pgdyn::DatabaseConfig;

use crate::cli::{ConnectArgs, DEFAULT_CONFIG};

/// Contents of `pgdyn.toml`.
///
/// ```toml
/// version = "1"
///
/// [database]
/// url = "${DATABASE_URL}"
/// # or discrete settings:
/// # host = "127.0.0.1"
/// # port = 5432
/// # user = "postgres"
/// # password = "${PGPASSWORD}"
/// # dbname = "app"
/// # sslmode = "disable"
/// # connect_timeout_secs = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub database: DatabaseConfig,
}

fn default_version() -> String {
    "1".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: DatabaseConfig::default(),
        }
    }
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.expand_env()?;
        file.validate()?;
        Ok(file)
    }

    fn expand_env(&mut self) -> anyhow::Result<()> {
        let db = &mut self.database;
        if let Some(url) = db.url.as_mut() {
            *url = expand_env_vars(url)?;
        }
        for s in [
            &mut db.host,
            &mut db.user,
            &mut db.password,
            &mut db.dbname,
            &mut db.sslmode,
        ] {
            *s = expand_env_vars(s)?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        self.database.to_pg_config()?;
        Ok(())
    }
}

/// Resolve the database settings for a command.
///
/// Precedence: `--database`, then `database.url` from the config file, then
/// `DATABASE_URL`, then the discrete `[database]` fields (or their defaults).
/// An explicit `--config` must exist; the default `pgdyn.toml` may be absent.
pub fn resolve(args: &ConnectArgs) -> anyhow::Result<DatabaseConfig> {
    let mut file = match &args.config {
        Some(path) => load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => load(Path::new(DEFAULT_CONFIG))?,
        None => ConfigFile::default(),
    };

    let env_url = std::env::var("DATABASE_URL").ok();
    apply_overrides(&mut file.database, args.database.as_deref(), env_url.as_deref());
    Ok(file.database)
}

fn load(path: &Path) -> anyhow::Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    ConfigFile::parse(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e:#}", path.display()))
}

fn apply_overrides(db: &mut DatabaseConfig, flag: Option<&str>, env_url: Option<&str>) {
    let non_empty = |s: &&str| !s.trim().is_empty();
    if let Some(url) = flag.filter(non_empty) {
        db.url = Some(url.to_string());
    } else if db.url.as_deref().filter(non_empty).is_none() {
        db.url = env_url.filter(non_empty).map(str::to_string);
    }
}

/// Replace `${NAME}` and `${NAME:-fallback}` with environment values.
fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let end = reference
            .find('}')
            .ok_or_else(|| anyhow::anyhow!("config value has an unclosed `${{`"))?;
        out.push_str(&lookup_env(&reference[..end])?);
        rest = &reference[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup_env(reference: &str) -> anyhow::Result<String> {
    let (name, fallback) = match reference.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (reference, None),
    };
    if name.is_empty() {
        anyhow::bail!("empty variable name in `${{{reference}}}`");
    }
    match (std::env::var(name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_string()),
        (Err(_), None) => anyhow::bail!("environment variable {name} is not set"),
    }
}
