//! 🔧 App Configuration — the sacred env-and-TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, layered lowest to highest:
//! 1. the old tool's names (`REMOTE_*` → `source`, `LOCAL_*` → `destination`) from a `.env`
//!    file in the working directory, if there is one
//! 2. the same names from the real environment
//! 3. `S3MIRROR_*` env vars, nested with `__` (`S3MIRROR_SOURCE__BUCKET=...`)
//! 4. an optional TOML file. TOML wins on conflicts.
//!
//! Then `validate()` checks that all eight required settings are actually there.
//! `run` calls it before a single request leaves the process.

use std::path::Path;

use anyhow::{Context, bail};
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Toml},
    value::{Dict, Map, Value},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::EndpointConfig;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// 📥 where objects come from
    #[serde(default)]
    pub source: EndpointConfig,
    /// 📤 where objects go
    #[serde(default)]
    pub destination: EndpointConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 🎛️ How hard the supervisor pushes.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// 🧵 Keys processed at once. 1 = strictly one key at a time, which is the default.
    #[serde(default = "default_parallelism", alias = "workers")]
    pub parallelism: usize,
    /// 📬 Listed keys allowed to wait in line for a worker.
    #[serde(default = "default_queue_capacity", alias = "channel_size")]
    pub queue_capacity: usize,
    /// 🌀 Spinner on stderr while the run is going.
    #[serde(default = "default_show_progress_bar")]
    pub show_progress_bar: bool,
}

fn default_parallelism() -> usize {
    1
}

// -- 📬 64 keys of lookahead. keys are tiny. payloads are not, and those are capped by parallelism.
fn default_queue_capacity() -> usize {
    64
}

fn default_show_progress_bar() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            queue_capacity: default_queue_capacity(),
            show_progress_bar: default_show_progress_bar(),
        }
    }
}

impl AppConfig {
    /// 🚦 The bouncer. Checks every required setting and names all the missing ones at once,
    /// so nobody has to play whack-a-mole with env vars.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut the_missing = self.source.missing_settings("source");
        the_missing.extend(self.destination.missing_settings("destination"));
        if !the_missing.is_empty() {
            bail!(
                "💀 Missing required settings: {}. Set them in the TOML file, as S3MIRROR_* \
                 variables (e.g. S3MIRROR_SOURCE__BUCKET), or as the classic REMOTE_*/LOCAL_* variables.",
                the_missing.join(", ")
            );
        }
        if self.destination.effective_prefix().is_some() {
            bail!(
                "💀 destination.prefix is not supported. Keys are written under exactly the \
                 names they have at the source; use source.prefix to pick what gets mirrored."
            );
        }
        if self.runtime.parallelism == 0 {
            bail!("💀 runtime.parallelism must be at least 1. Zero workers copy zero objects.");
        }
        if self.runtime.queue_capacity == 0 {
            bail!("💀 runtime.queue_capacity must be at least 1. A queue with no room is a wall.");
        }
        Ok(())
    }
}

// -- 📜 the old tool read exactly these, per side
const LEGACY_SIDES: [(&str, &str); 2] = [("REMOTE_", "source"), ("LOCAL_", "destination")];
const LEGACY_SETTINGS: [&str; 6] = [
    "bucket",
    "region",
    "access_key",
    "secret_key",
    "endpoint",
    "use_ssl",
];
const DOTENV_FILE: &str = ".env";

/// 🗺️ The old tool's settings, nested under `source` / `destination`.
///
/// Values stay the exact strings they were typed as. `Env` would turn `REMOTE_BUCKET=0042`
/// into the number 42, and that is a different bucket.
struct LegacyVars {
    origin: String,
    vars: Vec<(String, String)>,
}

impl LegacyVars {
    fn from_env() -> Self {
        Self {
            origin: "`REMOTE_`/`LOCAL_` environment variable(s)".to_string(),
            vars: Env::raw()
                .lowercase(false)
                .iter()
                .map(|(name, value)| (name.as_str().to_owned(), value))
                .collect(),
        }
    }

    /// 📄 `None` when there is no `.env` file. A file that is there but broken is an error.
    fn from_dotenv(path: &Path) -> anyhow::Result<Option<Self>> {
        let the_lines = match dotenvy::from_path_iter(path) {
            Ok(lines) => lines,
            Err(err) if err.not_found() => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("💀 Could not open '{}'", path.display()));
            }
        };
        let the_vars = the_lines
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| {
                format!(
                    "💀 '{}' has a line dotenv can't read. Quotes, maybe? It's always quotes.",
                    path.display()
                )
            })?;
        Ok(Some(Self {
            origin: format!("`{}` file", path.display()),
            vars: the_vars,
        }))
    }
}

/// 🔍 `REMOTE_ACCESS_KEY` → (`source`, `access_key`). Anything else → `None`.
fn legacy_setting(name: &str) -> Option<(&'static str, String)> {
    LEGACY_SIDES.iter().find_map(|(prefix, side)| {
        let the_setting = name.strip_prefix(prefix)?.to_ascii_lowercase();
        LEGACY_SETTINGS
            .contains(&the_setting.as_str())
            .then_some((*side, the_setting))
    })
}

impl Provider for LegacyVars {
    fn metadata(&self) -> Metadata {
        Metadata::named(self.origin.clone())
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let mut the_sides: Map<&str, Dict> = Map::new();
        for (name, value) in &self.vars {
            if let Some((side, setting)) = legacy_setting(name) {
                the_sides
                    .entry(side)
                    .or_default()
                    .insert(setting, Value::from(value.clone()));
            }
        }
        let the_dict: Dict = the_sides
            .into_iter()
            .map(|(side, settings)| (side.to_string(), Value::from(settings)))
            .collect();
        Ok(Profile::Default.collect(the_dict))
    }
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power of hoping.
///
/// - `None` → `.env` + env vars only. No file. No assumptions.
/// - `Some(path)` → the same, plus the TOML file on top. TOML wins on conflicts.
///
/// 💀 Returns an error if the config is unparseable. Completeness is `AppConfig::validate`'s
/// job, after the CLI has had its say.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    match config_file_name {
        Some(path) => info!("🔧 Loading configuration from {} and the environment", path.display()),
        None => info!("🔧 Loading configuration from the environment only"),
    }

    let mut config = Figment::new();
    if let Some(dotenv) = LegacyVars::from_dotenv(Path::new(DOTENV_FILE))? {
        info!("📄 Found {DOTENV_FILE}; real environment variables still win over it");
        config = config.merge(dotenv);
    }
    let config = config
        .merge(LegacyVars::from_env())
        .merge(Env::prefixed("S3MIRROR_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables. \
             The file exists in our hearts, but apparently not in valid TOML.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables. \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
