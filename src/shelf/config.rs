//! # Configuration
//!
//! Shelf is configured entirely through environment variables, read once at
//! startup into a [`ShelfConfig`] that is then passed down explicitly.
//! Nothing below `main` reads the environment.
//!
//! ## Available Settings
//!
//! `<MODULE>` is one of `NOTES`, `BLOG`, `FILES`, `VICE_BANK`.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHELF_<MODULE>_BACKEND` | `memory` | `memory`, `file` or `mongo_db` (alias `document`) |
//! | `SHELF_<MODULE>_FILE_PATH` | none | Data file (a directory for `VICE_BANK`) |
//! | `SHELF_<MODULE>_BACKUP_DIR` | `<data dir>/backup` | Where backups are written |
//! | `SHELF_DOCUMENT_PATH` | none | Document database directory |
//! | `SHELF_BACKUP_SCHEDULE` | `@daily` | See [`crate::schedule`] |
//! | `SHELF_LOG_PATH` | none | JSON-lines log file; unset means tracing only (`shelf run` picks a per-user file) |
//! | `SHELF_LOG_MAX_BYTES` | `10485760` | Rotation threshold |
//! | `SHELF_LOG_GENERATIONS` | `5` | Rotated files kept |
//! | `SHELF_LOG_CYCLE_SCHEDULE` | `@hourly` | How often rotation is checked |
//!
//! Loading never fails. Values that cannot be parsed keep their default and
//! leave a message in [`ShelfConfig::warnings`] for the caller to log once a
//! logger exists.

use crate::logging::{DEFAULT_LOG_GENERATIONS, DEFAULT_LOG_MAX_BYTES};
use crate::schedule::Schedule;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

const PREFIX: &str = "SHELF_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    File,
    Document,
}

impl BackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "in_memory" => Some(BackendKind::Memory),
            "file" => Some(BackendKind::File),
            "mongo_db" | "mongodb" | "document" => Some(BackendKind::Document),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Document => "document",
        };
        f.write_str(name)
    }
}

/// Resource groups that choose their backend independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Notes,
    Blog,
    Files,
    ViceBank,
}

impl Module {
    pub const ALL: [Module; 4] = [Module::Notes, Module::Blog, Module::Files, Module::ViceBank];

    pub fn env_name(self) -> &'static str {
        match self {
            Module::Notes => "NOTES",
            Module::Blog => "BLOG",
            Module::Files => "FILES",
            Module::ViceBank => "VICE_BANK",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.env_name().to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleConfig {
    pub backend: BackendKind,
    /// Data file for most modules, data directory for the vice bank.
    pub file_path: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
}

impl ModuleConfig {
    /// Explicit backup dir, or `backup/` beside the data file.
    pub fn resolved_backup_dir(&self, module: Module) -> Option<PathBuf> {
        if let Some(dir) = &self.backup_dir {
            return Some(dir.clone());
        }
        let path = self.file_path.as_ref()?;
        let base = match module {
            Module::ViceBank => path.clone(),
            _ => path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        Some(base.join("backup"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub path: Option<PathBuf>,
    pub max_bytes: u64,
    pub generations: usize,
    pub cycle_schedule: Schedule,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            generations: DEFAULT_LOG_GENERATIONS,
            cycle_schedule: Schedule::HOURLY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShelfConfig {
    pub notes: ModuleConfig,
    pub blog: ModuleConfig,
    pub files: ModuleConfig,
    pub vice_bank: ModuleConfig,
    pub document_path: Option<PathBuf>,
    pub backup_schedule: Schedule,
    pub log: LogConfig,
    pub warnings: Vec<String>,
}

impl ShelfConfig {
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build from any set of key/value pairs. Keys without the `SHELF_`
    /// prefix are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(PREFIX))
            .collect();

        let mut config = ShelfConfig::default();
        for module in Module::ALL {
            let parsed = config.parse_module(&vars, module);
            *config.module_mut(module) = parsed;
        }

        config.document_path = path_var(&vars, "DOCUMENT_PATH");

        if let Some(value) = var(&vars, "BACKUP_SCHEDULE") {
            match value.parse() {
                Ok(schedule) => config.backup_schedule = schedule,
                Err(e) => config.warn(format!("{}; using {}", e, config.backup_schedule)),
            }
        }

        config.log.path = path_var(&vars, "LOG_PATH");
        if let Some(value) = var(&vars, "LOG_MAX_BYTES") {
            match value.trim().parse::<u64>() {
                Ok(n) if n > 0 => config.log.max_bytes = n,
                _ => config.warn(format!("invalid SHELF_LOG_MAX_BYTES value: {}", value)),
            }
        }
        if let Some(value) = var(&vars, "LOG_GENERATIONS") {
            match value.trim().parse::<usize>() {
                Ok(n) => config.log.generations = n,
                Err(_) => config.warn(format!("invalid SHELF_LOG_GENERATIONS value: {}", value)),
            }
        }
        if let Some(value) = var(&vars, "LOG_CYCLE_SCHEDULE") {
            match value.parse() {
                Ok(schedule) => config.log.cycle_schedule = schedule,
                Err(e) => config.warn(format!("{}; using {}", e, config.log.cycle_schedule)),
            }
        }

        config
    }

    pub fn module(&self, module: Module) -> &ModuleConfig {
        match module {
            Module::Notes => &self.notes,
            Module::Blog => &self.blog,
            Module::Files => &self.files,
            Module::ViceBank => &self.vice_bank,
        }
    }

    fn module_mut(&mut self, module: Module) -> &mut ModuleConfig {
        match module {
            Module::Notes => &mut self.notes,
            Module::Blog => &mut self.blog,
            Module::Files => &mut self.files,
            Module::ViceBank => &mut self.vice_bank,
        }
    }

    fn parse_module(&mut self, vars: &HashMap<String, String>, module: Module) -> ModuleConfig {
        let name = module.env_name();
        let mut parsed = ModuleConfig {
            file_path: path_var(vars, &format!("{}_FILE_PATH", name)),
            backup_dir: path_var(vars, &format!("{}_BACKUP_DIR", name)),
            ..Default::default()
        };

        if let Some(value) = var(vars, &format!("{}_BACKEND", name)) {
            match BackendKind::parse(value) {
                Some(kind) => parsed.backend = kind,
                None => self.warn(format!(
                    "unknown SHELF_{}_BACKEND value: {}; using memory",
                    name, value
                )),
            }
        }
        parsed
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

fn var<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(&format!("{}{}", PREFIX, key))
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn path_var(vars: &HashMap<String, String>, key: &str) -> Option<PathBuf> {
    var(vars, key).map(|v| PathBuf::from(v.trim()))
}
