use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::registry::{BuiltinIntents, IntentRegistry, IntentSource, RegistryBuilder};
use crate::resolver::DEFAULT_ACCEPT_THRESHOLD;
use crate::scanner::{ExcludeSet, FileFilter, ScanOptions, DEFAULT_MAX_FILE_SIZE};
use crate::ui::ThemeType;

pub const PROJECT_CONFIG_FILE: &str = "intentgrep.toml";
pub const ENV_PREFIX: &str = "INTENTGREP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub file_scanning: FileScanningConfig,
    pub resolver: ResolverConfig,
    pub output: OutputConfig,
    pub intents: Vec<IntentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileScanningConfig {
    pub follow_symlinks: bool,
    pub max_file_size: u64,
    pub skip_dirs: Vec<String>,
    /// Basenames always excluded, in addition to `-x`.
    pub exclude: Vec<String>,
    pub parallel: bool,
    pub threads: usize,
}

impl Default for FileScanningConfig {
    fn default() -> Self {
        let defaults = ScanOptions::default();
        Self {
            follow_symlinks: defaults.follow_symlinks,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            skip_dirs: defaults.skip_dirs,
            exclude: Vec::new(),
            parallel: defaults.parallel,
            threads: defaults.threads,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ACCEPT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub theme: ThemeType,
    pub colors: bool,
    pub editor: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            theme: ThemeType::Light,
            colors: true,
            editor: None,
        }
    }
}

/// A `[[intents]]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub name: String,
    pub signatures: Vec<String>,
    pub aliases: Vec<String>,
}

/// Registers the `[[intents]]` section.
pub struct ConfiguredIntents<'a>(pub &'a [IntentConfig]);

impl IntentSource for ConfiguredIntents<'_> {
    fn name(&self) -> &str {
        "config"
    }

    fn register(&self, builder: &mut RegistryBuilder) -> Result<()> {
        for intent in self.0 {
            builder.intent(&intent.name, &intent.signatures)?;
            builder.alias(&intent.name, &intent.aliases);
        }
        Ok(())
    }
}

impl CliConfig {
    /// User config dir, then `./intentgrep.toml`, then `explicit`, then
    /// `INTENTGREP_*` variables. Later layers win.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user = Self::user_config_path();
        Self::load_layers(user.as_deref(), Path::new(PROJECT_CONFIG_FILE), explicit)
    }

    pub fn load_layers(user: Option<&Path>, project: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(user) = user {
            debug!("User config: {}", user.display());
            builder = builder.add_source(File::from(user).required(false));
        }
        builder = builder.add_source(File::from(project).required(false));
        if let Some(explicit) = explicit {
            debug!("Explicit config: {}", explicit.display());
            builder = builder.add_source(File::from(explicit).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Built-in intents extended by the `[[intents]]` section.
    pub fn build_registry(&self) -> Result<IntentRegistry> {
        let mut builder = IntentRegistry::builder();
        builder.source(&BuiltinIntents)?;
        builder.source(&ConfiguredIntents(&self.intents))?;
        builder.build()
    }

    pub fn scan_options(&self, filter: FileFilter) -> ScanOptions {
        let mut exclude: Vec<String> = self.file_scanning.exclude.clone();
        exclude.extend(filter_excludes(&filter));
        ScanOptions {
            filter: FileFilter {
                exclude: ExcludeSet::new(&exclude),
                ..filter
            },
            follow_symlinks: self.file_scanning.follow_symlinks,
            max_file_size: self.file_scanning.max_file_size,
            skip_dirs: self.file_scanning.skip_dirs.clone(),
            parallel: self.file_scanning.parallel,
            threads: self.file_scanning.threads,
            ..ScanOptions::default()
        }
    }

    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "intentgrep", "intentgrep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn filter_excludes(filter: &FileFilter) -> Vec<String> {
    filter.exclude.patterns().map(str::to_string).collect()
}
