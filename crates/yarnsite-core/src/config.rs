//! Site configuration management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for yarnsite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Directory layout.
    #[serde(default)]
    pub path: PathConfig,

    /// Plugin discovery settings.
    #[serde(default)]
    pub plugins: PluginConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Name of the active theme under `path.themes`.
    #[serde(default = "default_theme")]
    pub theme: String,
}

/// Directory layout, relative to the configuration file unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Source content directory.
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Local plugin directory.
    #[serde(default = "default_plugins")]
    pub plugins: PathBuf,

    /// Directory holding all themes.
    #[serde(default = "default_themes")]
    pub themes: PathBuf,

    /// Generated output directory.
    #[serde(default = "default_destination")]
    pub destination: PathBuf,
}

/// Plugin package discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Package name prefix that marks a dependency as a plugin.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Project manifest declaring dependencies.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Directory where packages are installed.
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,
}

/// Absolute directory layout derived from [`Config`] once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Project root (directory of the configuration file).
    pub root: PathBuf,
    pub source: PathBuf,
    pub plugins: PathBuf,
    pub themes: PathBuf,
    pub destination: PathBuf,
    /// Active theme directory, `themes/<site.theme>`.
    pub theme_dir: PathBuf,
    pub manifest: PathBuf,
    pub modules_dir: PathBuf,
}

// Default value functions
fn default_theme() -> String {
    "default".to_string()
}

fn default_source() -> PathBuf {
    PathBuf::from("source")
}

fn default_plugins() -> PathBuf {
    PathBuf::from("plugins")
}

fn default_themes() -> PathBuf {
    PathBuf::from("themes")
}

fn default_destination() -> PathBuf {
    PathBuf::from("public")
}

fn default_prefix() -> String {
    "yarn-".to_string()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            plugins: default_plugins(),
            themes: default_themes(),
            destination: default_destination(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            manifest: default_manifest(),
            modules_dir: default_modules_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, with `YARNSITE__*`
    /// environment overrides (e.g. `YARNSITE__PATH__SOURCE`).
    pub fn load_with_env(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("YARNSITE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.theme.is_empty() {
            return Err(CoreError::config("site.theme cannot be empty"));
        }

        if self.plugins.prefix.is_empty() {
            return Err(CoreError::config("plugins.prefix cannot be empty"));
        }

        if self.path.destination == self.path.source {
            return Err(CoreError::config(
                "path.destination must differ from path.source",
            ));
        }

        Ok(())
    }

    /// Resolve every configured directory against `root` into absolute paths.
    pub fn resolve(&self, root: &Path) -> Result<ResolvedPaths> {
        let root = absolutize(Path::new("."), root)?;
        let themes = absolutize(&root, &self.path.themes)?;
        let theme_dir = absolutize(&themes, Path::new(&self.site.theme))?;

        let paths = ResolvedPaths {
            source: absolutize(&root, &self.path.source)?,
            plugins: absolutize(&root, &self.path.plugins)?,
            destination: absolutize(&root, &self.path.destination)?,
            manifest: absolutize(&root, &self.plugins.manifest)?,
            modules_dir: absolutize(&root, &self.plugins.modules_dir)?,
            themes,
            theme_dir,
            root,
        };

        tracing::debug!(?paths, "Resolved paths");
        Ok(paths)
    }
}

/// Join `path` onto `base` when relative, then canonicalize the longest
/// existing ancestor so that paths reported by the OS watcher compare equal,
/// including for directories created later (e.g. the destination).
pub fn absolutize(base: &Path, path: &Path) -> Result<PathBuf> {
    let joined = std::path::absolute(if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    })?;

    let mut existing = joined.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(joined),
        }
    }

    let mut resolved = existing.canonicalize()?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}
