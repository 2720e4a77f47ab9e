//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached, with `GLEANER__`
//! environment variables applied last (`GLEANER__BROWSER__HEADLESS=false`
//! overrides `browser.headless`). Every section has defaults, so an empty
//! document is a valid configuration. String values may reference
//! environment variables as `${VAR}`; references are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use gleaner_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GleanerConfig {
    pub browser: BrowserSettings,
    pub http: HttpSettings,
    pub assets: AssetSettings,
    pub logging: LoggingSettings,
}

/// WebDriver endpoint and Chrome launch options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    /// Extra Chrome command-line arguments.
    pub arguments: Vec<String>,
    /// How long single-element lookups wait for a match. Zero fails fast.
    pub find_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            arguments: vec!["--start-maximized".into(), "--kiosk".into()],
            find_timeout_ms: 0,
        }
    }
}

impl BrowserSettings {
    pub fn find_timeout(&self) -> Duration {
        Duration::from_millis(self.find_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub retries: usize,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            retries: 2,
            user_agent: concat!("gleaner/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where downloaded images land.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub dir: PathBuf,
    pub image_appendix: String,
    /// Maximum number of images downloaded at once.
    pub concurrency: usize,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            image_appendix: "png".into(),
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: false,
            filter: "info".into(),
            dir: None,
        }
    }
}

impl LoggingSettings {
    /// Translate into the observability layer's [`LogConfig`].
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct GleanerConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    files: Vec<(PathBuf, bool)>,
    inline: Vec<String>,
}

impl Default for GleanerConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GleanerConfigLoader {
    /// Start with defaults only; environment overrides are added on [`load`](Self::load).
    ///
    /// ```
    /// use gleaner_config::GleanerConfigLoader;
    ///
    /// let config = GleanerConfigLoader::new().load().expect("defaults are valid");
    /// assert!(config.browser.headless);
    /// assert_eq!(config.browser.webdriver_url, "http://localhost:9515");
    /// assert_eq!(config.assets.image_appendix, "png");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the `config` crate infers
    /// format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use gleaner_config::GleanerConfigLoader;
    ///
    /// let cfg = GleanerConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// browser:
    ///   headless: false
    ///   arguments: ["--window-size=1280,800"]
    /// assets:
    ///   dir: "downloads"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(!cfg.browser.headless);
    /// assert_eq!(cfg.browser.arguments, vec!["--window-size=1280,800"]);
    /// assert_eq!(cfg.assets.dir, std::path::PathBuf::from("downloads"));
    /// assert_eq!(cfg.http.retries, 2);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Files come first, then inline snippets, then `GLEANER__`-prefixed
    /// environment variables. `${VAR}` placeholders are expanded before the
    /// typed structs are materialised.
    ///
    /// ```
    /// use gleaner_config::GleanerConfigLoader;
    ///
    /// unsafe { std::env::set_var("GLEANER_DOC_UA", "doc-agent/1.0"); }
    ///
    /// let config = GleanerConfigLoader::new()
    ///     .with_yaml_str("http:\n  user_agent: \"${GLEANER_DOC_UA}\"\n  retries: 5\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.http.user_agent, "doc-agent/1.0");
    /// assert_eq!(config.http.retries, 5);
    ///
    /// unsafe { std::env::remove_var("GLEANER_DOC_UA"); }
    /// ```
    pub fn load(self) -> Result<GleanerConfig, ConfigError> {
        let mut builder = self.builder;
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("GLEANER")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: GleanerConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
