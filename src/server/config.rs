//! Configuration management for the JFiles server
//!
//! Settings are read once at startup from the first settings file found in a
//! fixed list of locations. Missing files, missing keys, unreadable files and
//! bad values all fall back to the documented defaults; resolution never fails.

use config::{Config, Environment, File, Value};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::client::SessionSettings;
use crate::error::{ConfigError, handle_error};

pub const DEFAULT_PORT: u16 = 9786;
pub const DEFAULT_MAX_THREADS: usize = 10;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_COMMAND_LENGTH: usize = 512;

const SETTINGS_FILE: &str = "serverConfig.toml";
const ENV_PREFIX: &str = "JFILES";

/// Immutable server settings, resolved once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Listening port (`Port`)
    pub port: u16,
    /// Maximum number of concurrent sessions (`maxThreads`)
    pub max_threads: usize,
    /// Interface to bind (`bindAddress`)
    pub bind_address: String,
    /// Seconds a session may wait for a command; 0 disables (`idleTimeoutSecs`)
    pub idle_timeout_secs: u64,
    /// Longest accepted request line in bytes (`maxCommandLength`)
    pub max_command_length: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_threads: DEFAULT_MAX_THREADS,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
        }
    }
}

impl Configuration {
    /// Get bind address and port as a socket address string
    pub fn bind_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get the idle timeout as a Duration, if enabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Limits applied to every client session
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            idle_timeout: self.idle_timeout(),
            max_command_length: self.max_command_length,
        }
    }

    /// Build a configuration from a settings mapping, defaulting per key.
    fn from_settings(settings: &HashMap<String, Value>) -> Self {
        let config = Self {
            port: lookup(settings, "Port", DEFAULT_PORT, positive_u16),
            max_threads: lookup(settings, "maxThreads", DEFAULT_MAX_THREADS, worker_count),
            bind_address: lookup(
                settings,
                "bindAddress",
                DEFAULT_BIND_ADDRESS.to_string(),
                non_empty_string,
            ),
            idle_timeout_secs: lookup(
                settings,
                "idleTimeoutSecs",
                DEFAULT_IDLE_TIMEOUT_SECS,
                non_negative_u64,
            ),
            max_command_length: lookup(
                settings,
                "maxCommandLength",
                DEFAULT_MAX_COMMAND_LENGTH,
                positive_usize,
            ),
        };

        info!("Config set to port {}", config.port);
        info!("Config set max threads to {}", config.max_threads);
        config
    }
}

/// Locates and loads the settings file.
pub struct ConfigResolver {
    candidates: Vec<PathBuf>,
    env_prefix: Option<&'static str>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::with_candidates(default_candidates(home.as_deref())).with_env_prefix(ENV_PREFIX)
    }
}

impl ConfigResolver {
    /// Resolver over an explicit list of candidate files, without
    /// environment overrides. Duplicate paths are dropped, keeping the first.
    pub fn with_candidates<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut candidates: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.into();
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }

        Self {
            candidates,
            env_prefix: None,
        }
    }

    /// Let `<PREFIX>_<KEY>` environment variables override file values.
    pub fn with_env_prefix(mut self, prefix: &'static str) -> Self {
        self.env_prefix = Some(prefix);
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// The first candidate that exists on disk.
    pub fn locate(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|path| path.exists())
    }

    /// Resolve the configuration, falling back to defaults on any error.
    pub fn resolve(&self) -> Configuration {
        let source = self.locate();
        match source {
            Some(path) => info!("Config file found in {}", path.display()),
            None => info!("No config file found. Using default values."),
        }

        match self.load(source) {
            Ok(settings) => Configuration::from_settings(&settings),
            Err(e) => {
                handle_error("Settings", e);
                Configuration::from_settings(&HashMap::new())
            }
        }
    }

    /// Read the settings file (if any) plus environment overrides into a
    /// key→value mapping with lowercase keys.
    fn load(&self, source: Option<&Path>) -> Result<HashMap<String, Value>, ConfigError> {
        if source.is_none() && self.env_prefix.is_none() {
            return Ok(HashMap::new());
        }

        let mut builder = Config::builder();
        if let Some(path) = source {
            builder = builder.add_source(File::from(path));
        }
        if let Some(prefix) = self.env_prefix {
            builder = builder.add_source(Environment::with_prefix(prefix));
        }

        let origin = source.map(Path::to_path_buf).unwrap_or_default();
        let settings: HashMap<String, Value> = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ConfigError::Read(origin, e))?;

        Ok(settings
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect())
    }
}

/// Settings file locations in priority order: system-wide, then home-relative.
pub fn default_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = ["/usr/local/etc/jfiles", "/opt/etc/jfiles", "/etc/jfiles"]
        .iter()
        .map(|dir| Path::new(dir).join(SETTINGS_FILE))
        .collect();

    if let Some(home) = home {
        paths.push(home.join("jfiles").join(SETTINGS_FILE));
        paths.push(home.join(".jfiles").join(SETTINGS_FILE));
    }
    paths
}

fn lookup<T>(
    settings: &HashMap<String, Value>,
    key: &'static str,
    default: T,
    convert: fn(&Value) -> Option<T>,
) -> T {
    let Some(value) = settings.get(&key.to_ascii_lowercase()) else {
        return default;
    };

    match convert(value) {
        Some(parsed) => parsed,
        None => {
            handle_error(
                "Settings",
                ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                },
            );
            default
        }
    }
}

fn positive_u16(value: &Value) -> Option<u16> {
    let n = value.clone().into_int().ok()?;
    u16::try_from(n).ok().filter(|port| *port > 0)
}

fn positive_usize(value: &Value) -> Option<usize> {
    let n = value.clone().into_int().ok()?;
    usize::try_from(n).ok().filter(|n| *n > 0)
}

/// Sessions are bounded by a semaphore, which caps how many permits it can hold.
fn worker_count(value: &Value) -> Option<usize> {
    positive_usize(value).filter(|n| *n <= Semaphore::MAX_PERMITS)
}

fn non_negative_u64(value: &Value) -> Option<u64> {
    let n = value.clone().into_int().ok()?;
    u64::try_from(n).ok()
}

fn non_empty_string(value: &Value) -> Option<String> {
    let s = value.clone().into_string().ok()?;
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_settings(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_when_no_source_exists() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::with_candidates([
            dir.path().join("missing.toml"),
            dir.path().join("nested/missing.toml"),
        ]);

        let config = resolver.resolve();
        assert_eq!(config.port, 9786);
        assert_eq!(config.max_threads, 10);
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_empty_candidate_list() {
        let resolver = ConfigResolver::with_candidates(Vec::<PathBuf>::new());
        assert!(resolver.locate().is_none());
        assert_eq!(resolver.resolve(), Configuration::default());
    }

    #[test]
    fn test_reads_recognized_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            "serverConfig.toml",
            "Port = 7001\nmaxThreads = 3\nbindAddress = \"127.0.0.1\"\nidleTimeoutSecs = 0\n",
        );

        let config = ConfigResolver::with_candidates([path]).resolve();
        assert_eq!(config.port, 7001);
        assert_eq!(config.max_threads, 3);
        assert_eq!(config.bind_socket(), "127.0.0.1:7001");
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.max_command_length, DEFAULT_MAX_COMMAND_LENGTH);
    }

    #[test]
    fn test_missing_key_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), "serverConfig.toml", "maxThreads = 4\n");

        let config = ConfigResolver::with_candidates([path]).resolve();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_threads, 4);
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_settings(dir.path(), "first.toml", "Port = 6000\n");
        let second = write_settings(dir.path(), "second.toml", "Port = 6001\n");

        let resolver =
            ConfigResolver::with_candidates([dir.path().join("absent.toml"), first.clone(), second]);
        assert_eq!(resolver.locate(), Some(first.as_path()));
        assert_eq!(resolver.resolve().port, 6000);
    }

    #[test]
    fn test_duplicate_candidates_are_dropped() {
        let resolver = ConfigResolver::with_candidates(["/etc/a.toml", "/etc/b.toml", "/etc/a.toml"]);
        assert_eq!(
            resolver.candidates(),
            &[PathBuf::from("/etc/a.toml"), PathBuf::from("/etc/b.toml")]
        );
    }

    #[test]
    fn test_malformed_source_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), "serverConfig.toml", "Port = = [\n");

        assert_eq!(
            ConfigResolver::with_candidates([path]).resolve(),
            Configuration::default()
        );
    }

    #[test]
    fn test_unreadable_source_uses_defaults() {
        // A directory exists but cannot be parsed as a settings file
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serverConfig.toml");
        fs::create_dir(&path).unwrap();

        assert_eq!(
            ConfigResolver::with_candidates([path]).resolve(),
            Configuration::default()
        );
    }

    #[test]
    fn test_invalid_values_fall_back_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            "serverConfig.toml",
            "Port = 70000\nmaxThreads = 0\nmaxCommandLength = \"abc\"\nidleTimeoutSecs = 15\n",
        );

        let config = ConfigResolver::with_candidates([path]).resolve();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_threads, DEFAULT_MAX_THREADS);
        assert_eq!(config.max_command_length, DEFAULT_MAX_COMMAND_LENGTH);
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_oversized_worker_count_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            "serverConfig.toml",
            "maxThreads = 4611686018427387904\n",
        );

        let config = ConfigResolver::with_candidates([path]).resolve();
        assert_eq!(config.max_threads, DEFAULT_MAX_THREADS);
        // Must be usable as a permit count
        let _ = Semaphore::new(config.max_threads);
    }

    #[test]
    fn test_worker_count_at_permit_limit() {
        let limit = Value::from(Semaphore::MAX_PERMITS as i64);
        let over = Value::from(Semaphore::MAX_PERMITS as i64 + 1);
        assert_eq!(worker_count(&limit), Some(Semaphore::MAX_PERMITS));
        assert_eq!(worker_count(&over), None);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            "serverConfig.toml",
            "Port = 6000\nmaxThreads = 6\n",
        );
        // Prefix unique to this test so parallel tests never see it
        // SAFETY: no other test reads or writes variables with this prefix
        unsafe { std::env::set_var("JFILESENVTEST_PORT", "7123") };

        let config = ConfigResolver::with_candidates([path])
            .with_env_prefix("JFILESENVTEST")
            .resolve();
        unsafe { std::env::remove_var("JFILESENVTEST_PORT") };

        assert_eq!(config.port, 7123);
        assert_eq!(config.max_threads, 6);
    }

    #[test]
    fn test_environment_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        // SAFETY: no other test reads or writes variables with this prefix
        unsafe { std::env::set_var("JFILESNOFILE_MAXTHREADS", "3") };

        let config = ConfigResolver::with_candidates([dir.path().join("absent.toml")])
            .with_env_prefix("JFILESNOFILE")
            .resolve();
        unsafe { std::env::remove_var("JFILESNOFILE_MAXTHREADS") };

        assert_eq!(config.max_threads, 3);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), "serverConfig.toml", "Port = \"8080\"\n");

        assert_eq!(ConfigResolver::with_candidates([path]).resolve().port, 8080);
    }

    #[test]
    fn test_default_candidate_order() {
        let paths = default_candidates(Some(Path::new("/home/jf")));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/usr/local/etc/jfiles/serverConfig.toml"),
                PathBuf::from("/opt/etc/jfiles/serverConfig.toml"),
                PathBuf::from("/etc/jfiles/serverConfig.toml"),
                PathBuf::from("/home/jf/jfiles/serverConfig.toml"),
                PathBuf::from("/home/jf/.jfiles/serverConfig.toml"),
            ]
        );
        assert_eq!(default_candidates(None).len(), 3);
    }

    #[test]
    fn test_session_settings() {
        let config = Configuration {
            idle_timeout_secs: 5,
            max_command_length: 64,
            ..Configuration::default()
        };
        let settings = config.session_settings();
        assert_eq!(settings.idle_timeout, Some(Duration::from_secs(5)));
        assert_eq!(settings.max_command_length, 64);
    }
}
