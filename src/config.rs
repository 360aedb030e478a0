use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8050;
const DEFAULT_UPLOAD_PATH: &str = "uploads/last_upload.bin";

/// Process configuration, each field overridable from the environment
///
/// | Variable          | Default                   |
/// |-------------------|---------------------------|
/// | `HOST`            | `127.0.0.1`               |
/// | `PORT`            | `8050`                    |
/// | `DEBUG`           | `false`                   |
/// | `UPLOAD_PATH`     | `uploads/last_upload.bin` |
/// | `PERSIST_UPLOADS` | `true`                    |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub upload_path: PathBuf,
    pub persist_uploads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            upload_path: PathBuf::from(DEFAULT_UPLOAD_PATH),
            persist_uploads: true,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment, after loading `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Values that fail to parse are logged and replaced by their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            debug: flag_or("DEBUG", lookup("DEBUG"), defaults.debug),
            upload_path: lookup("UPLOAD_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_path),
            persist_uploads: flag_or(
                "PERSIST_UPLOADS",
                lookup("PERSIST_UPLOADS"),
                defaults.persist_uploads,
            ),
        }
    }

    /// Address the server binds to
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default log filter for the configured verbosity
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    /// Create the directory holding the stored upload.
    pub fn bootstrap(&self) -> std::io::Result<()> {
        if !self.persist_uploads {
            return Ok(());
        }
        match self.upload_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Debug>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid {}={:?}, using {:?}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn flag_or(key: &str, raw: Option<String>, default: bool) -> bool {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            log::warn!("ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }
    }
}
