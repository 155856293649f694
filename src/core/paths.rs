use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the paths to avoid repeated environment lookups
static DICOTERM_HOME: OnceLock<PathBuf> = OnceLock::new();
static DICOTERM_DICOS_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the dicoterm home directory
/// Checks DICOTERM_HOME environment variable, falls back to ${HOME}/.dicoterm
pub fn dicoterm_home() -> PathBuf {
    DICOTERM_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("DICOTERM_HOME") {
                PathBuf::from(path)
            } else {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".dicoterm")
            }
        })
        .clone()
}

/// Get the directory holding one store directory per dictionary
/// Checks DICOTERM_DICOS_DIR environment variable, falls back to DICOTERM_HOME/dicos
pub fn dicos_dir() -> PathBuf {
    DICOTERM_DICOS_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("DICOTERM_DICOS_DIR") {
                PathBuf::from(path)
            } else {
                dicoterm_home().join("dicos")
            }
        })
        .clone()
}

/// Default configuration file location
pub fn config_path() -> PathBuf {
    dicoterm_home().join("config.toml")
}

/// Check if running with a custom data directory
pub fn is_custom_home() -> bool {
    std::env::var("DICOTERM_HOME").is_ok() || std::env::var("DICOTERM_DICOS_DIR").is_ok()
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths() -> String {
    format!(
        "Dicoterm Paths:\n  \
        Home: {}\n  \
        Dictionaries: {}\n  \
        Config: {}\n  \
        Custom: {}",
        dicoterm_home().display(),
        dicos_dir().display(),
        config_path().display(),
        if is_custom_home() { "Yes" } else { "No (using defaults)" }
    )
}
