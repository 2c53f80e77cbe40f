//! Error types for persistence, audio loading and the tuning file.
//!
//! The fireworks engine never produces errors: every failure there is a no-op.
//! The collaborators around it do fail (a corrupt save file, an unreadable
//! sound) and report through these types.  Systems log them with `warn!` /
//! `error!` and keep running on defaults.
//!
//! ## Usage
//!
//! ```rust
//! use luckydraw::error::{StoreError, StoreResult};
//!
//! fn require_table(value: &toml::Value) -> StoreResult<()> {
//!     value
//!         .as_table()
//!         .map(|_| ())
//!         .ok_or(StoreError::Malformed { key: "settings".to_string(), reason: "not a table".to_string() })
//! }
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure reading or writing the key-value store.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem access failed.
    Io {
        /// File or directory that was being accessed.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A stored record could not be parsed or decoded.
    Malformed {
        /// Store key of the offending record.
        key: String,
        /// Parser message.
        reason: String,
    },

    /// A value could not be serialized before writing.
    Serialize {
        /// Store key of the value being written.
        key: String,
        /// Serializer message.
        reason: String,
    },

    /// The record was written by an incompatible format version.
    UnsupportedVersion {
        /// Store key of the offending record.
        key: String,
        /// Version found on disk.
        found: i64,
        /// Version this build understands.
        expected: u32,
    },

    /// Keys are file stems; path separators and empty keys are rejected.
    InvalidKey(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "failed to access {}: {}", path.display(), source)
            }
            StoreError::Malformed { key, reason } => {
                write!(f, "stored record '{}' is malformed: {}", key, reason)
            }
            StoreError::Serialize { key, reason } => {
                write!(f, "failed to serialize record '{}': {}", key, reason)
            }
            StoreError::UnsupportedVersion {
                key,
                found,
                expected,
            } => write!(
                f,
                "record '{}' has unsupported version {} (expected {})",
                key, found, expected
            ),
            StoreError::InvalidKey(key) => write!(f, "invalid store key '{}'", key),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience alias: a `Result` using `StoreError` as the error type.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure loading a user-supplied sound.
#[derive(Debug)]
pub enum AudioError {
    /// The sound file could not be read.
    Io {
        /// Path of the sound file.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The bytes are not in a format the player can decode.
    Decode {
        /// Path of the sound file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Io { path, source } => {
                write!(f, "failed to read sound {}: {}", path.display(), source)
            }
            AudioError::Decode { path, reason } => {
                write!(f, "cannot decode sound {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::Io { source, .. } => Some(source),
            AudioError::Decode { .. } => None,
        }
    }
}

/// Convenience alias: a `Result` using `AudioError` as the error type.
pub type AudioResult<T> = Result<T, AudioError>;

/// Failure reading the fireworks tuning file.  A missing file is not one.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_error_names_both_versions() {
        let err = StoreError::UnsupportedVersion {
            key: "history".to_string(),
            found: 7,
            expected: 1,
        };
        let text = err.to_string();
        assert!(text.contains("history"));
        assert!(text.contains('7'));
        assert!(text.contains("expected 1"));
    }

    #[test]
    fn io_error_exposes_its_source() {
        use std::error::Error;
        let err = AudioError::Io {
            path: PathBuf::from("win.ogg"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("win.ogg"));
    }
}
