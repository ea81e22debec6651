use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod persistence;

pub use persistence::{
    decode, encode, resolve, AutosaveMode, Category, CodecError, GamePhase, GameState,
    GlobalSettings, Language, PersistedRecord, PersistenceConfig, PersistenceError, PlayerId,
    PlayerSettings, Position, RecordKind, SaveLoadManager, SavePaths, SnapshotProvider, Volume,
    DEFAULT_VOLUME, MAX_VOLUME, NB_PLAYERS, RECORD_FORMAT_VERSION, TWO_MINUTES_AUTOSAVE_SECS,
};

pub const DATA_DIR_ENV_VAR: &str = "SAVELOAD_DATA_DIR";
const DEFAULT_DATA_DIR_NAME: &str = "data";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "data directory {path} exists but is not a directory{}",
        .env_var.map(|var| format!(" (set by {var})")).unwrap_or_default()
    )]
    DataDirNotADirectory {
        path: PathBuf,
        /// Set when the path came from the environment.
        env_var: Option<&'static str>,
    },
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves where the four record files live.
///
/// `SAVELOAD_DATA_DIR` wins when set; otherwise a `data` directory next to the
/// executable is used. The directory is created if missing.
pub fn resolve_persistence_config() -> Result<PersistenceConfig, StartupError> {
    let (data_dir, env_var) = match env::var(DATA_DIR_ENV_VAR) {
        Ok(value) => (PathBuf::from(value), Some(DATA_DIR_ENV_VAR)),
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            (exe_dir.join(DEFAULT_DATA_DIR_NAME), None)
        }
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: DATA_DIR_ENV_VAR,
                source,
            });
        }
    };

    Ok(PersistenceConfig {
        data_dir: prepare_data_dir(&data_dir, env_var)?,
    })
}

fn prepare_data_dir(
    path: &Path,
    env_var: Option<&'static str>,
) -> Result<PathBuf, StartupError> {
    if path.exists() && !path.is_dir() {
        return Err(StartupError::DataDirNotADirectory {
            path: path.to_path_buf(),
            env_var,
        });
    }
    fs::create_dir_all(path).map_err(|source| StartupError::CreateDataDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_path(path))
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn prepare_creates_missing_data_dir() {
        let temp = TempDir::new().expect("temp");
        let target = temp.path().join("nested").join("data");
        let prepared = prepare_data_dir(&target, None).expect("prepare");
        assert!(prepared.is_dir());
    }

    #[test]
    fn prepare_rejects_file_in_place_of_dir() {
        let temp = TempDir::new().expect("temp");
        let target = temp.path().join("data");
        fs::write(&target, b"not a dir").expect("write");
        let error = prepare_data_dir(&target, None).expect_err("file");
        assert!(matches!(
            error,
            StartupError::DataDirNotADirectory { env_var: None, .. }
        ));
        assert!(!error.to_string().contains(DATA_DIR_ENV_VAR), "{error}");
    }

    #[test]
    fn env_supplied_file_names_the_variable() {
        let temp = TempDir::new().expect("temp");
        let target = temp.path().join("data");
        fs::write(&target, b"not a dir").expect("write");
        let error = prepare_data_dir(&target, Some(DATA_DIR_ENV_VAR)).expect_err("file");
        assert!(error.to_string().contains(DATA_DIR_ENV_VAR), "{error}");
    }
}
