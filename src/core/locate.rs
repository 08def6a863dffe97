//! Locating the `op` executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::core::constants::BINARY_NAME;
use crate::error::{CommandError, Error, Result};

/// Find `op` on the process `PATH`.
///
/// # Errors
///
/// Returns `Error::NotFound` if no directory in `PATH` holds the executable.
pub fn locate() -> Result<PathBuf> {
    let path = std::env::var_os("PATH").ok_or(Error::NotFound)?;
    locate_in(&path)
}

/// Find `op` in an explicit search path (same syntax as `PATH`).
///
/// The first directory containing a regular file with the platform's
/// executable name wins; directories with that name are skipped.
///
/// # Errors
///
/// Returns `Error::NotFound` if no candidate exists.
pub fn locate_in(search_path: &OsStr) -> Result<PathBuf> {
    debug!("searching for {} in search path", BINARY_NAME);

    let cwd = std::env::current_dir().unwrap_or_default();
    let found = which::which_in_all(BINARY_NAME, Some(search_path), cwd)
        .map_err(|_| Error::NotFound)?
        .find(|candidate| candidate.is_file());

    match found {
        Some(path) => {
            debug!(path = %path.display(), "found op executable");
            Ok(path)
        }
        None => Err(Error::NotFound),
    }
}

/// Run `op --version` and return the trimmed version string.
///
/// # Errors
///
/// Returns `CommandError` if the binary cannot be run or exits non-zero.
pub fn version(binary: &Path) -> Result<String> {
    let output = Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(CommandError::io)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(CommandError::exited(stderr, output.status).into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn install(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(BINARY_NAME);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn join(dirs: &[&Path]) -> OsString {
        std::env::join_paths(dirs).unwrap()
    }

    #[test]
    fn test_locate_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = install(first.path(), "#!/bin/sh\n");
        install(second.path(), "#!/bin/sh\n");

        let found = locate_in(&join(&[first.path(), second.path()])).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_locate_skips_directories() {
        let decoy = TempDir::new().unwrap();
        let real = TempDir::new().unwrap();
        fs::create_dir(decoy.path().join(BINARY_NAME)).unwrap();
        let expected = install(real.path(), "#!/bin/sh\n");

        let found = locate_in(&join(&[decoy.path(), real.path()])).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_locate_not_found() {
        let empty = TempDir::new().unwrap();
        let err = locate_in(&join(&[empty.path()])).unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[test]
    fn test_version() {
        let dir = TempDir::new().unwrap();
        let bin = install(dir.path(), "#!/bin/sh\necho '2.30.0'\n");
        assert_eq!(version(&bin).unwrap(), "2.30.0");
    }
}
