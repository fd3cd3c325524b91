//! Audit-log path validation: a pure function enforcing the log-file path
//! contract (absolute path under the current working directory or a
//! descendant, `.log` suffix, file-name length bounded) before any file is
//! opened. Kept separate from I/O so it can be unit-tested without a
//! filesystem.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const MAX_NAME_LEN: usize = 255;

/// A rejected audit-log path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogPathError {
    /// The resolved path escapes the current working directory.
    #[error("log path {0} is not under the current working directory")]
    OutsideWorkingDirectory(String),
    /// The path does not end in `.log`.
    #[error("log path {0} must end in .log")]
    MissingLogSuffix(String),
    /// The file name exceeds the maximum length.
    #[error("log file name exceeds {MAX_NAME_LEN} characters")]
    NameTooLong,
}

/// Lexically collapse `.` and `..` components without touching the
/// filesystem (the path need not exist yet).
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Validate and resolve a user-supplied audit-log path against `cwd`.
/// Relative inputs are joined onto `cwd` first; the result must stay under
/// `cwd`, end in `.log`, and have a file name no longer than 255 bytes.
pub fn validate_log_path(cwd: &Path, input: &Path) -> Result<PathBuf, LogPathError> {
    let joined = if input.is_absolute() {
        input.to_path_buf()
    } else {
        cwd.join(input)
    };
    let resolved = normalize(&joined);
    let resolved_cwd = normalize(cwd);

    if !resolved.starts_with(&resolved_cwd) {
        return Err(LogPathError::OutsideWorkingDirectory(resolved.display().to_string()));
    }

    let file_name = resolved.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if file_name.len() > MAX_NAME_LEN {
        return Err(LogPathError::NameTooLong);
    }
    if !file_name.ends_with(".log") {
        return Err(LogPathError::MissingLogSuffix(resolved.display().to_string()));
    }

    Ok(resolved)
}

/// Build an audit-log file name under `cwd` when `-l` is given without a
/// path, keyed on the session id for uniqueness across runs.
#[must_use]
pub fn auto_generate_path(cwd: &Path, session_id: &str) -> PathBuf {
    cwd.join(format!("wsc-audit-{session_id}.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_resolves_under_cwd() {
        let cwd = PathBuf::from("/home/user/project");
        let resolved = validate_log_path(&cwd, Path::new("logs/session.log")).unwrap();
        assert_eq!(resolved, PathBuf::from("/home/user/project/logs/session.log"));
    }

    #[test]
    fn rejects_missing_log_suffix() {
        let cwd = PathBuf::from("/home/user/project");
        let err = validate_log_path(&cwd, Path::new("session.txt")).unwrap_err();
        assert!(matches!(err, LogPathError::MissingLogSuffix(_)));
    }

    #[test]
    fn rejects_escape_via_parent_dir() {
        let cwd = PathBuf::from("/home/user/project");
        let err = validate_log_path(&cwd, Path::new("../../etc/passwd.log")).unwrap_err();
        assert!(matches!(err, LogPathError::OutsideWorkingDirectory(_)));
    }

    #[test]
    fn rejects_overlong_file_name() {
        let cwd = PathBuf::from("/home/user/project");
        let long_name = format!("{}.log", "a".repeat(300));
        let err = validate_log_path(&cwd, Path::new(&long_name)).unwrap_err();
        assert_eq!(err, LogPathError::NameTooLong);
    }

    #[test]
    fn absolute_path_under_cwd_is_accepted() {
        let cwd = PathBuf::from("/home/user/project");
        let resolved = validate_log_path(&cwd, Path::new("/home/user/project/sub/session.log")).unwrap();
        assert_eq!(resolved, PathBuf::from("/home/user/project/sub/session.log"));
    }

    #[test]
    fn absolute_path_outside_cwd_is_rejected() {
        let cwd = PathBuf::from("/home/user/project");
        let err = validate_log_path(&cwd, Path::new("/tmp/session.log")).unwrap_err();
        assert!(matches!(err, LogPathError::OutsideWorkingDirectory(_)));
    }

    #[test]
    fn auto_generated_name_is_under_cwd_and_has_log_suffix() {
        let cwd = PathBuf::from("/home/user/project");
        let path = auto_generate_path(&cwd, "20260101-abc123");
        assert!(path.starts_with(&cwd));
        assert!(path.extension().is_some_and(|e| e == "log"));
    }
}
