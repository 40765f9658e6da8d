//! Path utilities for locating the server binary and the toolchain.
//!
//! Covers `${storage_path}` expansion, the platform executable suffix and a
//! `which`-style search over `PATH`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::{ManagerConfig, DEFAULT_COMMAND};

/// Variable holding the storage root in command templates
pub const STORAGE_PATH_VAR: &str = "storage_path";

static RE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("valid variable regex"));

/// Expand `${name}` and `$name` references. Unknown variables are left as written.
pub fn expand_variables(input: &str, vars: &[(&str, &str)]) -> String {
    RE_VARIABLE
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match vars.iter().find(|(key, _)| *key == name) {
                Some((_, value)) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Append `.exe` on Windows if the path lacks it.
pub fn with_executable_suffix(path: PathBuf) -> PathBuf {
    if cfg!(target_os = "windows") && path.extension() != Some(OsStr::new("exe")) {
        let mut raw = path.into_os_string();
        raw.push(".exe");
        return PathBuf::from(raw);
    }
    path
}

/// Resolve the server binary location: the user override if any, else the
/// default under the storage root.
pub fn resolve_binary_path(config: &ManagerConfig) -> PathBuf {
    let template = config.command.as_deref().unwrap_or(DEFAULT_COMMAND);
    let storage_root = config.storage_root.to_string_lossy();
    let expanded = expand_variables(template, &[(STORAGE_PATH_VAR, storage_root.as_ref())]);
    with_executable_suffix(PathBuf::from(expanded))
}

/// Location the toolchain installs into: `<base>/bin/<server_name>`.
///
/// Managed installs always land here, whatever the user override says.
pub fn managed_binary_path(config: &ManagerConfig) -> PathBuf {
    with_executable_suffix(config.base_dir().join("bin").join(&config.server_name))
}

/// Whether `path` is a regular file with at least one execute bit set.
///
/// Any of the owner, group or other bits counts; ownership is not checked.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    let executable = {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    };
    #[cfg(not(unix))]
    let executable = true;

    executable
}

/// Look a program up on the process `PATH`.
pub fn find_on_search_path(program: &str) -> Option<PathBuf> {
    find_in_paths(program, std::env::var_os("PATH"))
}

/// Look a program up in an explicit search path list.
///
/// A program name containing a path separator is checked as-is.
pub fn find_in_paths(program: &str, search_path: Option<OsString>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        let candidate = with_executable_suffix(candidate.to_path_buf());
        return is_executable(&candidate).then_some(candidate);
    }

    let search_path = search_path?;
    std::env::split_paths(&search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| with_executable_suffix(dir.join(program)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_executable(path: &Path) {
        std::fs::write(path, "#!/bin/sh\n").expect("failed to write file");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
                .expect("failed to set permissions");
        }
    }

    #[test]
    fn test_expand_braced_variable() {
        let expanded = expand_variables(
            "${storage_path}/LSP-gopls/bin/gopls",
            &[("storage_path", "/data")],
        );
        assert_eq!(expanded, "/data/LSP-gopls/bin/gopls");
    }

    #[test]
    fn test_expand_bare_variable() {
        let expanded = expand_variables("$storage_path/bin", &[("storage_path", "/data")]);
        assert_eq!(expanded, "/data/bin");
    }

    #[test]
    fn test_expand_leaves_unknown_variables() {
        let expanded = expand_variables("${home}/gopls", &[("storage_path", "/data")]);
        assert_eq!(expanded, "${home}/gopls");
    }

    #[test]
    fn test_resolve_binary_path_default() {
        let config = ManagerConfig::new("/data");
        let expected = with_executable_suffix(PathBuf::from("/data/LSP-gopls/bin/gopls"));
        assert_eq!(resolve_binary_path(&config), expected);
    }

    #[test]
    fn test_resolve_binary_path_override() {
        let mut config = ManagerConfig::new("/data");
        config.command = Some("${storage_path}/custom/gopls".to_string());
        let expected = with_executable_suffix(PathBuf::from("/data/custom/gopls"));
        assert_eq!(resolve_binary_path(&config), expected);
    }

    #[test]
    fn test_managed_binary_path_ignores_override() {
        let mut config = ManagerConfig::new("/data");
        config.command = Some("/usr/local/bin/gopls".to_string());
        let expected = with_executable_suffix(PathBuf::from("/data/LSP-gopls/bin/gopls"));
        assert_eq!(managed_binary_path(&config), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_is_executable_accepts_other_exec_bit() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool");
        std::fs::write(&file, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o601)).unwrap();
        assert!(is_executable(&file));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_executable_suffix_not_doubled() {
        let path = with_executable_suffix(PathBuf::from("C:\\tools\\gopls.exe"));
        assert_eq!(path, PathBuf::from("C:\\tools\\gopls.exe"));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_executable_suffix_untouched_off_windows() {
        let path = with_executable_suffix(PathBuf::from("/tools/gopls"));
        assert_eq!(path, PathBuf::from("/tools/gopls"));
    }

    #[test]
    fn test_is_executable_missing_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_executable(&dir.path().join("missing")));
        assert!(!is_executable(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_executable_requires_exec_bit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "data").unwrap();
        assert!(!is_executable(&file));

        let exe = dir.path().join("tool");
        write_executable(&exe);
        assert!(is_executable(&exe));
    }

    #[test]
    fn test_find_in_paths_searches_each_directory() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let exe = with_executable_suffix(second.path().join("go"));
        write_executable(&exe);

        let search = std::env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(find_in_paths("go", Some(search)), Some(exe));
    }

    #[test]
    fn test_find_in_paths_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let search = std::env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in_paths("go", Some(search)), None);
        assert_eq!(find_in_paths("go", None), None);
    }

    #[test]
    fn test_find_in_paths_accepts_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let exe = with_executable_suffix(dir.path().join("go"));
        write_executable(&exe);

        let found = find_in_paths(exe.to_str().unwrap(), None);
        assert_eq!(found, Some(exe));
    }
}
