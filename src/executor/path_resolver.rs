use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Finds the file a command name refers to.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathResolver;

impl PathResolver {
    /// Names with a `/` are taken as paths; anything else is searched for in
    /// `path_var` (the `PATH` of the environment the program will see).
    pub fn resolve(&self, command: &str, path_var: Option<&str>) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }

        if command.contains('/') {
            let path = Path::new(command);
            return is_executable(path).then(|| path.to_path_buf());
        }

        let paths = path_var?;
        std::env::split_paths(paths)
            .map(|dir| dir.join(command))
            .find(|candidate| is_executable(candidate))
    }
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_searches_path_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(second.path(), "tool", 0o755);
        let expected = make_file(first.path(), "tool", 0o755);

        let path_var = format!("{}:{}", first.path().display(), second.path().display());
        assert_eq!(PathResolver.resolve("tool", Some(&path_var)), Some(expected));
    }

    #[test]
    fn test_skips_non_executable_files() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(first.path(), "tool", 0o644);
        let expected = make_file(second.path(), "tool", 0o700);

        let path_var = format!("{}:{}", first.path().display(), second.path().display());
        assert_eq!(PathResolver.resolve("tool", Some(&path_var)), Some(expected));
    }

    #[test]
    fn test_slash_bypasses_search() {
        let dir = tempfile::tempdir().unwrap();
        let script = make_file(dir.path(), "run.sh", 0o755);
        let name = script.to_str().unwrap();
        assert_eq!(PathResolver.resolve(name, None), Some(script.clone()));
        assert_eq!(PathResolver.resolve(&format!("{}/nope", dir.path().display()), None), None);
    }

    #[test]
    fn test_missing_command() {
        let dir = tempfile::tempdir().unwrap();
        let path_var = dir.path().display().to_string();
        assert_eq!(PathResolver.resolve("tool", Some(&path_var)), None);
        assert_eq!(PathResolver.resolve("tool", None), None);
        assert_eq!(PathResolver.resolve("", Some("/bin")), None);
    }
}
