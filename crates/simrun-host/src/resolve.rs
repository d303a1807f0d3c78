use std::path::{Component, Path, PathBuf};

use simrun_abi::dynamic_library_file_name;

use crate::error::{Error, Result};

/// Where a backend module will be opened from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendLocation {
    /// A file that exists on disk, canonicalized when possible.
    File(PathBuf),
    /// A bare name left to the platform loader's own search path.
    SystemName(String),
}

impl BackendLocation {
    pub fn as_path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::SystemName(name) => Path::new(name),
        }
    }
}

fn is_bare_name(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn canonical_or_given(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolves a backend argument that is either a filesystem path or a logical module name.
///
/// Explicit paths must exist. Bare names are looked up in the working directory and
/// `search_dirs`, as given and with the platform library naming; anything not found on
/// disk is handed to the system loader.
pub fn resolve_backend(
    backend: impl AsRef<Path>,
    search_dirs: &[PathBuf],
) -> Result<BackendLocation> {
    let backend = backend.as_ref();
    if backend.as_os_str().is_empty() {
        return Err(Error::not_found(backend));
    }

    if !is_bare_name(backend) {
        if !backend.exists() {
            return Err(Error::not_found(backend));
        }
        return Ok(BackendLocation::File(canonical_or_given(backend)));
    }

    if backend.is_file() {
        return Ok(BackendLocation::File(canonical_or_given(backend)));
    }

    let name = backend.to_string_lossy();
    let platform_name = dynamic_library_file_name(&name);
    for dir in search_dirs {
        for candidate in [dir.join(backend), dir.join(&platform_name)] {
            if candidate.is_file() {
                return Ok(BackendLocation::File(canonical_or_given(&candidate)));
            }
        }
    }

    Ok(BackendLocation::SystemName(name.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_path_is_not_found() {
        match resolve_backend("/nonexistent/path", &[]) {
            Err(Error::BackendNotFound { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path"));
            }
            other => panic!("expected BackendNotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_backend_argument_is_not_found() {
        assert!(matches!(
            resolve_backend("", &[]),
            Err(Error::BackendNotFound { .. })
        ));
    }

    #[test]
    fn existing_explicit_path_is_canonicalized() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("epdll");
        std::fs::write(&file, b"").unwrap();
        let location = resolve_backend(&file, &[]).unwrap();
        assert_eq!(
            location,
            BackendLocation::File(std::fs::canonicalize(&file).unwrap())
        );
    }

    #[test]
    fn bare_name_found_in_search_dir_with_platform_naming() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(dynamic_library_file_name("energyplusapi"));
        std::fs::write(&file, b"").unwrap();
        let location = resolve_backend("energyplusapi", &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            location,
            BackendLocation::File(std::fs::canonicalize(&file).unwrap())
        );
    }

    #[test]
    fn earlier_search_dir_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("backend.bin"), b"").unwrap();
        std::fs::write(second.path().join("backend.bin"), b"").unwrap();
        let location = resolve_backend(
            "backend.bin",
            &[first.path().to_path_buf(), second.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(
            location.as_path(),
            std::fs::canonicalize(first.path().join("backend.bin")).unwrap()
        );
    }

    #[test]
    fn unknown_bare_name_falls_back_to_system_loader() {
        let location = resolve_backend("simrun_definitely_not_here", &[]).unwrap();
        assert_eq!(
            location,
            BackendLocation::SystemName("simrun_definitely_not_here".to_string())
        );
    }
}
