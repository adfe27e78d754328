use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Files kept under `<root>/.tally/`.
#[derive(Debug, Clone)]
pub struct TallyPaths {
    pub config_json: PathBuf,
    pub fixture_json: PathBuf,
}

impl TallyPaths {
    /// Derive all paths from a working directory. Pure computation, no I/O.
    pub fn discover(root: impl AsRef<Path>) -> Self {
        let tally_dir = root.as_ref().join(".tally");
        Self {
            config_json: tally_dir.join("config.json"),
            fixture_json: tally_dir.join("fixture.json"),
        }
    }
}

/// Replace `path` with `data` in one step: the bytes go to a temp file next to
/// it, which is then renamed over the target. Missing parent dirs are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let Some(dir) = path.parent() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        ));
    };
    std::fs::create_dir_all(dir)?;
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    staged.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_is_pure() {
        let paths = TallyPaths::discover("/tmp/nowhere");
        assert_eq!(paths.config_json, PathBuf::from("/tmp/nowhere/.tally/config.json"));
        assert_eq!(paths.fixture_json, PathBuf::from("/tmp/nowhere/.tally/fixture.json"));
        assert!(!paths.config_json.exists());
    }

    #[test]
    fn write_atomic_creates_parent_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".tally").join("config.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        write_atomic(&path, b"{\"source\":\"remote\"}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"source\":\"remote\"}");
    }

    #[test]
    fn write_atomic_rejects_bare_root() {
        let err = write_atomic(Path::new("/"), b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
