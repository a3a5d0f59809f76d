use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A source file read for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path the file was read from
    pub path: PathBuf,

    /// Exact file contents
    pub content: String,
}

impl SourceFile {
    /// Reads a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUtf8`] for non-UTF-8 content and
    /// [`Error::Io`] for any other read failure.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = read_text(&path)?;
        Ok(Self { path, content })
    }
}

/// Reads a UTF-8 file, mapping errors with path context.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            Error::invalid_utf8(path)
        } else {
            Error::io(path, e)
        }
    })
}

/// Returns the application a path belongs to.
///
/// For a directory this is the directory's own name; for anything else it
/// is the name of the parent directory.
///
/// # Examples
///
/// ```
/// use llm_qa_validator::extract_app_name;
///
/// assert_eq!(extract_app_name("apps/billing/main.py").as_deref(), Some("billing"));
/// ```
#[must_use]
pub fn extract_app_name(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    let named = if path.is_dir() { Some(path) } else { path.parent() };

    named
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_read_exact_contents() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("file.py");
        file.write_str("print('hi')\n\n").unwrap();

        let source = SourceFile::read(file.path()).unwrap();
        assert_eq!(source.content, "print('hi')\n\n");
        assert_eq!(source.path, file.path());
    }

    #[test]
    fn test_read_invalid_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("blob.py");
        file.write_binary(&[0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = SourceFile::read(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_read_missing() {
        let err = SourceFile::read("/nonexistent/file.py").unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_extract_app_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let app = temp.child("myapp");
        app.create_dir_all().unwrap();
        let main = app.child("main.py");
        main.write_str("pass").unwrap();

        assert_eq!(extract_app_name(main.path()).as_deref(), Some("myapp"));
        assert_eq!(extract_app_name(app.path()).as_deref(), Some("myapp"));
    }

    #[test]
    fn test_extract_app_name_without_parent() {
        assert_eq!(extract_app_name("/"), None);
    }
}
