use std::path::Path;
use std::path::PathBuf;

/* -------------------------------------------------------------------------- */
/*                           Struct: GeneratedFile                            */
/* -------------------------------------------------------------------------- */

/// `GeneratedFile` buffers one artifact in memory and lands it atomically:
/// the content is written to a sibling temporary file and renamed over the
/// target only on success, so a failed pass never leaves a half-written
/// artifact for a downstream build to consume.
#[derive(Clone, Debug)]
pub struct GeneratedFile {
    contents: String,
    path: PathBuf,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GeneratedFile {
            contents: String::new(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `write` appends text to the buffered artifact.
    pub fn write(&mut self, input: &str) {
        self.contents.push_str(input);
    }

    /// `write_line` appends text followed by a line break.
    pub fn write_line(&mut self, input: &str) {
        self.contents.push_str(input);
        self.contents.push('\n');
    }

    /// `commit` writes the buffered content to disk atomically.
    pub fn commit(self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&temp_path, &self.contents)?;
        std::fs::rename(&temp_path, &self.path)
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */
