use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/* -------------------------------------------------------------------------- */
/*                          Struct: GenerationConfig                          */
/* -------------------------------------------------------------------------- */

/// `GenerationConfig` is the optional `kodgen.json` file in the working
/// directory. Absent fields (or an absent file) fall back to the defaults
/// below.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    pub class_footer_macro_pattern: String,
    /// One of `gcc`, `clang`, `msvc`.
    pub compiler: String,
    pub generated_header_file_name_pattern: String,
    pub generated_source_file_name_pattern: String,
    pub header_file_footer_macro_pattern: String,
    pub should_abort_parsing_on_first_error: bool,
    pub supported_file_extensions: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            class_footer_macro_pattern: "##CLASSFULLNAME##_GENERATED".to_string(),
            compiler: "clang".to_string(),
            generated_header_file_name_pattern: "##FILENAME##.h.h".to_string(),
            generated_source_file_name_pattern: "##FILENAME##.src.h".to_string(),
            header_file_footer_macro_pattern: "File_##FILENAME##_GENERATED".to_string(),
            should_abort_parsing_on_first_error: true,
            supported_file_extensions: vec![".h".to_string()],
        }
    }
}

impl GenerationConfig {
    /// `load` reads `kodgen.json` from the working directory, falling back
    /// to defaults when the file is absent.
    pub fn load(working_directory: &Path) -> anyhow::Result<Self> {
        let path = working_directory.join("kodgen.json");

        if !path.exists() {
            return Ok(GenerationConfig::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {path:?}"))?;

        serde_json::from_str(&contents).with_context(|| format!("failed to parse {path:?}"))
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        // Given: A working directory without a config file.
        let dir = tempfile::tempdir().expect("temp dir");

        // When: Loading the configuration.
        let config = GenerationConfig::load(dir.path()).expect("load succeeds");

        // Then: Defaults apply.
        assert_eq!(config.compiler, "clang");
        assert_eq!(config.supported_file_extensions, vec![".h".to_string()]);
        assert!(config.should_abort_parsing_on_first_error);
    }

    #[test]
    fn test_load_overrides_from_json() {
        // Given: A config file overriding two fields.
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join("kodgen.json"),
            r#"{"compiler": "gcc", "supportedFileExtensions": [".h", ".hpp"]}"#,
        )
        .expect("write config");

        // When: Loading the configuration.
        let config = GenerationConfig::load(dir.path()).expect("load succeeds");

        // Then: Overrides apply, the rest stays default.
        assert_eq!(config.compiler, "gcc");
        assert_eq!(
            config.supported_file_extensions,
            vec![".h".to_string(), ".hpp".to_string()]
        );
        assert_eq!(config.generated_header_file_name_pattern, "##FILENAME##.h.h");
    }
}
