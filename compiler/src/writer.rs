use std::fs;
use std::path::Path;

use tracing::info;

use crate::{error::OutputError, types::ValidatedSchema};

pub const HEADER: &str = "// @generated by netmsgc. DO NOT EDIT.";
pub const FOOTER: &str = "// end of generated code";

/// Joins the fragments between the header and footer. The result depends only
/// on the schema, so regenerating an unchanged schema gives identical bytes.
pub fn render(schema: &ValidatedSchema, fragments: &[String]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(&format!("// namespace: {}\n", schema.namespace().unwrap_or("(all)")));
    out.push_str(&format!(
        "// messages: {}, enums: {}\n",
        schema.messages().len(),
        schema.enums().len()
    ));

    for fragment in fragments {
        out.push('\n');
        out.push_str(fragment);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(FOOTER);
    out.push('\n');
    out
}

/// Writes the artifact to `path`, replacing any previous file. The parent
/// directory must already exist.
pub fn write_output(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "wrote generated code");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract::extract_schema, verifier::verify_schema};

    #[test]
    fn render_wraps_fragments() {
        let schema = verify_schema(extract_schema(&[], Some("Game"), None)).unwrap();
        let text = render(&schema, &["A".to_string(), "B".to_string()]);
        assert_eq!(
            text,
            "// @generated by netmsgc. DO NOT EDIT.\n// namespace: Game\n// messages: 0, enums: 0\n\nA\n\nB\n\n// end of generated code\n"
        );
    }

    #[test]
    fn write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.rs");
        write_output(&path, "first").unwrap();
        write_output(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn missing_directory_is_an_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.rs");
        let err = write_output(&path, "x").unwrap_err();
        assert_eq!(err.path, path);
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }
}
