//! Shared fixtures: sample tables and stub compiler/cropper scripts.

use tabtex::DataTable;

pub fn sample_table() -> DataTable {
    DataTable::new(
        vec!["group".into(), "score".into()],
        vec![
            vec!["treated".into(), "1.25".into()],
            vec!["control".into(), "0.75".into()],
        ],
    )
    .unwrap()
    .with_name("results")
}

#[cfg(unix)]
pub mod stubs {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Writes `<base>.pdf` next to the `.tex` it is given, like pdflatex.
    pub const COMPILER: &str = r#"for last; do :; done
base="${last%.tex}"
echo "This is a stub compiler"
printf '%%PDF-1.5\n%% full page\n' > "$base.pdf"
echo "Output written on $base.pdf" > "$base.log"
"#;

    /// Fails with a LaTeX-style error in the log.
    pub const FAILING_COMPILER: &str = r#"for last; do :; done
base="${last%.tex}"
printf 'This is a stub compiler\n! Undefined control sequence.\nl.7 \\badcommand\n\nNo pages of output.\n' > "$base.log"
echo "see log" >&2
exit 1
"#;

    /// `--margins "<m m m m>" <in> <out>`: copies and tags the input.
    pub const CROPPER: &str = r#"cp "$3" "$4"
printf '%% cropped with margins %s\n' "$2" >> "$4"
"#;

    pub const FAILING_CROPPER: &str = r#"echo "pdfcrop: no bounding box" >&2
exit 1
"#;

    pub fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }
}
