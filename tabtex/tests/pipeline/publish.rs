use crate::common::sample_table;
use tabtex::{render_source, DataTable, HeaderGroups, PublishSpec, TableError, ThemeRegistry};

#[test]
fn header_group_mismatch_fails_before_anything_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never-created");
    let table = sample_table();
    let registry = ThemeRegistry::new();
    let spec = PublishSpec::new(&table)
        .with_registry(&registry)
        .with_output_directory(&out)
        .with_header_groups(HeaderGroups::new(vec![("Outcome", 3)]));

    match tabtex::write_source(&spec) {
        Err(TableError::Configuration(msg)) => assert!(msg.contains("span 3")),
        other => panic!("Expected Configuration error, got {other:?}"),
    }
    assert!(!out.exists());
}

#[test]
fn ragged_input_is_rejected() {
    let result = DataTable::new(
        vec!["a".into(), "b".into()],
        vec![vec!["1".into()]],
    );
    assert!(matches!(result, Err(TableError::InputValidation(_))));
}

#[test]
fn csv_input_renders_with_every_decoration() {
    let csv = "region,product,q1,q2\nNorth,A,1.5,2.25\nNorth,B,3.0,4.5\nSouth,A,5.75,6.0\n";
    let table = DataTable::from_csv_reader(csv.as_bytes()).unwrap();
    let registry = ThemeRegistry::new();
    let spec = PublishSpec::new(&table)
        .with_registry(&registry)
        .with_theme("striped")
        .with_alignment("l l S[table-format=1.2] S[table-format=1.2]".parse().unwrap())
        .with_header_groups(HeaderGroups::new(vec![("", 2), ("Quarter", 2)]))
        .with_collapse(tabtex::CollapseRows::new(vec![1]))
        .with_footnote(tabtex::Footnote::new().with_general("Units sold, thousands"));

    let source = render_source(&spec).unwrap().source;
    for package in [
        "\\usepackage{booktabs}",
        "\\usepackage[table]{xcolor}",
        "\\usepackage{siunitx}",
        "\\usepackage{threeparttable}",
        "\\usepackage{multirow}",
    ] {
        assert!(source.contains(package), "missing {package}");
    }
    assert!(source.contains("\\multicolumn{2}{c}{} & \\multicolumn{2}{c}{Quarter} \\\\\n\\cmidrule(lr){3-4}\n"));
    assert!(source.contains("{\\textbf{q1}} & {\\textbf{q2}} \\\\"));
    assert!(source.contains("\\multirow[t]{2}{*}{North} & A & 1.5 & 2.25 \\\\"));
    assert!(source.contains("\\item \\textit{Note:} Units sold, thousands"));
}

#[cfg(all(unix, feature = "native-export"))]
mod unix {
    use crate::common::sample_table;
    use crate::common::stubs::{
        write_tool, COMPILER, CROPPER, FAILING_COMPILER, FAILING_CROPPER,
    };
    use std::fs;
    use std::path::PathBuf;
    use tabtex::{publish, CompileStage, PublishSpec, TableError, ThemeRegistry, ToolOverrides};
    use tempfile::tempdir;

    fn tools(compiler: PathBuf, cropper: PathBuf) -> ToolOverrides {
        ToolOverrides {
            compiler: Some(compiler),
            cropper: Some(cropper),
        }
    }

    #[test]
    fn produces_three_artifacts() {
        let bin = tempdir().unwrap();
        let out = tempdir().unwrap();
        let table = sample_table();
        let registry = ThemeRegistry::new();
        let spec = PublishSpec::new(&table)
            .with_registry(&registry)
            .with_output_directory(out.path())
            .with_tools(tools(
                write_tool(bin.path(), "pdflatex", COMPILER),
                write_tool(bin.path(), "pdfcrop", CROPPER),
            ));

        let result = publish(spec).unwrap();
        assert!(result.success);
        assert_eq!(result.stage, CompileStage::Cropped);

        let tex = out.path().join("results.tex");
        let full = out.path().join("results.pdf");
        let cropped = out.path().join("results_cropped.pdf");
        assert_eq!(result.source_path, tex);
        assert_eq!(result.full_artifact, full);
        assert_eq!(result.cropped_artifact.as_deref(), Some(cropped.as_path()));
        assert!(fs::read_to_string(&tex).unwrap().contains("treated & 1.25"));

        let full_bytes = fs::read(&full).unwrap();
        let cropped_bytes = fs::read(&cropped).unwrap();
        assert!(full_bytes.starts_with(b"%PDF"));
        assert_ne!(full_bytes, cropped_bytes);
        assert!(String::from_utf8_lossy(&cropped_bytes).contains("margins 10 10 10 10"));
    }

    #[test]
    fn crop_margin_is_passed_through() {
        let bin = tempdir().unwrap();
        let out = tempdir().unwrap();
        let table = sample_table();
        let registry = ThemeRegistry::new();
        let spec = PublishSpec::new(&table)
            .with_registry(&registry)
            .with_output_directory(out.path())
            .with_crop_margin(2.5)
            .with_tools(tools(
                write_tool(bin.path(), "pdflatex", COMPILER),
                write_tool(bin.path(), "pdfcrop", CROPPER),
            ));
        let result = publish(spec).unwrap();
        let cropped = fs::read_to_string(result.cropped_artifact.unwrap()).unwrap();
        assert!(cropped.contains("margins 2.5 2.5 2.5 2.5"));
    }

    #[test]
    fn failing_compiler_reports_log_detail() {
        let bin = tempdir().unwrap();
        let out = tempdir().unwrap();
        let table = sample_table();
        let registry = ThemeRegistry::new();
        let spec = PublishSpec::new(&table)
            .with_registry(&registry)
            .with_output_directory(out.path())
            .with_tools(tools(
                write_tool(bin.path(), "pdflatex", FAILING_COMPILER),
                write_tool(bin.path(), "pdfcrop", CROPPER),
            ));

        match publish(spec) {
            Err(TableError::ExternalTool { tool, detail }) => {
                assert_eq!(tool, "pdflatex");
                assert!(detail.contains("! Undefined control sequence."));
                assert!(detail.contains("l.7 \\badcommand"));
            }
            other => panic!("Expected ExternalTool error, got {other:?}"),
        }
        assert!(out.path().join("results.tex").exists());
        assert!(!out.path().join("results_cropped.pdf").exists());
    }

    #[test]
    fn failing_cropper_keeps_full_document() {
        let bin = tempdir().unwrap();
        let out = tempdir().unwrap();
        let table = sample_table();
        let registry = ThemeRegistry::new();
        let spec = PublishSpec::new(&table)
            .with_registry(&registry)
            .with_output_directory(out.path())
            .with_tools(tools(
                write_tool(bin.path(), "pdflatex", COMPILER),
                write_tool(bin.path(), "pdfcrop", FAILING_CROPPER),
            ));

        let result = publish(spec).unwrap();
        assert!(!result.success);
        assert_eq!(result.stage, CompileStage::CropFailed);
        assert!(result.full_artifact.exists());
        assert!(result.crop_error.as_deref().unwrap().contains("no bounding box"));

        match result.into_result() {
            Err(TableError::CropFailed { full_artifact, .. }) => {
                assert_eq!(full_artifact, out.path().join("results.pdf"));
            }
            other => panic!("Expected CropFailed, got {other:?}"),
        }
    }

    #[test]
    fn crop_disabled_needs_no_cropper() {
        let bin = tempdir().unwrap();
        let out = tempdir().unwrap();
        let table = sample_table();
        let registry = ThemeRegistry::new();
        let spec = PublishSpec::new(&table)
            .with_registry(&registry)
            .with_output_directory(out.path().join("nested/dir"))
            .with_crop(false)
            .with_tools(tools(
                write_tool(bin.path(), "pdflatex", COMPILER),
                PathBuf::from("/definitely/not/here/pdfcrop"),
            ));

        let result = publish(spec).unwrap();
        assert!(result.success);
        assert_eq!(result.stage, CompileStage::CropSkipped);
        assert_eq!(result.cropped_artifact, None);
        assert!(out.path().join("nested/dir/results.pdf").exists());
    }

    #[test]
    fn missing_compiler_fails_before_writing() {
        let out = tempdir().unwrap();
        let target = out.path().join("out");
        let table = sample_table();
        let registry = ThemeRegistry::new();
        let spec = PublishSpec::new(&table)
            .with_registry(&registry)
            .with_output_directory(&target)
            .with_crop(false)
            .with_tools(ToolOverrides {
                compiler: Some(PathBuf::from("/definitely/not/here/pdflatex")),
                cropper: None,
            });

        assert!(matches!(
            publish(spec),
            Err(TableError::ExternalTool { .. })
        ));
        assert!(!target.exists());
    }
}
