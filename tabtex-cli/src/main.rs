// Command-line interface for tabtex
//
// This binary turns a CSV file (or a JSON statistical result) into a typeset table:
// <name>.tex, <name>.pdf and <name>_cropped.pdf.
//
// The heavy lifting happens in the tabtex crate; this layer reads files, merges
// configuration with command line flags and reports the outcome.
//
// Usage:
//  tabtex <input> [options]           - Render a table (default)
//  tabtex render <input> [options]    - Same as above (explicit)
//  tabtex themes                      - List available themes
//  tabtex check                       - Report whether the compiler and cropper can be found
//
// Style Parameters:
//
// Per-call style fields are passed using --extra-<field> <value>.
// The CLI layer strips the "extra-" prefix and hands the pair to StyleOverrides::set.
// Example:
//  tabtex data.csv --extra-striped --extra-shading-color gray!20 --extra-font-size small
//
// Exit codes: 0 on success, 1 on failure, 2 when the table compiled but cropping failed.

mod input;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabtex::{
    check_tools, publish, write_source, Alignment, CollapseRows, CompileStage, Footnote,
    HeaderGroups, PublishSpec, StyleOverrides, TableError, ThemeRegistry, ToolOverrides, VAlign,
};
use tabtex_config::{Loader, TabtexConfig, PROJECT_CONFIG_FILE};

const EXIT_FAILURE: i32 = 1;
const EXIT_PARTIAL: i32 = 2;

const SUBCOMMANDS: &[&str] = &["render", "themes", "check", "help"];

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            let has_value = i + 1 < args.len() && !args[i + 1].starts_with('-');

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("tabtex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Turn tabular data into typeset, cropped table documents")
        .long_about(
            "tabtex renders a CSV file or a JSON statistical result as a LaTeX table,\n\
            compiles it with pdflatex and crops the result with pdfcrop.\n\n\
            Outputs (in the output directory):\n  \
            <name>.tex, <name>.pdf, <name>_cropped.pdf\n\n\
            Style Parameters:\n  \
            Use --extra-<field> [value] to override a style field for one call\n  \
            (shading-color, header-bold, font-size, striped, or any extension).\n  \
            Boolean fields can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            tabtex data.csv                              # Render with the default theme\n  \
            tabtex data.csv --theme striped -o out       # Striped theme, output in ./out\n  \
            tabtex fit.json --kind coefficients          # Coefficient table from a model\n  \
            tabtex data.csv --source-only                # Only write data.tex"
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a tabtex.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Report progress")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(render_command())
        .subcommand(Command::new("themes").about("List available themes"))
        .subcommand(
            Command::new("check")
                .about("Report whether the compiler and cropper can be found"),
        )
}

fn render_command() -> Command {
    Command::new("render")
        .about("Render a table (default command)")
        .arg(
            Arg::new("input")
                .help("CSV or JSON input file")
                .required(true)
                .index(1)
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .value_name("DIR")
                .help("Directory for the generated files")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Base name of the generated files (defaults to the input file name)"),
        )
        .arg(
            Arg::new("kind")
                .long("kind")
                .help("Tidy adapter for JSON input (coefficients, records)"),
        )
        .arg(Arg::new("theme").long("theme").help("Theme name"))
        .arg(
            Arg::new("align")
                .long("align")
                .help("Column alignment, e.g. 'lcr' or 'l S[table-format=2.3] r'"),
        )
        .arg(Arg::new("caption").long("caption").help("Table caption"))
        .arg(Arg::new("label").long("label").help("Cross-reference label"))
        .arg(
            Arg::new("longtable")
                .long("longtable")
                .help("Allow the table to break across pages")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("note")
                .long("note")
                .help("General note under the table"),
        )
        .arg(
            Arg::new("numbered-note")
                .long("numbered-note")
                .help("Numbered note (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("symbol-note")
                .long("symbol-note")
                .help("Symbol note (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("no-threeparttable")
                .long("no-threeparttable")
                .help("Emit notes as plain rows instead of a threeparttable")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("group")
                .long("group")
                .value_name("LABEL:SPAN")
                .help("Header group above the column names (repeatable, left to right)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("collapse")
                .long("collapse")
                .value_name("COLUMNS")
                .help("Merge repeated values in these 1-indexed columns, e.g. '1,2'"),
        )
        .arg(
            Arg::new("valign")
                .long("valign")
                .help("Vertical position of merged values (top, middle, bottom)"),
        )
        .arg(
            Arg::new("no-crop")
                .long("no-crop")
                .help("Skip cropping")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("crop-margin")
                .long("crop-margin")
                .help("Crop margin in points")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("Time limit for each tool run")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("compiler")
                .long("compiler")
                .help("Path to the LaTeX compiler")
                .value_hint(ValueHint::ExecutablePath),
        )
        .arg(
            Arg::new("cropper")
                .long("cropper")
                .help("Path to the PDF cropper")
                .value_hint(ValueHint::ExecutablePath),
        )
        .arg(
            Arg::new("source-only")
                .long("source-only")
                .help("Write the .tex file and stop")
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    // Try to parse args. If no subcommand is provided, inject "render"
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !SUBCOMMANDS.contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "render".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    let verbose = matches.get_flag("verbose");
    init_logging(verbose);

    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));

    let code = match matches.subcommand() {
        Some(("render", sub_matches)) => {
            handle_render_command(sub_matches, &config, &extra_params, verbose)
        }
        Some(("themes", _)) => handle_themes_command(&config),
        Some(("check", _)) => handle_check_command(&config),
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_cli_config(explicit_path: Option<&str>) -> TabtexConfig {
    let loader = Loader::new().with_optional_file(PROJECT_CONFIG_FILE);
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(EXIT_FAILURE);
    })
}

/// Theme registry seeded with the configured themes and current theme.
fn registry_from_config(config: &TabtexConfig) -> Result<ThemeRegistry, TableError> {
    let mut registry = ThemeRegistry::new();
    config.apply_themes(&mut registry)?;
    Ok(registry)
}

fn tool_overrides(config: &TabtexConfig, matches: Option<&ArgMatches>) -> ToolOverrides {
    let mut tools = ToolOverrides::from(&config.tools);
    if let Some(matches) = matches {
        if let Some(path) = matches.get_one::<String>("compiler") {
            tools.compiler = Some(PathBuf::from(path));
        }
        if let Some(path) = matches.get_one::<String>("cropper") {
            tools.cropper = Some(PathBuf::from(path));
        }
    }
    tools
}

fn handle_render_command(
    matches: &ArgMatches,
    config: &TabtexConfig,
    extra_params: &HashMap<String, String>,
    verbose: bool,
) -> i32 {
    match render(matches, config, extra_params, verbose) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            EXIT_FAILURE
        }
    }
}

fn render(
    matches: &ArgMatches,
    config: &TabtexConfig,
    extra_params: &HashMap<String, String>,
    verbose: bool,
) -> Result<i32, TableError> {
    let input = matches
        .get_one::<String>("input")
        .expect("input is required");
    let kind = matches.get_one::<String>("kind").map(|s| s.as_str());
    let table = input::load_table(Path::new(input), kind)?;

    let registry = registry_from_config(config)?;

    let mut style = StyleOverrides::default();
    for (key, value) in extra_params {
        style.set(key, value)?;
    }

    let output_dir = matches
        .get_one::<String>("output-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output.directory.clone());
    let crop_margin = matches
        .get_one::<f64>("crop-margin")
        .copied()
        .unwrap_or(config.output.crop_margin);

    let mut spec = PublishSpec::new(&table)
        .with_registry(&registry)
        .with_style(style)
        .with_shading_color(&config.style.shading_color)
        .with_document(config.document.document_options()?)
        .with_output_directory(&output_dir)
        .with_crop(config.output.crop && !matches.get_flag("no-crop"))
        .with_crop_margin(crop_margin)
        .with_tools(tool_overrides(config, Some(matches)))
        .with_longtable(matches.get_flag("longtable"))
        .with_verbose(verbose);

    let timeout = matches
        .get_one::<u64>("timeout")
        .map(|secs| Duration::from_secs(*secs))
        .or_else(|| config.output.timeout());
    if let Some(timeout) = timeout {
        spec = spec.with_timeout(timeout);
    }
    if let Some(name) = matches.get_one::<String>("name") {
        spec = spec.with_filename(name);
    }
    if let Some(theme) = matches.get_one::<String>("theme") {
        spec = spec.with_theme(theme.as_str());
    }
    if let Some(align) = matches.get_one::<String>("align") {
        spec = spec.with_alignment(align.parse::<Alignment>()?);
    }
    if let Some(caption) = matches.get_one::<String>("caption") {
        spec = spec.with_caption(caption);
    }
    if let Some(label) = matches.get_one::<String>("label") {
        spec = spec.with_label(label);
    }
    if let Some(footnote) = footnote_from_args(matches) {
        spec = spec.with_footnote(footnote);
    }
    if let Some(groups) = matches.get_many::<String>("group") {
        let groups = groups
            .map(|g| parse_group(g))
            .collect::<Result<Vec<_>, _>>()?;
        spec = spec.with_header_groups(HeaderGroups::new(groups));
    }
    if let Some(columns) = matches.get_one::<String>("collapse") {
        let mut collapse = CollapseRows::new(parse_columns(columns)?);
        if let Some(valign) = matches.get_one::<String>("valign") {
            collapse = collapse.with_valign(valign.parse::<VAlign>()?);
        }
        spec = spec.with_collapse(collapse);
    }

    if matches.get_flag("source-only") {
        let path = write_source(&spec)?;
        println!("{}", path.display());
        return Ok(0);
    }

    let result = publish(spec)?;
    for path in result.artifacts() {
        println!("{}", path.display());
    }
    if result.stage == CompileStage::CropFailed {
        eprintln!(
            "Warning: cropping failed ({}); the full document is at {}",
            result.crop_error.as_deref().unwrap_or("unknown error"),
            result.full_artifact.display()
        );
        return Ok(EXIT_PARTIAL);
    }
    Ok(0)
}

fn footnote_from_args(matches: &ArgMatches) -> Option<Footnote> {
    let mut footnote = Footnote::new().with_threeparttable(!matches.get_flag("no-threeparttable"));
    if let Some(note) = matches.get_one::<String>("note") {
        footnote = footnote.with_general(note);
    }
    for note in matches.get_many::<String>("numbered-note").into_iter().flatten() {
        footnote = footnote.with_numbered(note);
    }
    for note in matches.get_many::<String>("symbol-note").into_iter().flatten() {
        footnote = footnote.with_symbol(note);
    }
    (!footnote.is_empty()).then_some(footnote)
}

/// `LABEL:SPAN`; the label may itself contain colons.
fn parse_group(raw: &str) -> Result<(String, usize), TableError> {
    let invalid = || TableError::Configuration(format!("invalid header group '{raw}' (expected LABEL:SPAN)"));
    let (label, span) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let span = span.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((label.to_string(), span))
}

fn parse_columns(raw: &str) -> Result<Vec<usize>, TableError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>().map_err(|_| {
                TableError::Configuration(format!("invalid column '{s}' in --collapse"))
            })
        })
        .collect()
}

fn handle_themes_command(config: &TabtexConfig) -> i32 {
    let registry = match registry_from_config(config) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("Error: {err}");
            return EXIT_FAILURE;
        }
    };
    let current = registry.current().map(|t| t.name.clone());
    for name in registry.list_themes() {
        let marker = if current.as_deref() == Some(name.as_str()) {
            "*"
        } else {
            " "
        };
        let origin = if registry.is_builtin(&name) {
            "built-in"
        } else {
            "custom"
        };
        println!("{marker} {name} ({origin})");
    }
    0
}

fn handle_check_command(config: &TabtexConfig) -> i32 {
    let statuses = check_tools(&tool_overrides(config, None));
    let mut code = 0;
    for (index, status) in statuses.iter().enumerate() {
        match (&status.path, &status.problem) {
            (Some(path), _) => println!("{}: {}", status.name, path.display()),
            (None, problem) => {
                println!(
                    "{}: missing ({})",
                    status.name,
                    problem.as_deref().unwrap_or("not found")
                );
                // The cropper only matters when cropping is on
                if index == 0 || config.output.crop {
                    code = EXIT_FAILURE;
                }
            }
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_extra_args_empty() {
        let (cleaned, extras) = parse_extra_args(&args(&["tabtex", "data.csv"]));
        assert_eq!(cleaned, args(&["tabtex", "data.csv"]));
        assert!(extras.is_empty());
    }

    #[test]
    fn test_parse_extra_args_mixed_boolean_and_value() {
        let (cleaned, extras) = parse_extra_args(&args(&[
            "tabtex",
            "data.csv",
            "--extra-striped",
            "--extra-shading-color",
            "gray!20",
            "--theme",
            "compact",
            "--extras-font-size",
            "small",
        ]));
        assert_eq!(cleaned, args(&["tabtex", "data.csv", "--theme", "compact"]));
        assert_eq!(extras.get("striped").map(String::as_str), Some("true"));
        assert_eq!(extras.get("shading-color").map(String::as_str), Some("gray!20"));
        assert_eq!(extras.get("font-size").map(String::as_str), Some("small"));
    }

    #[test]
    fn test_parse_extra_args_boolean_flag_at_end() {
        let (_, extras) = parse_extra_args(&args(&["tabtex", "data.csv", "--extra-header-bold"]));
        assert_eq!(extras.get("header-bold").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_parse_group() {
        assert_eq!(parse_group("Scores:2").unwrap(), ("Scores".to_string(), 2));
        assert_eq!(parse_group("a:b:1").unwrap(), ("a:b".to_string(), 1));
        assert_eq!(parse_group(":1").unwrap(), (String::new(), 1));
        assert!(parse_group("Scores").is_err());
        assert!(parse_group("Scores:x").is_err());
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_columns("1, 3").unwrap(), vec![1, 3]);
        assert!(parse_columns("1,a").is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_render_arguments_parse() {
        let matches = build_cli()
            .try_get_matches_from(args(&[
                "tabtex",
                "render",
                "data.csv",
                "--group",
                ":1",
                "--group",
                "Scores:2",
                "--crop-margin",
                "2.5",
            ]))
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let groups: Vec<&String> = sub.get_many::<String>("group").unwrap().collect();
        assert_eq!(groups, vec![":1", "Scores:2"]);
        assert_eq!(sub.get_one::<f64>("crop-margin").copied(), Some(2.5));
    }
}
