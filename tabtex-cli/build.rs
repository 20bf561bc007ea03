use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the command tree from src/main.rs
// We need to duplicate this here since build scripts can't access src/ modules
const TIDY_KINDS: &[&str] = &["coefficients", "records"];
// Mirror of the names VAlign::from_str accepts
const VALIGN_VALUES: &[&str] = &["top", "middle", "bottom", "center", "t", "c", "m", "b"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let render = Command::new("render")
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
                .value_hint(ValueHint::DirPath),
        )
        .arg(Arg::new("name").long("name"))
        .arg(
            Arg::new("kind")
                .long("kind")
                .value_parser(clap::builder::PossibleValuesParser::new(TIDY_KINDS)),
        )
        .arg(Arg::new("theme").long("theme"))
        .arg(Arg::new("align").long("align"))
        .arg(Arg::new("caption").long("caption"))
        .arg(Arg::new("label").long("label"))
        .arg(Arg::new("longtable").long("longtable").action(ArgAction::SetTrue))
        .arg(Arg::new("note").long("note"))
        .arg(Arg::new("numbered-note").long("numbered-note").action(ArgAction::Append))
        .arg(Arg::new("symbol-note").long("symbol-note").action(ArgAction::Append))
        .arg(
            Arg::new("no-threeparttable")
                .long("no-threeparttable")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("group").long("group").action(ArgAction::Append))
        .arg(Arg::new("collapse").long("collapse"))
        .arg(
            Arg::new("valign")
                .long("valign")
                .value_parser(clap::builder::PossibleValuesParser::new(VALIGN_VALUES)),
        )
        .arg(Arg::new("no-crop").long("no-crop").action(ArgAction::SetTrue))
        .arg(Arg::new("crop-margin").long("crop-margin"))
        .arg(Arg::new("timeout").long("timeout"))
        .arg(
            Arg::new("compiler")
                .long("compiler")
                .value_hint(ValueHint::ExecutablePath),
        )
        .arg(
            Arg::new("cropper")
                .long("cropper")
                .value_hint(ValueHint::ExecutablePath),
        )
        .arg(Arg::new("source-only").long("source-only").action(ArgAction::SetTrue));

    let mut cmd = Command::new("tabtex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Turn tabular data into typeset, cropped table documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(render)
        .subcommand(Command::new("themes").about("List available themes"))
        .subcommand(Command::new("check").about("Report whether the compiler and cropper can be found"));

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "tabtex", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "tabtex", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "tabtex", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
