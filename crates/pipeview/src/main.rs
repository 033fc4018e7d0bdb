//! CLI entry point for the pipeview trace converter.

use std::env;
use std::ffi::OsString;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use pipeview::{default_command, load_log, load_schema, setup_logger, SpikeDasm};
use pipeview_core::{build_graph, render_graph, TraceConfig};
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing::warn;
use tracing_subscriber as _;

const USAGE_TEXT: &str = "\
Usage: pipeview --log <file> --schema <file> --output <file> [options]

Required:
  -l, --log <file>      GenEvent log written by the simulator
  -s, --schema <file>   JSON schema describing the logged events
  -o, --output <file>   Kanata trace to write

Options:
  -v, --verbose         Keep squashed (flushed) instructions in the trace
  -r, --rocc            Decode instruction bytes as RoCC accelerator commands
      --dasm <command>  Disassembler command (default: $RISCV/bin/spike-dasm --isa=rv64gcv)
      --dot <file>      Also write the event graph in Graphviz DOT format
  -h, --help            Show this help message

Environment:
  RUST_LOG              Log filter for diagnostics on stderr (default: warn)

Examples:
  pipeview -l run.log -s schema.json -o run.kanata
  pipeview -l run.log -s schema.json -o run.kanata --verbose --dasm cat
";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    log: PathBuf,
    schema: PathBuf,
    output: PathBuf,
    verbose: bool,
    rocc: bool,
    dasm: Option<String>,
    dot: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Run(Args),
    Help,
}

fn value_for(arg: &OsString, args: &mut impl Iterator<Item = OsString>) -> Result<OsString, String> {
    args.next()
        .ok_or_else(|| format!("missing value for {}", arg.to_string_lossy()))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut log: Option<PathBuf> = None;
    let mut schema: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;
    let mut rocc = false;
    let mut dasm: Option<String> = None;
    let mut dot: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match &*arg.to_string_lossy() {
            "-h" | "--help" => return Ok(ParseResult::Help),
            "-v" | "--verbose" => verbose = true,
            "-r" | "--rocc" => rocc = true,
            "-l" | "--log" => log = Some(PathBuf::from(value_for(&arg, &mut args)?)),
            "-s" | "--schema" => schema = Some(PathBuf::from(value_for(&arg, &mut args)?)),
            "-o" | "--output" => output = Some(PathBuf::from(value_for(&arg, &mut args)?)),
            "--dot" => dot = Some(PathBuf::from(value_for(&arg, &mut args)?)),
            "--dasm" => {
                let command = value_for(&arg, &mut args)?;
                dasm = Some(command.to_string_lossy().into_owned());
            }
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    Ok(ParseResult::Run(Args {
        log: log.ok_or_else(|| "missing --log".to_string())?,
        schema: schema.ok_or_else(|| "missing --schema".to_string())?,
        output: output.ok_or_else(|| "missing --output".to_string())?,
        verbose,
        rocc,
        dasm,
        dot,
    }))
}

fn fail(error: impl Display) -> i32 {
    eprintln!("error: {error}");
    1
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), i32> {
    fs::write(path, contents)
        .map_err(|e| fail(format_args!("failed to write {}: {e}", path.display())))
}

fn run(args: Args) -> Result<(), i32> {
    let log = load_log(&args.log).map_err(fail)?;
    let schema = load_schema(&args.schema).map_err(fail)?;
    if log.skipped_lines > 0 {
        warn!(
            skipped = log.skipped_lines,
            log = %args.log.display(),
            "ignored malformed log lines"
        );
    }

    let config = TraceConfig::default()
        .with_verbose(args.verbose)
        .with_rocc_decode(args.rocc);
    let mut dasm = SpikeDasm::new(args.dasm.unwrap_or_else(default_command));

    let (graph, summary) = build_graph(log, &schema, &config, &mut dasm).map_err(fail)?;
    if let Some(dot) = &args.dot {
        write_file(dot, graph.to_dot())?;
    }

    let mut trace = Vec::new();
    let summary = render_graph(&graph, &schema, &config, summary, &mut trace).map_err(fail)?;
    write_file(&args.output, &trace)?;

    println!("{summary} -> {}", args.output.display());
    Ok(())
}

fn main() {
    setup_logger();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => match run(args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter()
            .map(OsString::from)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_required_and_optional_flags() {
        let result = parse_args(os(&[
            "--log",
            "run.log",
            "-s",
            "schema.json",
            "-o",
            "run.kanata",
            "-v",
            "--rocc",
            "--dasm",
            "cat",
            "--dot",
            "graph.dot",
        ]))
        .expect("valid args should parse");

        let ParseResult::Run(args) = result else {
            panic!("expected a run");
        };
        assert_eq!(
            args,
            Args {
                log: PathBuf::from("run.log"),
                schema: PathBuf::from("schema.json"),
                output: PathBuf::from("run.kanata"),
                verbose: true,
                rocc: true,
                dasm: Some("cat".to_string()),
                dot: Some(PathBuf::from("graph.dot")),
            }
        );
    }

    #[test]
    fn toggles_default_off() {
        let result = parse_args(os(&["-l", "a", "-s", "b", "-o", "c"])).expect("parses");
        let ParseResult::Run(args) = result else {
            panic!("expected a run");
        };
        assert!(!args.verbose);
        assert!(!args.rocc);
        assert_eq!(args.dasm, None);
        assert_eq!(args.dot, None);
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os(&["-l", "a", "--help"])).expect("help should parse");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn every_path_is_required() {
        let error = parse_args(os(&["-l", "a", "-o", "c"])).expect_err("schema missing");
        assert_eq!(error, "missing --schema");

        let error = parse_args(os(&["-s", "b", "-o", "c"])).expect_err("log missing");
        assert_eq!(error, "missing --log");
    }

    #[test]
    fn flag_without_value_is_rejected() {
        let error = parse_args(os(&["-l", "a", "-s", "b", "--output"])).expect_err("no value");
        assert!(error.contains("missing value for --output"));
    }

    #[test]
    fn rejects_unknown_argument() {
        let error = parse_args(os(&["--color"])).expect_err("unknown flag");
        assert!(error.contains("unexpected argument"));
    }
}
