// Command-line interface for LML
//
// This binary provides commands for converting, rendering and validating
// LML documents.
//
// The core capabilities live in the lml-babel crate. This program is a thin
// shell over that library: it reads files, picks formats, and writes output.
//
// Converting:
//
// The conversion needs a to and from pair. The from side is auto-detected
// from the file extension, while being overwrittable by an explicit --from
// flag. When --to is omitted it is detected from the output filename, and
// failing that falls back to the configured default format.
// Usage:
//  lml <input> --to <format> [--from <format>] [--output <file>]  - Convert between formats (default)
//  lml convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above (explicit)
//  lml render <input> [--output <file>]  - Render to an HTML fragment
//  lml validate <input> [--json]         - Lint a document without converting it
//  lml --list-formats                    - List registered formats

use clap::{Arg, ArgAction, Command, ValueHint};
use lml_babel::{import_latex, render_to_markup, FormatRegistry};
use lml_config::{LmlConfig, Loader};
use lml_core::{validate, DocumentData, Severity};
use std::fs;

fn build_cli() -> Command {
    Command::new("lml")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for converting, rendering and validating LML documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List registered conversion formats")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a configuration file (TOML)")
                .long_help(
                    "Path to a configuration file in TOML format.\n\n\
                    Settings from this file are layered over the built-in\n\
                    defaults. Without this flag, an `lml.toml` in the current\n\
                    directory is used when present.",
                )
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a document between formats")
                .long_about(
                    "Convert a document between formats.\n\n\
                    This is the default subcommand: `lml input.tex --to lml`\n\
                    and `lml convert input.tex --to lml` are equivalent.\n\n\
                    Examples:\n  \
                    lml paper.tex --to lml            # LaTeX import to stdout\n  \
                    lml doc.lml --to markdown -o doc.md\n  \
                    lml doc.lml --to lml              # Canonical reformat",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .long_help(
                            "Source format to convert from.\n\n\
                            If not specified, the format is auto-detected from the file extension.\n\
                            Use this option to override auto-detection.",
                        )
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (detected from --output, else the configured default)")
                        .long_help(
                            "Target format to convert to.\n\n\
                            Available formats: lml, braces, latex, markdown, html\n\
                            Use the format name, not the file extension.",
                        )
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Render an LML document to an HTML fragment")
                .long_about(
                    "Render an LML document to an HTML fragment.\n\n\
                    Block elements carry source-line attributes so a host\n\
                    application can map rendered output back to the source.\n\
                    Math spans are wrapped for client-side typesetting.",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check an LML document for problems")
                .long_about(
                    "Check an LML document for problems without converting it.\n\n\
                    Diagnostics are printed one per line as\n\
                    `line:column severity[code] message`. With --json the full\n\
                    report is printed as a JSON object instead.\n\n\
                    The exit code is non-zero when any diagnostic has error\n\
                    severity.",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit the report as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() {
    // Try to parse args. If no subcommand is provided, inject "convert"
    let args: Vec<String> = std::env::args().collect();

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&args) {
        Ok(m) => m,
        Err(e) => {
            // A first argument that looks like a file means the subcommand
            // was elided; retry with "convert" injected.
            if args.len() > 1
                && !args[1].starts_with('-')
                && args[1] != "convert"
                && args[1] != "render"
                && args[1] != "validate"
                && args[1] != "help"
            {
                let mut new_args = vec![args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    if matches.get_flag("list-formats") {
        handle_list_formats_command();
        return;
    }

    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());

            let registry = FormatRegistry::default();

            let from = match sub_matches.get_one::<String>("from") {
                Some(f) => f.to_string(),
                None => match registry.detect_format_from_filename(input) {
                    Some(detected) => detected,
                    None => {
                        eprintln!("Error: Could not detect format from filename '{input}'");
                        eprintln!("Please specify --from explicitly");
                        std::process::exit(1);
                    }
                },
            };

            let to = match sub_matches.get_one::<String>("to") {
                Some(t) => t.to_string(),
                None => output
                    .and_then(|path| registry.detect_format_from_filename(path))
                    .unwrap_or_else(|| config.convert.default_format.clone()),
            };

            handle_convert_command(&registry, input, &from, &to, output, &config);
        }
        Some(("render", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_render_command(input, output);
        }
        Some(("validate", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let json = sub_matches.get_flag("json");
            handle_validate_command(input, json);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// Handle the convert command
fn handle_convert_command(
    registry: &FormatRegistry,
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    config: &LmlConfig,
) {
    // Validate formats exist
    if let Err(e) = registry.get(from) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = registry.get(to) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let source = read_input(input);

    // Parse. The LaTeX importer is driven directly so that configured import
    // options apply and its warnings reach the user.
    let doc = if from == "latex" {
        let import = import_latex(&source, &(&config.import).into());
        for warning in &import.warnings {
            eprintln!("Warning: {warning}");
        }
        if !import.errors.is_empty() {
            for error in &import.errors {
                eprintln!("Error: {error}");
            }
            std::process::exit(1);
        }
        DocumentData {
            meta: import.meta,
            blocks: import.blocks,
            bibliography: import.bibliography,
        }
    } else {
        registry.parse(&source, from).unwrap_or_else(|e| {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        })
    };

    // Serialize. Canonical output honors the configured serializer knobs.
    let result = if to == "lml" {
        lml_core::text::serialize_with_options(&doc, &(&config.serialize).into())
    } else {
        registry.serialize(&doc, to).unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        })
    };

    write_output(output, &result);
}

/// Handle the render command
fn handle_render_command(input: &str, output: Option<&str>) {
    let source = read_input(input);
    let markup = render_to_markup(&source);
    write_output(output, &markup);
}

/// Handle the validate command
fn handle_validate_command(input: &str, json: bool) {
    let source = read_input(input);
    let report = validate(&source);

    if json {
        let rendered = serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
            eprintln!("Error serializing report: {e}");
            std::process::exit(1);
        });
        println!("{rendered}");
    } else {
        for diagnostic in &report.diagnostics {
            let severity = match diagnostic.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "info",
            };
            println!(
                "{}:{} {severity}[{}] {}",
                diagnostic.line, diagnostic.column, diagnostic.code, diagnostic.message
            );
        }
        let errors = report
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        println!(
            "{} diagnostic(s), {errors} error(s)",
            report.diagnostics.len()
        );
    }

    if !report.valid {
        std::process::exit(1);
    }
}

/// Handle the list-formats command
fn handle_list_formats_command() {
    let registry = FormatRegistry::default();
    println!("Registered formats:\n");
    for name in registry.list_formats() {
        let format = registry.get(&name).expect("listed format is registered");
        let direction = match (format.supports_parsing(), format.supports_serialization()) {
            (true, true) => "import/export",
            (true, false) => "import only",
            (false, true) => "export only",
            (false, false) => "unusable",
        };
        println!("  {name:<10} {direction:<14} {}", format.description());
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> LmlConfig {
    let loader = Loader::new().with_optional_file("lml.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn read_input(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn write_output(path: Option<&str>, content: &str) {
    match path {
        Some(path) => {
            fs::write(path, content).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        None => print!("{content}"),
    }
}
