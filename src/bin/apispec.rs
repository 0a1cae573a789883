//! apispec CLI
//!
//! Command-line interface for validating, elaborating and inspecting service
//! specifications.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use apispec::{
    body_schema, bundle, elaborate_with, example, lint, load_service_auto, request_bodies,
    validate_service, ElaborateOptions, FileStatus, Service, Severity, TypeOptions, TypeResolver,
    ValidateError, DEFAULT_PAGE_SIZE,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apispec")]
#[command(about = "Elaborate and check declarative API specifications")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a specification with default endpoints, filters and standard types
    Elaborate {
        /// Specification source: file path or URL (http:// or https://)
        spec: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Default `limit` for List and Search endpoints
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },

    /// Check a specification for structural errors
    Validate {
        /// Specification source: file path or URL
        spec: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint specification files (syntax, validation, suspicious declarations)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print an example instance of an object from the elaborated specification
    Example {
        spec: String,

        /// Object name (e.g. User, UserFilter, Pagination)
        object: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the target-language types of an object's fields
    Types {
        spec: String,

        object: String,

        /// Namespace of scalar wrapper types
        #[arg(long, default_value = "types")]
        namespace: String,
    },

    /// Print a self-contained JSON Schema for an object
    Schema {
        spec: String,

        object: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the deduplicated request-body schemas
    Bodies {
        spec: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Elaborate {
            spec,
            output,
            pretty,
            format,
            page_size,
        } => run_elaborate(&spec, output, pretty, format, page_size),
        Commands::Validate { spec, json } => run_validate(&spec, json),
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
        Commands::Example {
            spec,
            object,
            pretty,
        } => run_example(&spec, &object, pretty),
        Commands::Types {
            spec,
            object,
            namespace,
        } => run_types(&spec, &object, namespace),
        Commands::Schema {
            spec,
            object,
            pretty,
        } => run_schema(&spec, &object, pretty),
        Commands::Bodies { spec, pretty } => run_bodies(&spec, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

/// Load and structurally validate a specification, reporting failures.
fn load_valid(source: &str) -> Result<Service, u8> {
    let service = load_service_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    validate_service(&service).map_err(|e| {
        report_invalid(&e);
        e.exit_code() as u8
    })?;
    Ok(service)
}

fn load_elaborated(source: &str) -> Result<Service, u8> {
    let service = load_valid(source)?;
    Ok(elaborate_with(&service, &ElaborateOptions::default()))
}

fn report_invalid(e: &ValidateError) {
    eprintln!("Error: {}", e);
    for issue in e.issues() {
        eprintln!("  {}", issue);
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn run_elaborate(
    source: &str,
    output: Option<PathBuf>,
    pretty: bool,
    format: OutputFormat,
    page_size: u32,
) -> Result<(), u8> {
    let service = load_valid(source)?;
    let options = ElaborateOptions::new().default_page_size(page_size);
    let elaborated = elaborate_with(&service, &options);

    let text = match format {
        OutputFormat::Json => to_json(&elaborated, pretty)?,
        OutputFormat::Yaml => serde_yaml::to_string(&elaborated).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &text).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", text.trim_end());
        }
    }

    Ok(())
}

fn run_validate(source: &str, json_output: bool) -> Result<(), u8> {
    let service = load_service_auto(source).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    match validate_service(&service) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(e) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "issues": e.issues()
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for issue in e.issues() {
                    eprintln!("  {}", issue);
                }
            }
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        println!("{}", to_json(&result, true)?);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_example(source: &str, object: &str, pretty: bool) -> Result<(), u8> {
    let service = load_elaborated(source)?;
    let value = example(object, &service).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    println!("{}", to_json(&value, pretty)?);
    Ok(())
}

fn run_types(source: &str, object: &str, namespace: String) -> Result<(), u8> {
    let service = load_elaborated(source)?;
    let Some(target) = service.object(object) else {
        let e = ValidateError::UnknownObject {
            name: object.to_string(),
        };
        eprintln!("Error: {}", e);
        return Err(e.exit_code() as u8);
    };

    let resolver = TypeResolver::new(&service, TypeOptions::new(namespace));
    let fields = resolver.resolve_object(target);
    let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    println!("{}", target.name);
    for (name, target_type) in fields {
        println!("  {:width$}  {}", name, target_type, width = width);
    }
    Ok(())
}

fn run_schema(source: &str, object: &str, pretty: bool) -> Result<(), u8> {
    let service = load_elaborated(source)?;
    let schema = bundle(object, &service).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    println!("{}", to_json(&schema, pretty)?);
    Ok(())
}

fn run_bodies(source: &str, pretty: bool) -> Result<(), u8> {
    let service = load_elaborated(source)?;
    let bodies: Vec<serde_json::Value> = request_bodies(&service)
        .iter()
        .map(|body| {
            serde_json::json!({
                "name": body.name,
                "usedBy": body.used_by,
                "existingObject": body.existing_object,
                "schema": body_schema(body, &service),
            })
        })
        .collect();
    println!("{}", to_json(&bodies, pretty)?);
    Ok(())
}
