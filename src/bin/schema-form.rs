//! Schema Form CLI
//!
//! Command-line interface for compiling schemas into form fields and
//! validating values against them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_form::{create_form, load_json, Form, FormConfig};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "schema-form")]
#[command(about = "Compile JSON Schemas into form fields and validate values")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the field tree of a schema as JSON
    Fields {
        /// Schema file
        schema: PathBuf,

        /// Values file used to resolve conditional branches
        #[arg(long)]
        values: Option<PathBuf>,

        /// Require x-jsf-presentation.inputType on every field
        #[arg(long)]
        strict_input_type: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a values file against a schema
    Validate {
        /// Schema file
        schema: PathBuf,

        /// Values file to validate
        values: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Require x-jsf-presentation.inputType on every field
        #[arg(long)]
        strict_input_type: bool,

        /// Ignore values sent for fields a conditional branch disallows
        #[arg(long)]
        allow_forbidden_values: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fields {
            schema,
            values,
            strict_input_type,
            output,
            pretty,
        } => run_fields(&schema, values.as_deref(), strict_input_type, output, pretty),

        Commands::Validate {
            schema,
            values,
            json,
            strict_input_type,
            allow_forbidden_values,
        } => run_validate(
            &schema,
            &values,
            json,
            FormConfig::new()
                .strict_input_type(strict_input_type)
                .allow_forbidden_values(allow_forbidden_values),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_fields(
    schema_path: &Path,
    values_path: Option<&Path>,
    strict_input_type: bool,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let schema = load(schema_path, false)?;
    let values = match values_path {
        Some(path) => load(path, false)?,
        None => Value::Object(Map::new()),
    };

    let config = FormConfig::new()
        .initial_values(values)
        .strict_input_type(strict_input_type);
    let form = compile(schema, config, false)?;

    let json_output = if pretty {
        serde_json::to_string_pretty(form.fields())
    } else {
        serde_json::to_string(form.fields())
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_validate(
    schema_path: &Path,
    values_path: &Path,
    json_output: bool,
    config: FormConfig,
) -> Result<(), u8> {
    let schema = load(schema_path, json_output)?;
    let values = load(values_path, json_output)?;

    let mut form = compile(schema, config, json_output)?;
    let result = form.handle_validation(&values).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    match result.form_errors {
        None => {
            if json_output {
                println!("{}", json!({ "valid": true }));
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Some(errors) => {
            if json_output {
                println!("{}", json!({ "valid": false, "formErrors": errors }));
            } else {
                eprintln!("Validation failed:");
                for (path, message) in errors.leaves() {
                    let path = path.join(".");
                    let path = if path.is_empty() { "<root>" } else { path.as_str() };
                    eprintln!("  {}: {}", path, message);
                }
            }
            Err(1)
        }
    }
}

fn load(path: &Path, json_output: bool) -> Result<Value, u8> {
    load_json(path).map_err(|e| {
        report_error(json_output, &format!("loading {}: {}", path.display(), e));
        e.exit_code() as u8
    })
}

fn compile(schema: Value, config: FormConfig, json_output: bool) -> Result<Form, u8> {
    create_form(schema, config).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
