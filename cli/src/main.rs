use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use serde_json::Value as Json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stencil::{
    Engine, EngineOptions, Escape, ExecutionOptions, UserFunction, format_json,
    render_diagnostics, render_error,
};

/// Stencil - Handlebars templates with embedded expressions and user functions
#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(about = "Render Stencil templates", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template to stdout
    Render {
        /// Template file, or `-` to read from stdin
        template: PathBuf,

        /// JSON file with the data to render against
        #[arg(long)]
        data: Option<PathBuf>,

        /// JSON file with an array of function definitions
        #[arg(long)]
        functions: Option<PathBuf>,

        /// Pretty-print the output if it is valid JSON
        #[arg(long)]
        pretty: bool,

        /// How interpolated values are escaped
        #[arg(long, value_enum, default_value_t = EscapeArg::Html)]
        escape: EscapeArg,

        /// Fail on missing fields and helpers
        #[arg(long)]
        strict: bool,

        /// Maximum evaluation steps per expression or function call
        #[arg(long)]
        max_steps: Option<u64>,

        /// Wall-clock limit per expression or function call, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Test-run a single function
    Call {
        /// JSON file with an array of function definitions
        #[arg(long)]
        functions: PathBuf,

        /// Name of the function to run
        name: String,

        /// Arguments, parsed as JSON or taken as plain strings
        args: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EscapeArg {
    Html,
    None,
    Json,
}

impl From<EscapeArg> for Escape {
    fn from(arg: EscapeArg) -> Self {
        match arg {
            EscapeArg::Html => Escape::Html,
            EscapeArg::None => Escape::None,
            EscapeArg::Json => Escape::Json,
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .into_diagnostic()
            .wrap_err("Failed to read template from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))
}

fn read_data(path: Option<&Path>) -> Result<Json> {
    let Some(path) = path else {
        return Ok(Json::Object(Default::default()));
    };
    serde_json::from_str(&read_text(path)?)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid JSON data in {}", path.display()))
}

fn read_functions(path: Option<&Path>) -> Result<Vec<UserFunction>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&read_text(path)?)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid function definitions in {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG environment variable to control log level
    // Default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match args.command {
        Command::Render {
            template,
            data,
            functions,
            pretty,
            escape,
            strict,
            max_steps,
            timeout_ms,
        } => {
            let template = read_text(&template)?;
            let data = read_data(data.as_deref())?;
            let functions = read_functions(functions.as_deref())?;

            let defaults = ExecutionOptions::default();
            let options = EngineOptions {
                escape: escape.into(),
                strict,
                execution: ExecutionOptions {
                    max_steps: max_steps.unwrap_or(defaults.max_steps),
                    timeout: timeout_ms.map(Duration::from_millis).or(defaults.timeout),
                    ..defaults
                },
            };
            tracing::debug!(?options, functions = functions.len(), "Rendering template");

            match Engine::new(options).compile(&template, &data, &functions) {
                Ok(output) => {
                    render_diagnostics(&output.warnings);
                    if pretty {
                        println!("{}", format_json(&output.text));
                    } else {
                        print!("{}", output.text);
                    }
                }
                Err(e) => {
                    render_error(&e);
                    std::process::exit(1);
                }
            }
        }
        Command::Call {
            functions,
            name,
            args,
        } => {
            let functions = read_functions(Some(&functions))?;
            // The last definition with a given name wins, as in a render.
            let def = functions
                .iter()
                .rev()
                .find(|f| f.name == name)
                .ok_or_else(|| miette!("No function named '{}'", name))?;

            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            match Engine::default().call_function(def, &args) {
                Ok(result) => println!("{}", result),
                Err(e) => {
                    render_error(&e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
