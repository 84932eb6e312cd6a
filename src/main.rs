//! cliqfile CLI
//!
//! Usage:
//!   cliqfile validate [FILE] [--json]
//!   cliqfile fmt [FILE]
//!   cliqfile synth <COMMAND> [--config FILE]
//!   cliqfile strip [FILE] [--normalize] [--base64] [--config FILE]
//!   cliqfile placeholders <COMMAND>
//!
//! FILE defaults to stdin. Set RUST_LOG=debug to trace pipeline stages.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use cliqfile::{
    encode, extract_placeholders, load, normalize_generated, strip_presentation,
    synthesize_from_example, transport_encode, validate, Config, LoadError, NormalizeError,
};

#[derive(Parser)]
#[command(name = "cliqfile")]
#[command(version, about = "Validate, normalize and generate cliQ command templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report every problem in a template
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a valid template in canonical form
    Fmt {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Generate a template from an example command line
    Synth {
        /// Command with {{placeholders}}
        command: String,

        /// TOML config whose [defaults] override the generated metadata
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Strip reasoning spans and a wrapping code fence from model output
    Strip {
        #[command(flatten)]
        input: InputArgs,

        /// Also decode, apply defaults, re-encode and validate
        #[arg(short, long)]
        normalize: bool,

        /// Base64-encode the output
        #[arg(long)]
        base64: bool,

        /// TOML config with [defaults] used by --normalize
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List placeholder names used by a command line
    Placeholders {
        command: String,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input file (reads from stdin if not provided)
    file: Option<PathBuf>,
}

impl InputArgs {
    fn display_name(&self) -> String {
        self.file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string())
    }

    fn read(&self) -> Result<String, String> {
        match &self.file {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| format!("Error reading file '{}': {}", path.display(), e)),
            None => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .map_err(|e| format!("Error reading from stdin: {}", e))?;
                Ok(buffer)
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Fmt { input } => cmd_fmt(&input),
        Commands::Synth { command, config } => cmd_synth(&command, config.as_deref()),
        Commands::Strip {
            input,
            normalize,
            base64,
            config,
        } => cmd_strip(&input, normalize, base64, config.as_deref()),
        Commands::Placeholders { command } => {
            for name in extract_placeholders(&command) {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(input: &InputArgs, json: bool) -> Result<ExitCode, String> {
    let source = input.read()?;
    let filename = input.display_name();
    let diagnostics = validate(source.as_bytes()).map_err(|e| e.format(&source, &filename))?;

    if json {
        let out = serde_json::to_string_pretty(&diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {}", e))?;
        println!("{}", out);
    } else if diagnostics.is_empty() {
        println!("{}: ok", filename);
    } else {
        for diagnostic in &diagnostics {
            eprint!("{}", diagnostic.format(&source, &filename));
        }
        eprintln!("{}: {} problem(s)", filename, diagnostics.len());
    }

    Ok(if diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_fmt(input: &InputArgs) -> Result<ExitCode, String> {
    let source = input.read()?;
    let filename = input.display_name();
    let document = match load(source.as_bytes()) {
        Ok(document) => document,
        Err(LoadError::Syntax(e)) => return Err(e.format(&source, &filename)),
        Err(LoadError::Invalid(diagnostics)) => {
            let rendered: String = diagnostics
                .iter()
                .map(|d| d.format(&source, &filename))
                .collect();
            return Err(rendered);
        }
    };
    let text = encode(&document).map_err(|e| format!("Error: {}", e))?;
    print!("{}", text);
    Ok(ExitCode::SUCCESS)
}

fn cmd_synth(command: &str, config: Option<&Path>) -> Result<ExitCode, String> {
    let mut document = synthesize_from_example(command).map_err(|e| format!("Error: {}", e))?;
    if let Some(path) = config {
        let config = load_config(path)?;
        config.defaults.overlay(&mut document);
    }
    let text = encode(&document).map_err(|e| format!("Error: {}", e))?;
    print!("{}", text);
    Ok(ExitCode::SUCCESS)
}

fn cmd_strip(
    input: &InputArgs,
    normalize: bool,
    base64: bool,
    config: Option<&Path>,
) -> Result<ExitCode, String> {
    let raw = input.read()?;
    let output = if normalize {
        let config = match config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        normalize_generated(&raw, &config.defaults).map_err(|e| match e {
            NormalizeError::Invalid(_) => format!("Error: validation error: {}", e.summary()),
            other => format!("Error: {}", other),
        })?
    } else {
        strip_presentation(&raw)
    };
    debug!(bytes = output.len(), base64, "strip output ready");

    if base64 {
        println!("{}", transport_encode(&output));
    } else if output.ends_with('\n') {
        print!("{}", output);
    } else {
        println!("{}", output);
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: &Path) -> Result<Config, String> {
    Config::from_file(path)
        .map_err(|e| format!("Error loading config '{}': {}", path.display(), e))
}
