//! rillc - Inspector for the Rill front-end.
//!
//! A development tool for exercising the tokenizer and parser: dump the
//! token stream, summarize a parse, or check a file and print its
//! diagnostics with source snippets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rillc::prelude::*;
use rillc::FrontendConfig;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rillc")]
#[command(version = rillc::VERSION)]
#[command(about = "Inspector for the Rill compiler front-end")]
#[command(long_about = r#"
Exercises the Rill front-end without the rest of the toolchain:

  rillc tokenize input.rill            dump the token stream
  rillc parse input.rill --json        dump the parse result as JSON
  rillc check input.rill -D FEATURE    parse and report diagnostics
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the token stream of a file
    Tokenize {
        /// Input .rill file
        input: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Preprocessor variables to define
        #[arg(short = 'D', long = "define")]
        defines: Vec<String>,
    },
    /// Parse a file and summarize the result
    Parse {
        /// Input .rill file
        input: PathBuf,

        /// Emit the full parse result as JSON
        #[arg(long)]
        json: bool,

        /// Preprocessor variables to define
        #[arg(short = 'D', long = "define")]
        defines: Vec<String>,
    },
    /// Parse a file and report diagnostics with source snippets
    Check {
        /// Input .rill file
        input: PathBuf,

        /// Preprocessor variables to define
        #[arg(short = 'D', long = "define")]
        defines: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Tokenize { input, json, defines } => tokenize_command(&input, json, &defines),
        Commands::Parse { input, json, defines } => parse_command(&input, json, &defines),
        Commands::Check { input, defines } => check_command(&input, &defines),
    }
}

fn read_input(input: &Path) -> Result<(String, String)> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok((source, input.to_string_lossy().into_owned()))
}

fn config_from(defines: &[String]) -> FrontendConfig {
    defines
        .iter()
        .fold(FrontendConfig::default(), |config, name| config.define(name))
}

fn tokenize_command(input: &Path, json: bool, defines: &[String]) -> Result<()> {
    let (source, file) = read_input(input)?;
    let config = config_from(defines);
    let mut diagnostics = DiagnosticsCollection::new();
    let tokens = tokenize(&source, &file, &mut diagnostics, &config.preprocessor_defines);

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            if matches!(token.kind, TokenKind::Whitespace | TokenKind::LineBreak) {
                continue;
            }
            println!("{:>12} {:<20} {:?}", token.span.to_string(), token.kind.to_string(), token.content);
        }
    }
    print_diagnostics(&diagnostics, &file, &source);
    Ok(())
}

fn parse_command(input: &Path, json: bool, defines: &[String]) -> Result<()> {
    let (source, file) = read_input(input)?;
    let config = config_from(defines);
    let mut diagnostics = DiagnosticsCollection::new();
    let result = rillc::parse_source_with(&source, &file, &mut diagnostics, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("usings:     {}", result.usings.len());
        println!("aliases:    {}", result.aliases.len());
        println!("structs:    {}", result.structs.len());
        println!("functions:  {}", result.functions.len());
        println!("operators:  {}", result.operators.len());
        println!("statements: {}", result.top_level_statements.len());
        for function in &result.functions {
            println!(
                "  fn {} ({} parameters) at {}",
                function.name.content,
                function.parameters.len(),
                function.location
            );
        }
        for definition in &result.structs {
            println!(
                "  struct {} ({} fields, {} methods) at {}",
                definition.name.content,
                definition.fields.len(),
                definition.methods.len(),
                definition.location
            );
        }
    }
    print_diagnostics(&diagnostics, &file, &source);
    Ok(())
}

fn check_command(input: &Path, defines: &[String]) -> Result<()> {
    let (source, file) = read_input(input)?;
    let config = config_from(defines);
    let mut diagnostics = DiagnosticsCollection::new();
    let _ = rillc::parse_source_with(&source, &file, &mut diagnostics, &config);

    if diagnostics.is_empty() {
        println!("{}: no diagnostics", file);
        return Ok(());
    }
    print_diagnostics(&diagnostics, &file, &source);
    if diagnostics.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

/// Render diagnostics with snippets resolved from the already-loaded
/// buffer.
fn print_diagnostics(diagnostics: &DiagnosticsCollection, file: &str, source: &str) {
    if diagnostics.is_empty() {
        return;
    }
    let mut memory = MemorySourceProvider::new();
    memory.insert(file, source);
    let mut providers = SourceProviderSet::new();
    providers.register(Box::new(memory));
    diagnostics.print(Some(&providers));
}
