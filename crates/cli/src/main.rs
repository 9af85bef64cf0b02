//! `preslib`: command-line front end for the presentation library core.
//!
//! All file I/O lives here; the core is a pure text-to-data
//! transformation. Diagnostics go to stderr, results go to stdout or a
//! file.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use preslib_core::compile::{BoundaryStyle, CompileConfig, PointSymbolStyle};
use preslib_core::error::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BoundaryArg {
    Plain,
    Symbolized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SymbolArg {
    Paper,
    Simplified,
}

/// S-52 presentation library toolchain.
#[derive(Parser)]
#[command(name = "preslib", version, about = "S-52 presentation library toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .dai library file and print it as JSON
    Json {
        /// Path to the .dai presentation library file
        file: PathBuf,
        /// Output file ("-" for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,
    },

    /// Compile a .dai library file into rendering rules
    Compile {
        /// Path to the .dai presentation library file
        file: PathBuf,
        /// Colour table (display mode) to resolve colour tokens against
        #[arg(long, default_value = "DAY")]
        colour_table: String,
        /// Area boundary rendering mode
        #[arg(long, default_value = "plain", value_enum)]
        boundaries: BoundaryArg,
        /// Point symbol rendering mode
        #[arg(long, default_value = "paper", value_enum)]
        symbols: SymbolArg,
        /// Shallow contour depth in metres
        #[arg(long, default_value_t = 2.0)]
        shallow_depth: f64,
        /// Safety contour depth in metres
        #[arg(long, default_value_t = 6.0)]
        safety_depth: f64,
        /// Deep contour depth in metres
        #[arg(long, default_value_t = 30.0)]
        deep_depth: f64,
        /// Renderer tile size in pixels
        #[arg(long, default_value_t = 512)]
        tile_size: u32,
        /// Output file ("-" for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Json { file, output } => cmd_json(&file, &output),
        Commands::Compile {
            file,
            colour_table,
            boundaries,
            symbols,
            shallow_depth,
            safety_depth,
            deep_depth,
            tile_size,
            output,
        } => {
            let config = CompileConfig {
                colour_table,
                boundaries: match boundaries {
                    BoundaryArg::Plain => BoundaryStyle::Plain,
                    BoundaryArg::Symbolized => BoundaryStyle::Symbolized,
                },
                symbols: match symbols {
                    SymbolArg::Paper => PointSymbolStyle::PaperChart,
                    SymbolArg::Simplified => PointSymbolStyle::Simplified,
                },
                shallow_depth,
                safety_depth,
                deep_depth,
                tile_size,
            };
            cmd_compile(&file, &config, &output);
        }
    }
}

fn cmd_json(file: &Path, output: &str) {
    let outcome = parse_file(file);
    report_diagnostics(&outcome.diagnostics);
    let json = serde_json::to_string_pretty(&outcome.library)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    write_output(output, &json);
}

fn cmd_compile(file: &Path, config: &CompileConfig, output: &str) {
    let outcome = parse_file(file);
    report_diagnostics(&outcome.diagnostics);

    let compiled = preslib_core::compile(&outcome.library, config);
    report_diagnostics(&compiled.diagnostics);

    let json = serde_json::to_string_pretty(&compiled.rules)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    write_output(output, &json);
}

fn parse_file(file: &Path) -> preslib_core::ParseOutcome {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("cannot read {}: {}", file.display(), e);
            process::exit(1);
        }
    };
    match preslib_core::parse(&text) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}: {}", file.display(), e);
            process::exit(1);
        }
    }
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn write_output(output: &str, json: &str) {
    if output == "-" {
        println!("{}", json);
        return;
    }
    if let Err(e) = std::fs::write(output, json) {
        eprintln!("cannot write {}: {}", output, e);
        process::exit(1);
    }
}
