use clap::{Parser, ValueEnum};
use diaflow::prelude::*;
use std::fs;
use std::time::Instant;

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatCli {
    Reduced,
    Readable,
    Native,
}

impl From<FormatCli> for DiagramFormat {
    fn from(cli: FormatCli) -> Self {
        match cli {
            FormatCli::Reduced => DiagramFormat::Reduced,
            FormatCli::Readable => DiagramFormat::Readable,
            FormatCli::Native => DiagramFormat::Native,
        }
    }
}

/// A workflow diagram inspection and format conversion CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the diagram document to read
    input_path: String,

    /// The dialect of the input document (detected from its version tag when omitted)
    #[arg(short, long, value_enum)]
    from: Option<FormatCli>,

    /// The dialect to convert the diagram into; omit to only parse and summarize
    #[arg(short, long, value_enum)]
    to: Option<FormatCli>,

    /// Write the converted document to this path instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    tracing_subscriber_init();
    let cli = Cli::parse();
    let total_start = Instant::now();

    let text = fs::read_to_string(&cli.input_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read input file '{}': {}",
            &cli.input_path, e
        ))
    });

    let from: DiagramFormat = match cli.from {
        Some(format) => format.into(),
        None => DiagramFormat::detect(&text).unwrap_or_else(|| {
            exit_with_error(
                "Could not detect the input dialect from its version tag; pass --from explicitly.",
            )
        }),
    };

    let parse_start = Instant::now();
    let diagram = from
        .converter()
        .deserialize(&text)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse {from} document: {e}")));
    let parse_duration = parse_start.elapsed();

    println!("Parsed '{}' as the {} dialect.", cli.input_path, from);
    println!("\n--- Diagram Summary ---");
    println!("Nodes:    {}", diagram.nodes.len());
    println!("Handles:  {}", diagram.handles.len());
    println!("Arrows:   {}", diagram.arrows.len());
    println!("Persons:  {}", diagram.persons.len());
    println!("Api keys: {}", diagram.api_keys.len());
    if let Some(name) = diagram.metadata.as_ref().and_then(|m| m.name.as_deref()) {
        println!("Name:     {name}");
    }

    if let Some(to) = cli.to {
        let to: DiagramFormat = to.into();
        let emit_start = Instant::now();
        let output = to
            .converter()
            .serialize(&diagram)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to emit {to} document: {e}")));
        let emit_duration = emit_start.elapsed();

        match &cli.output {
            Some(path) => {
                fs::write(path, &output).unwrap_or_else(|e| {
                    exit_with_error(&format!("Failed to write output file '{path}': {e}"))
                });
                println!("\nWrote {to} document to '{path}'.");
            }
            None => {
                println!("\n--- {to} ---");
                println!("{output}");
            }
        }

        println!("\n--- Performance Summary ---");
        println!("Parse: {:?}", parse_duration);
        println!("Emit:  {:?}", emit_duration);
        println!("Total: {:?}", total_start.elapsed());
    }
}

/// Routes library tracing to stderr, honoring `RUST_LOG` when set.
fn tracing_subscriber_init() {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
