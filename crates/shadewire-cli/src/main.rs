use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, info};
use miette::{Context, IntoDiagnostic};

/// shadewire: inspect WGSL modules and their memory layouts
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log more detail (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a WGSL file
    Check {
        /// Input WGSL file
        input: PathBuf,
    },
    /// Compare each struct's computed layout against naga's
    Layout {
        /// Input WGSL file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> miette::Result<()> {
    match command {
        Command::Check { input } => {
            let source = read(&input)?;
            let module = shadewire_parser::validate(&source)
                .map_err(|e| miette::miette!("{e}"))
                .wrap_err_with(|| format!("{} is not valid WGSL", input.display()))?;
            println!(
                "{}: ok ({} entry points, {} types, {} globals)",
                input.display(),
                module.entry_points.len(),
                module.types.len(),
                module.global_variables.len()
            );
            Ok(())
        }
        Command::Layout { input } => {
            let source = read(&input)?;
            let (report, mismatches) = layout_report(&source)?;
            print!("{report}");
            if mismatches > 0 {
                return Err(miette::miette!(
                    "{mismatches} layout mismatch(es) in {}",
                    input.display()
                ));
            }
            Ok(())
        }
    }
}

fn read(path: &Path) -> miette::Result<String> {
    debug!("reading {}", path.display());
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

/// Renders one block per struct and counts the values that disagree.
fn layout_report(source: &str) -> miette::Result<(String, usize)> {
    let imported = shadewire_parser::import_structs(source)
        .map_err(|e| miette::miette!("{e}"))
        .wrap_err("struct import failed")?;
    let reference = shadewire_parser::struct_layouts(source)
        .map_err(|e| miette::miette!("{e}"))
        .wrap_err("naga layout failed")?;
    info!("comparing {} struct(s)", imported.len());

    let mut out = String::new();
    let mut mismatches = 0;
    let mut mark = |ours: u64, theirs: u64| {
        if ours == theirs {
            String::new()
        } else {
            mismatches += 1;
            format!("  <- naga: {theirs}")
        }
    };

    for ((name, schema), naga) in imported.iter().zip(&reference) {
        let size = match schema.size() {
            Some(size) => size,
            // Runtime-sized structs: naga's span covers the fixed part only.
            None => u64::from(naga.size),
        };
        let _ = writeln!(
            out,
            "struct {name}: size {size}{}, align {}{}",
            mark(size, u64::from(naga.size)),
            schema.alignment(),
            mark(schema.alignment(), u64::from(naga.alignment)),
        );
        let fields = schema.field_layouts().unwrap_or_default();
        for (field, (_, offset)) in fields.iter().zip(&naga.members) {
            let size = field
                .size
                .map_or_else(|| "runtime".to_string(), |s| s.to_string());
            let _ = writeln!(
                out,
                "  {:<20} offset {:>5}{}  size {size}",
                field.name,
                field.offset,
                mark(field.offset, u64::from(*offset)),
            );
        }
    }
    Ok((out, mismatches))
}
