use clap::{ArgAction, Args, Parser, Subcommand};
use log::warn;
use risum::codec::CodecId;
use risum::decoder::SectionEnd;
use risum::extract::{ExtractOptions, Extraction};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "risum", about = "Inspect and extract assets from .risum module containers")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DecodeArgs {
    input: PathBuf,
    /// Codec the container blocks were packed with: zstd (default), lz4, brotli, lzma, none
    #[arg(short, long, default_value = "zstd")]
    codec: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every asset (and the metadata structure) to a directory
    Extract {
        #[command(flatten)]
        decode: DecodeArgs,
        /// Output directory (default: "<module name>_assets")
        #[arg(short = 'C', long)]
        output_dir: Option<PathBuf>,
        /// Skip writing <input>_structure.json
        #[arg(long)]
        no_structure: bool,
        /// Fail instead of replacing existing files
        #[arg(long)]
        no_overwrite: bool,
    },
    /// List resolved assets
    List {
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Show container and module metadata
    Info {
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Print or save the decompressed metadata document
    Structure {
        #[command(flatten)]
        decode: DecodeArgs,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { decode, output_dir, no_structure, no_overwrite } => {
            let opts = ExtractOptions {
                codec:           parse_codec(&decode.codec),
                write_structure: !no_structure,
                overwrite:       !no_overwrite,
            };
            let ex = Extraction::open(&decode.input, &opts)?;
            let dest = output_dir.unwrap_or_else(|| PathBuf::from(ex.archive_name()));
            let summary = ex.extract_all(&dest, &opts)?;
            for (path, info) in summary.assets.iter().zip(ex.list()) {
                println!("  extracted  {} ({})", path.display(), info.display_size);
            }
            if let Some(path) = &summary.structure {
                println!("  structure  {}", path.display());
            }
            if summary.assets.is_empty() {
                println!("Module \"{}\" has no assets to extract.", ex.module().name());
            } else {
                println!("Extracted {} asset(s) to: {}", summary.assets.len(), dest.display());
            }
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { decode } => {
            let ex = open(&decode)?;
            println!("Module: {}", ex.module().name());
            println!("{:>5}  {:<40} {:<26} {:>12}  Content hash",
                     "#", "Filename", "Type", "Size");
            for info in ex.list() {
                println!("{:>5}  {:<40} {:<26} {:>12}  {}",
                    info.index, info.filename, info.content_type,
                    info.display_size, info.hash_prefix);
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { decode } => {
            let ex = open(&decode)?;
            let module = ex.module();
            let total: usize = module.assets.iter().map(|a| a.data.len()).sum();

            println!("── .risum Module ────────────────────────────────────────");
            println!("  Path            {}", decode.input.display());
            println!("  Format version  {}", module.header.version);
            println!("  Name            {}", module.name());
            println!("  Declared assets {}", module.metadata.assets.len());
            println!("  Decoded assets  {}", module.assets.len());
            println!("  Decoded size    {:.2} KB", total as f64 / 1024.0);
            println!("  Section end     {}", describe_end(module.end));
        }

        // ── Structure ────────────────────────────────────────────────────────
        Commands::Structure { decode, output } => {
            let ex = open(&decode)?;
            let json = ex.structure_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote: {}", path.display());
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn open(args: &DecodeArgs) -> Result<Extraction, Box<dyn std::error::Error>> {
    let opts = ExtractOptions { codec: parse_codec(&args.codec), ..ExtractOptions::default() };
    Ok(Extraction::open(&args.input, &opts)?)
}

fn parse_codec(s: &str) -> CodecId {
    CodecId::from_name(s).unwrap_or_else(|| {
        warn!("Unknown codec '{}', defaulting to zstd", s);
        CodecId::Zstd
    })
}

fn describe_end(end: SectionEnd) -> &'static str {
    match end {
        SectionEnd::NoAssets   => "no assets declared",
        SectionEnd::Complete   => "all declared assets present",
        SectionEnd::Terminator => "end marker before all declared assets",
        SectionEnd::Exhausted  => "end of file before all declared assets",
    }
}
