use clap::{Parser, Subcommand};
use respack::{summarize, ResourcePackage, ResourceSummary, HEADER_SIZE};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "respack", about = "Inspect and edit firmware resource packs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the resources in a pack
    List {
        input: PathBuf,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show package header and totals
    Info {
        input: PathBuf,
    },
    /// Write resource payloads to files
    Extract {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        /// Only extract the resource at this 0-based index
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Replace a resource payload with the contents of a file
    Replace {
        input: PathBuf,
        #[arg(short, long)]
        index: usize,
        #[arg(short, long)]
        with: PathBuf,
        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Change the id of a resource (decimal or 0x-prefixed hex)
    SetId {
        input: PathBuf,
        #[arg(short, long)]
        index: usize,
        #[arg(long, value_parser = parse_id)]
        id: u16,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a resource
    Remove {
        input: PathBuf,
        #[arg(short, long)]
        index: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Move a resource to another position
    Move {
        input: PathBuf,
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that the pack re-encodes to identical bytes
    Verify {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let package = ResourcePackage::open(&input)?;
            let rows = summarize(&package);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Pack: {}", input.display());
                println!("{:<28} {:>10} {:>8}  Digest", "Resource", "Size", "Kind");
                for row in &rows {
                    println!("{:<28} {:>10} {:>8}  {}",
                        row.display_name(), row.size, row.kind.name(), &row.digest[..12]);
                }
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let package = ResourcePackage::open(&input)?;
            let payload_bytes: usize = package.blocks.iter().map(|b| b.payload().len()).sum();

            println!("── Resource pack ────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Header         {}", hex::encode(&package.header[..HEADER_SIZE / 2]));
            println!("                 {}", hex::encode(&package.header[HEADER_SIZE / 2..]));
            println!("  Resources      {}", package.blocks.len());
            println!("  Payload bytes  {} B", payload_bytes);
            println!("  Encoded size   {} B", package.encoded_len());
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { input, output_dir, index } => {
            let package = ResourcePackage::open(&input)?;
            std::fs::create_dir_all(&output_dir)?;
            let rows = summarize(&package);
            let selected: Vec<&ResourceSummary> = match index {
                Some(i) => vec![rows.get(i).ok_or_else(|| {
                    format!("index {i} out of range ({} resources)", rows.len())
                })?],
                None => rows.iter().collect(),
            };
            for row in selected {
                let path = output_dir.join(row.export_file_name());
                std::fs::write(&path, package.blocks[row.index].payload())?;
                println!("  extracted  {}", path.display());
            }
        }

        // ── Edits ────────────────────────────────────────────────────────────
        Commands::Replace { input, index, with, output } => {
            let mut package = ResourcePackage::open(&input)?;
            let data = std::fs::read(&with)?;
            let len = data.len();
            package.replace_payload(index, data)?;
            info!(index, bytes = len, source = %with.display(), "replaced payload");
            save(&package, &input, output)?;
        }

        Commands::SetId { input, index, id, output } => {
            let mut package = ResourcePackage::open(&input)?;
            package.block_mut(index)?.set_id(id);
            save(&package, &input, output)?;
        }

        Commands::Remove { input, index, output } => {
            let mut package = ResourcePackage::open(&input)?;
            let removed = package.remove_block(index)?;
            info!(index, id = removed.id(), "removed resource");
            save(&package, &input, output)?;
        }

        Commands::Move { input, from, to, output } => {
            let mut package = ResourcePackage::open(&input)?;
            package.move_block(from, to)?;
            save(&package, &input, output)?;
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { input } => {
            let original = std::fs::read(&input)?;
            let package = verify_reencode(&original)?;
            println!("OK  {} resources, {} B, byte-identical", package.blocks.len(), original.len());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn save(package: &ResourcePackage, input: &Path, output: Option<PathBuf>) -> respack::Result<()> {
    let target = output.unwrap_or_else(|| input.to_path_buf());
    package.save(&target)?;
    println!("Saved: {}", target.display());
    Ok(())
}

/// Parse `original` and re-encode it; fails unless the bytes come back
/// identical.
fn verify_reencode(original: &[u8]) -> Result<ResourcePackage, Box<dyn std::error::Error>> {
    let package = ResourcePackage::from_bytes(original)?;
    let encoded = package.to_bytes()?;
    match first_difference(original, &encoded) {
        None     => Ok(package),
        Some(at) => Err(format!(
            "re-encoded pack differs from input at offset {at:#x} ({} B in, {} B out)",
            original.len(), encoded.len()
        ).into()),
    }
}

/// Offset of the first differing byte, or of the shorter end when one
/// buffer is a prefix of the other.
fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    if a == b {
        return None;
    }
    Some(a.iter().zip(b).position(|(x, y)| x != y).unwrap_or_else(|| a.len().min(b.len())))
}

fn parse_id(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None      => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid id '{s}': {e}"))
}
