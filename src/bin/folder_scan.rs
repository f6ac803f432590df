use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wrangle::services::structure_service;

#[derive(Parser)]
#[command(name = "folder-scan", about = "Scan a folder and output its structure as JSON")]
struct Args {
    /// Path to the folder to scan
    folder: PathBuf,

    /// Output JSON file (default: print to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let folder = std::path::absolute(&args.folder)
        .with_context(|| format!("resolving {}", args.folder.display()))?;
    if !folder.is_dir() {
        println!("Error: {} is not a valid directory.", folder.display());
        return Ok(());
    }

    let structure = structure_service::scan_folder_structure(&folder)
        .with_context(|| format!("scanning {}", folder.display()))?;
    let rendered = serde_json::to_string_pretty(&structure)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Folder structure saved to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
