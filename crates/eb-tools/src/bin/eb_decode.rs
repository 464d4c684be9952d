//! `eb_decode` — decompresses an EB container back into an OFF mesh.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use eb_io::OffWriter;
use eb_tools::{CliError, EXIT_FAILURE};
use log::info;

/// Decodes an Edgebreaker ("EB") container back into a triangle mesh (OFF).
#[derive(Parser, Debug)]
#[command(name = "eb_decode")]
struct Args {
    /// Input EB container path.
    #[arg(long)]
    input: PathBuf,

    /// Output OFF mesh path.
    #[arg(long)]
    output: PathBuf,

    /// Write a line-oriented summary of the decode to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), CliError> {
    let mut source = BufReader::new(File::open(&args.input)?);
    let mesh = eb_core::decode_eb_file(&mut source)?;
    info!(
        "decoded mesh: {} vertices, {} faces",
        mesh.points.len(),
        mesh.faces.len()
    );

    let writer = OffWriter::new();
    writer.write_mesh(&mesh.clone().into(), &args.output)?;

    if let Some(report_path) = &args.report {
        let mut report = File::create(report_path)?;
        writeln!(report, "vertex_count {}", mesh.points.len())?;
        writeln!(report, "face_count {}", mesh.faces.len())?;
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("eb_decode: {e}");
        std::process::exit(EXIT_FAILURE);
    }
}
