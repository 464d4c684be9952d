//! `eb_encode` — compresses an OFF mesh into the EB container format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use eb_core::CompressionOptions;
use eb_io::OffReader;
use eb_tools::{merge_duplicate_vertices, CliError, EXIT_FAILURE};
use log::info;

/// Encodes a triangle mesh (OFF) into the Edgebreaker ("EB") container format.
#[derive(Parser, Debug)]
#[command(name = "eb_encode")]
struct Args {
    /// Input OFF mesh path.
    #[arg(long)]
    input: PathBuf,

    /// Output EB container path.
    #[arg(long)]
    output: PathBuf,

    /// Per-axis quantization step (x y z).
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], conflicts_with = "qstep_uniform")]
    qstep: Option<Vec<f64>>,

    /// Single quantization step applied to all three axes.
    #[arg(long)]
    qstep_uniform: Option<f64>,

    /// Per-axis bit-width budget, applied uniformly to all three axes.
    #[arg(long, default_value_t = 14)]
    qbits: u32,

    /// Weld vertices at identical positions before encoding.
    #[arg(long)]
    merge_duplicates: bool,

    /// Write a line-oriented summary of the encode to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), CliError> {
    let mut reader = OffReader::open(&args.input)?;
    let mesh = reader.read_mesh()?;
    let mesh = if args.merge_duplicates {
        merge_duplicate_vertices(mesh)
    } else {
        mesh
    };
    info!(
        "loaded mesh: {} vertices, {} faces",
        mesh.points.len(),
        mesh.faces.len()
    );

    let step = args.qstep_uniform.unwrap_or(0.01);
    let options = match &args.qstep {
        Some(s) => CompressionOptions::new([s[0], s[1], s[2]], [args.qbits; 3])?,
        None => CompressionOptions::uniform(step, args.qbits)?,
    };

    let encoded = eb_core::encode_mesh(&mesh, options)?;
    info!(
        "encoded: {} history symbols, code series {:?}, {} holes, {} handles",
        encoded.history.len(),
        encoded.code_series,
        encoded.m_table.len(),
        encoded.h_table.len()
    );

    let mut sink = BufWriter::new(File::create(&args.output)?);
    eb_core::write_eb_file(&mut sink, &encoded)?;
    sink.flush()?;

    let output_size = std::fs::metadata(&args.output)?.len();

    if let Some(report_path) = &args.report {
        let mut report = File::create(report_path)?;
        writeln!(report, "vertex_count {}", mesh.points.len())?;
        writeln!(report, "face_count {}", mesh.faces.len())?;
        writeln!(report, "hole_count {}", encoded.m_table.len())?;
        writeln!(report, "handle_count {}", encoded.h_table.len())?;
        writeln!(report, "code_series {:?}", encoded.code_series)?;
        writeln!(report, "output_bytes {output_size}")?;
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("eb_encode: {e}");
        std::process::exit(EXIT_FAILURE);
    }
}
