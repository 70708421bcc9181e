//! Scan files through a read-ahead fileset and report what was read.

use clap::Parser;
use dbufio::config::{ScanConfig, ScanMode, parse_size};
use dbufio::{logging, scan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dbufio-scan")]
#[command(about = "Read files through a double-buffered read-ahead fileset")]
struct Args {
    /// Files to scan
    files: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the per-file buffer size (e.g. "64KB")
    #[arg(long)]
    buffer_size: Option<String>,

    /// Override the read size per call (e.g. "4KB")
    #[arg(long)]
    chunk_size: Option<String>,

    /// Use a single consumer thread that visits files in turn
    #[arg(long)]
    round_robin: bool,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();

    if args.print_config {
        match toml::to_string_pretty(&ScanConfig::default()) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("Failed to render config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&config.logging);

    if args.files.is_empty() {
        eprintln!("No files specified");
        std::process::exit(1);
    }

    if let Err(e) = run(&config, &args.files) {
        tracing::error!(error = %e, "scan failed");
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(size) = &args.buffer_size {
        config.fileset.buffer_size = parse_size(size)?;
    }
    if let Some(size) = &args.chunk_size {
        config.scan.chunk_size = parse_size(size)?;
    }
    if args.round_robin {
        config.scan.mode = ScanMode::RoundRobin;
    }
    config.validate()?;
    Ok(config)
}

fn run(config: &ScanConfig, files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let report = scan::scan(config, files)?;

    for file in &report.files {
        match &file.error {
            None => println!("{:>12} {:>10}  {}", file.bytes, file.lines, file.path.display()),
            Some(e) => println!(
                "{:>12} {:>10}  {}  ({e})",
                file.bytes,
                file.lines,
                file.path.display()
            ),
        }
    }

    let secs = report.elapsed.as_secs_f64();
    let mib = report.total_bytes() as f64 / (1024.0 * 1024.0);
    println!(
        "{:>12} bytes in {:.3}s ({:.1} MiB/s)",
        report.total_bytes(),
        secs,
        if secs > 0.0 { mib / secs } else { 0.0 }
    );
    println!("{}", report.dump);
    print_metrics();

    if report.is_clean() {
        Ok(())
    } else {
        Err("one or more files failed".into())
    }
}

fn print_metrics() {
    for metric in metriken::metrics().iter() {
        let name = metric.name();
        if !name.starts_with("dbufio_") {
            continue;
        }
        match metric.value() {
            Some(metriken::Value::Counter(v)) => println!("{name} {v}"),
            Some(metriken::Value::Gauge(v)) => println!("{name} {v}"),
            _ => {}
        }
    }
}
