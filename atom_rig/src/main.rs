//! atom_rig: window entry point.

use std::path::PathBuf;

use clap::Parser;

use atom_rig::app::run;
use atom_rig::config::{AppConfig, SourceKind};

/// Drive a character rig with hand gestures
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured landmark source
    #[arg(short, long, value_enum)]
    source: Option<SourceKind>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.print_config {
        match cfg.to_toml() {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cfg.logging.level.as_str()))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Atom Rig — Hand Gesture Animation Controller        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match cfg.source.kind {
        SourceKind::Camera   => println!("  Source: webcam #{} via MediaPipe", cfg.source.camera.device),
        SourceKind::Scripted => println!("  Source: scripted hands  (use --source camera for a webcam)"),
    }
    println!("  Keys:   1–7 play a clip, Esc/Q quits");
    println!();

    if let Err(e) = run(cfg) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> atom_rig::Result<AppConfig> {
    let mut cfg = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(kind) = args.source {
        cfg.source.kind = kind;
    }
    cfg.validate()?;
    Ok(cfg)
}
