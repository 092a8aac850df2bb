// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use std::path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use gen_video_hpp::gen_video_hpp_code::{GeneratorError, GeneratorOptions, VideoHppCodeGenerator};
use gen_video_hpp::video_registry::VideoRegistry;

const DEFAULT_REGISTRY_FILE: &str = "video.xml";

#[derive(Parser, Debug)]
struct Cli {
    #[arg(short, long, default_value = DEFAULT_REGISTRY_FILE)]
    filename: path::PathBuf,

    #[arg(short, long, default_value = ".")]
    output_dir: path::PathBuf,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        },
    };
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run(cli: &Cli) -> Result<(), GeneratorError> {
    info!(path = %cli.filename.display(), "loading registry");
    let registry = VideoRegistry::read_from_file(&cli.filename)?;
    if !registry.warnings().is_empty() {
        info!(count = registry.warnings().len(), "registry read with warnings");
    }

    let options = GeneratorOptions::default();
    let codegen = VideoHppCodeGenerator::new(&registry, &options);
    codegen.write_files(&cli.output_dir)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
