mod bootstrap;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use mailqf_core::settings::{FilterConfig, Settings};
use mailqf_data::pipeline::Pipeline;
use mailqf_data::reader::open_output;

fn main() -> ExitCode {
    match run() {
        Ok(clean) if clean => ExitCode::SUCCESS,
        // Lines were skipped (decode failures or malformed records);
        // details were already logged.
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("mailqf: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::debug!("mailqf v{} starting", env!("CARGO_PKG_VERSION"));

    // Compile patterns and resolve the interval up front: configuration
    // errors must fail before any record is read.
    let config = FilterConfig::from_settings(&settings)?;

    let mut out = open_output(&settings.outfile)?;
    let clean = Pipeline::new(&config).run(&settings.infile, &mut out)?;
    out.flush()?;

    Ok(clean)
}
