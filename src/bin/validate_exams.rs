use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sat_exams::config::{ValidateArgs, ValidateConfig};
use sat_exams::report::{self, render_validation_file, render_validation_summary};
use sat_exams::validate::validate_manifest;

fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let args = ValidateArgs::parse();
    sat_exams::logging::init(&args.log_level);

    let config = ValidateConfig::from_args(&args).context("invalid configuration")?;

    print!("{}", report::banner("Validating original exams"));
    let summary = validate_manifest(&config.seed_dir, &config.manifest, |file| {
        print!("{}", render_validation_file(file));
    });
    print!("{}", render_validation_summary(&summary));

    if summary.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
