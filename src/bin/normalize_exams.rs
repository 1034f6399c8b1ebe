use anyhow::Context;
use clap::Parser;

use sat_exams::config::{NormalizeArgs, NormalizeConfig};
use sat_exams::report::{self, render_rewrite_file, render_rewrite_summary};
use sat_exams::rewrite::run_rewrite;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = NormalizeArgs::parse();
    sat_exams::logging::init(&args.log_level);

    let config = NormalizeConfig::from_args(&args).context("invalid configuration")?;

    print!("{}", report::banner("Normalizing exam text"));
    let summary = run_rewrite(
        &config.seed_dir,
        &config.manifest,
        &config.rules,
        config.dry_run,
        |file| print!("{}", render_rewrite_file(file)),
    )
    .context("normalization aborted")?;
    print!("{}", render_rewrite_summary(&summary));

    Ok(())
}
