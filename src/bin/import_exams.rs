use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use sat_exams::config::{ImportArgs, ImportConfig};
use sat_exams::import::run_import;
use sat_exams::report::{self, render_import_file, render_import_summary};
use sat_exams::store::{MemoryExamStore, MongoExamStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = ImportArgs::parse();
    sat_exams::logging::init(&args.log_level);

    let config = ImportConfig::from_args(&args, |name| std::env::var(name).ok())
        .context("invalid configuration")?;

    print!("{}", report::banner("Importing original exams"));
    println!("database: {}", config.database);
    println!("collection: {}", config.collection);

    if config.dry_run {
        info!("dry run, nothing is written to MongoDB");
        let store = MemoryExamStore::new();
        let summary = run_import(&store, &config.seed_dir, &config.manifest, |file| {
            print!("{}", render_import_file(file));
        })
        .await?;
        print!("{}", render_import_summary(&summary));
        return Ok(());
    }

    let uri = config
        .mongo_uri
        .as_deref()
        .context("no MongoDB connection string configured")?;
    let store = MongoExamStore::connect(uri, &config.database, &config.collection)
        .await
        .context("failed to connect to MongoDB")?;

    let result = run_import(&store, &config.seed_dir, &config.manifest, |file| {
        print!("{}", render_import_file(file));
    })
    .await;

    // release the connection before reporting, on success and failure alike
    store.shutdown().await;

    match result {
        Ok(summary) => {
            print!("{}", render_import_summary(&summary));
            Ok(())
        }
        Err(e) => {
            error!("import aborted: {}", e);
            Err(e).context("import aborted")
        }
    }
}
