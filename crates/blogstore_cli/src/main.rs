//! Store smoke probe.
//!
//! # Responsibility
//! - Wire config, logging and a file-backed store together once.
//! - Print schema and row facts for quick local sanity checks.

use blogstore_core::db::migrations::latest_version;
use blogstore_core::{
    core_version, default_log_level, init_logging, CategoryRepository, FileConnectionProvider,
    SqliteCategoryRepository, StoreConfig,
};
use log::info;
use std::process::ExitCode;

const PROBE_PAGE_LIMIT: u32 = 100;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("blogstore probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let provider =
        FileConnectionProvider::open_with_timeout(&config.db_path, config.busy_timeout())?;
    let categories = SqliteCategoryRepository::new(&provider);
    let first_page = categories.list_all_categories(0, PROBE_PAGE_LIMIT)?;

    info!(
        "event=probe module=cli status=ok schema_version={} categories={}",
        latest_version(),
        first_page.len()
    );
    println!("blogstore_core version={}", core_version());
    println!("db_path={}", provider.path().display());
    println!("schema_version={}", latest_version());
    println!("categories_first_page={}", first_page.len());
    Ok(())
}
