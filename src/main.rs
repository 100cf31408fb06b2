use eyre::Result;
use owo_colors::OwoColorize;
use retail_star_etl::{Pipeline, PipelineConfig, RunReport, StarSchemaTransformer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env is fine; the variables may come from the environment
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        return Err(e.into());
    }

    let env = env_logger::Env::default().filter_or("LOG_LEVEL", "info");
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    log::info!("Retail star-schema ETL");

    let config = PipelineConfig::from_env()?;
    log::info!(
        "Reading container {} into {}",
        config.storage.container.bright_black(),
        config.database.describe().bright_black()
    );

    let pipeline = Pipeline::new(
        config.extractor()?,
        StarSchemaTransformer::new(),
        config.loader()?,
    )
    .with_sources(config.sources.clone());

    let report = pipeline.run().await?;
    print_summary(&report);

    if !report.all_loaded() {
        eyre::bail!(
            "{} table(s) failed to load: {}",
            report.failed_tables().len(),
            report.failed_tables().join(", ")
        );
    }

    log::info!("ETL pipeline completed successfully");
    Ok(())
}

fn print_summary(report: &RunReport) {
    let stats = &report.stats;
    println!("{}", "Run summary".bold());
    println!(
        "  extracted   {} transactions, {} products, {} customers",
        report.transactions_extracted, report.products_extracted, report.customers_extracted
    );
    println!(
        "  cleaned     {} kept, {} missing fields, {} non-positive",
        stats.cleaned_transactions, stats.dropped_missing, stats.dropped_non_positive
    );
    println!(
        "  facts       {} rows, {} unmatched",
        stats.fact_rows, stats.dropped_unmatched
    );
    for outcome in &report.loads {
        match &outcome.result {
            Ok(rows) => println!("  {:<12}{} rows", outcome.table, rows.green()),
            Err(e) => println!("  {:<12}{}", outcome.table, e.red()),
        }
    }
}
