use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use chartlift_pipeline::{enrich_tracks, FsCacheStore, LastfmClient, PipelineConfig, RunReport};

/// Run the enrichment stage with progress output.
pub(crate) fn run_enrich(cfg: &PipelineConfig) {
    match try_enrich(cfg) {
        Ok(report) => print_summary(&report),
        Err(e) => {
            log::error!("Enrichment failed: {}", e);
            std::process::exit(1);
        }
    }
}

pub(crate) fn try_enrich(
    cfg: &PipelineConfig,
) -> Result<RunReport, chartlift_pipeline::PipelineError> {
    let conn = chartlift_db::open_database(&cfg.database)?;
    let cache = FsCacheStore::open(cfg.cache_dir.clone())?;
    let client = LastfmClient::new(cfg)?;

    println!("Using cache directory: {}", cache.root().display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars("/-\\|"),
    );
    pb.set_message("Enriching tracks...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    // DB access stays on this thread; only the fetch pool is async.
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(enrich_tracks(&conn, cfg, &cache, &client, |outcome| {
        pb.set_message(format!(
            "Batch {}: {} enriched, {} persisted{}",
            outcome.index + 1,
            outcome.enriched,
            outcome.persisted,
            if outcome.write_error.is_some() {
                " (write failed)"
            } else {
                ""
            },
        ));
    }));
    pb.finish_and_clear();

    result
}

fn print_summary(report: &RunReport) {
    println!();
    println!(
        "{}",
        "Enrichment complete".if_supports_color(Stdout, |t| t.bold())
    );
    println!("  Candidates:     {:>6}", report.candidates);
    println!("  Persisted:      {:>6}", report.persisted());
    println!("  Rows dropped:   {:>6}", report.rows_dropped());
    println!("  Failed tasks:   {:>6}", report.failed_tasks());

    let failed_batches: Vec<_> = report
        .batches
        .iter()
        .filter(|b| b.write_error.is_some())
        .collect();
    if !failed_batches.is_empty() {
        println!(
            "  {} {} batch(es) failed to persist; their rows were not written:",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            failed_batches.len(),
        );
        for batch in failed_batches {
            println!(
                "    batch {}: {}",
                batch.index + 1,
                batch.write_error.as_deref().unwrap_or("unknown error"),
            );
        }
        println!("  The cache was kept; re-run 'chartlift enrich' to retry.");
    }
}
