use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use chartlift_pipeline::stages::{extract_raw, publish_curated, transform_clean, validate_enriched};
use chartlift_pipeline::{PipelineConfig, PipelineError};

pub(crate) fn run_extract(cfg: &PipelineConfig) {
    exit_on_error(try_extract(cfg));
}

pub(crate) fn run_transform(cfg: &PipelineConfig) {
    exit_on_error(try_transform(cfg));
}

pub(crate) fn run_validate(cfg: &PipelineConfig) {
    exit_on_error(try_validate(cfg));
}

pub(crate) fn run_load(cfg: &PipelineConfig) {
    exit_on_error(try_load(cfg));
}

/// Run every stage in order. A fatal stage error stops the run; the
/// enrichment stage itself is best-effort per batch and only fails on
/// setup problems.
pub(crate) fn run_all(cfg: &PipelineConfig) {
    exit_on_error(try_extract(cfg));
    exit_on_error(try_transform(cfg));

    match super::enrich::try_enrich(cfg) {
        Ok(report) if !report.all_persisted() => {
            log::warn!("Continuing with partially persisted enrichment");
        }
        Ok(_) => {}
        Err(e) => {
            log::error!("Enrichment failed: {}", e);
            std::process::exit(1);
        }
    }

    exit_on_error(try_validate(cfg));
    exit_on_error(try_load(cfg));

    println!(
        "{} Pipeline complete",
        "\u{2714}".if_supports_color(Stdout, |t| t.green())
    );
}

fn try_extract(cfg: &PipelineConfig) -> Result<(), PipelineError> {
    let conn = chartlift_db::open_database(&cfg.database)?;
    let rows = extract_raw(&conn)?;
    println!("Extracted {} row(s)", rows);
    Ok(())
}

fn try_transform(cfg: &PipelineConfig) -> Result<(), PipelineError> {
    let conn = chartlift_db::open_database(&cfg.database)?;
    let rows = transform_clean(&conn)?;
    println!("Transformed table has {} row(s)", rows);
    Ok(())
}

fn try_validate(cfg: &PipelineConfig) -> Result<(), PipelineError> {
    let conn = chartlift_db::open_database(&cfg.database)?;
    let summary = validate_enriched(&conn, cfg)?;
    println!(
        "Validated {} row(s), {} column(s); summary at {}",
        summary.rows,
        summary.columns,
        summary.report_path.display()
    );
    Ok(())
}

fn try_load(cfg: &PipelineConfig) -> Result<(), PipelineError> {
    let conn = chartlift_db::open_database(&cfg.database)?;
    let rows = publish_curated(&conn)?;
    println!("Published curated table with {} row(s)", rows);
    Ok(())
}

fn exit_on_error(result: Result<(), PipelineError>) {
    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
