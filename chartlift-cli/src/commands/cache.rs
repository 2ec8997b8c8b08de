use chartlift_pipeline::{CacheStore, FsCacheStore, PipelineConfig};

pub(crate) fn run_stats(cfg: &PipelineConfig) {
    let store = match FsCacheStore::open(cfg.cache_dir.clone()) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open cache: {}", e);
            std::process::exit(1);
        }
    };

    match store.stats() {
        Ok((count, bytes)) => {
            println!("Cache directory: {}", store.root().display());
            println!("Entries: {}", count);
            println!("Size: {:.1} MiB", bytes as f64 / (1024.0 * 1024.0));
        }
        Err(e) => {
            log::error!("Failed to read cache: {}", e);
            std::process::exit(1);
        }
    }
}

pub(crate) fn run_clear(cfg: &PipelineConfig) {
    let store = match FsCacheStore::open(cfg.cache_dir.clone()) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open cache: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = store.purge() {
        log::error!("Failed to clear cache: {}", e);
        std::process::exit(1);
    }
    println!("Cache cleared: {}", store.root().display());
}
