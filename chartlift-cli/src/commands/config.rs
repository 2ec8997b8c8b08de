use chartlift_pipeline::{config_path, PipelineConfig};

pub(crate) fn print_config(cfg: &PipelineConfig) {
    println!("database:      {}", cfg.database.display());
    println!("api_url:       {}", cfg.api_url);
    println!("api_key:       {}", mask(&cfg.api_key));
    println!("cache_dir:     {}", cfg.cache_dir.display());
    println!("reports_dir:   {}", cfg.reports_dir.display());
    println!("batch_size:    {}", cfg.batch_size);
    println!("workers:       {}", cfg.workers);
    println!("timeout_secs:  {}", cfg.timeout_secs);
    println!("numeric_keywords: {}", cfg.numeric_keywords.join(", "));
}

pub(crate) fn print_config_path() {
    match config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            log::error!("Could not determine config directory");
            std::process::exit(1);
        }
    }
}

/// Show only the tail of the API key, enough to recognize it.
fn mask(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else if key.len() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", &key[key.len() - 4..])
    }
}
