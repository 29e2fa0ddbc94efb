use std::path::PathBuf;

/// Get cache data directory from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("ISXSYNC_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("market_data"))
}

/// Round to two decimal places (prices and percentages on disk carry 2dp)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
