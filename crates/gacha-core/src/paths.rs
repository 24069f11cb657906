use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const GACHA_DIR: &str = ".gacha";
pub const RESULTS_DIR: &str = ".gacha/results";

pub const CONFIG_FILE: &str = ".gacha/config.yaml";
pub const COLLECTION_FILE: &str = ".gacha/collection.yaml";

/// Dropped by the status updater when it wants fresh content.
pub const REQUEST_FILE: &str = ".gacha-request.json";
/// Written by `gacha handle` / `gacha watch` in reply.
pub const RESPONSE_FILE: &str = ".gacha-response.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn gacha_dir(root: &Path) -> PathBuf {
    root.join(GACHA_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn collection_path(root: &Path) -> PathBuf {
    root.join(COLLECTION_FILE)
}

pub fn results_dir(root: &Path) -> PathBuf {
    root.join(RESULTS_DIR)
}

pub fn result_path(root: &Path, file_name: &str) -> PathBuf {
    results_dir(root).join(file_name)
}

pub fn request_path(root: &Path) -> PathBuf {
    root.join(REQUEST_FILE)
}

pub fn response_path(root: &Path) -> PathBuf {
    root.join(RESPONSE_FILE)
}
