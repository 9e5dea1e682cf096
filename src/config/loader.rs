// src/config/loader.rs

use std::path::Path;

use tracing::info;

use crate::config::model::{SiteConfig, SiteList};
use crate::errors::Result;
use crate::fs::FileSystem;

/// File name used when no `--config` is given.
pub const CONFIG_NAME: &str = "sites.json";

/// Parse the raw JSON site array without semantic validation.
pub fn parse_sites(contents: &str) -> Result<Vec<SiteConfig>> {
    let sites: Vec<SiteConfig> = serde_json::from_str(contents)?;
    Ok(sites)
}

/// Read and validate a sites file that must already exist.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<SiteList> {
    let contents = fs.read_to_string(path.as_ref())?;
    let sites = parse_sites(&contents)?;
    SiteList::try_from(sites)
}

/// Load the sites file, writing the default list first if it is missing.
///
/// The default file holds a single non-autostarted `youtube` site, pretty
/// printed so users can edit it by hand.
pub fn load_or_create(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<SiteList> {
    let path = path.as_ref();
    if !fs.exists(path) {
        let defaults = vec![SiteConfig::default_site()];
        let rendered = serde_json::to_string_pretty(&defaults)?;
        fs.write(path, rendered.as_bytes())?;
        info!(path = %path.display(), "created default sites file");
    }
    load_from_path(fs, path)
}
