// src/config/registry.rs

//! Site registry collaborator.
//!
//! The supervisor asks the registry for the full site list once at boot
//! (autostart) and again for every `start`, so a file-backed registry picks
//! up edits without a restart.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::loader::{load_from_path, load_or_create};
use crate::config::model::{SiteConfig, SiteList};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

pub trait SiteRegistry: Send + Sync + Debug {
    /// Ordered, validated list of configured sites.
    fn sites(&self) -> Result<SiteList>;

    /// Resolve a single id; `Ok(None)` when the id is not configured.
    fn resolve(&self, id: &str) -> Result<Option<SiteConfig>> {
        Ok(self.sites()?.get(id).cloned())
    }
}

/// Registry backed by a JSON file, re-read on every query.
#[derive(Debug, Clone)]
pub struct FileSiteRegistry {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileSiteRegistry {
    /// Open the registry, creating the default sites file when missing.
    pub fn open(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        load_or_create(fs.as_ref(), &path)?;
        Ok(Self { fs, path })
    }

    /// Same as [`FileSiteRegistry::open`] using the real filesystem.
    pub fn open_real(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(Arc::new(RealFileSystem), path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SiteRegistry for FileSiteRegistry {
    fn sites(&self) -> Result<SiteList> {
        load_from_path(self.fs.as_ref(), &self.path)
    }
}

/// Fixed in-memory registry.
#[derive(Debug, Clone)]
pub struct StaticSiteRegistry {
    sites: SiteList,
}

impl StaticSiteRegistry {
    pub fn new(sites: SiteList) -> Self {
        Self { sites }
    }
}

impl SiteRegistry for StaticSiteRegistry {
    fn sites(&self) -> Result<SiteList> {
        Ok(self.sites.clone())
    }
}
