// src/config/mod.rs

//! Site configuration for sitevisor.
//!
//! Responsibilities:
//! - Define the JSON-backed data model and supervisor settings (`model.rs`).
//! - Load (or create) the sites file (`loader.rs`).
//! - Validate ids and urls (`validate.rs`).
//! - Expose the site registry the supervisor resolves ids against (`registry.rs`).

pub mod loader;
pub mod model;
pub mod registry;
pub mod validate;

pub use loader::{load_from_path, load_or_create, parse_sites};
pub use model::{SiteConfig, SiteList, SupervisorConfig};
pub use registry::{FileSiteRegistry, SiteRegistry, StaticSiteRegistry};
pub use validate::validate_sites;
