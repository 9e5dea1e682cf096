// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{SiteConfig, SiteList};
use crate::errors::{Result, SitevisorError};

impl TryFrom<Vec<SiteConfig>> for SiteList {
    type Error = crate::errors::SitevisorError;

    fn try_from(raw: Vec<SiteConfig>) -> std::result::Result<Self, Self::Error> {
        validate_sites(&raw)?;
        Ok(SiteList::new_unchecked(raw))
    }
}

/// Check the invariants every consumer of a site list relies on.
pub fn validate_sites(sites: &[SiteConfig]) -> Result<()> {
    ensure_has_sites(sites)?;
    validate_fields(sites)?;
    validate_unique_ids(sites)?;
    Ok(())
}

fn ensure_has_sites(sites: &[SiteConfig]) -> Result<()> {
    if sites.is_empty() {
        return Err(SitevisorError::ConfigError(
            "sites file must contain at least one site".to_string(),
        ));
    }
    Ok(())
}

fn validate_fields(sites: &[SiteConfig]) -> Result<()> {
    for (idx, site) in sites.iter().enumerate() {
        if site.id.trim().is_empty() {
            return Err(SitevisorError::ConfigError(format!(
                "site #{} has an empty `id`",
                idx
            )));
        }
        if site.id.chars().any(char::is_whitespace) {
            return Err(SitevisorError::ConfigError(format!(
                "site id '{}' must not contain whitespace",
                site.id
            )));
        }
        if site.url.trim().is_empty() {
            return Err(SitevisorError::ConfigError(format!(
                "site '{}' has an empty `url`",
                site.id
            )));
        }
    }
    Ok(())
}

fn validate_unique_ids(sites: &[SiteConfig]) -> Result<()> {
    let mut seen = HashSet::new();
    for site in sites {
        if !seen.insert(site.id.as_str()) {
            return Err(SitevisorError::ConfigError(format!(
                "duplicate site id '{}'",
                site.id
            )));
        }
    }
    Ok(())
}
