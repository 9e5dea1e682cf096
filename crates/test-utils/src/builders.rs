#![allow(dead_code)]

use std::sync::Arc;

use sitevisor::config::{SiteConfig, SiteList, SiteRegistry, StaticSiteRegistry};

/// Builder for `SiteList` to simplify test setup.
pub struct SiteListBuilder {
    sites: Vec<SiteConfig>,
}

impl SiteListBuilder {
    pub fn new() -> Self {
        Self { sites: Vec::new() }
    }

    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.sites.push(site);
        self
    }

    /// Shorthand: site with a derived name and url.
    pub fn with_id(self, id: &str) -> Self {
        self.with_site(SiteConfigBuilder::new(id).build())
    }

    pub fn with_autostart(self, id: &str) -> Self {
        self.with_site(SiteConfigBuilder::new(id).autostart(true).build())
    }

    pub fn build(self) -> SiteList {
        SiteList::try_from(self.sites).expect("Failed to build valid site list from builder")
    }

    pub fn registry(self) -> Arc<dyn SiteRegistry> {
        Arc::new(StaticSiteRegistry::new(self.build()))
    }
}

impl Default for SiteListBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `SiteConfig`.
pub struct SiteConfigBuilder {
    site: SiteConfig,
}

impl SiteConfigBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            site: SiteConfig {
                id: id.to_string(),
                name: id.to_uppercase(),
                url: format!("https://{id}.example"),
                autostart: false,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.site.name = name.to_string();
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.site.url = url.to_string();
        self
    }

    pub fn autostart(mut self, val: bool) -> Self {
        self.site.autostart = val;
        self
    }

    pub fn build(self) -> SiteConfig {
        self.site
    }
}
