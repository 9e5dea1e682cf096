// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One configured site, as stored in the sites file:
///
/// ```json
/// [
///   {
///     "id": "youtube",
///     "name": "YouTube",
///     "url": "https://youtube.com",
///     "autostart": false
///   }
/// ]
/// ```
///
/// The whole struct is serialized and handed to the worker process on spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Unique key used by every control action and snapshot.
    pub id: String,

    /// Human-readable label (window title on the worker side).
    pub name: String,

    /// Page the worker loads.
    pub url: String,

    /// Start this site's worker when the supervisor boots.
    #[serde(default)]
    pub autostart: bool,
}

impl SiteConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            autostart: false,
        }
    }

    /// The site written to a freshly created sites file.
    pub fn default_site() -> Self {
        Self::new("youtube", "YouTube", "https://youtube.com")
    }
}

/// Validated, ordered list of sites.
///
/// Only constructible through `TryFrom<Vec<SiteConfig>>` (see `validate.rs`),
/// so holders can rely on ids being unique and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteList {
    sites: Vec<SiteConfig>,
}

impl SiteList {
    pub(crate) fn new_unchecked(sites: Vec<SiteConfig>) -> Self {
        Self { sites }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteConfig> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Ids of sites flagged `autostart`, in file order.
    pub fn autostart_ids(&self) -> Vec<String> {
        self.sites
            .iter()
            .filter(|s| s.autostart)
            .map(|s| s.id.clone())
            .collect()
    }
}

/// Supervisor tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Automatic respawns allowed before a site needs a manual `start`.
    pub max_restarts: u32,

    /// Fixed delay between an unrequested exit and the respawn.
    pub restart_delay: Duration,

    /// Capacity of the snapshot broadcast channel.
    pub status_capacity: usize,

    /// Capacity of the control loop's inbound event channel.
    pub event_capacity: usize,
}

pub const DEFAULT_MAX_RESTARTS: u32 = 5;
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(3000);

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_restarts: DEFAULT_MAX_RESTARTS,
            restart_delay: DEFAULT_RESTART_DELAY,
            status_capacity: 64,
            event_capacity: 64,
        }
    }
}
