use std::sync::Arc;
use tokio::sync::Mutex;

use beacon_core::{GroupId, Site, SiteId};

/// Organization the session is currently scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGroup {
    pub id: GroupId,
    pub title: String,
}

/// Cross-view session state, passed explicitly to whatever needs it.
pub struct AppContext {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    active_network: Option<String>,
    active_group: Option<ActiveGroup>,
    selected_sites: Vec<SiteId>,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub async fn set_active_network(&self, network: Option<String>) {
        let mut inner = self.inner.lock().await;
        if inner.active_network != network {
            inner.selected_sites.clear();
        }
        inner.active_network = network;
    }

    pub async fn active_network(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.active_network.clone()
    }

    /// Switching organization drops the site selection made under the
    /// previous one.
    pub async fn set_active_group(&self, group: Option<ActiveGroup>) {
        let mut inner = self.inner.lock().await;
        if inner.active_group != group {
            inner.selected_sites.clear();
        }
        inner.active_group = group;
    }

    pub async fn active_group(&self) -> Option<ActiveGroup> {
        let inner = self.inner.lock().await;
        inner.active_group.clone()
    }

    /// Adds a site to the selection; already-selected sites are ignored.
    pub async fn select_site(&self, site: SiteId) {
        let mut inner = self.inner.lock().await;
        if !inner.selected_sites.contains(&site) {
            inner.selected_sites.push(site);
        }
    }

    /// Narrows `sites` to the selection, or keeps every site when nothing
    /// is selected.
    pub async fn narrow_to_selection(&self, mut sites: Vec<Site>) -> Vec<Site> {
        let inner = self.inner.lock().await;
        if !inner.selected_sites.is_empty() {
            sites.retain(|site| inner.selected_sites.contains(&site.id));
        }
        sites
    }

    pub async fn selected_sites(&self) -> Vec<SiteId> {
        let inner = self.inner.lock().await;
        inner.selected_sites.clone()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for AppContext {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
