//! Catalog store: lifecycle, intents and derived views
//!
//! ```text
//! Uninitialized ──initialize──▶ Initializing ──fetched──▶ Ready
//!       ▲                            │                      │
//!       └──────── fetch failed ──────┘◀────── clear ────────┘
//! ```
//!
//! Intents are pure reductions of [`CatalogViewState`] and are only accepted
//! once the store is `Ready`. Every `clear` starts a new epoch; a fetch only
//! commits its records if no clear happened while it was in flight.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use sill_core::{Environment, Prerogative, SearchConfig, SillApi, SillError, SoftwareRecord};

use crate::query::{
    CatalogQuery, CatalogSelectors, EnvironmentFacet, FacetSidebars, PrerogativeFacet, StringFacet,
};
use crate::sort::SortId;
use crate::{Record, RecordList};

/// One intent per filter field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogAction {
    SetSearch(String),
    SetSort(Option<SortId>),
    SetOrganization(Option<String>),
    SetCategory(Option<String>),
    SetEnvironment(Option<Environment>),
    SetPrerogatives(BTreeSet<Prerogative>),
    TogglePrerogative(Prerogative),
    /// Reset every filter and the sort
    ClearFilters,
}

/// Loaded records plus the active query
#[derive(Debug, Clone)]
pub struct CatalogViewState {
    pub records: RecordList,
    pub query: CatalogQuery,
}

impl CatalogViewState {
    /// Fresh view with empty filters
    pub fn new(records: Vec<SoftwareRecord>) -> Self {
        Self {
            records: records.into_iter().map(Arc::new).collect::<Vec<_>>().into(),
            query: CatalogQuery::default(),
        }
    }

    /// Apply one intent; records are never touched
    pub fn reduce(mut self, action: CatalogAction) -> Self {
        let query = &mut self.query;
        match action {
            CatalogAction::SetSearch(search) => query.search = search,
            CatalogAction::SetSort(sort) => query.sort = sort,
            CatalogAction::SetOrganization(organization) => query.organization = organization,
            CatalogAction::SetCategory(category) => query.category = category,
            CatalogAction::SetEnvironment(environment) => query.environment = environment,
            CatalogAction::SetPrerogatives(prerogatives) => query.prerogatives = prerogatives,
            CatalogAction::TogglePrerogative(prerogative) => {
                if !query.prerogatives.remove(&prerogative) {
                    query.prerogatives.insert(prerogative);
                }
            }
            CatalogAction::ClearFilters => *query = CatalogQuery::default(),
        }
        self
    }
}

#[derive(Debug, Clone)]
pub enum CatalogState {
    Uninitialized,
    Initializing,
    Ready(CatalogViewState),
}

impl CatalogState {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready(_) => "ready",
        }
    }
}

pub struct CatalogStore {
    state: Mutex<CatalogState>,
    /// Bumped by `clear`, under the state lock
    epoch: AtomicU64,
    selectors: CatalogSelectors,
}

/// Puts an `Initializing` store back to `Uninitialized` when the fetch is
/// dropped or fails, unless the store was cleared meanwhile
struct InitializingGuard<'a> {
    store: &'a CatalogStore,
    epoch: u64,
    armed: bool,
}

impl InitializingGuard<'_> {
    /// Install the fetched records; false when the fetch was superseded
    fn commit(mut self, records: Vec<SoftwareRecord>) -> bool {
        self.armed = false;
        let mut state = self.store.lock();
        if !self.store.is_current(self.epoch) || !matches!(*state, CatalogState::Initializing) {
            return false;
        }
        *state = CatalogState::Ready(CatalogViewState::new(records));
        true
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.store.lock();
        if self.store.is_current(self.epoch) && matches!(*state, CatalogState::Initializing) {
            debug!("catalog initialization abandoned");
            *state = CatalogState::Uninitialized;
        }
    }
}

impl CatalogStore {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            state: Mutex::new(CatalogState::Uninitialized),
            epoch: AtomicU64::new(0),
            selectors: CatalogSelectors::new(config),
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetch the catalog once
    ///
    /// Returns `Ok(false)` without calling the API when the store is already
    /// ready or being initialized, and also when the store was cleared while
    /// the fetch was in flight. A failed or dropped fetch leaves the store
    /// uninitialized so the call can be retried.
    pub async fn initialize(&self, api: &dyn SillApi) -> Result<bool, SillError> {
        let guard = {
            let mut state = self.lock();
            if !matches!(*state, CatalogState::Uninitialized) {
                debug!(state = state.description(), "catalog initialization skipped");
                return Ok(false);
            }
            *state = CatalogState::Initializing;
            InitializingGuard {
                store: self,
                epoch: self.epoch.load(Ordering::SeqCst),
                armed: true,
            }
        };

        match api.fetch_software_list().await {
            Ok(records) => {
                let count = records.len();
                if guard.commit(records) {
                    info!(count, "catalog loaded");
                    Ok(true)
                } else {
                    debug!(count, "catalog cleared during fetch, records dropped");
                    Ok(false)
                }
            }
            Err(e) => {
                warn!(error = %e, "catalog fetch failed");
                Err(e.into())
            }
        }
    }

    /// Discard the records (catalog view left); an in-flight fetch is
    /// abandoned
    pub fn clear(&self) {
        let mut state = self.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *state = CatalogState::Uninitialized;
    }

    pub fn state(&self) -> CatalogState {
        self.lock().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.lock(), CatalogState::Ready(_))
    }

    /// Snapshot of the ready view
    pub fn view(&self) -> Result<CatalogViewState, SillError> {
        match &*self.lock() {
            CatalogState::Ready(view) => Ok(view.clone()),
            other => Err(SillError::precondition(format!(
                "catalog is {}, expected ready",
                other.description()
            ))),
        }
    }

    pub fn dispatch(&self, action: CatalogAction) -> Result<(), SillError> {
        let mut state = self.lock();
        let current = std::mem::replace(&mut *state, CatalogState::Uninitialized);
        match current {
            CatalogState::Ready(view) => {
                debug!(?action, "catalog intent");
                *state = CatalogState::Ready(view.reduce(action));
                Ok(())
            }
            other => {
                let description = other.description();
                *state = other;
                Err(SillError::precondition(format!(
                    "cannot apply {:?}: catalog is {}",
                    action, description
                )))
            }
        }
    }

    pub fn set_search(&self, search: impl Into<String>) -> Result<(), SillError> {
        self.dispatch(CatalogAction::SetSearch(search.into()))
    }

    pub fn set_sort(&self, sort: Option<SortId>) -> Result<(), SillError> {
        self.dispatch(CatalogAction::SetSort(sort))
    }

    pub fn set_organization_filter(&self, organization: Option<String>) -> Result<(), SillError> {
        self.dispatch(CatalogAction::SetOrganization(organization))
    }

    pub fn set_category_filter(&self, category: Option<String>) -> Result<(), SillError> {
        self.dispatch(CatalogAction::SetCategory(category))
    }

    pub fn set_environment_filter(&self, environment: Option<Environment>) -> Result<(), SillError> {
        self.dispatch(CatalogAction::SetEnvironment(environment))
    }

    pub fn set_prerogatives_filter(&self, prerogatives: BTreeSet<Prerogative>) -> Result<(), SillError> {
        self.dispatch(CatalogAction::SetPrerogatives(prerogatives))
    }

    pub fn toggle_prerogative(&self, prerogative: Prerogative) -> Result<(), SillError> {
        self.dispatch(CatalogAction::TogglePrerogative(prerogative))
    }

    pub fn clear_filters(&self) -> Result<(), SillError> {
        self.dispatch(CatalogAction::ClearFilters)
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    pub fn visible_softwares(&self) -> Result<RecordList, SillError> {
        let view = self.view()?;
        Ok(self.selectors.visible_softwares(&view.records, &view.query))
    }

    pub fn organization_facet(&self) -> Result<StringFacet, SillError> {
        let view = self.view()?;
        Ok(self.selectors.organization_facet(&view.records, &view.query))
    }

    pub fn category_facet(&self) -> Result<StringFacet, SillError> {
        let view = self.view()?;
        Ok(self.selectors.category_facet(&view.records, &view.query))
    }

    pub fn environment_facet(&self) -> Result<EnvironmentFacet, SillError> {
        let view = self.view()?;
        Ok(self.selectors.environment_facet(&view.records, &view.query))
    }

    pub fn prerogative_facet(&self) -> Result<PrerogativeFacet, SillError> {
        let view = self.view()?;
        Ok(self.selectors.prerogative_facet(&view.records, &view.query))
    }

    pub fn facets(&self) -> Result<FacetSidebars, SillError> {
        let view = self.view()?;
        Ok(self.selectors.facets(&view.records, &view.query))
    }

    /// Visible list of an ad hoc query against the loaded records
    pub fn query_softwares(&self, query: &CatalogQuery) -> Result<RecordList, SillError> {
        let view = self.view()?;
        Ok(self.selectors.visible_softwares(&view.records, query))
    }

    /// Facet sidebars of an ad hoc query against the loaded records
    pub fn query_facets(&self, query: &CatalogQuery) -> Result<FacetSidebars, SillError> {
        let view = self.view()?;
        Ok(self.selectors.facets(&view.records, query))
    }

    pub fn find_software(&self, name: &str) -> Result<Record, SillError> {
        self.view()?
            .records
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| SillError::not_found("software", name))
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}
