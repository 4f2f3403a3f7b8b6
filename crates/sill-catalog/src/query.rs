//! Catalog query orchestration
//!
//! Composes the predicates in their fixed order (search, organization,
//! category, environment, then each prerogative), applies the sort, and
//! derives the facet sidebars. [`CatalogSelectors`] memoizes every derived
//! value in a single slot keyed by its declared inputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

use sill_core::{ByAddress, Environment, Memo, Prerogative, SearchConfig};

use crate::facet::{self, Facet, FacetCount};
use crate::filter::{
    filter_by_category, filter_by_environment, filter_by_organization, filter_by_prerogatives,
    SearchFilter,
};
use crate::sort::{sort_records, SortId};
use crate::RecordList;

/// Active filters and sort of a catalog view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogQuery {
    pub search: String,
    pub sort: Option<SortId>,
    pub organization: Option<String>,
    pub category: Option<String>,
    pub environment: Option<Environment>,
    pub prerogatives: BTreeSet<Prerogative>,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn sorted_by(mut self, sort: SortId) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn prerogative(mut self, prerogative: Prerogative) -> Self {
        self.prerogatives.insert(prerogative);
        self
    }
}

/// Narrow `records` with every active filter except `skip`'s own
pub fn narrow(
    records: &RecordList,
    query: &CatalogQuery,
    search: &SearchFilter,
    skip: Option<Facet>,
) -> RecordList {
    let mut narrowed = search.apply(records, &query.search);
    if skip != Some(Facet::Organization) {
        narrowed = filter_by_organization(&narrowed, query.organization.as_deref());
    }
    if skip != Some(Facet::Category) {
        narrowed = filter_by_category(&narrowed, query.category.as_deref());
    }
    if skip != Some(Facet::Environment) {
        narrowed = filter_by_environment(&narrowed, query.environment);
    }
    if skip != Some(Facet::Prerogative) {
        narrowed = filter_by_prerogatives(&narrowed, &query.prerogatives);
    }
    narrowed
}

type ListKey = ByAddress<[crate::Record]>;

/// Inputs of a facet: every filter but the facet's own, never the sort
#[derive(Debug, Clone, PartialEq)]
struct FacetKey {
    records: ListKey,
    search: String,
    organization: Option<String>,
    category: Option<String>,
    environment: Option<Environment>,
    prerogatives: Option<BTreeSet<Prerogative>>,
}

impl FacetKey {
    fn new(records: &RecordList, query: &CatalogQuery, facet: Facet) -> Self {
        Self {
            records: ByAddress(Arc::clone(records)),
            search: query.search.clone(),
            organization: (facet != Facet::Organization)
                .then(|| query.organization.clone())
                .flatten(),
            category: (facet != Facet::Category)
                .then(|| query.category.clone())
                .flatten(),
            environment: (facet != Facet::Environment)
                .then_some(query.environment)
                .flatten(),
            prerogatives: (facet != Facet::Prerogative).then(|| query.prerogatives.clone()),
        }
    }
}

pub type StringFacet = Arc<Vec<FacetCount<String>>>;
pub type EnvironmentFacet = Arc<Vec<FacetCount<Environment>>>;
pub type PrerogativeFacet = Arc<Vec<FacetCount<Prerogative>>>;

/// Memoized derived views of a catalog
pub struct CatalogSelectors {
    search: SearchFilter,
    visible: Memo<(ListKey, CatalogQuery), RecordList>,
    organizations: Memo<FacetKey, StringFacet>,
    categories: Memo<FacetKey, StringFacet>,
    environments: Memo<FacetKey, EnvironmentFacet>,
    prerogatives: Memo<FacetKey, PrerogativeFacet>,
}

impl CatalogSelectors {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            search: SearchFilter::new(config),
            visible: Memo::new(),
            organizations: Memo::new(),
            categories: Memo::new(),
            environments: Memo::new(),
            prerogatives: Memo::new(),
        }
    }

    /// Filtered then sorted list
    pub fn visible_softwares(&self, records: &RecordList, query: &CatalogQuery) -> RecordList {
        let key = (ByAddress(Arc::clone(records)), query.clone());
        self.visible
            .get_or_compute(key, || self.compute_visible(records, query))
    }

    #[instrument(name = "catalog.visible", skip_all, fields(result_count = tracing::field::Empty))]
    fn compute_visible(&self, records: &RecordList, query: &CatalogQuery) -> RecordList {
        let narrowed = narrow(records, query, &self.search, None);
        let sorted = sort_records(&narrowed, query.sort);
        tracing::Span::current().record("result_count", sorted.len());
        debug!(total = records.len(), visible = sorted.len(), sort = ?query.sort, "visible softwares recomputed");
        sorted
    }

    pub fn organization_facet(&self, records: &RecordList, query: &CatalogQuery) -> StringFacet {
        let key = FacetKey::new(records, query, Facet::Organization);
        self.organizations.get_or_compute(key, || {
            let narrowed = self.narrow_for(records, query, Facet::Organization);
            Arc::new(facet::organization_counts(records, &narrowed))
        })
    }

    pub fn category_facet(&self, records: &RecordList, query: &CatalogQuery) -> StringFacet {
        let key = FacetKey::new(records, query, Facet::Category);
        self.categories.get_or_compute(key, || {
            let narrowed = self.narrow_for(records, query, Facet::Category);
            Arc::new(facet::category_counts(records, &narrowed))
        })
    }

    pub fn environment_facet(&self, records: &RecordList, query: &CatalogQuery) -> EnvironmentFacet {
        let key = FacetKey::new(records, query, Facet::Environment);
        self.environments.get_or_compute(key, || {
            let narrowed = self.narrow_for(records, query, Facet::Environment);
            Arc::new(facet::environment_counts(&narrowed))
        })
    }

    pub fn prerogative_facet(&self, records: &RecordList, query: &CatalogQuery) -> PrerogativeFacet {
        let key = FacetKey::new(records, query, Facet::Prerogative);
        self.prerogatives.get_or_compute(key, || {
            let narrowed = self.narrow_for(records, query, Facet::Prerogative);
            Arc::new(facet::prerogative_counts(&narrowed))
        })
    }

    /// All four sidebars at once
    pub fn facets(&self, records: &RecordList, query: &CatalogQuery) -> FacetSidebars {
        FacetSidebars {
            organizations: self.organization_facet(records, query),
            categories: self.category_facet(records, query),
            environments: self.environment_facet(records, query),
            prerogatives: self.prerogative_facet(records, query),
        }
    }

    #[cfg(test)]
    pub(crate) fn facets_cached(&self, records: &RecordList, query: &CatalogQuery) -> bool {
        self.organizations
            .is_cached(&FacetKey::new(records, query, Facet::Organization))
            && self
                .categories
                .is_cached(&FacetKey::new(records, query, Facet::Category))
            && self
                .environments
                .is_cached(&FacetKey::new(records, query, Facet::Environment))
            && self
                .prerogatives
                .is_cached(&FacetKey::new(records, query, Facet::Prerogative))
    }

    #[instrument(name = "catalog.facet", skip(self, records, query))]
    fn narrow_for(&self, records: &RecordList, query: &CatalogQuery, facet: Facet) -> RecordList {
        narrow(records, query, &self.search, Some(facet))
    }
}

impl Default for CatalogSelectors {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

/// Facet counts shown next to the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSidebars {
    pub organizations: StringFacet,
    pub categories: StringFacet,
    pub environments: EnvironmentFacet,
    pub prerogatives: PrerogativeFacet,
}
