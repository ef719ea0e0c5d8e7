//! One dashboard page: a remote collection plus its filter, sort and export
//! settings. Every resource in the registry is driven through this type.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::client::Backend;
use crate::collection::{LoadOutcome, RemoteCollection};
use crate::error::Result;
use crate::export::{self, ExportFormat, ExportRequest, ExportedDocument, Exportable};
use crate::filter::{self, FilterCriteria};
use crate::notify::Notifier;
use crate::resources::Resource;
use crate::sort::{self, SortDirection, SortState};
use crate::summary::{self, CategorySummary};

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub collection: RemoteCollection<T>,
    pub criteria: FilterCriteria,
    pub sort: SortState,
}

impl<T: Exportable + Clone + DeserializeOwned> Page<T> {
    pub fn new(resource: &'static Resource) -> Self {
        Self {
            collection: RemoteCollection::new(resource),
            criteria: FilterCriteria::default(),
            sort: SortState::by(resource.default_sort, SortDirection::Ascending),
        }
    }

    pub fn resource(&self) -> &'static Resource {
        self.collection.resource()
    }

    pub async fn refresh(&mut self, backend: &dyn Backend) -> LoadOutcome {
        self.collection.load(backend, &self.criteria).await
    }

    /// Reloads only if a local patch left the list out of sync.
    pub async fn resync_if_needed(&mut self, backend: &dyn Backend) -> Option<LoadOutcome> {
        if self.collection.needs_resync() {
            Some(self.refresh(backend).await)
        } else {
            None
        }
    }

    /// Filtered then sorted view of the loaded items.
    pub fn visible(&self) -> Vec<T> {
        let filtered = filter::apply_filter(self.collection.items(), &self.criteria);
        sort::sorted(&filtered, &self.sort)
    }

    pub fn filter_options(&self, key: &str) -> Vec<String> {
        filter::filter_options(self.collection.items(), key)
    }

    pub fn summary(&self, key: &str) -> Vec<CategorySummary> {
        summary::summarize_by(&self.visible(), key)
    }

    /// Exports what is currently visible.
    pub fn export(
        &self,
        format: ExportFormat,
        date: NaiveDate,
        notifier: &dyn Notifier,
    ) -> Result<ExportedDocument> {
        let resource = self.resource();
        let request = ExportRequest {
            resource: resource.name,
            title: resource.title,
            format,
            date,
            group_by: Some(resource.group_by),
        };
        export::export_table(&self.visible(), &T::columns(), &request, notifier)
    }
}
