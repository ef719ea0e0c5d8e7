//! Page-local cache of a remote list.
//!
//! Every load takes a [`RequestTicket`]. Only the most recently issued ticket may
//! settle the collection, so a slow response to an older query can never
//! overwrite the result of a newer one.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::client::{self, Backend};
use crate::error::{DeskError, Result};
use crate::filter::FilterCriteria;
use crate::models::{Record, RecordId};
use crate::resources::{RecordAction, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// What happened to a settled load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(usize),
    Failed,
    Stale,
}

#[derive(Debug, Clone)]
pub struct RemoteCollection<T> {
    resource: &'static Resource,
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
    last_loaded: Option<DateTime<Utc>>,
    needs_resync: bool,
    issued: u64,
}

impl<T: Record + Clone + DeserializeOwned> RemoteCollection<T> {
    pub fn new(resource: &'static Resource) -> Self {
        Self {
            resource,
            items: Vec::new(),
            loading: false,
            error: None,
            last_loaded: None,
            needs_resync: false,
            issued: 0,
        }
    }

    pub fn resource(&self) -> &'static Resource {
        self.resource
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_loaded(&self) -> Option<DateTime<Utc>> {
        self.last_loaded
    }

    /// Set after a local patch until the next successful load.
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    /// Marks a load as started and returns its ticket.
    pub fn begin(&mut self) -> RequestTicket {
        self.issued += 1;
        self.loading = true;
        RequestTicket(self.issued)
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Applies a load result if `ticket` is still the latest. On failure the
    /// previous items are kept and the error message is stored.
    pub fn settle(&mut self, ticket: RequestTicket, result: Result<Vec<T>>) -> LoadOutcome {
        if !self.is_latest(ticket) {
            tracing::warn!(
                resource = self.resource.name,
                sequence = ticket.0,
                latest = self.issued,
                "discarding stale response"
            );
            return LoadOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(items) => {
                let count = items.len();
                self.items = items;
                self.error = None;
                self.needs_resync = false;
                self.last_loaded = Some(Utc::now());
                tracing::info!(resource = self.resource.name, count, "collection loaded");
                LoadOutcome::Applied(count)
            }
            Err(err) => {
                tracing::warn!(resource = self.resource.name, error = %err, "load failed");
                self.error = Some(err.user_message());
                LoadOutcome::Failed
            }
        }
    }

    /// Fetches the list with the backend-side filters of `criteria`.
    pub async fn load(&mut self, backend: &dyn Backend, criteria: &FilterCriteria) -> LoadOutcome {
        let ticket = self.begin();
        tracing::debug!(resource = self.resource.name, sequence = ticket.0, "loading");
        let result = client::fetch_list::<T>(backend, self.resource, criteria).await;
        self.settle(ticket, result)
    }

    /// Adds a freshly created record at the top of the list.
    pub fn prepend(&mut self, record: T) {
        self.items.insert(0, record);
        self.needs_resync = true;
    }

    /// Replaces the record with the same id. Returns false if none matched.
    pub fn replace(&mut self, record: T) -> bool {
        let position = self.items.iter().position(|item| item.id() == record.id());
        let found = match position {
            Some(index) => {
                self.items[index] = record;
                true
            }
            None => false,
        };
        self.needs_resync = true;
        found
    }

    /// Removes the record with `id`. Returns false if none matched.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.needs_resync = true;
        self.items.len() != before
    }

    pub fn find(&self, id: &RecordId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// POSTs `draft` and prepends the created record.
    pub async fn create<B: serde::Serialize + ?Sized + Sync>(
        &mut self,
        backend: &dyn Backend,
        draft: &B,
    ) -> Result<T> {
        let created: T = client::create(backend, self.resource, draft).await?;
        tracing::info!(resource = self.resource.name, id = %created.id(), "record created");
        self.prepend(created.clone());
        Ok(created)
    }

    /// PUTs `draft` for `id` and replaces the local copy.
    pub async fn update<B: serde::Serialize + ?Sized + Sync>(
        &mut self,
        backend: &dyn Backend,
        id: &RecordId,
        draft: &B,
    ) -> Result<T> {
        let updated: T = client::update(backend, self.resource, id, draft).await?;
        tracing::info!(resource = self.resource.name, id = %id, "record updated");
        self.replace(updated.clone());
        Ok(updated)
    }

    /// DELETEs `id` and drops it from the list.
    pub async fn delete(&mut self, backend: &dyn Backend, id: &RecordId) -> Result<()> {
        client::delete(backend, self.resource, id).await?;
        tracing::info!(resource = self.resource.name, id = %id, "record deleted");
        self.remove(id);
        Ok(())
    }

    /// Runs an inline action and replaces the record with the server's copy.
    pub async fn act(
        &mut self,
        backend: &dyn Backend,
        id: &RecordId,
        action: RecordAction,
    ) -> Result<T> {
        if !self.resource.supports(action) {
            return Err(DeskError::UnsupportedAction {
                resource: self.resource.name.to_string(),
                action: action.to_string(),
            });
        }
        let updated: T = client::run_action(backend, self.resource, id, action).await?;
        tracing::info!(resource = self.resource.name, id = %id, %action, "action applied");
        self.replace(updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Facture, InvoiceStatus};
    use crate::resources::{find, Role};

    fn invoice(id: &str) -> Facture {
        Facture {
            id: RecordId::from(id),
            numero: format!("F-{id}"),
            montant: 10.0,
            statut: InvoiceStatus::Generee,
            eleve: None,
            date_emission: None,
        }
    }

    fn collection() -> RemoteCollection<Facture> {
        RemoteCollection::new(find(Role::Comptable, "factures").unwrap())
    }

    #[test]
    fn newer_ticket_wins_regardless_of_arrival_order() {
        let mut list = collection();
        let first = list.begin();
        let second = list.begin();

        assert_eq!(list.settle(second, Ok(vec![invoice("2")])), LoadOutcome::Applied(1));
        assert_eq!(list.settle(first, Ok(vec![invoice("1"), invoice("x")])), LoadOutcome::Stale);
        assert_eq!(list.items()[0].id.as_str(), "2");
        assert!(!list.is_loading());
    }

    #[test]
    fn stale_ticket_keeps_loading_flag_for_pending_request() {
        let mut list = collection();
        let first = list.begin();
        let _second = list.begin();
        list.settle(first, Ok(vec![]));
        assert!(list.is_loading());
    }

    #[test]
    fn failure_keeps_previous_items() {
        let mut list = collection();
        let ticket = list.begin();
        list.settle(ticket, Ok(vec![invoice("1")]));

        let ticket = list.begin();
        let outcome = list.settle(
            ticket,
            Err(DeskError::Http {
                status: 500,
                message: "boom".into(),
            }),
        );
        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.error(), Some("boom"));
    }

    #[test]
    fn patches_flag_resync() {
        let mut list = collection();
        let ticket = list.begin();
        list.settle(ticket, Ok(vec![invoice("1"), invoice("2")]));
        assert!(!list.needs_resync());

        list.prepend(invoice("3"));
        assert_eq!(list.items()[0].id.as_str(), "3");
        assert!(list.needs_resync());

        let mut sent = invoice("2");
        sent.statut = InvoiceStatus::Envoyee;
        assert!(list.replace(sent));
        assert_eq!(list.find(&RecordId::from("2")).unwrap().statut, InvoiceStatus::Envoyee);

        assert!(list.remove(&RecordId::from("1")));
        assert!(!list.remove(&RecordId::from("1")));
        assert_eq!(list.items().len(), 2);
    }
}
