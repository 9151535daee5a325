//! Session persisted through a synchronous `StorageBackend`.
//!
//! The three collections are loaded once when the session opens. Every ledger
//! mutation updates memory first and then rewrites the affected collection in
//! full. A failed write is logged and the in-memory change is kept, so memory
//! and storage can drift until the next successful write of that collection.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use invoicer_core::{DomainResult, Entity, InvoiceId, ItemId, TemplateId};
use invoicer_invoicing::{
    InvoiceData, InvoiceDraft, InvoiceTemplate, ItemPatch, Ledger, PrintView, TemplateField, Totals,
};

use super::confirm::{
    ConfirmDelete, DELETE_DRAFT_PROMPT, DELETE_INVOICE_PROMPT, DELETE_TEMPLATE_PROMPT,
};
use super::state::SessionState;
use crate::storage::{StorageBackend, StorageError, StorageKey, load_ledger, save_collection};

pub struct LocalSession<S: StorageBackend> {
    storage: S,
    state: SessionState,
}

impl<S: StorageBackend> LocalSession<S> {
    /// Load the ledger from `storage` and start with a blank current invoice.
    pub fn open(storage: S, now: DateTime<Utc>) -> Result<Self, StorageError> {
        let ledger = load_ledger(&storage)?;
        Ok(Self {
            storage,
            state: SessionState::new(ledger, now),
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        self.state.ledger()
    }

    pub fn current(&self) -> &InvoiceData {
        self.state.current()
    }

    pub fn edit_current<F>(&mut self, edit: F) -> DomainResult<()>
    where
        F: FnOnce(&mut InvoiceData),
    {
        self.state.edit_current(edit)
    }

    pub fn new_invoice(&mut self, now: DateTime<Utc>) {
        self.state.new_invoice(now);
    }

    pub fn select_invoice(&mut self, id: &InvoiceId) -> DomainResult<()> {
        self.state.select_invoice(id)
    }

    pub fn add_item(&mut self) -> ItemId {
        self.state.add_item()
    }

    pub fn remove_item(&mut self, id: &ItemId) -> bool {
        self.state.remove_item(id)
    }

    pub fn update_item(&mut self, id: &ItemId, patch: &ItemPatch) -> DomainResult<()> {
        self.state.update_item(id, patch)
    }

    /// Save the current invoice into the ledger (replace by id or append).
    pub fn save_current(&mut self) {
        let invoice = self.state.current().clone();
        tracing::info!(invoice_id = %invoice.id, "saving invoice");
        self.state.ledger_mut().save_invoice(invoice);
        self.persist(StorageKey::Invoices);
    }

    /// Append a copy of the current invoice and make the copy current.
    pub fn duplicate_current(&mut self, now: DateTime<Utc>) -> DomainResult<InvoiceId> {
        let copy = self.state.current().duplicate(now);
        let id = copy.id.clone();
        self.state.ledger_mut().add_invoice(copy.clone())?;
        self.state.set_current(copy);
        tracing::info!(invoice_id = %id, "duplicated invoice");
        self.persist(StorageKey::Invoices);
        Ok(id)
    }

    /// Delete the current invoice and start over with a blank one.
    ///
    /// Returns `false` if the deletion was not confirmed.
    pub fn delete_current(&mut self, confirm: impl ConfirmDelete, now: DateTime<Utc>) -> bool {
        let id = self.state.current().id.clone();
        if !self.delete_invoice(&id, confirm) {
            return false;
        }
        self.state.new_invoice(now);
        true
    }

    /// Delete a saved invoice. An absent id is a no-op that still counts as
    /// confirmed.
    pub fn delete_invoice(&mut self, id: &InvoiceId, confirm: impl ConfirmDelete) -> bool {
        if !confirm.confirm(DELETE_INVOICE_PROMPT) {
            tracing::warn!(invoice_id = %id, "invoice deletion not confirmed");
            return false;
        }
        if self.state.ledger_mut().delete_invoice(id).is_some() {
            tracing::info!(invoice_id = %id, "deleted invoice");
            self.persist(StorageKey::Invoices);
        }
        true
    }

    /// Save the selected fields of the current invoice as a template.
    pub fn save_template(
        &mut self,
        name: &str,
        description: &str,
        fields: &BTreeSet<TemplateField>,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceTemplate> {
        let source = self.state.current().clone();
        let template = self
            .state
            .ledger_mut()
            .save_template(name, description, fields, &source, now)?;
        tracing::info!(template_id = %template.id, name = %template.name, "saved template");
        self.persist(StorageKey::Templates);
        Ok(template)
    }

    pub fn delete_template(&mut self, id: &TemplateId, confirm: impl ConfirmDelete) -> bool {
        if !confirm.confirm(DELETE_TEMPLATE_PROMPT) {
            tracing::warn!(template_id = %id, "template deletion not confirmed");
            return false;
        }
        if self.state.ledger_mut().delete_template(id).is_some() {
            tracing::info!(template_id = %id, "deleted template");
            self.persist(StorageKey::Templates);
        }
        true
    }

    pub fn apply_template(&mut self, id: &TemplateId) -> DomainResult<()> {
        self.state.apply_template(id)
    }

    /// Snapshot the current invoice as a named draft.
    pub fn save_draft(&mut self, name: &str, now: DateTime<Utc>) -> DomainResult<InvoiceDraft> {
        let source = self.state.current().clone();
        let draft = self.state.ledger_mut().save_draft(name, &source, now)?;
        tracing::info!(draft_id = %draft.id(), name = %draft.draft_name, "saved draft");
        self.persist(StorageKey::Drafts);
        Ok(draft)
    }

    pub fn delete_draft(&mut self, id: &InvoiceId, confirm: impl ConfirmDelete) -> bool {
        if !confirm.confirm(DELETE_DRAFT_PROMPT) {
            tracing::warn!(draft_id = %id, "draft deletion not confirmed");
            return false;
        }
        if self.state.ledger_mut().delete_draft(id).is_some() {
            tracing::info!(draft_id = %id, "deleted draft");
            self.persist(StorageKey::Drafts);
        }
        true
    }

    pub fn load_draft(&mut self, id: &InvoiceId) -> DomainResult<()> {
        self.state.load_draft(id)
    }

    pub fn totals(&self) -> Totals {
        self.state.totals()
    }

    pub fn print_view(&self) -> PrintView {
        self.state.print_view()
    }

    /// Rewrite one collection. Failures are logged, never returned.
    fn persist(&self, key: StorageKey) {
        let ledger = self.state.ledger();
        let result = match key {
            StorageKey::Invoices => save_collection(&self.storage, key, ledger.invoices.as_slice()),
            StorageKey::Templates => {
                save_collection(&self.storage, key, ledger.templates.as_slice())
            }
            StorageKey::Drafts => save_collection(&self.storage, key, ledger.drafts.as_slice()),
        };

        match result {
            Ok(()) => tracing::debug!(%key, "persisted collection"),
            Err(error) => tracing::error!(%key, %error, "failed to persist collection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use super::*;
    use crate::storage::{InMemoryStorage, load_collection};
    use invoicer_invoicing::{InvoiceItem, InvoiceStatus};

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 8, 30, 0).unwrap()
    }

    fn open_empty() -> LocalSession<Arc<InMemoryStorage>> {
        LocalSession::open(Arc::new(InMemoryStorage::new()), test_time()).unwrap()
    }

    /// Backend whose writes always fail.
    #[derive(Default)]
    struct FailingStorage {
        attempts: AtomicUsize,
    }

    impl StorageBackend for FailingStorage {
        fn load(&self, _key: StorageKey) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn save(&self, _key: StorageKey, _blob: &str) -> Result<(), StorageError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Backend("quota exceeded".to_string()))
        }
    }

    #[test]
    fn save_current_persists_invoices() {
        let mut session = open_empty();
        session
            .edit_current(|inv| inv.items = vec![InvoiceItem::new("Work", 2.0, 50.0)])
            .unwrap();
        session.save_current();
        session.save_current();

        let stored: Vec<InvoiceData> =
            load_collection(session.storage(), StorageKey::Invoices).unwrap();
        assert_eq!(stored, vec![session.current().clone()]);
    }

    #[test]
    fn reopening_restores_the_ledger() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut session = LocalSession::open(storage.clone(), test_time()).unwrap();
        session.save_current();
        let fields: BTreeSet<_> = [TemplateField::CompanyDetails].into_iter().collect();
        session
            .save_template("company", "", &fields, test_time())
            .unwrap();
        session.save_draft("wip", test_time()).unwrap();

        let reopened = LocalSession::open(storage, test_time()).unwrap();
        assert_eq!(reopened.ledger(), session.ledger());
    }

    #[test]
    fn duplicate_appends_copy_and_makes_it_current() {
        let mut session = open_empty();
        session.edit_current(|inv| inv.status = InvoiceStatus::Paid).unwrap();
        session.save_current();
        let original = session.current().id.clone();

        let copy = session.duplicate_current(test_time()).unwrap();
        assert_ne!(copy, original);
        assert_eq!(session.current().id, copy);
        assert_eq!(session.current().invoice_number, "001-copy");
        assert_eq!(session.current().status, InvoiceStatus::Draft);
        assert_eq!(session.ledger().invoices.len(), 2);
    }

    #[test]
    fn unconfirmed_delete_changes_nothing() {
        let mut session = open_empty();
        session.save_current();
        let before = session.ledger().clone();
        let current = session.current().id.clone();

        assert!(!session.delete_current(false, test_time()));
        assert_eq!(session.ledger(), &before);
        assert_eq!(session.current().id, current);
    }

    #[test]
    fn delete_current_resets_to_blank() {
        let mut session = open_empty();
        session.save_current();
        let deleted = session.current().id.clone();

        assert!(session.delete_current(|_: &str| true, test_time()));
        assert!(session.ledger().invoices.is_empty());
        assert_ne!(session.current().id, deleted);

        let stored: Vec<InvoiceData> =
            load_collection(session.storage(), StorageKey::Invoices).unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn template_and_draft_round_trip_through_the_session() {
        let mut session = open_empty();
        session
            .edit_current(|inv| {
                inv.tax_rate = 20.0;
                inv.notes = "Thanks".to_string();
            })
            .unwrap();
        let fields: BTreeSet<_> = [TemplateField::TaxRate, TemplateField::Notes]
            .into_iter()
            .collect();
        let template = session
            .save_template("standard", "tax and notes", &fields, test_time())
            .unwrap();
        let draft = session.save_draft("before reset", test_time()).unwrap();

        session.new_invoice(test_time());
        assert_eq!(session.current().tax_rate, 10.0);
        session.apply_template(&template.id).unwrap();
        assert_eq!(session.current().tax_rate, 20.0);
        assert_eq!(session.current().notes, "Thanks");

        session.load_draft(draft.id()).unwrap();
        assert_eq!(session.current(), &draft.invoice);

        assert!(session.delete_template(&template.id, true));
        assert!(session.delete_draft(draft.id(), true));
        assert!(session.ledger().templates.is_empty());
        assert!(session.ledger().drafts.is_empty());
    }

    #[test]
    fn invalid_template_does_not_write() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut session = LocalSession::open(storage.clone(), test_time()).unwrap();
        assert!(
            session
                .save_template(" ", "", &BTreeSet::new(), test_time())
                .is_err()
        );
        assert!(storage.raw(StorageKey::Templates).is_none());
    }

    #[test]
    fn write_failures_keep_the_in_memory_change() {
        let storage = Arc::new(FailingStorage::default());
        let mut session = LocalSession::open(storage.clone(), test_time()).unwrap();

        session.save_current();
        session.save_draft("d", test_time()).unwrap();

        assert_eq!(session.ledger().invoices.len(), 1);
        assert_eq!(session.ledger().drafts.len(), 1);
        assert_eq!(storage.attempts.load(Ordering::SeqCst), 2);
    }
}
