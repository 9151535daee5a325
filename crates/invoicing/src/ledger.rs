//! In-memory ledger: saved invoices, templates and drafts of one session.
//!
//! Pure state only. Persisting the collections after a mutation is the
//! caller's job (see the session types in the infra crate).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicer_core::{DomainError, DomainResult, Entity, InvoiceId, TemplateId};

use crate::draft::InvoiceDraft;
use crate::invoice::InvoiceData;
use crate::template::{InvoiceTemplate, TemplateField};

/// Ordered collection of records with ids unique within the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    entries: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded entries. Later duplicates of an id are dropped.
    pub fn from_entries(entries: Vec<T>) -> Self {
        let mut out = Self::new();
        for e in entries {
            if !out.contains(e.id()) {
                out.entries.push(e);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.get(id).is_some()
    }

    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Append; an entry with the same id already present is a conflict.
    pub fn insert(&mut self, entry: T) -> DomainResult<()> {
        if self.contains(entry.id()) {
            return Err(DomainError::conflict(format!(
                "an entry with id {:?} already exists",
                entry.id()
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Replace the entry with the same id in place, or append.
    pub fn upsert(&mut self, entry: T) {
        match self.entries.iter_mut().find(|e| e.same_identity(&entry)) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove by id. An absent id is not an error; the return value says
    /// whether anything was removed.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let idx = self.position(id)?;
        Some(self.entries.remove(idx))
    }

    pub fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The session's saved invoices, templates and drafts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub invoices: Collection<InvoiceData>,
    pub templates: Collection<InvoiceTemplate>,
    pub drafts: Collection<InvoiceDraft>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        invoices: Vec<InvoiceData>,
        templates: Vec<InvoiceTemplate>,
        drafts: Vec<InvoiceDraft>,
    ) -> Self {
        Self {
            invoices: Collection::from_entries(invoices),
            templates: Collection::from_entries(templates),
            drafts: Collection::from_entries(drafts),
        }
    }

    pub fn add_invoice(&mut self, invoice: InvoiceData) -> DomainResult<()> {
        self.invoices.insert(invoice)
    }

    /// Replace by id (keeping position) or append. Idempotent.
    pub fn save_invoice(&mut self, invoice: InvoiceData) {
        self.invoices.upsert(invoice);
    }

    pub fn delete_invoice(&mut self, id: &InvoiceId) -> Option<InvoiceData> {
        self.invoices.remove(id)
    }

    /// Build a template from `source` and append it to the templates.
    pub fn save_template(
        &mut self,
        name: &str,
        description: &str,
        fields: &BTreeSet<TemplateField>,
        source: &InvoiceData,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceTemplate> {
        let template = InvoiceTemplate::from_invoice(name, description, fields, source, now)?;
        self.templates.insert(template.clone())?;
        Ok(template)
    }

    pub fn delete_template(&mut self, id: &TemplateId) -> Option<InvoiceTemplate> {
        self.templates.remove(id)
    }

    /// Snapshot `source` as a draft. A draft of the same invoice is replaced.
    pub fn save_draft(
        &mut self,
        name: &str,
        source: &InvoiceData,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceDraft> {
        let draft = InvoiceDraft::from_invoice(name, source, now)?;
        self.drafts.upsert(draft.clone());
        Ok(draft)
    }

    pub fn delete_draft(&mut self, id: &InvoiceId) -> Option<InvoiceDraft> {
        self.drafts.remove(id)
    }
}

/// Apply `template` to a copy of `invoice`.
pub fn apply_template(invoice: &InvoiceData, template: &InvoiceTemplate) -> InvoiceData {
    template.apply_to(invoice)
}

/// The invoice to make active when `draft` is loaded.
pub fn load_draft(draft: &InvoiceDraft) -> InvoiceData {
    draft.to_invoice()
}
