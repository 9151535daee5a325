//! Session whose templates and drafts live on a `RemoteStore`.
//!
//! Every mutation calls the store and, on success, re-fetches the affected
//! collection for the user. Store failures are logged and swallowed: the
//! in-memory collections stay as last fetched. Invoices are kept in the
//! session only.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use invoicer_core::{DomainError, DomainResult, Entity, InvoiceId, PublicTemplateId, TemplateId};
use invoicer_invoicing::{
    Collection, InvoiceData, InvoiceDraft, InvoiceTemplate, PrintView, PublicTemplate,
    TemplateField, Totals, User,
};

use super::confirm::{
    ConfirmDelete, DELETE_DRAFT_PROMPT, DELETE_INVOICE_PROMPT, DELETE_TEMPLATE_PROMPT,
};
use super::state::SessionState;
use crate::remote::{DraftUpdate, RemoteStore, RemoteStoreError};

pub struct RemoteSession<R: RemoteStore> {
    store: R,
    user: User,
    state: SessionState,
    public_templates: Vec<PublicTemplate>,
}

impl<R: RemoteStore> RemoteSession<R> {
    /// Fetch the user's templates and drafts and start with a blank invoice.
    ///
    /// A failed fetch leaves that collection empty.
    pub async fn open(store: R, user: User, now: DateTime<Utc>) -> Self {
        let mut session = Self {
            store,
            user,
            state: SessionState::new(Default::default(), now),
            public_templates: Vec::new(),
        };
        session.refresh().await;
        session
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Pure edits of the current invoice (items, fields, template application).
    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn current(&self) -> &InvoiceData {
        self.state.current()
    }

    pub fn templates(&self) -> &[InvoiceTemplate] {
        self.state.ledger().templates.as_slice()
    }

    pub fn drafts(&self) -> &[InvoiceDraft] {
        self.state.ledger().drafts.as_slice()
    }

    /// Public templates as last fetched, newest first.
    pub fn public_templates(&self) -> &[PublicTemplate] {
        &self.public_templates
    }

    /// Re-fetch templates and drafts. Failures are logged.
    pub async fn refresh(&mut self) {
        self.reload_templates().await;
        self.reload_drafts().await;
    }

    async fn reload_templates(&mut self) {
        match self.store.list_templates(&self.user.id).await {
            Ok(templates) => {
                tracing::debug!(count = templates.len(), "fetched templates");
                self.state.ledger_mut().templates = Collection::from_entries(templates);
            }
            Err(error) => log_store_error("list templates", &error),
        }
    }

    async fn reload_drafts(&mut self) {
        match self.store.list_drafts(&self.user.id).await {
            Ok(drafts) => {
                tracing::debug!(count = drafts.len(), "fetched drafts");
                self.state.ledger_mut().drafts = Collection::from_entries(drafts);
            }
            Err(error) => log_store_error("list drafts", &error),
        }
    }

    /// Save the current invoice into the session's invoice list.
    pub fn save_current(&mut self) {
        let invoice = self.state.current().clone();
        self.state.ledger_mut().save_invoice(invoice);
    }

    /// Append a copy of the current invoice and make the copy current.
    pub fn duplicate_current(&mut self, now: DateTime<Utc>) -> DomainResult<InvoiceId> {
        let copy = self.state.current().duplicate(now);
        let id = copy.id.clone();
        self.state.ledger_mut().add_invoice(copy.clone())?;
        self.state.set_current(copy);
        Ok(id)
    }

    /// Delete the current invoice from the session and start over with a
    /// blank one. Returns `false` if the deletion was not confirmed.
    pub fn delete_current(&mut self, confirm: impl ConfirmDelete, now: DateTime<Utc>) -> bool {
        let id = self.state.current().id.clone();
        if !confirm.confirm(DELETE_INVOICE_PROMPT) {
            tracing::warn!(invoice_id = %id, "invoice deletion not confirmed");
            return false;
        }
        self.state.ledger_mut().delete_invoice(&id);
        self.state.new_invoice(now);
        true
    }

    /// Save the selected fields of the current invoice as a template.
    ///
    /// Validation errors are returned before the store is called. The
    /// returned template is the one sent to the store, whether or not the
    /// insert succeeded.
    pub async fn save_template(
        &mut self,
        name: &str,
        description: &str,
        fields: &BTreeSet<TemplateField>,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceTemplate> {
        let template =
            InvoiceTemplate::from_invoice(name, description, fields, self.state.current(), now)?;

        match self.store.insert_template(&self.user.id, &template).await {
            Ok(()) => {
                tracing::info!(template_id = %template.id, name = %template.name, "saved template");
                self.reload_templates().await;
            }
            Err(error) => log_store_error("save template", &error),
        }
        Ok(template)
    }

    pub async fn delete_template(&mut self, id: &TemplateId, confirm: impl ConfirmDelete) -> bool {
        if !confirm.confirm(DELETE_TEMPLATE_PROMPT) {
            tracing::warn!(template_id = %id, "template deletion not confirmed");
            return false;
        }
        match self.store.delete_template(id).await {
            Ok(()) => {
                tracing::info!(template_id = %id, "deleted template");
                self.reload_templates().await;
            }
            Err(error) => log_store_error("delete template", &error),
        }
        true
    }

    pub fn apply_template(&mut self, id: &TemplateId) -> DomainResult<()> {
        self.state.apply_template(id)
    }

    /// Snapshot the current invoice as a named draft.
    ///
    /// A draft of the same invoice already on the store is updated in place;
    /// otherwise a new row is inserted.
    pub async fn save_draft(&mut self, name: &str, now: DateTime<Utc>) -> DomainResult<InvoiceDraft> {
        let draft = InvoiceDraft::from_invoice(name, self.state.current(), now)?;

        let result = if self.state.ledger().drafts.contains(draft.id()) {
            let update = DraftUpdate {
                draft_name: Some(draft.draft_name.clone()),
                invoice: Some(draft.invoice.clone()),
                last_modified: Some(draft.last_modified),
            };
            self.store.update_draft(draft.id(), &update).await
        } else {
            self.store.insert_draft(&self.user.id, &draft).await
        };

        match result {
            Ok(()) => {
                tracing::info!(draft_id = %draft.id(), name = %draft.draft_name, "saved draft");
                self.reload_drafts().await;
            }
            Err(error) => log_store_error("save draft", &error),
        }
        Ok(draft)
    }

    /// Rename a stored draft; its snapshot is left as it was.
    pub async fn rename_draft(
        &mut self,
        id: &InvoiceId,
        name: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("draft name is required"));
        }
        if !self.state.ledger().drafts.contains(id) {
            return Err(DomainError::not_found(format!("draft {id}")));
        }

        let update = DraftUpdate {
            draft_name: Some(name.to_string()),
            last_modified: Some(now),
            ..DraftUpdate::default()
        };
        match self.store.update_draft(id, &update).await {
            Ok(()) => {
                tracing::info!(draft_id = %id, name, "renamed draft");
                self.reload_drafts().await;
            }
            Err(error) => log_store_error("rename draft", &error),
        }
        Ok(())
    }

    pub async fn delete_draft(&mut self, id: &InvoiceId, confirm: impl ConfirmDelete) -> bool {
        if !confirm.confirm(DELETE_DRAFT_PROMPT) {
            tracing::warn!(draft_id = %id, "draft deletion not confirmed");
            return false;
        }
        match self.store.delete_draft(id).await {
            Ok(()) => {
                tracing::info!(draft_id = %id, "deleted draft");
                self.reload_drafts().await;
            }
            Err(error) => log_store_error("delete draft", &error),
        }
        true
    }

    pub fn load_draft(&mut self, id: &InvoiceId) -> DomainResult<()> {
        self.state.load_draft(id)
    }

    /// Fetch the public templates, newest first. Failures are logged.
    pub async fn load_public_templates(&mut self) {
        match self.store.list_public_templates().await {
            Ok(templates) => {
                tracing::debug!(count = templates.len(), "fetched public templates");
                self.public_templates = templates;
            }
            Err(error) => log_store_error("list public templates", &error),
        }
    }

    /// Publish one of the user's templates. It starts inactive until an
    /// administrator activates it.
    pub async fn publish_template(
        &mut self,
        id: &TemplateId,
        now: DateTime<Utc>,
    ) -> DomainResult<PublicTemplate> {
        let template = self
            .state
            .ledger()
            .templates
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("template {id}")))?;
        let public = PublicTemplate::publish(template, &self.user, now);

        match self.store.insert_public_template(&public).await {
            Ok(()) => {
                tracing::info!(public_template_id = %public.id, template_id = %id, "published template");
                self.load_public_templates().await;
            }
            Err(error) => log_store_error("publish template", &error),
        }
        Ok(public)
    }

    /// Activate or deactivate a public template. Administrators only.
    pub async fn set_public_template_active(
        &mut self,
        id: &PublicTemplateId,
        active: bool,
    ) -> DomainResult<()> {
        self.user.require_admin()?;

        match self.store.set_public_template_active(id, active).await {
            Ok(()) => {
                tracing::info!(public_template_id = %id, active, "changed public template status");
                self.load_public_templates().await;
            }
            Err(error) => log_store_error("change public template status", &error),
        }
        Ok(())
    }

    /// Apply a fetched public template to the current invoice.
    ///
    /// Inactive templates can only be applied by administrators.
    pub fn apply_public_template(&mut self, id: &PublicTemplateId) -> DomainResult<()> {
        let public = self
            .public_templates
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("public template {id}")))?;
        if !public.is_active {
            self.user.require_admin()?;
        }
        self.state.apply(&public.data);
        Ok(())
    }

    pub fn totals(&self) -> Totals {
        self.state.totals()
    }

    pub fn print_view(&self) -> PrintView {
        self.state.print_view()
    }
}

fn log_store_error(operation: &str, error: &RemoteStoreError) {
    tracing::error!(operation, %error, "remote store call failed");
}
