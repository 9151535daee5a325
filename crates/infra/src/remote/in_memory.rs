use std::sync::RwLock;

use invoicer_core::{Entity, InvoiceId, PublicTemplateId, TemplateId, UserId};
use invoicer_invoicing::{InvoiceDraft, InvoiceTemplate, PublicTemplate};

use super::r#trait::{DraftUpdate, RemoteStore, RemoteStoreError};

#[derive(Debug, Default)]
struct Tables {
    templates: Vec<(UserId, InvoiceTemplate)>,
    drafts: Vec<(UserId, InvoiceDraft)>,
    public_templates: Vec<PublicTemplate>,
}

/// In-memory remote store for tests/dev.
///
/// Mirrors the row semantics of the hosted tables: ids are primary keys,
/// lists are filtered by owner, deletes of absent rows succeed.
#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    tables: RwLock<Tables>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, RemoteStoreError> {
        self.tables
            .read()
            .map_err(|_| RemoteStoreError::Database("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, RemoteStoreError> {
        self.tables
            .write()
            .map_err(|_| RemoteStoreError::Database("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn list_templates(&self, user: &UserId) -> Result<Vec<InvoiceTemplate>, RemoteStoreError> {
        let tables = self.read()?;
        Ok(tables
            .templates
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, t)| t.clone())
            .collect())
    }

    async fn insert_template(
        &self,
        user: &UserId,
        template: &InvoiceTemplate,
    ) -> Result<(), RemoteStoreError> {
        let mut tables = self.write()?;
        if tables.templates.iter().any(|(_, t)| t.id == template.id) {
            return Err(RemoteStoreError::Conflict(format!("template {}", template.id)));
        }
        tables.templates.push((user.clone(), template.clone()));
        Ok(())
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<(), RemoteStoreError> {
        let mut tables = self.write()?;
        tables.templates.retain(|(_, t)| &t.id != id);
        Ok(())
    }

    async fn list_drafts(&self, user: &UserId) -> Result<Vec<InvoiceDraft>, RemoteStoreError> {
        let tables = self.read()?;
        Ok(tables
            .drafts
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn insert_draft(&self, user: &UserId, draft: &InvoiceDraft) -> Result<(), RemoteStoreError> {
        let mut tables = self.write()?;
        if tables.drafts.iter().any(|(_, d)| d.id() == draft.id()) {
            return Err(RemoteStoreError::Conflict(format!("draft {}", draft.id())));
        }
        tables.drafts.push((user.clone(), draft.clone()));
        Ok(())
    }

    async fn update_draft(&self, id: &InvoiceId, update: &DraftUpdate) -> Result<(), RemoteStoreError> {
        let mut tables = self.write()?;
        let (_, draft) = tables
            .drafts
            .iter_mut()
            .find(|(_, d)| d.id() == id)
            .ok_or_else(|| RemoteStoreError::NotFound(format!("draft {id}")))?;
        update.apply_to(draft);
        Ok(())
    }

    async fn delete_draft(&self, id: &InvoiceId) -> Result<(), RemoteStoreError> {
        let mut tables = self.write()?;
        tables.drafts.retain(|(_, d)| d.id() != id);
        Ok(())
    }

    async fn list_public_templates(&self) -> Result<Vec<PublicTemplate>, RemoteStoreError> {
        let tables = self.read()?;
        let mut out = tables.public_templates.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn insert_public_template(&self, template: &PublicTemplate) -> Result<(), RemoteStoreError> {
        let mut tables = self.write()?;
        if tables.public_templates.iter().any(|p| p.id == template.id) {
            return Err(RemoteStoreError::Conflict(format!("public template {}", template.id)));
        }
        tables.public_templates.push(template.clone());
        Ok(())
    }

    async fn set_public_template_active(
        &self,
        id: &PublicTemplateId,
        active: bool,
    ) -> Result<(), RemoteStoreError> {
        let mut tables = self.write()?;
        let template = tables
            .public_templates
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RemoteStoreError::NotFound(format!("public template {id}")))?;
        template.is_active = active;
        Ok(())
    }
}
