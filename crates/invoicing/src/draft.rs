//! Named full snapshots of an in-progress invoice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicer_core::{DomainError, DomainResult, Entity, InvoiceId};

use crate::invoice::{InvoiceData, InvoiceStatus};

/// An invoice snapshot saved under a user-given name.
///
/// Serialized flat: the invoice fields plus `draftName` and `lastModified`
/// in one JSON object. The draft shares its id with the invoice it was taken
/// from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    #[serde(flatten)]
    pub invoice: InvoiceData,
    pub draft_name: String,
    pub last_modified: DateTime<Utc>,
}

impl InvoiceDraft {
    /// Snapshot `source` under `name`; the snapshot's status is forced to draft.
    pub fn from_invoice(name: &str, source: &InvoiceData, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("draft name is required"));
        }

        let mut invoice = source.clone();
        invoice.status = InvoiceStatus::Draft;

        Ok(Self {
            invoice,
            draft_name: name.to_string(),
            last_modified: now,
        })
    }

    /// The invoice to make active when this draft is loaded.
    pub fn to_invoice(&self) -> InvoiceData {
        self.invoice.clone()
    }

    pub fn into_invoice(self) -> InvoiceData {
        self.invoice
    }

    /// Client name as shown in draft lists.
    pub fn client_label(&self) -> &str {
        let name = self.invoice.client_details.name.as_str();
        if name.is_empty() {
            "No client specified"
        } else {
            name
        }
    }
}

impl Entity for InvoiceDraft {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.invoice.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 14, 0, 0).unwrap()
    }

    #[test]
    fn draft_forces_status_and_keeps_fields() {
        let mut src = InvoiceData::new_default(test_time());
        src.status = InvoiceStatus::Pending;
        src.notes = "keep me".to_string();

        let later = test_time() + chrono::Duration::hours(2);
        let draft = InvoiceDraft::from_invoice(" March project ", &src, later).unwrap();

        assert_eq!(draft.draft_name, "March project");
        assert_eq!(draft.last_modified, later);
        assert_eq!(draft.invoice.status, InvoiceStatus::Draft);
        assert_eq!(draft.invoice.notes, "keep me");
        assert_eq!(draft.id(), &src.id);
        // The source is untouched.
        assert_eq!(src.status, InvoiceStatus::Pending);
    }

    #[test]
    fn blank_name_is_rejected() {
        let src = InvoiceData::new_default(test_time());
        let err = InvoiceDraft::from_invoice("  ", &src, test_time()).unwrap_err();
        assert_eq!(err, DomainError::validation("draft name is required"));
    }

    #[test]
    fn loading_returns_the_snapshot() {
        let src = InvoiceData::new_default(test_time());
        let draft = InvoiceDraft::from_invoice("d", &src, test_time()).unwrap();
        let loaded = draft.to_invoice();
        assert_eq!(loaded, draft.invoice);
        assert_eq!(draft.client_label(), "No client specified");
    }

    #[test]
    fn serializes_flat() {
        let src = InvoiceData::new_default(test_time());
        let draft = InvoiceDraft::from_invoice("d", &src, test_time()).unwrap();
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["draftName"], "d");
        assert_eq!(json["invoiceNumber"], "001");
        assert_eq!(json["lastModified"], "2024-05-10T14:00:00Z");

        let back: InvoiceDraft = serde_json::from_value(json).unwrap();
        assert_eq!(back, draft);
    }
}
