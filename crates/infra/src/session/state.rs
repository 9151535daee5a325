use chrono::{DateTime, Utc};

use invoicer_core::{DomainError, DomainResult, InvoiceId, ItemId, TemplateId};
use invoicer_invoicing::{
    InvoiceData, InvoiceTemplate, ItemPatch, Ledger, PrintView, Totals, apply_template, load_draft,
};

/// The ledger plus the invoice currently being edited.
///
/// The current invoice is a working copy: it only reaches the ledger through
/// an explicit save. Every edit is validated on a copy first, so a rejected
/// edit leaves the current invoice as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    ledger: Ledger,
    current: InvoiceData,
}

impl SessionState {
    /// Start with `ledger` and a blank invoice.
    pub fn new(ledger: Ledger, now: DateTime<Utc>) -> Self {
        Self {
            ledger,
            current: InvoiceData::new_default(now),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn current(&self) -> &InvoiceData {
        &self.current
    }

    pub(crate) fn set_current(&mut self, invoice: InvoiceData) {
        self.current = invoice;
    }

    /// Apply `edit` to the current invoice if the result validates.
    pub fn edit_current<F>(&mut self, edit: F) -> DomainResult<()>
    where
        F: FnOnce(&mut InvoiceData),
    {
        let mut next = self.current.clone();
        edit(&mut next);
        next.validate()?;
        self.current = next;
        Ok(())
    }

    /// Replace the current invoice with a blank one.
    pub fn new_invoice(&mut self, now: DateTime<Utc>) {
        self.current = InvoiceData::new_default(now);
    }

    /// Make a saved invoice current.
    pub fn select_invoice(&mut self, id: &InvoiceId) -> DomainResult<()> {
        let invoice = self
            .ledger
            .invoices
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))?;
        self.current = invoice.clone();
        Ok(())
    }

    pub fn add_item(&mut self) -> ItemId {
        self.current.add_item()
    }

    pub fn remove_item(&mut self, id: &ItemId) -> bool {
        self.current.remove_item(id)
    }

    pub fn update_item(&mut self, id: &ItemId, patch: &ItemPatch) -> DomainResult<()> {
        self.current.update_item(id, patch)
    }

    /// Apply a template from the ledger to the current invoice.
    pub fn apply_template(&mut self, id: &TemplateId) -> DomainResult<()> {
        let template = self
            .ledger
            .templates
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("template {id}")))?;
        self.current = apply_template(&self.current, template);
        Ok(())
    }

    /// Apply a template that does not live in the ledger (e.g. a public one).
    pub fn apply(&mut self, template: &InvoiceTemplate) {
        self.current = apply_template(&self.current, template);
    }

    /// Make a saved draft the current invoice.
    pub fn load_draft(&mut self, id: &InvoiceId) -> DomainResult<()> {
        let draft = self
            .ledger
            .drafts
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("draft {id}")))?;
        self.current = load_draft(draft);
        Ok(())
    }

    pub fn totals(&self) -> Totals {
        self.current.totals()
    }

    pub fn print_view(&self) -> PrintView {
        PrintView::from_invoice(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::TimeZone;

    use super::*;
    use invoicer_invoicing::{InvoiceItem, TemplateField};

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn starts_with_blank_invoice() {
        let state = SessionState::new(Ledger::new(), test_time());
        assert_eq!(state.current().invoice_number, "001");
        assert_eq!(state.current().items.len(), 1);
        assert_eq!(state.totals(), Totals::default());
    }

    #[test]
    fn rejected_edit_leaves_current_unchanged() {
        let mut state = SessionState::new(Ledger::new(), test_time());
        let before = state.current().clone();

        let err = state
            .edit_current(|inv| inv.items.push(InvoiceItem::new("bad", f64::NAN, 1.0)))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(state.current(), &before);

        state
            .edit_current(|inv| inv.notes = "ok".to_string())
            .unwrap();
        assert_eq!(state.current().notes, "ok");
    }

    #[test]
    fn select_missing_invoice_is_not_found() {
        let mut state = SessionState::new(Ledger::new(), test_time());
        let err = state.select_invoice(&"nope".parse().unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn item_edits_flow_into_totals() {
        let mut state = SessionState::new(Ledger::new(), test_time());
        let first = state.current().items[0].id.clone();
        state
            .update_item(
                &first,
                &ItemPatch {
                    quantity: Some(2.0),
                    price: Some(50.0),
                    ..ItemPatch::default()
                },
            )
            .unwrap();
        let second = state.add_item();
        state
            .update_item(
                &second,
                &ItemPatch {
                    price: Some(25.0),
                    ..ItemPatch::default()
                },
            )
            .unwrap();

        let totals = state.totals();
        assert_eq!(totals.subtotal, 125.0);
        assert_eq!(totals.total, 137.5);
        assert_eq!(state.print_view().total, "USD 137.50");

        assert!(state.remove_item(&second));
        assert_eq!(state.totals().subtotal, 100.0);
    }

    #[test]
    fn apply_template_by_id() {
        let mut ledger = Ledger::new();
        let mut source = InvoiceData::new_default(test_time());
        source.notes = "from template".to_string();
        let fields: BTreeSet<_> = [TemplateField::Notes].into_iter().collect();
        let template = ledger
            .save_template("notes", "", &fields, &source, test_time())
            .unwrap();

        let mut state = SessionState::new(ledger, test_time());
        state.apply_template(&template.id).unwrap();
        assert_eq!(state.current().notes, "from template");

        let missing = state.apply_template(&"missing".parse().unwrap());
        assert!(matches!(missing, Err(DomainError::NotFound(_))));
    }
}
