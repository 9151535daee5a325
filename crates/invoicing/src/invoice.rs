use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicer_core::{DomainError, DomainResult, Entity, InvoiceId, ItemId};

use crate::totals::Totals;

/// Currencies offered by the invoice form.
pub const CURRENCIES: [&str; 6] = ["USD", "EUR", "GBP", "CAD", "AUD", "JPY"];

/// Payment terms offered by the invoice form.
pub const PAYMENT_TERMS: [&str; 4] = ["Net 30", "Net 15", "Due on Receipt", "Net 60"];

/// Suffix appended to the invoice number of a duplicated invoice.
pub const COPY_SUFFIX: &str = "-copy";

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [Self::Draft, Self::Pending, Self::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Capitalized label used by list and print views.
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(DomainError::validation(format!("unknown invoice status '{other}'"))),
        }
    }
}

/// A single billable line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: ItemId,
    pub description: String,
    pub quantity: f64,
    pub price: f64,
}

impl InvoiceItem {
    /// A blank line (quantity 1, price 0) as offered by "add item".
    pub fn blank() -> Self {
        Self {
            id: ItemId::generate(),
            description: String::new(),
            quantity: 1.0,
            price: 0.0,
        }
    }

    pub fn new(description: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            id: ItemId::generate(),
            description: description.into(),
            quantity,
            price,
        }
    }

    /// `quantity × price`, unrounded.
    pub fn amount(&self) -> f64 {
        self.quantity * self.price
    }

    /// Quantity and price must be finite numbers. Negative values are accepted.
    pub fn validate(&self) -> DomainResult<()> {
        if !self.quantity.is_finite() {
            return Err(DomainError::validation(format!(
                "item {}: quantity must be a finite number",
                self.id
            )));
        }
        if !self.price.is_finite() {
            return Err(DomainError::validation(format!(
                "item {}: price must be a finite number",
                self.id
            )));
        }
        Ok(())
    }
}

/// Partial update of a line item; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
}

impl ItemPatch {
    fn apply_to(&self, item: &mut InvoiceItem) {
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
    }
}

/// Issuer block printed in the invoice header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    /// Logo reference (URL or data URI), passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// "Bill to" block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub name: String,
    pub address: String,
    pub email: String,
}

/// The invoice being edited, saved, duplicated or printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub id: InvoiceId,
    /// Display label; not required to be unique.
    pub invoice_number: String,
    pub date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub company_details: CompanyDetails,
    pub client_details: ClientDetails,
    /// Display order.
    pub items: Vec<InvoiceItem>,
    pub notes: String,
    /// Percentage, e.g. `10.0` for 10%.
    pub tax_rate: f64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub payment_terms: String,
}

impl InvoiceData {
    /// A fresh invoice pre-filled with the form's default values.
    pub fn new_default(now: DateTime<Utc>) -> Self {
        Self {
            id: InvoiceId::generate(),
            invoice_number: "001".to_string(),
            date: now,
            due_date: now,
            company_details: CompanyDetails {
                name: "Your Company Name".to_string(),
                address: "123 Business Street\nCity, State 12345".to_string(),
                email: "contact@company.com".to_string(),
                phone: "(555) 555-5555".to_string(),
                logo: None,
            },
            client_details: ClientDetails::default(),
            items: vec![InvoiceItem::blank()],
            notes: String::new(),
            tax_rate: 10.0,
            currency: "USD".to_string(),
            status: InvoiceStatus::Draft,
            payment_terms: "Net 30".to_string(),
        }
    }

    /// Copy under a new id: number suffixed with `-copy`, date reset to `now`,
    /// status reset to draft. Everything else is copied verbatim.
    pub fn duplicate(&self, now: DateTime<Utc>) -> Self {
        Self {
            id: InvoiceId::generate(),
            invoice_number: format!("{}{}", self.invoice_number, COPY_SUFFIX),
            date: now,
            status: InvoiceStatus::Draft,
            ..self.clone()
        }
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(&self.items, self.tax_rate)
    }

    pub fn item(&self, id: &ItemId) -> Option<&InvoiceItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Append a blank line and return its id.
    pub fn add_item(&mut self) -> ItemId {
        let item = InvoiceItem::blank();
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    /// Remove a line by id. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        self.items.len() != before
    }

    /// Apply a partial update to one line.
    ///
    /// The patched item is validated before it replaces the stored one, so a
    /// rejected patch leaves the invoice unchanged.
    pub fn update_item(&mut self, id: &ItemId, patch: &ItemPatch) -> DomainResult<()> {
        let slot = self
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))?;

        let mut updated = slot.clone();
        patch.apply_to(&mut updated);
        updated.validate()?;
        *slot = updated;
        Ok(())
    }

    /// Check every line item.
    pub fn validate(&self) -> DomainResult<()> {
        if !self.tax_rate.is_finite() {
            return Err(DomainError::validation("tax rate must be a finite number"));
        }
        self.items.iter().try_for_each(InvoiceItem::validate)
    }
}

impl Entity for InvoiceData {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn default_invoice_matches_blank_form() {
        let inv = InvoiceData::new_default(test_time());
        assert_eq!(inv.invoice_number, "001");
        assert_eq!(inv.status, InvoiceStatus::Draft);
        assert_eq!(inv.tax_rate, 10.0);
        assert_eq!(inv.currency, "USD");
        assert_eq!(inv.payment_terms, "Net 30");
        assert_eq!(inv.items.len(), 1);
        assert_eq!(inv.items[0].quantity, 1.0);
        assert_eq!(inv.items[0].price, 0.0);
        assert_eq!(inv.date, test_time());
        assert_eq!(inv.due_date, test_time());
    }

    #[test]
    fn duplicate_resets_identity_number_date_and_status() {
        let mut inv = InvoiceData::new_default(test_time());
        inv.invoice_number = "INV-7".to_string();
        inv.status = InvoiceStatus::Paid;
        inv.notes = "thanks".to_string();

        let later = test_time() + chrono::Duration::days(3);
        let copy = inv.duplicate(later);

        assert_ne!(copy.id, inv.id);
        assert_eq!(copy.invoice_number, "INV-7-copy");
        assert_eq!(copy.date, later);
        assert_eq!(copy.status, InvoiceStatus::Draft);
        assert_eq!(copy.due_date, inv.due_date);
        assert_eq!(copy.items, inv.items);
        assert_eq!(copy.notes, "thanks");
    }

    #[test]
    fn item_editing_round() {
        let mut inv = InvoiceData::new_default(test_time());
        let id = inv.add_item();
        assert_eq!(inv.items.len(), 2);

        inv.update_item(
            &id,
            &ItemPatch {
                description: Some("Design work".to_string()),
                quantity: Some(3.0),
                price: None,
            },
        )
        .unwrap();
        let item = inv.item(&id).unwrap();
        assert_eq!(item.description, "Design work");
        assert_eq!(item.quantity, 3.0);
        assert_eq!(item.price, 0.0);

        assert!(inv.remove_item(&id));
        assert!(!inv.remove_item(&id));
        assert_eq!(inv.items.len(), 1);
    }

    #[test]
    fn update_item_rejects_non_finite_and_keeps_old_value() {
        let mut inv = InvoiceData::new_default(test_time());
        let id = inv.items[0].id.clone();
        let err = inv
            .update_item(
                &id,
                &ItemPatch {
                    price: Some(f64::NAN),
                    ..ItemPatch::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(inv.items[0].price, 0.0);
    }

    #[test]
    fn update_unknown_item_is_not_found() {
        let mut inv = InvoiceData::new_default(test_time());
        let err = inv
            .update_item(&"missing".parse().unwrap(), &ItemPatch::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn negative_amounts_pass_through() {
        let item = InvoiceItem::new("refund", -1.0, 40.0);
        assert!(item.validate().is_ok());
        assert_eq!(item.amount(), -40.0);
    }

    #[test]
    fn serializes_with_camel_case_and_iso_dates() {
        let inv = InvoiceData::new_default(test_time());
        let json = serde_json::to_value(&inv).unwrap();
        assert_eq!(json["invoiceNumber"], "001");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["paymentTerms"], "Net 30");
        assert_eq!(json["date"], "2024-03-01T09:30:00Z");
        assert!(json["companyDetails"].get("logo").is_none());

        let back: InvoiceData = serde_json::from_value(json).unwrap();
        assert_eq!(back, inv);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!("void".parse::<InvoiceStatus>().is_err());
    }
}
