//! Invoice templates: named partial snapshots used to pre-fill invoices.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicer_core::{DomainError, DomainResult, Entity, PublicTemplateId, TemplateId, UserId};

use crate::invoice::{ClientDetails, CompanyDetails, InvoiceData, InvoiceItem};

/// Invoice fields a template may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateField {
    CompanyDetails,
    ClientDetails,
    Items,
    TaxRate,
    Currency,
    PaymentTerms,
    Notes,
}

impl TemplateField {
    pub const ALL: [TemplateField; 7] = [
        Self::CompanyDetails,
        Self::ClientDetails,
        Self::Items,
        Self::TaxRate,
        Self::Currency,
        Self::PaymentTerms,
        Self::Notes,
    ];

    /// Serialized (camelCase) name of the field.
    pub fn key(&self) -> &'static str {
        match self {
            TemplateField::CompanyDetails => "companyDetails",
            TemplateField::ClientDetails => "clientDetails",
            TemplateField::Items => "items",
            TemplateField::TaxRate => "taxRate",
            TemplateField::Currency => "currency",
            TemplateField::PaymentTerms => "paymentTerms",
            TemplateField::Notes => "notes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemplateField::CompanyDetails => "Company Details",
            TemplateField::ClientDetails => "Client Details",
            TemplateField::Items => "Line Items",
            TemplateField::TaxRate => "Tax Rate",
            TemplateField::Currency => "Currency",
            TemplateField::PaymentTerms => "Payment Terms",
            TemplateField::Notes => "Notes",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TemplateField::CompanyDetails => {
                "Include company information (name, address, contact details)"
            }
            TemplateField::ClientDetails => "Include default client information",
            TemplateField::Items => "Save current items as template items",
            TemplateField::TaxRate => "Include the current tax rate setting",
            TemplateField::Currency => "Save the selected currency",
            TemplateField::PaymentTerms => "Include payment terms",
            TemplateField::Notes => "Include any default notes",
        }
    }
}

impl core::str::FromStr for TemplateField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| {
                f.label().eq_ignore_ascii_case(wanted) || f.key().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| DomainError::validation(format!("unknown template field '{wanted}'")))
    }
}

/// Named partial snapshot of invoice fields. Absent fields are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_details: Option<CompanyDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_details: Option<ClientDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<InvoiceItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl InvoiceTemplate {
    /// Snapshot the selected fields of `source` by value.
    ///
    /// Fails before building anything if the trimmed name is empty or no field
    /// is selected. A blank description is stored as `None`.
    pub fn from_invoice(
        name: &str,
        description: &str,
        fields: &BTreeSet<TemplateField>,
        source: &InvoiceData,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("template name is required"));
        }
        if fields.is_empty() {
            return Err(DomainError::validation(
                "select at least one field to include in the template",
            ));
        }

        let description = description.trim();
        let mut template = Self {
            id: TemplateId::generate(),
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            created_at: now,
            company_details: None,
            client_details: None,
            items: None,
            tax_rate: None,
            currency: None,
            payment_terms: None,
            notes: None,
            is_public: None,
        };

        for field in fields {
            match field {
                TemplateField::CompanyDetails => {
                    template.company_details = Some(source.company_details.clone())
                }
                TemplateField::ClientDetails => {
                    template.client_details = Some(source.client_details.clone())
                }
                TemplateField::Items => template.items = Some(source.items.clone()),
                TemplateField::TaxRate => template.tax_rate = Some(source.tax_rate),
                TemplateField::Currency => template.currency = Some(source.currency.clone()),
                TemplateField::PaymentTerms => {
                    template.payment_terms = Some(source.payment_terms.clone())
                }
                TemplateField::Notes => template.notes = Some(source.notes.clone()),
            }
        }

        Ok(template)
    }

    /// Fields that will overwrite an invoice when this template is applied.
    ///
    /// A field counts only when it is present *and* non-empty: a zero tax rate
    /// or an empty string never overwrites. Details blocks and item lists count
    /// whenever they are present, even if empty.
    pub fn effective_fields(&self) -> BTreeSet<TemplateField> {
        let non_empty = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.is_empty());

        let mut out = BTreeSet::new();
        if self.company_details.is_some() {
            out.insert(TemplateField::CompanyDetails);
        }
        if self.client_details.is_some() {
            out.insert(TemplateField::ClientDetails);
        }
        if self.items.is_some() {
            out.insert(TemplateField::Items);
        }
        if self.tax_rate.is_some_and(|r| r != 0.0 && !r.is_nan()) {
            out.insert(TemplateField::TaxRate);
        }
        if non_empty(&self.currency) {
            out.insert(TemplateField::Currency);
        }
        if non_empty(&self.payment_terms) {
            out.insert(TemplateField::PaymentTerms);
        }
        if non_empty(&self.notes) {
            out.insert(TemplateField::Notes);
        }
        out
    }

    /// Return a copy of `invoice` with this template's effective fields
    /// written over it. Everything else is left as it was.
    pub fn apply_to(&self, invoice: &InvoiceData) -> InvoiceData {
        let mut out = invoice.clone();
        for field in self.effective_fields() {
            match field {
                TemplateField::CompanyDetails => {
                    if let Some(v) = &self.company_details {
                        out.company_details = v.clone();
                    }
                }
                TemplateField::ClientDetails => {
                    if let Some(v) = &self.client_details {
                        out.client_details = v.clone();
                    }
                }
                TemplateField::Items => {
                    if let Some(v) = &self.items {
                        out.items = v.clone();
                    }
                }
                TemplateField::TaxRate => {
                    if let Some(v) = self.tax_rate {
                        out.tax_rate = v;
                    }
                }
                TemplateField::Currency => {
                    if let Some(v) = &self.currency {
                        out.currency = v.clone();
                    }
                }
                TemplateField::PaymentTerms => {
                    if let Some(v) = &self.payment_terms {
                        out.payment_terms = v.clone();
                    }
                }
                TemplateField::Notes => {
                    if let Some(v) = &self.notes {
                        out.notes = v.clone();
                    }
                }
            }
        }
        out
    }

    pub fn is_public(&self) -> bool {
        self.is_public.unwrap_or(false)
    }
}

impl Entity for InvoiceTemplate {
    type Id = TemplateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Role of a signed-in user of the hosted variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl core::str::FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" | "" => Ok(Self::User),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Gate for privileged operations such as toggling public templates.
    pub fn require_admin(&self) -> DomainResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::unauthorized(format!(
                "user {} is not an administrator",
                self.id
            )))
        }
    }
}

/// A template shared with every user, curated by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTemplate {
    pub id: PublicTemplateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: InvoiceTemplate,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
}

impl PublicTemplate {
    /// Publish a copy of `template`. New public templates start inactive.
    pub fn publish(template: &InvoiceTemplate, by: &User, now: DateTime<Utc>) -> Self {
        let mut data = template.clone();
        data.is_public = Some(true);
        Self {
            id: PublicTemplateId::generate(),
            name: template.name.clone(),
            description: template.description.clone(),
            company_logo: template
                .company_details
                .as_ref()
                .and_then(|c| c.logo.clone()),
            data,
            is_active: false,
            created_by: by.id.clone(),
            created_at: now,
        }
    }
}

impl Entity for PublicTemplate {
    type Id = PublicTemplateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
