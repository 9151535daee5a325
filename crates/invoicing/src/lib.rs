//! Invoicing domain module.
//!
//! Record types, the totals engine, templates, drafts and the in-memory
//! ledger. Deterministic domain logic only: callers pass `now` explicitly and
//! persistence lives in `invoicer-infra`.

pub mod draft;
pub mod invoice;
pub mod ledger;
pub mod print;
pub mod template;
pub mod totals;

pub use draft::InvoiceDraft;
pub use invoice::{
    ClientDetails, CompanyDetails, InvoiceData, InvoiceItem, InvoiceStatus, ItemPatch, CURRENCIES,
    PAYMENT_TERMS,
};
pub use ledger::{apply_template, load_draft, Collection, Ledger};
pub use print::{PrintLine, PrintParty, PrintView};
pub use template::{InvoiceTemplate, PublicTemplate, TemplateField, User, UserRole};
pub use totals::{format_money, Totals};
