//! Read-only rendering data handed to print/export collaborators.
//!
//! Every string is display-ready; the collaborator only lays it out.

use serde::Serialize;

use crate::invoice::InvoiceData;
use crate::totals::format_money;

const DATE_FORMAT: &str = "%b %d, %Y";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintLine {
    pub description: String,
    pub quantity: String,
    pub price: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintParty {
    pub name: String,
    /// One entry per address line.
    pub address_lines: Vec<String>,
    pub email: String,
    pub phone: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintView {
    pub title: String,
    pub invoice_number: String,
    pub status: String,
    pub company: PrintParty,
    pub bill_to: PrintParty,
    pub date: String,
    pub due_date: String,
    pub payment_terms: String,
    pub lines: Vec<PrintLine>,
    pub subtotal: String,
    pub tax_label: String,
    pub tax: String,
    pub total: String,
    pub notes: Option<String>,
}

impl PrintView {
    pub fn from_invoice(invoice: &InvoiceData) -> Self {
        let currency = invoice.currency.as_str();
        let totals = invoice.totals();

        let lines = invoice
            .items
            .iter()
            .map(|item| PrintLine {
                description: item.description.clone(),
                quantity: format_quantity(item.quantity),
                price: format_money(currency, item.price),
                amount: format_money(currency, item.amount()),
            })
            .collect();

        let company = &invoice.company_details;
        let client = &invoice.client_details;

        Self {
            title: "INVOICE".to_string(),
            invoice_number: format!("#{}", invoice.invoice_number),
            status: invoice.status.label().to_string(),
            company: PrintParty {
                name: company.name.clone(),
                address_lines: split_lines(&company.address),
                email: company.email.clone(),
                phone: Some(company.phone.clone()),
                logo: company.logo.clone(),
            },
            bill_to: PrintParty {
                name: client.name.clone(),
                address_lines: split_lines(&client.address),
                email: client.email.clone(),
                phone: None,
                logo: None,
            },
            date: invoice.date.format(DATE_FORMAT).to_string(),
            due_date: invoice.due_date.format(DATE_FORMAT).to_string(),
            payment_terms: invoice.payment_terms.clone(),
            lines,
            subtotal: format_money(currency, totals.subtotal),
            tax_label: format!("Tax ({}%)", format_quantity(invoice.tax_rate)),
            tax: format_money(currency, totals.tax),
            total: format_money(currency, totals.total),
            notes: (!invoice.notes.is_empty()).then(|| invoice.notes.clone()),
        }
    }

    /// Plain-text rendering, one block per section.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} {}  [{}]\n", self.title, self.invoice_number, self.status));
        out.push_str(&format!("{}\n", self.company.name));
        for line in &self.company.address_lines {
            out.push_str(&format!("{line}\n"));
        }
        out.push_str(&format!("{}\n", self.company.email));
        if let Some(phone) = &self.company.phone {
            out.push_str(&format!("{phone}\n"));
        }

        out.push_str("\nBill To:\n");
        out.push_str(&format!("{}\n", self.bill_to.name));
        for line in &self.bill_to.address_lines {
            out.push_str(&format!("{line}\n"));
        }
        out.push_str(&format!("{}\n\n", self.bill_to.email));

        out.push_str(&format!("Invoice Date:  {}\n", self.date));
        out.push_str(&format!("Due Date:      {}\n", self.due_date));
        out.push_str(&format!("Payment Terms: {}\n\n", self.payment_terms));

        for line in &self.lines {
            out.push_str(&format!(
                "{:<32} {:>8} {:>14} {:>14}\n",
                line.description, line.quantity, line.price, line.amount
            ));
        }

        out.push_str(&format!("\nSubtotal: {}\n", self.subtotal));
        out.push_str(&format!("{}: {}\n", self.tax_label, self.tax));
        out.push_str(&format!("Total: {}\n", self.total));

        if let Some(notes) = &self.notes {
            out.push_str(&format!("\nNotes:\n{notes}\n"));
        }
        out
    }
}

impl core::fmt::Display for PrintView {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Integers print without a fraction; other values as given.
fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
