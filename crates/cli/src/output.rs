//! Table rendering for list commands.

use comfy_table::{Cell, Table};

use invoicer_invoicing::{InvoiceData, InvoiceDraft, InvoiceTemplate, PublicTemplate, format_money};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn invoices(invoices: &[InvoiceData]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Number", "Client", "Date", "Status", "Total"]);
    for inv in invoices {
        table.add_row(vec![
            Cell::new(&inv.id),
            Cell::new(&inv.invoice_number),
            Cell::new(&inv.client_details.name),
            Cell::new(inv.date.format(DATE_FORMAT)),
            Cell::new(inv.status.label()),
            Cell::new(format_money(&inv.currency, inv.totals().total)),
        ]);
    }
    table
}

pub fn templates(templates: &[InvoiceTemplate]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Description", "Fields", "Created"]);
    for t in templates {
        let fields: Vec<&str> = t.effective_fields().iter().map(|f| f.label()).collect();
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.name),
            Cell::new(t.description.as_deref().unwrap_or("")),
            Cell::new(fields.join(", ")),
            Cell::new(t.created_at.format(DATE_FORMAT)),
        ]);
    }
    table
}

pub fn drafts(drafts: &[InvoiceDraft]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Client", "Last modified"]);
    for d in drafts {
        table.add_row(vec![
            Cell::new(&d.invoice.id),
            Cell::new(&d.draft_name),
            Cell::new(d.client_label()),
            Cell::new(d.last_modified.format("%Y-%m-%d %H:%M")),
        ]);
    }
    table
}

pub fn public_templates(templates: &[PublicTemplate]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Status", "Created by", "Created"]);
    for p in templates {
        table.add_row(vec![
            Cell::new(&p.id),
            Cell::new(&p.name),
            Cell::new(if p.is_active { "Active" } else { "Inactive" }),
            Cell::new(&p.created_by),
            Cell::new(p.created_at.format(DATE_FORMAT)),
        ]);
    }
    table
}
