use clap::{Args, Parser, Subcommand};

use invoicer_core::{InvoiceId, PublicTemplateId, TemplateId};
use invoicer_invoicing::{InvoiceStatus, TemplateField};

#[derive(Debug, Parser)]
#[command(name = "invoicer", version, about = "Create, price and keep invoices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List saved invoices
    List,
    /// Print an invoice
    Show { id: InvoiceId },
    /// Create and save a new invoice
    New(NewInvoice),
    /// Save a copy of an invoice as a new draft invoice
    Duplicate { id: InvoiceId },
    /// Change the status of an invoice
    SetStatus { id: InvoiceId, status: InvoiceStatus },
    /// Delete an invoice
    Delete {
        id: InvoiceId,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// List templates
    Templates,
    /// Save fields of an invoice as a template
    SaveTemplate {
        invoice_id: InvoiceId,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Field to copy (repeatable): companyDetails, clientDetails, items,
        /// taxRate, currency, paymentTerms, notes
        #[arg(long = "field", required = true)]
        fields: Vec<TemplateField>,
    },
    /// Apply a template to an invoice and save the result
    ApplyTemplate {
        template_id: TemplateId,
        invoice_id: InvoiceId,
    },
    /// Delete a template
    DeleteTemplate {
        id: TemplateId,
        #[arg(long)]
        yes: bool,
    },
    /// List drafts
    Drafts,
    /// Save an invoice as a named draft
    SaveDraft {
        invoice_id: InvoiceId,
        #[arg(long)]
        name: String,
    },
    /// Restore a draft and save it as an invoice
    LoadDraft { id: InvoiceId },
    /// Delete a draft
    DeleteDraft {
        id: InvoiceId,
        #[arg(long)]
        yes: bool,
    },
    /// List public templates (remote storage only)
    Public,
    /// Publish one of your templates (remote storage only)
    Publish { template_id: TemplateId },
    /// Activate or deactivate a public template (administrators only)
    Activate {
        id: PublicTemplateId,
        /// Deactivate instead
        #[arg(long)]
        off: bool,
    },
    /// Apply a public template to an invoice and save the result
    UsePublic {
        id: PublicTemplateId,
        invoice_id: InvoiceId,
    },
}

#[derive(Debug, Args)]
pub struct NewInvoice {
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub client_email: Option<String>,
    #[arg(long)]
    pub client_address: Option<String>,
    /// Line item as `description:quantity:price` (repeatable)
    #[arg(long = "item", value_parser = parse_line)]
    pub items: Vec<Line>,
    /// Tax rate in percent
    #[arg(long)]
    pub tax: Option<f64>,
    #[arg(long)]
    pub currency: Option<String>,
    #[arg(long)]
    pub terms: Option<String>,
    #[arg(long)]
    pub status: Option<InvoiceStatus>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub description: String,
    pub quantity: f64,
    pub price: f64,
}

/// `description:quantity:price`; the description may itself contain colons.
fn parse_line(raw: &str) -> Result<Line, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected description:quantity:price, got '{raw}'"));
    };

    let quantity: f64 = quantity
        .trim()
        .parse()
        .map_err(|e| format!("bad quantity '{quantity}': {e}"))?;
    let price: f64 = price
        .trim()
        .parse()
        .map_err(|e| format!("bad price '{price}': {e}"))?;

    Ok(Line {
        description: description.trim().to_string(),
        quantity,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn line_keeps_colons_in_description() {
        let line = parse_line("Consulting: phase 1:2:150.5").unwrap();
        assert_eq!(line.description, "Consulting: phase 1");
        assert_eq!(line.quantity, 2.0);
        assert_eq!(line.price, 150.5);
        assert!(parse_line("no numbers").is_err());
        assert!(parse_line("x:two:3").is_err());
    }

    #[test]
    fn parses_template_fields() {
        let cli = Cli::try_parse_from([
            "invoicer",
            "save-template",
            "inv-1",
            "--name",
            "standard",
            "--field",
            "items",
            "--field",
            "taxRate",
        ])
        .unwrap();
        let Command::SaveTemplate { fields, .. } = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(fields, vec![TemplateField::Items, TemplateField::TaxRate]);
    }
}
