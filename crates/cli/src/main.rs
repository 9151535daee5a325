mod args;
mod output;

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Parser;

use invoicer_core::InvoiceId;
use invoicer_infra::{
    FileStorage, InvoicerConfig, LocalSession, PostgresRemoteStore, RemoteSession, RemoteStore,
    StorageMode,
};
use invoicer_invoicing::{InvoiceData, InvoiceItem};

use crate::args::{Cli, Command, NewInvoice};

type Local = LocalSession<FileStorage>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = InvoicerConfig::from_env().context("invalid configuration")?;
    invoicer_observability::init_with(config.log_format);

    let mut local = LocalSession::open(FileStorage::new(&config.data_dir), Utc::now())
        .with_context(|| format!("failed to load data from {}", config.data_dir.display()))?;

    if run_invoice_command(&mut local, &cli.command)? {
        return Ok(());
    }

    match config.storage {
        StorageMode::Local => run_local_library(&mut local, cli.command),
        StorageMode::Remote { database_url, user } => {
            let store = PostgresRemoteStore::connect(&database_url)
                .await
                .context("failed to connect to the remote store")?;
            tracing::info!(user_id = %user.id, "using remote templates and drafts");
            let mut remote = RemoteSession::open(store, user, Utc::now()).await;
            run_remote_library(&mut local, &mut remote, cli.command).await
        }
    }
}

/// Ask on stderr; anything but y/yes declines.
fn ask(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn confirmation(yes: bool) -> Box<dyn Fn(&str) -> bool> {
    if yes { Box::new(|_: &str| true) } else { Box::new(ask) }
}

fn select(local: &mut Local, id: &InvoiceId) -> anyhow::Result<()> {
    local
        .select_invoice(id)
        .with_context(|| format!("no saved invoice with id {id}"))
}

/// Invoice commands always run against local storage. Returns `false` for
/// template/draft commands, which depend on the storage mode.
fn run_invoice_command(local: &mut Local, command: &Command) -> anyhow::Result<bool> {
    match command {
        Command::List => {
            println!("{}", output::invoices(local.ledger().invoices.as_slice()));
        }
        Command::Show { id } => {
            select(local, id)?;
            print!("{}", local.print_view());
        }
        Command::New(args) => {
            local.new_invoice(Utc::now());
            local.edit_current(|inv| fill(inv, args))?;
            local.save_current();
            println!("{}", local.current().id);
        }
        Command::Duplicate { id } => {
            select(local, id)?;
            let copy = local.duplicate_current(Utc::now())?;
            println!("{copy}");
        }
        Command::SetStatus { id, status } => {
            select(local, id)?;
            let status = *status;
            local.edit_current(|inv| inv.status = status)?;
            local.save_current();
        }
        Command::Delete { id, yes } => {
            select(local, id)?;
            if !local.delete_current(confirmation(*yes), Utc::now()) {
                println!("kept invoice {id}");
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn fill(inv: &mut InvoiceData, args: &NewInvoice) {
    if let Some(number) = &args.number {
        inv.invoice_number = number.clone();
    }
    if let Some(client) = &args.client {
        inv.client_details.name = client.clone();
    }
    if let Some(email) = &args.client_email {
        inv.client_details.email = email.clone();
    }
    if let Some(address) = &args.client_address {
        inv.client_details.address = address.clone();
    }
    if !args.items.is_empty() {
        inv.items = args
            .items
            .iter()
            .map(|l| InvoiceItem::new(l.description.clone(), l.quantity, l.price))
            .collect();
    }
    if let Some(tax) = args.tax {
        inv.tax_rate = tax;
    }
    if let Some(currency) = &args.currency {
        inv.currency = currency.clone();
    }
    if let Some(terms) = &args.terms {
        inv.payment_terms = terms.clone();
    }
    if let Some(status) = args.status {
        inv.status = status;
    }
    if let Some(notes) = &args.notes {
        inv.notes = notes.clone();
    }
}

fn run_local_library(local: &mut Local, command: Command) -> anyhow::Result<()> {
    let now = Utc::now();
    match command {
        Command::Templates => println!("{}", output::templates(local.ledger().templates.as_slice())),
        Command::SaveTemplate {
            invoice_id,
            name,
            description,
            fields,
        } => {
            select(local, &invoice_id)?;
            let fields: BTreeSet<_> = fields.into_iter().collect();
            let template = local.save_template(&name, &description, &fields, now)?;
            println!("{}", template.id);
        }
        Command::ApplyTemplate {
            template_id,
            invoice_id,
        } => {
            select(local, &invoice_id)?;
            local.apply_template(&template_id)?;
            local.save_current();
            print!("{}", local.print_view());
        }
        Command::DeleteTemplate { id, yes } => {
            local.delete_template(&id, confirmation(yes));
        }
        Command::Drafts => println!("{}", output::drafts(local.ledger().drafts.as_slice())),
        Command::SaveDraft { invoice_id, name } => {
            select(local, &invoice_id)?;
            let draft = local.save_draft(&name, now)?;
            println!("{}", draft.invoice.id);
        }
        Command::LoadDraft { id } => {
            local.load_draft(&id)?;
            local.save_current();
            print!("{}", local.print_view());
        }
        Command::DeleteDraft { id, yes } => {
            local.delete_draft(&id, confirmation(yes));
        }
        Command::Public | Command::Publish { .. } | Command::Activate { .. } | Command::UsePublic { .. } => {
            bail!("public templates need INVOICER_STORAGE=remote")
        }
        other => bail!("unexpected command {other:?}"),
    }
    Ok(())
}

/// Copy the selected local invoice into the remote session.
fn stage<R: RemoteStore>(
    local: &mut Local,
    remote: &mut RemoteSession<R>,
    id: &InvoiceId,
) -> anyhow::Result<()> {
    select(local, id)?;
    let invoice = local.current().clone();
    remote.state_mut().edit_current(move |inv| *inv = invoice)?;
    Ok(())
}

/// Save the remote session's current invoice locally and print it.
fn unstage<R: RemoteStore>(local: &mut Local, remote: &RemoteSession<R>) -> anyhow::Result<()> {
    let invoice = remote.current().clone();
    local.edit_current(move |inv| *inv = invoice)?;
    local.save_current();
    print!("{}", local.print_view());
    Ok(())
}

async fn run_remote_library<R: RemoteStore>(
    local: &mut Local,
    remote: &mut RemoteSession<R>,
    command: Command,
) -> anyhow::Result<()> {
    let now = Utc::now();
    match command {
        Command::Templates => println!("{}", output::templates(remote.templates())),
        Command::SaveTemplate {
            invoice_id,
            name,
            description,
            fields,
        } => {
            stage(local, remote, &invoice_id)?;
            let fields: BTreeSet<_> = fields.into_iter().collect();
            let template = remote.save_template(&name, &description, &fields, now).await?;
            println!("{}", template.id);
        }
        Command::ApplyTemplate {
            template_id,
            invoice_id,
        } => {
            stage(local, remote, &invoice_id)?;
            remote.apply_template(&template_id)?;
            unstage(local, remote)?;
        }
        Command::DeleteTemplate { id, yes } => {
            remote.delete_template(&id, confirmation(yes)).await;
        }
        Command::Drafts => println!("{}", output::drafts(remote.drafts())),
        Command::SaveDraft { invoice_id, name } => {
            stage(local, remote, &invoice_id)?;
            let draft = remote.save_draft(&name, now).await?;
            println!("{}", draft.invoice.id);
        }
        Command::LoadDraft { id } => {
            remote.load_draft(&id)?;
            unstage(local, remote)?;
        }
        Command::DeleteDraft { id, yes } => {
            remote.delete_draft(&id, confirmation(yes)).await;
        }
        Command::Public => {
            remote.load_public_templates().await;
            println!("{}", output::public_templates(remote.public_templates()));
        }
        Command::Publish { template_id } => {
            let public = remote.publish_template(&template_id, now).await?;
            println!("{}", public.id);
        }
        Command::Activate { id, off } => {
            remote.set_public_template_active(&id, !off).await?;
        }
        Command::UsePublic { id, invoice_id } => {
            remote.load_public_templates().await;
            stage(local, remote, &invoice_id)?;
            remote.apply_public_template(&id)?;
            unstage(local, remote)?;
        }
        other => bail!("unexpected command {other:?}"),
    }
    Ok(())
}
