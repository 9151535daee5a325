//! End-to-end tests across sessions and storage backends.
//!
//! Tests: Session → StorageBackend / RemoteStore → reopened Session
//!
//! Verifies:
//! - Collections written by one session are read back unchanged by the next
//! - JSON files on disk keep the camelCase layout and ISO date strings
//! - A template saved locally can be published and applied remotely

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use invoicer_invoicing::{InvoiceData, InvoiceItem, InvoiceStatus, TemplateField, User, UserRole};

use crate::remote::{InMemoryRemoteStore, RemoteStore};
use crate::session::{LocalSession, RemoteSession};
use crate::storage::{FileStorage, InMemoryStorage, StorageKey, load_collection, save_collection};

fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 4, 16, 45, 30).unwrap()
}

fn temp_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("invoicer-integration-{}", uuid::Uuid::now_v7()))
}

fn sample_invoice() -> InvoiceData {
    let mut inv = InvoiceData::new_default(test_time());
    inv.invoice_number = "2024-17".to_string();
    inv.client_details.name = "Acme Corp".to_string();
    inv.items = vec![
        InvoiceItem::new("Design", 2.0, 50.0),
        InvoiceItem::new("Hosting", 1.0, 25.0),
    ];
    inv.status = InvoiceStatus::Pending;
    inv
}

#[test]
fn file_session_survives_a_restart() {
    let dir = temp_dir();

    let mut first = LocalSession::open(FileStorage::new(&dir), test_time()).unwrap();
    first.edit_current(|inv| *inv = sample_invoice()).unwrap();
    first.save_current();
    let fields: BTreeSet<_> = [TemplateField::ClientDetails, TemplateField::Items]
        .into_iter()
        .collect();
    let template = first
        .save_template("acme", "monthly", &fields, test_time())
        .unwrap();
    first.save_draft("acme draft", test_time()).unwrap();

    let mut second = LocalSession::open(FileStorage::new(&dir), test_time()).unwrap();
    assert_eq!(second.ledger(), first.ledger());

    second.apply_template(&template.id).unwrap();
    assert_eq!(second.current().client_details.name, "Acme Corp");
    assert_eq!(second.totals().total, 137.5);

    let raw = std::fs::read_to_string(dir.join("invoiceData.json")).unwrap();
    assert!(raw.contains("\"invoiceNumber\":\"2024-17\""));
    assert!(raw.contains("\"dueDate\":\"2024-07-04T16:45:30Z\""));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn local_template_can_be_shared_remotely() {
    let storage = Arc::new(InMemoryStorage::new());
    let mut local = LocalSession::open(storage, test_time()).unwrap();
    local.edit_current(|inv| inv.payment_terms = "Net 15".to_string()).unwrap();
    let fields: BTreeSet<_> = [TemplateField::PaymentTerms].into_iter().collect();
    let template = local
        .save_template("net 15", "", &fields, test_time())
        .unwrap();

    let store = Arc::new(InMemoryRemoteStore::new());
    let author = User {
        id: "author".parse().unwrap(),
        email: "author@example.com".to_string(),
        role: UserRole::User,
    };
    store.insert_template(&author.id, &template).await.unwrap();

    let mut remote = RemoteSession::open(store.clone(), author, test_time()).await;
    assert_eq!(remote.templates(), &[template.clone()]);
    let public = remote.publish_template(&template.id, test_time()).await.unwrap();

    let admin = User {
        id: "admin".parse().unwrap(),
        email: "admin@example.com".to_string(),
        role: UserRole::Admin,
    };
    let mut admin_session = RemoteSession::open(store, admin, test_time()).await;
    admin_session
        .set_public_template_active(&public.id, true)
        .await
        .unwrap();

    remote.load_public_templates().await;
    remote.apply_public_template(&public.id).unwrap();
    assert_eq!(remote.current().payment_terms, "Net 15");
}

proptest! {
    /// Writing a collection and reading it back yields equal invoices,
    /// dates included.
    #[test]
    fn persisted_invoices_reload_equal(
        numbers in prop::collection::vec("[0-9]{3}", 0..5),
        offset_secs in 0i64..1_000_000_000,
        quantity in -100i32..100,
        price_quarters in 0i64..4_000_000,
    ) {
        let when = Utc.timestamp_opt(offset_secs, 0).unwrap();
        let invoices: Vec<InvoiceData> = numbers
            .into_iter()
            .map(|number| {
                let mut inv = InvoiceData::new_default(when);
                inv.invoice_number = number;
                inv.items = vec![InvoiceItem::new("line", f64::from(quantity), price_quarters as f64 / 4.0)];
                inv
            })
            .collect();

        let storage = InMemoryStorage::new();
        save_collection(&storage, StorageKey::Invoices, &invoices).unwrap();
        let back: Vec<InvoiceData> = load_collection(&storage, StorageKey::Invoices).unwrap();
        prop_assert_eq!(back, invoices);
    }

    /// Arbitrary finite amounts survive the JSON round trip bit for bit.
    #[test]
    fn persisted_amounts_reload_exactly(
        price in 0.0f64..1.0e7,
        quantity in prop::num::f64::NORMAL,
        tax_rate in 0.0f64..100.0,
    ) {
        let mut inv = InvoiceData::new_default(test_time());
        inv.items = vec![InvoiceItem::new("line", quantity, price)];
        inv.tax_rate = tax_rate;

        let storage = InMemoryStorage::new();
        save_collection(&storage, StorageKey::Invoices, std::slice::from_ref(&inv)).unwrap();
        let back: Vec<InvoiceData> = load_collection(&storage, StorageKey::Invoices).unwrap();
        prop_assert_eq!(back.len(), 1);
        prop_assert_eq!(back[0].items[0].price.to_bits(), price.to_bits());
        prop_assert_eq!(back[0].items[0].quantity.to_bits(), quantity.to_bits());
        prop_assert_eq!(back[0].tax_rate.to_bits(), tax_rate.to_bits());
        prop_assert_eq!(&back[0], &inv);
    }
}
