//! Contact and encounter tracking with key/value persistence and derived
//! spending statistics.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::RecordStore`]:
//! ```
//! use chrono::NaiveDate;
//! use conquistas::{
//!     core::store::RecordStore,
//!     input::{ContactForm, EncounterForm},
//! };
//!
//! let mut store = RecordStore::in_memory();
//! let maria = store.add_contact(
//!     ContactForm { name: "Maria".to_string(), ..ContactForm::default() }
//!         .validate()
//!         .expect("valid contact"),
//! );
//!
//! let today = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");
//! let form = EncounterForm {
//!     contact_id: Some(maria.id),
//!     location: "Cafe".to_string(),
//!     amount: "100".to_string(),
//!     rating: 4,
//!     ..EncounterForm::default()
//! };
//! store.add_encounter(form.validate(today).expect("valid encounter")).expect("add");
//!
//! assert_eq!(store.stats().total_spent(), 100.0);
//! ```
//!
//! Runtime usage with a SQLite adapter:
//! ```no_run
//! use conquistas::{
//!     core::store::{RecordStore, StoreConfig},
//!     input::ContactForm,
//!     persist::sqlite::SqliteKv,
//!     runtime::handle::{spawn_record_store, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let kv = SqliteKv::open("conquistas.db").expect("open sqlite");
//! let store = RecordStore::open(Box::new(kv), StoreConfig::default()).expect("load");
//! let handle = spawn_record_store(store, RuntimeConfig::default());
//! let form = ContactForm { name: "Ana".to_string(), ..ContactForm::default() };
//! let _contact = handle.add_contact(form.validate().expect("valid")).await.expect("add");
//! let _store = handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Core in-memory store and index helpers.
pub mod core;
/// Form validation ahead of store mutations.
pub mod input;
/// Persistence abstraction with memory and SQLite implementations.
pub mod persist;
/// Contact and encounter records and insert payloads.
pub mod record;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Aggregate and per-contact statistics.
pub mod stats;
/// Shared primitive types.
pub mod types;
