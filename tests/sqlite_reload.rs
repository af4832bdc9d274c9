use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;

use conquistas::{
    core::store::{RecordStore, StoreConfig},
    persist::{KeyValueStore, LoadedList, load_list, memory::MemoryKv, sqlite::SqliteKv},
    record::{NewContact, NewEncounter},
    types::{Amount, PhotoRef, Rating},
};

fn new_contact(name: &str) -> NewContact {
    NewContact::new(name, PhotoRef::preset(0)).expect("contact")
}

#[test]
fn sqlite_reload_round_trips_collections_and_order() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("conquistas.db");

    let kv = SqliteKv::open(&db_path).expect("open sqlite");
    let mut store = RecordStore::open(Box::new(kv), StoreConfig::default()).expect("load");

    let ana = store.add_contact(
        new_contact("Ana")
            .with_nickname("Aninha")
            .with_notes("gosta de jazz"),
    );
    let bia = store.add_contact(new_contact("Bia"));
    let date = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    store
        .add_encounter(
            NewEncounter::new(ana.id, "Jazz bar", date)
                .expect("encounter")
                .with_amount(Amount::new(120.5).unwrap())
                .with_rating(Rating::new(5)),
        )
        .expect("add");
    store
        .add_encounter(NewEncounter::new(bia.id, "Parque", date).expect("encounter"))
        .expect("add");
    let expected = store.export_snapshot();
    assert_eq!(store.persist_failures(), 0);

    drop(store);

    let kv = SqliteKv::open(&db_path).expect("reopen");
    let reloaded = RecordStore::open(Box::new(kv), StoreConfig::default()).expect("reload");

    assert_eq!(reloaded.export_snapshot(), expected);
    assert_eq!(reloaded.stats().total_spent(), 120.5);
}

#[test]
fn cascade_delete_is_persisted() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("cascade.db");

    let kv = SqliteKv::open(&db_path).expect("open sqlite");
    let mut store = RecordStore::open(Box::new(kv), StoreConfig::default()).expect("load");
    let ana = store.add_contact(new_contact("Ana"));
    let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for _ in 0..3 {
        store
            .add_encounter(NewEncounter::new(ana.id, "Bar", date).expect("encounter"))
            .expect("add");
    }
    store.delete_contact(ana.id);
    drop(store);

    let kv = SqliteKv::open(&db_path).expect("reopen");
    assert_eq!(kv.load("contacts").expect("load"), Some(json!([])));
    assert_eq!(kv.load("encounters").expect("load"), Some(json!([])));
}

#[test]
fn stored_json_uses_camel_case_and_omits_absent_fields() {
    let kv = MemoryKv::new();
    let mut store = RecordStore::open(Box::new(kv.clone()), StoreConfig::default()).expect("open");
    let ana = store.add_contact(new_contact("Ana"));
    let date = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
    store
        .add_encounter(NewEncounter::new(ana.id, "Bar", date).expect("encounter"))
        .expect("add");

    assert_eq!(kv.len(), 2);
    let contacts = kv.load("contacts").expect("load").expect("saved");
    let contact = &contacts[0];
    assert_eq!(contact["name"], "Ana");
    assert!(contact.get("createdAt").is_some());
    assert!(contact.get("nickname").is_none());

    let encounters = kv.load("encounters").expect("load").expect("saved");
    let encounter = &encounters[0];
    assert_eq!(encounter["contactId"], json!(ana.id.to_string()));
    assert_eq!(encounter["date"], "2024-04-02T00:00:00Z");
    assert_eq!(encounter["amount"], json!(0.0));
    assert!(encounter.get("rating").is_none());
}

const ANA: &str = "6f1c2a4e-0d1b-4c55-9a53-3f1f4f3b9a01";

fn stored_contact(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "photo": "https://example.com/a.jpg",
        "createdAt": "2024-01-01T10:00:00Z"
    })
}

fn stored_encounter(id: &str, contact_id: &str, amount: f64) -> Value {
    json!({
        "id": id,
        "contactId": contact_id,
        "date": "2024-01-03T00:00:00Z",
        "location": "Bar",
        "amount": amount,
        "rating": 3
    })
}

#[test]
fn orphans_and_duplicates_are_dropped_on_load() {
    let mut kv = MemoryKv::new();
    let ghost = "00000000-0000-4000-8000-000000000000";
    kv.save(
        "contacts",
        &json!([stored_contact(ANA, "Ana"), stored_contact(ANA, "Ana again")]),
    )
    .expect("seed contacts");
    kv.save(
        "encounters",
        &json!([
            stored_encounter("11111111-1111-4111-8111-111111111111", ANA, 40.0),
            stored_encounter("22222222-2222-4222-8222-222222222222", ghost, 99.0)
        ]),
    )
    .expect("seed encounters");

    let store = RecordStore::open(Box::new(kv.clone()), StoreConfig::default()).expect("open");

    assert_eq!(store.contacts().len(), 1);
    assert_eq!(store.contacts()[0].name, "Ana");
    assert_eq!(store.encounters().len(), 1);
    assert_eq!(store.stats().total_spent(), 40.0);

    let persisted = kv.load("encounters").expect("load").expect("saved");
    assert_eq!(persisted.as_array().map(Vec::len), Some(1));
}

#[test]
fn unreadable_blob_starts_empty() {
    let mut kv = MemoryKv::new();
    kv.save("contacts", &json!({ "not": "a list" })).expect("seed");
    kv.save("encounters", &json!([{ "amount": -5 }])).expect("seed");

    let store = RecordStore::open(Box::new(kv), StoreConfig::default()).expect("open");

    assert!(store.contacts().is_empty());
    assert!(store.encounters().is_empty());
}

#[test]
fn damaged_contacts_blob_leaves_stored_encounters_untouched() {
    let mut kv = MemoryKv::new();
    kv.save(
        "contacts",
        &json!([{ "id": ANA, "name": "Ana", "createdAt": "2024-01-01T10:00:00Z" }]),
    )
    .expect("seed contacts");
    kv.save(
        "encounters",
        &json!([stored_encounter("11111111-1111-4111-8111-111111111111", ANA, 40.0)]),
    )
    .expect("seed encounters");
    let contacts_before = kv.load("contacts").expect("load");
    let encounters_before = kv.load("encounters").expect("load");

    let store = RecordStore::open(Box::new(kv.clone()), StoreConfig::default()).expect("open");

    assert!(store.contacts().is_empty());
    assert!(store.encounters().is_empty());
    assert_eq!(store.persist_failures(), 0);
    assert_eq!(kv.load("contacts").expect("load"), contacts_before);
    assert_eq!(kv.load("encounters").expect("load"), encounters_before);
}

#[test]
fn unreadable_records_are_skipped_one_by_one() {
    let mut kv = MemoryKv::new();
    kv.save("contacts", &json!([stored_contact(ANA, "Ana")])).expect("seed contacts");
    let mut zero_rating = stored_encounter("22222222-2222-4222-8222-222222222222", ANA, 10.0);
    zero_rating["rating"] = json!(0);
    let negative = stored_encounter("33333333-3333-4333-8333-333333333333", ANA, -5.0);
    kv.save(
        "encounters",
        &json!([
            stored_encounter("11111111-1111-4111-8111-111111111111", ANA, 40.0),
            zero_rating,
            negative
        ]),
    )
    .expect("seed encounters");

    let mut store = RecordStore::open(Box::new(kv.clone()), StoreConfig::default()).expect("open");

    assert_eq!(store.contacts().len(), 1);
    assert_eq!(store.encounters().len(), 1);
    assert_eq!(store.stats().total_spent(), 40.0);
    let stored = kv.load("encounters").expect("load").expect("saved");
    assert_eq!(stored.as_array().map(Vec::len), Some(3));

    let ana = store.contacts()[0].id;
    let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
    store
        .add_encounter(NewEncounter::new(ana, "Cinema", date).expect("encounter"))
        .expect("add");
    let stored = kv.load("encounters").expect("load").expect("saved");
    assert_eq!(stored.as_array().map(Vec::len), Some(2));
}

#[test]
fn load_list_reports_damage() {
    let mut kv = MemoryKv::new();
    kv.save("mixed", &json!([1, "two", 3])).expect("seed");
    kv.save("object", &json!({ "a": 1 })).expect("seed");

    let missing: LoadedList<u32> = load_list(&kv, "missing").expect("load");
    assert!(missing.items.is_empty());
    assert!(missing.is_intact());

    let mixed: LoadedList<u32> = load_list(&kv, "mixed").expect("load");
    assert_eq!(mixed.items, vec![1, 3]);
    assert_eq!(mixed.skipped, 1);
    assert!(!mixed.is_intact());

    let object: LoadedList<u32> = load_list(&kv, "object").expect("load");
    assert!(object.items.is_empty());
    assert!(object.not_a_list);
    assert!(!object.is_intact());
}

#[test]
fn custom_keys_are_honoured() {
    let kv = SqliteKv::open_in_memory().expect("sqlite");
    let config = StoreConfig {
        contacts_key: "women".to_string(),
        encounters_key: "dates".to_string(),
        ..StoreConfig::default()
    };
    let mut store = RecordStore::open(Box::new(kv), config).expect("open");
    store.add_contact(new_contact("Ana"));

    assert_eq!(store.config().contacts_key, "women");
    assert_eq!(store.contacts().len(), 1);
}

#[test]
fn sqlite_keys_lists_and_removes() {
    let mut kv = SqliteKv::open_in_memory().expect("sqlite");
    kv.save("b", &json!(1)).expect("save");
    kv.save("a", &json!(2)).expect("save");
    kv.save("a", &json!(3)).expect("overwrite");

    assert_eq!(kv.keys().expect("keys"), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(kv.load("a").expect("load"), Some(json!(3)));
    assert!(kv.remove("a").expect("remove"));
    assert!(!kv.remove("a").expect("remove again"));
    assert_eq!(kv.load("a").expect("load"), None);
}
