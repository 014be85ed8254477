//! Integration tests for the catalog: routing, storage and sync together.

use resroute_catalog::{Catalog, CatalogConfig, COLUMN_NAME, COLUMN_TITLE};
use resroute_core::{CoreError, ReadRequest, Selection, SelectionBuilder, Value, Values};
use resroute_sync::{FileHttp, HttpError, MockHttp, SyncConfig, Syncable};
use serde_json::{json, Value as Json};
use std::sync::Arc;

const ENDPOINT: &str = "https://data.example.com";
const LISTING_URL: &str = "https://data.example.com/listing.json";

fn listing() -> Json {
    json!({
        "version": "13.1.1",
        "data": {
            "Ahri": {
                "key": "103",
                "name": "Ahri",
                "title": "the Nine-Tailed Fox",
                "blurb": "Innately connected to the magic of the spirit realm",
                "children": [
                    {"id": "103000", "number": 0, "title": "default"},
                    {"id": "103001", "number": 1, "title": "Dynasty Ahri"},
                    {"id": "103002", "number": 2, "title": "Midnight Ahri"}
                ]
            },
            "Brand": {
                "key": "63",
                "name": "Brand",
                "title": "the Burning Vengeance",
                "blurb": "Once a tribesman of the icy Freljord",
                "children": [
                    {"id": "63000", "number": 0, "title": "default"}
                ]
            }
        }
    })
}

fn catalog_with(http: MockHttp) -> Catalog<MockHttp> {
    let config = CatalogConfig::new(SyncConfig::new(ENDPOINT));
    let catalog = Catalog::new(config, Arc::new(http)).unwrap();
    catalog.start().unwrap();
    catalog
}

fn synced_catalog() -> Catalog<MockHttp> {
    let http = MockHttp::new();
    http.respond(LISTING_URL, Ok(listing()));
    let catalog = catalog_with(http);
    assert_eq!(catalog.create("/catalog/items/sync", Values::new()).unwrap(), 1);
    catalog
}

fn force(value: bool) -> Values {
    let mut values = Values::new();
    values.insert("force".into(), Value::Bool(value));
    values
}

fn titles(rows: &[Values]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(COLUMN_TITLE).and_then(Value::as_text))
        .map(str::to_string)
        .collect()
}

#[test]
fn sync_route_fills_the_store() {
    let catalog = synced_catalog();

    let items = catalog
        .read("/catalog/items", ReadRequest::new().with_sort("name"))
        .unwrap();
    assert_eq!(
        titles(&items),
        vec!["the Nine-Tailed Fox", "the Burning Vengeance"]
    );
}

#[test]
fn items_by_name_and_by_id() {
    let catalog = synced_catalog();

    let by_id = catalog
        .read_single("/catalog/items/103", ReadRequest::new())
        .unwrap()
        .unwrap();
    assert_eq!(by_id[COLUMN_NAME], Value::from("Ahri"));

    let by_name = catalog
        .read_single("/catalog/items/Brand", ReadRequest::new())
        .unwrap()
        .unwrap();
    assert_eq!(by_name["item_id"], Value::from(63i64));

    let missing = catalog
        .read_single("/catalog/items/Zed", ReadRequest::new())
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn children_under_either_item_variable() {
    let catalog = synced_catalog();

    let by_name = catalog
        .read(
            "/catalog/items/Ahri/children",
            ReadRequest::new().with_sort("number DESC"),
        )
        .unwrap();
    assert_eq!(
        titles(&by_name),
        vec!["Midnight Ahri", "Dynasty Ahri", "default"]
    );

    let by_id = catalog
        .read("/catalog/items/63/children", ReadRequest::new())
        .unwrap();
    assert_eq!(titles(&by_id), vec!["default"]);

    let one = catalog
        .read(
            "/catalog/items/Ahri/children/103001",
            ReadRequest::new().with_projection(["title"]),
        )
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].len(), 1);
    assert_eq!(titles(&one), vec!["Dynasty Ahri"]);

    // The child exists, but not under Brand
    let wrong_parent = catalog
        .read("/catalog/items/Brand/children/103001", ReadRequest::new())
        .unwrap();
    assert!(wrong_parent.is_empty());
}

#[test]
fn caller_selection_is_combined_with_route_variables() {
    let catalog = synced_catalog();

    let selection = SelectionBuilder::positional()
        .with("title", Value::from("Dynasty Ahri"))
        .build();
    let rows = catalog
        .read(
            "/catalog/items/Ahri/children",
            ReadRequest {
                selection,
                ..ReadRequest::new()
            },
        )
        .unwrap();
    assert_eq!(titles(&rows), vec!["Dynasty Ahri"]);
}

#[test]
fn forced_sync_through_route_rewrites_entries() {
    let catalog = synced_catalog();

    let mut edit = Values::new();
    edit.insert(COLUMN_TITLE.into(), Value::from("edited locally"));
    let updated = catalog
        .update("/catalog/items/Ahri", Selection::none(), edit)
        .unwrap();
    assert_eq!(updated, 1);

    // Same remote version: an unforced pass leaves the edit alone
    assert_eq!(catalog.create("/catalog/items/sync", force(false)).unwrap(), 1);
    let ahri = catalog
        .read_single("/catalog/items/Ahri", ReadRequest::new())
        .unwrap()
        .unwrap();
    assert_eq!(ahri[COLUMN_TITLE], Value::from("edited locally"));

    assert_eq!(catalog.create("/catalog/items/sync", force(true)).unwrap(), 1);
    let ahri = catalog
        .read_single("/catalog/items/Ahri", ReadRequest::new())
        .unwrap()
        .unwrap();
    assert_eq!(ahri[COLUMN_TITLE], Value::from("the Nine-Tailed Fox"));
}

#[test]
fn network_failure_is_reported() {
    let http = MockHttp::new();
    http.respond(LISTING_URL, Err(HttpError::unreachable("offline")));
    let catalog = catalog_with(http);

    assert_eq!(catalog.create("/catalog/items/sync", Values::new()).unwrap(), -1);

    let result = catalog.sync(false);
    assert_eq!(result.network_errors, 1);
    assert_eq!(result.authentication_errors, 0);
    assert!(catalog
        .read("/catalog/items", ReadRequest::new())
        .unwrap()
        .is_empty());
}

#[test]
fn authentication_failure_is_reported() {
    let http = MockHttp::new();
    http.respond(LISTING_URL, Err(HttpError::status(403, "bad key")));
    let catalog = catalog_with(http);

    let result = catalog.sync(true);
    assert_eq!(result.authentication_errors, 1);
    assert_eq!(result.network_errors, 0);
}

#[test]
fn renaming_an_item_carries_its_children() {
    let catalog = synced_catalog();

    let mut rename = Values::new();
    rename.insert(COLUMN_NAME.into(), Value::from("Ahri Prime"));
    catalog
        .update("/catalog/items/103", Selection::none(), rename)
        .unwrap();

    let children = catalog
        .read("/catalog/items/Ahri Prime/children", ReadRequest::new())
        .unwrap();
    assert_eq!(children.len(), 3);
    assert!(catalog
        .read("/catalog/items/Ahri/children", ReadRequest::new())
        .unwrap()
        .is_empty());
}

#[test]
fn deleting_an_item_removes_its_children() {
    let catalog = synced_catalog();

    assert_eq!(catalog.delete("/catalog/items/Ahri", Selection::none()).unwrap(), 1);
    assert!(catalog
        .read("/catalog/items/103/children", ReadRequest::new())
        .unwrap()
        .is_empty());
    assert_eq!(
        catalog
            .read("/catalog/items/63/children", ReadRequest::new())
            .unwrap()
            .len(),
        1
    );

    // The next sync brings it back
    assert_eq!(catalog.create("/catalog/items/sync", force(true)).unwrap(), 1);
    assert_eq!(
        catalog
            .read("/catalog/items/Ahri/children", ReadRequest::new())
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn update_cannot_take_another_items_id() {
    let catalog = synced_catalog();

    let mut steal = Values::new();
    steal.insert("item_id".into(), Value::from(63i64));
    let err = catalog
        .update("/catalog/items/Ahri", Selection::none(), steal)
        .unwrap_err();
    assert!(matches!(err, CoreError::Handler(_)));

    let brand = catalog.read("/catalog/items/63", ReadRequest::new()).unwrap();
    assert_eq!(brand.len(), 1);
    assert_eq!(brand[0][COLUMN_NAME], Value::from("Brand"));
    assert_eq!(
        catalog
            .read("/catalog/items/103/children", ReadRequest::new())
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn routing_errors() {
    let catalog = synced_catalog();

    assert!(matches!(
        catalog.read("/catalog/nothing", ReadRequest::new()),
        Err(CoreError::NoRouteFound { .. })
    ));
    assert!(matches!(
        catalog.create("/catalog/items", Values::new()),
        Err(CoreError::NoHandlerFound { .. })
    ));
    assert!(matches!(
        catalog.delete("/catalog/items/Ahri/children", Selection::none()),
        Err(CoreError::NoHandlerFound { .. })
    ));
    assert!(matches!(
        catalog.read("", ReadRequest::new()),
        Err(CoreError::NoRouteFound { .. })
    ));
}

#[test]
fn handler_errors_are_relayed() {
    let catalog = synced_catalog();

    let mut bogus = Values::new();
    bogus.insert("no_such_column".into(), Value::from(1i64));
    let err = catalog
        .update("/catalog/items/Ahri", Selection::none(), bogus)
        .unwrap_err();
    assert!(matches!(err, CoreError::Handler(_)));
}

#[test]
fn stop_and_restart() {
    let catalog = synced_catalog();
    catalog.stop();
    assert!(!catalog.is_started());
    assert!(matches!(
        catalog.read("/catalog/items", ReadRequest::new()),
        Err(CoreError::NotStarted)
    ));

    catalog.start().unwrap();
    assert_eq!(
        catalog
            .read("/catalog/items", ReadRequest::new())
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn custom_root() {
    let http = MockHttp::new();
    http.respond(LISTING_URL, Ok(listing()));
    let config = CatalogConfig::new(SyncConfig::new(ENDPOINT)).with_root("/champions/");
    let catalog = Catalog::new(config, Arc::new(http)).unwrap();
    catalog.start().unwrap();

    assert_eq!(catalog.path("items/sync"), "/champions/items/sync");
    assert_eq!(catalog.create(&catalog.path("items/sync"), Values::new()).unwrap(), 1);
    assert!(matches!(
        catalog.read("/catalog/items", ReadRequest::new()),
        Err(CoreError::NoRouteFound { .. })
    ));
}

#[test]
fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let http = MockHttp::new();
        http.respond(LISTING_URL, Ok(listing()));
        let config = CatalogConfig::new(SyncConfig::new(ENDPOINT)).with_database_dir(dir.path());
        let catalog = Catalog::new(config, Arc::new(http)).unwrap();
        catalog.start().unwrap();
        assert!(!catalog.sync(false).has_errors());
    }
    assert!(dir.path().join("catalog.json").exists());

    // Offline now, but the cache still answers
    let http = MockHttp::new();
    http.respond(LISTING_URL, Err(HttpError::unreachable("offline")));
    let config = CatalogConfig::new(SyncConfig::new(ENDPOINT)).with_database_dir(dir.path());
    let catalog = Catalog::new(config, Arc::new(http)).unwrap();
    catalog.start().unwrap();

    assert_eq!(
        catalog
            .read("/catalog/items/Ahri/children", ReadRequest::new())
            .unwrap()
            .len(),
        3
    );
    assert_eq!(catalog.sync(false).network_errors, 1);
}

#[test]
fn fixture_directory_as_remote() {
    let fixtures = tempfile::tempdir().unwrap();
    std::fs::write(
        fixtures.path().join("listing.json"),
        serde_json::to_vec(&listing()).unwrap(),
    )
    .unwrap();

    let config = CatalogConfig::new(SyncConfig::new(ENDPOINT));
    let catalog = Catalog::new(config, Arc::new(FileHttp::new(fixtures.path()))).unwrap();
    catalog.start().unwrap();

    let result = catalog.sync(false);
    assert_eq!(result.inserts, 2);
    assert!(!result.has_errors());
    assert!(catalog
        .read_single("/catalog/items/63", ReadRequest::new())
        .unwrap()
        .is_some());
}
