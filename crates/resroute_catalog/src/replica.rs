//! The catalog store as the local side of a sync pass.

use crate::schema::{
    CatalogSchema, CHILDREN_TABLE, COLUMN_BLURB, COLUMN_CHILD_ID, COLUMN_FINGERPRINT,
    COLUMN_ITEM_ID, COLUMN_KEY, COLUMN_NAME, COLUMN_NUMBER, COLUMN_TITLE, COLUMN_TYPE,
    COLUMN_VERSION, ITEMS_TABLE, LISTING_VERSION_TYPE, VERSION_TABLE,
};
use resroute_core::{ReadRequest, Selection, SelectionBuilder, Value, Values};
use resroute_storage::{OpenHelper, StorageResult, Transaction};
use resroute_sync::{ChangeSet, Entry, FetchError, FetchResult, Listing, LocalReplica};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::debug;

/// Converts a JSON scalar into a [`Value`].
///
/// Integers, strings, booleans and null map to their variants; floats,
/// arrays and objects are kept as their JSON text.
pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Text(n.to_string()),
        },
        Json::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn json_id(json: Option<&Json>) -> Option<i64> {
    match json? {
        Json::Number(n) => n.as_i64(),
        Json::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn text_field(payload: &Json, field: &str) -> Value {
    payload.get(field).map_or(Value::Text(String::new()), json_to_value)
}

/// Builds a single-clause equality selection.
pub(crate) fn by_column(column: &str, value: Value) -> Selection {
    SelectionBuilder::positional().with(column, value).build()
}

/// An item and its children, decoded from a listing entry.
struct ItemRows {
    item_id: i64,
    item: Values,
    children: Vec<Values>,
}

/// Decodes an entry of the remote listing.
///
/// The payload carries a numeric `key` (integer or integer string), an
/// optional `name` (defaulting to the listing key), `title`, `blurb` and an
/// optional `children` array of `{id, number, title}` objects.
fn decode_entry(key: &str, entry: &Entry) -> FetchResult<ItemRows> {
    let payload = &entry.payload;
    let item_id = json_id(payload.get("key"))
        .ok_or_else(|| FetchError::Decode(format!("entry {key} has no numeric key")))?;
    let name = match payload.get("name") {
        Some(Json::String(name)) => name.clone(),
        _ => key.to_string(),
    };

    let mut item = Values::new();
    item.insert(COLUMN_ITEM_ID.into(), Value::Integer(item_id));
    item.insert(COLUMN_NAME.into(), Value::Text(name.clone()));
    item.insert(COLUMN_TITLE.into(), text_field(payload, "title"));
    item.insert(COLUMN_BLURB.into(), text_field(payload, "blurb"));
    item.insert(COLUMN_KEY.into(), Value::Text(key.to_string()));
    item.insert(
        COLUMN_FINGERPRINT.into(),
        Value::Text(entry.fingerprint.clone()),
    );

    let children = match payload.get("children") {
        None | Some(Json::Null) => Vec::new(),
        Some(Json::Array(children)) => children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let child_id = json_id(child.get("id")).ok_or_else(|| {
                    FetchError::Decode(format!("child {index} of {key} has no numeric id"))
                })?;
                let number = json_id(child.get("number")).unwrap_or(index as i64);

                let mut row = Values::new();
                row.insert(COLUMN_CHILD_ID.into(), Value::Integer(child_id));
                row.insert(COLUMN_ITEM_ID.into(), Value::Integer(item_id));
                row.insert(COLUMN_NAME.into(), Value::Text(name.clone()));
                row.insert(COLUMN_NUMBER.into(), Value::Integer(number));
                row.insert(COLUMN_TITLE.into(), text_field(child, "title"));
                Ok(row)
            })
            .collect::<FetchResult<Vec<_>>>()?,
        Some(_) => {
            return Err(FetchError::Decode(format!(
                "children of {key} is not an array"
            )))
        }
    };

    Ok(ItemRows {
        item_id,
        item,
        children,
    })
}

/// Deletes the items matching `selection` together with their children.
pub(crate) fn delete_items(tx: &mut Transaction, selection: &Selection) -> StorageResult<u64> {
    let request = ReadRequest {
        selection: selection.clone(),
        ..ReadRequest::new()
    };
    let ids: Vec<Value> = tx
        .select(ITEMS_TABLE, &request)?
        .into_iter()
        .filter_map(|mut row| row.remove(COLUMN_ITEM_ID))
        .collect();

    let deleted = tx.delete(ITEMS_TABLE, selection)?;
    for id in ids {
        tx.delete(CHILDREN_TABLE, &by_column(COLUMN_ITEM_ID, id))?;
    }
    Ok(deleted)
}

/// Adapts the catalog store to [`LocalReplica`].
#[derive(Debug, Clone)]
pub struct CatalogReplica {
    store: Arc<OpenHelper<CatalogSchema>>,
}

impl CatalogReplica {
    /// Creates a replica over `store`.
    pub fn new(store: Arc<OpenHelper<CatalogSchema>>) -> Self {
        Self { store }
    }
}

impl LocalReplica for CatalogReplica {
    fn listing(&self) -> FetchResult<Listing> {
        let db = self.store.database().map_err(FetchError::local)?;

        let version = db
            .select(
                VERSION_TABLE,
                &ReadRequest {
                    selection: by_column(COLUMN_TYPE, Value::from(LISTING_VERSION_TYPE)),
                    ..ReadRequest::new()
                },
            )
            .map_err(FetchError::local)?
            .into_iter()
            .next()
            .and_then(|row| row.get(COLUMN_VERSION).and_then(Value::as_text).map(str::to_string));

        let mut listing = Listing::new(version);
        let request = ReadRequest::new().with_projection([COLUMN_KEY, COLUMN_FINGERPRINT]);
        for row in db.select(ITEMS_TABLE, &request).map_err(FetchError::local)? {
            let key = row.get(COLUMN_KEY).and_then(Value::as_text);
            let fingerprint = row.get(COLUMN_FINGERPRINT).and_then(Value::as_text);
            if let (Some(key), Some(fingerprint)) = (key, fingerprint) {
                listing.insert(
                    key,
                    Entry {
                        fingerprint: fingerprint.to_string(),
                        payload: Json::Null,
                    },
                );
            }
        }
        Ok(listing)
    }

    fn apply(&self, changes: &ChangeSet) -> FetchResult<()> {
        let mut decoded = Vec::with_capacity(changes.inserts.len() + changes.updates.len());
        for (key, entry) in changes.inserts.iter().chain(&changes.updates) {
            decoded.push((key.as_str(), decode_entry(key, entry)?));
        }

        let db = self.store.database().map_err(FetchError::local)?;
        db.transaction(|tx| {
            for key in &changes.deletes {
                delete_items(tx, &by_column(COLUMN_KEY, Value::from(key.as_str())))?;
            }

            for (key, rows) in &decoded {
                delete_items(tx, &by_column(COLUMN_KEY, Value::from(*key)))?;
                tx.delete(
                    CHILDREN_TABLE,
                    &by_column(COLUMN_ITEM_ID, Value::Integer(rows.item_id)),
                )?;
                tx.upsert(ITEMS_TABLE, rows.item.clone())?;
                for child in &rows.children {
                    tx.upsert(CHILDREN_TABLE, child.clone())?;
                }
            }

            let version_key = by_column(COLUMN_TYPE, Value::from(LISTING_VERSION_TYPE));
            tx.delete(VERSION_TABLE, &version_key)?;
            if let Some(version) = &changes.version {
                let mut row = Values::new();
                row.insert(COLUMN_TYPE.into(), Value::from(LISTING_VERSION_TYPE));
                row.insert(COLUMN_VERSION.into(), Value::from(version.as_str()));
                tx.insert(VERSION_TABLE, row)?;
            }
            Ok(())
        })
        .map_err(FetchError::local)?;

        debug!(
            inserts = changes.inserts.len(),
            updates = changes.updates.len(),
            deletes = changes.deletes.len(),
            "applied catalog changes"
        );
        Ok(())
    }
}
