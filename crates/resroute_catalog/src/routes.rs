//! The catalog route table.
//!
//! ```text
//! /<root>/items                                        read
//! /<root>/items/sync                                   create {force}
//! /<root>/items/{name:*}                               read, update, delete
//! /<root>/items/{item_id:#}                            read, update, delete
//! /<root>/items/{name|item_id}/children                read
//! /<root>/items/{name|item_id}/children/{child_id:#}   read
//! ```

use crate::replica::{by_column, delete_items};
use crate::schema::{
    CatalogSchema, CHILDREN_TABLE, COLUMN_CHILD_ID, COLUMN_ITEM_ID, COLUMN_NAME, ITEMS_TABLE,
};
use resroute_core::{
    CoreError, CoreResult, ReadRequest, ResultSet, RouteBuilder, RouteTree, SegmentId, Selection,
    Values,
};
use resroute_storage::{OpenHelper, StorageResult, Transaction};
use resroute_sync::Syncable;
use std::sync::Arc;
use tracing::info;

type Store = Arc<OpenHelper<CatalogSchema>>;

fn read_table(
    store: &Store,
    table: &'static str,
) -> impl Fn(&ReadRequest) -> CoreResult<ResultSet> + Send + Sync + 'static {
    let store = Arc::clone(store);
    move |request: &ReadRequest| {
        let db = store.database().map_err(CoreError::handler)?;
        db.select(table, request).map_err(CoreError::handler)
    }
}

fn update_items(tx: &mut Transaction, values: &Values, selection: &Selection) -> StorageResult<u64> {
    let request = ReadRequest {
        selection: selection.clone(),
        ..ReadRequest::new().with_projection([COLUMN_ITEM_ID])
    };
    let ids: Vec<_> = tx
        .select(ITEMS_TABLE, &request)?
        .into_iter()
        .filter_map(|mut row| row.remove(COLUMN_ITEM_ID))
        .collect();

    let updated = tx.update(ITEMS_TABLE, values, selection)?;

    // Children carry copies of their item's name and id
    let shared: Values = [COLUMN_NAME, COLUMN_ITEM_ID]
        .into_iter()
        .filter_map(|column| values.get(column).map(|v| (column.to_string(), v.clone())))
        .collect();
    if !shared.is_empty() {
        for id in ids {
            tx.update(CHILDREN_TABLE, &shared, &by_column(COLUMN_ITEM_ID, id))?;
        }
    }

    Ok(updated)
}

fn add_item_routes(builder: &mut RouteBuilder, item: SegmentId, store: &Store) {
    builder.on_read(item, read_table(store, ITEMS_TABLE));

    let update_store = Arc::clone(store);
    builder.on_update(item, move |values, selection| {
        let db = update_store.database().map_err(CoreError::handler)?;
        db.transaction(|tx| update_items(tx, values, selection))
            .map_err(CoreError::handler)
    });

    let delete_store = Arc::clone(store);
    builder.on_delete(item, move |selection| {
        let db = delete_store.database().map_err(CoreError::handler)?;
        db.transaction(|tx| delete_items(tx, selection))
            .map_err(CoreError::handler)
    });

    let children = builder.add_segment("children", Some(item));
    builder.on_read(children, read_table(store, CHILDREN_TABLE));

    let child = builder.add_segment(&RouteBuilder::numeric_variable(COLUMN_CHILD_ID), Some(children));
    builder.on_read(child, read_table(store, CHILDREN_TABLE));
}

/// Builds the catalog routes under `/<root>`.
pub(crate) fn build_routes(
    root: &str,
    store: &Store,
    syncer: Arc<dyn Syncable + Send + Sync>,
) -> RouteTree {
    let mut builder = RouteBuilder::new();
    let root = builder.add_segment(root, None);

    let items = builder.add_segment("items", Some(root));
    builder.on_read(items, read_table(store, ITEMS_TABLE));

    let by_name = builder.add_segment(&RouteBuilder::text_variable(COLUMN_NAME), Some(items));
    add_item_routes(&mut builder, by_name, store);
    let by_id = builder.add_segment(&RouteBuilder::numeric_variable(COLUMN_ITEM_ID), Some(items));
    add_item_routes(&mut builder, by_id, store);

    let sync = builder.add_segment("sync", Some(items));
    builder.on_create(sync, move |values| {
        let force = values
            .get("force")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let result = syncer.sync(force);
        info!(force, errors = result.error_count(), "sync requested through route");
        Ok(if result.has_errors() { -1 } else { 1 })
    });

    builder.build()
}
