//! Transactional table store.

use crate::error::{StorageError, StorageResult};
use crate::predicate::Filter;
use parking_lot::Mutex;
use resroute_core::{ReadRequest, Selection, Value, Values};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Declares a table's columns and primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Column names. Rows may only carry declared columns.
    pub columns: Vec<String>,
    /// Columns forming the primary key (none when empty).
    pub primary_key: Vec<String>,
}

impl TableSpec {
    /// Declares the given columns with no primary key.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            primary_key: Vec::new(),
        }
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Table {
    spec: TableSpec,
    rows: Vec<Values>,
}

impl Table {
    fn key_of(&self, row: &Values) -> Option<Vec<Value>> {
        if self.spec.primary_key.is_empty() {
            return None;
        }
        Some(
            self.spec
                .primary_key
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }

    fn position_of_key(&self, key: &[Value]) -> Option<usize> {
        self.rows
            .iter()
            .position(|existing| self.key_of(existing).as_deref() == Some(key))
    }

    fn check_columns(&self, name: &str, row: &Values) -> StorageResult<()> {
        match row.keys().find(|c| !self.spec.columns.contains(c)) {
            Some(unknown) => Err(StorageError::Constraint {
                table: name.to_string(),
                message: format!("unknown column {unknown}"),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct State {
    user_version: u32,
    tables: BTreeMap<String, Table>,
}

impl State {
    fn table(&self, name: &str) -> StorageResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StorageError::NoSuchTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> StorageResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StorageError::NoSuchTable(name.to_string()))
    }

    fn select(&self, name: &str, request: &ReadRequest) -> StorageResult<Vec<Values>> {
        if request.grouping.is_some() || request.having.is_some() {
            return Err(StorageError::Unsupported("grouping/having".into()));
        }

        let table = self.table(name)?;
        let filter = Filter::compile(&request.selection)?;
        let mut rows: Vec<Values> = table
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();

        if let Some(sort) = request.sort.as_deref() {
            let (column, descending) = parse_sort(sort)?;
            rows.sort_by(|a, b| {
                let ord = compare(a.get(column), b.get(column));
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(projection) = &request.projection {
            for row in &mut rows {
                row.retain(|column, _| projection.contains(column));
            }
        }

        Ok(rows)
    }
}

fn parse_sort(sort: &str) -> StorageResult<(&str, bool)> {
    let mut parts = sort.split_whitespace();
    let column = parts
        .next()
        .ok_or_else(|| StorageError::Unsupported(format!("sort '{sort}'")))?;
    let descending = match parts.next().map(str::to_ascii_uppercase).as_deref() {
        None | Some("ASC") => false,
        Some("DESC") => true,
        Some(_) => return Err(StorageError::Unsupported(format!("sort '{sort}'"))),
    };
    if parts.next().is_some() {
        return Err(StorageError::Unsupported(format!("sort '{sort}'")));
    }
    Ok((column, descending))
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Integer(_)) => 2,
        Some(Value::Text(_)) => 3,
        Some(Value::Bytes(_)) => 4,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Integer(x)), Some(Value::Integer(y))) => x.cmp(y),
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        (Some(Value::Bytes(x)), Some(Value::Bytes(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A transactional store of tables.
///
/// All tables, rows and the schema version (`user_version`) live behind one
/// mutex. A database is either purely in memory or backed by a JSON snapshot
/// file that is rewritten on every commit.
///
/// # Example
///
/// ```rust
/// use resroute_core::{ReadRequest, Value, Values};
/// use resroute_storage::{Database, TableSpec};
///
/// let db = Database::in_memory();
/// db.transaction(|tx| {
///     tx.create_table("items", TableSpec::new(["id", "name"]).with_primary_key(["id"]))?;
///     let mut row = Values::new();
///     row.insert("id".into(), Value::from(1i64));
///     row.insert("name".into(), Value::from("Ahri"));
///     tx.insert("items", row)
/// })
/// .unwrap();
///
/// let rows = db.select("items", &ReadRequest::new()).unwrap();
/// assert_eq!(rows.len(), 1);
/// ```
#[derive(Debug)]
pub struct Database {
    path: Option<PathBuf>,
    state: Mutex<State>,
}

impl Database {
    /// Creates an empty in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Opens a file-backed database, loading the snapshot if it exists.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the snapshot
    /// cannot be read or decoded.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let state = if path.exists() {
            let bytes = std::fs::read(path)?;
            serde_json::from_slice(&bytes)?
        } else {
            State::default()
        };

        debug!(path = %path.display(), "opened database");
        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(state),
        })
    }

    /// Returns the snapshot path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the stored schema version.
    pub fn user_version(&self) -> u32 {
        self.state.lock().user_version
    }

    /// Returns the names of all tables.
    pub fn table_names(&self) -> Vec<String> {
        self.state.lock().tables.keys().cloned().collect()
    }

    /// Reads rows from `table`.
    ///
    /// Honors the request's selection, projection and sort. Grouping and
    /// having are rejected as unsupported.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or the request cannot be
    /// evaluated.
    pub fn select(&self, table: &str, request: &ReadRequest) -> StorageResult<Vec<Values>> {
        self.state.lock().select(table, request)
    }

    /// Runs `f` inside a transaction.
    ///
    /// The closure works on a copy of the current state. If it returns `Ok`
    /// the copy becomes the new state (and is written to the snapshot file);
    /// if it returns `Err` the copy is discarded. Transactions are
    /// serialized.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or an I/O error if the snapshot cannot
    /// be written. In both cases the previous state is kept.
    pub fn transaction<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Transaction) -> StorageResult<T>,
    {
        let mut guard = self.state.lock();
        let mut tx = Transaction {
            state: guard.clone(),
        };

        match f(&mut tx) {
            Ok(value) => {
                if let Some(path) = &self.path {
                    persist(path, &tx.state)?;
                }
                *guard = tx.state;
                debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}

fn persist(path: &Path, state: &State) -> StorageResult<()> {
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec(state)?;
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// A working copy of the database inside [`Database::transaction`].
#[derive(Debug)]
pub struct Transaction {
    state: State,
}

impl Transaction {
    /// Returns the schema version as of this transaction.
    pub fn user_version(&self) -> u32 {
        self.state.user_version
    }

    /// Sets the schema version.
    pub fn set_user_version(&mut self, version: u32) {
        self.state.user_version = version;
    }

    /// Returns true if `table` exists.
    pub fn has_table(&self, table: &str) -> bool {
        self.state.tables.contains_key(table)
    }

    /// Creates a table.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TableExists`] if the name is taken.
    pub fn create_table(&mut self, table: &str, spec: TableSpec) -> StorageResult<()> {
        if self.has_table(table) {
            return Err(StorageError::TableExists(table.to_string()));
        }
        debug!(table, "creating table");
        self.state.tables.insert(
            table.to_string(),
            Table {
                spec,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    /// Drops a table and all its rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchTable`] if the table does not exist.
    pub fn drop_table(&mut self, table: &str) -> StorageResult<()> {
        self.state
            .tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StorageError::NoSuchTable(table.to_string()))
    }

    /// Inserts a row.
    ///
    /// # Errors
    ///
    /// Returns a constraint error for unknown columns or a duplicate key.
    pub fn insert(&mut self, table: &str, row: Values) -> StorageResult<()> {
        let t = self.state.table_mut(table)?;
        t.check_columns(table, &row)?;

        if let Some(key) = t.key_of(&row) {
            if t.position_of_key(&key).is_some() {
                return Err(StorageError::Constraint {
                    table: table.to_string(),
                    message: format!("duplicate key {key:?}"),
                });
            }
        }

        t.rows.push(row);
        Ok(())
    }

    /// Inserts a row, replacing any row with the same primary key.
    ///
    /// Returns true if an existing row was replaced.
    ///
    /// # Errors
    ///
    /// Returns a constraint error for unknown columns or a table without a
    /// primary key.
    pub fn upsert(&mut self, table: &str, row: Values) -> StorageResult<bool> {
        let t = self.state.table_mut(table)?;
        t.check_columns(table, &row)?;

        let key = t.key_of(&row).ok_or_else(|| StorageError::Constraint {
            table: table.to_string(),
            message: "upsert requires a primary key".into(),
        })?;

        match t.position_of_key(&key) {
            Some(index) => {
                t.rows[index] = row;
                Ok(true)
            }
            None => {
                t.rows.push(row);
                Ok(false)
            }
        }
    }

    /// Sets `values` on every row matching `selection`.
    ///
    /// Returns the number of updated rows.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown columns or an invalid selection, and a
    /// constraint error if the update would give two rows the same primary
    /// key. The table is left untouched on error.
    pub fn update(
        &mut self,
        table: &str,
        values: &Values,
        selection: &Selection,
    ) -> StorageResult<u64> {
        let filter = Filter::compile(selection)?;
        let t = self.state.table_mut(table)?;
        t.check_columns(table, values)?;

        let mut rows = t.rows.clone();
        let mut changed = Vec::new();
        for (index, row) in rows.iter_mut().enumerate() {
            if filter.matches(row) {
                row.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
                changed.push(index);
            }
        }

        if t.spec.primary_key.iter().any(|c| values.contains_key(c)) {
            for &index in &changed {
                let key = t.key_of(&rows[index]);
                let duplicate = rows
                    .iter()
                    .enumerate()
                    .any(|(other, row)| other != index && t.key_of(row) == key);
                if duplicate {
                    return Err(StorageError::Constraint {
                        table: table.to_string(),
                        message: format!("duplicate key {key:?}"),
                    });
                }
            }
        }

        t.rows = rows;
        Ok(changed.len() as u64)
    }

    /// Deletes every row matching `selection`.
    ///
    /// Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or the selection is
    /// invalid.
    pub fn delete(&mut self, table: &str, selection: &Selection) -> StorageResult<u64> {
        let filter = Filter::compile(selection)?;
        let t = self.state.table_mut(table)?;

        let before = t.rows.len();
        t.rows.retain(|row| !filter.matches(row));
        Ok((before - t.rows.len()) as u64)
    }

    /// Reads rows as of this transaction.
    ///
    /// # Errors
    ///
    /// See [`Database::select`].
    pub fn select(&self, table: &str, request: &ReadRequest) -> StorageResult<Vec<Values>> {
        self.state.select(table, request)
    }
}
