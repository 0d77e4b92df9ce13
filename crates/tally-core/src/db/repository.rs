//! Keyed CRUD over the local store tables

use libsql::{Connection, Value};

use super::{LocalStore, StoreKey, StoredRow, Table};
use crate::error::{Error, Result};

impl LocalStore {
    /// Upsert a row keyed by its table's primary key.
    ///
    /// Rows without a key are appended to auto-increment tables; the
    /// assigned key is written back into the stored JSON and returned.
    pub async fn put<T: StoredRow>(&self, row: &T) -> Result<StoreKey> {
        let conn = self.conn().await?;
        put_row(&conn, row).await
    }

    /// Fetch one row by primary key
    pub async fn get<T: StoredRow>(&self, key: impl Into<StoreKey>) -> Result<Option<T>> {
        let table = T::TABLE;
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT data FROM {} WHERE {} = ?",
                    table.name(),
                    table.primary_key()
                ),
                vec![Value::from(key.into())],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(decode(&row.get::<String>(0)?)?)),
            None => Ok(None),
        }
    }

    /// Fetch every row of a table in [`Table::order_by`] order
    pub async fn get_all<T: StoredRow>(&self) -> Result<Vec<T>> {
        let table = T::TABLE;
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT data FROM {} ORDER BY {}",
                    table.name(),
                    table.order_by()
                ),
                (),
            )
            .await?;
        collect(rows).await
    }

    /// Fetch rows whose secondary index column equals `value`
    pub async fn get_all_by_index<T: StoredRow>(
        &self,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<T>> {
        let table = T::TABLE;
        let column = table
            .index_columns()
            .iter()
            .find(|candidate| **candidate == column)
            .ok_or_else(|| {
                Error::InvalidInput(format!("{} has no index on '{column}'", table.name()))
            })?;

        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT data FROM {} WHERE {column} = ? ORDER BY {}",
                    table.name(),
                    table.order_by()
                ),
                vec![value.into()],
            )
            .await?;
        collect(rows).await
    }

    /// Delete one row by primary key; returns whether a row was removed
    pub async fn delete<T: StoredRow>(&self, key: impl Into<StoreKey>) -> Result<bool> {
        let table = T::TABLE;
        let conn = self.conn().await?;
        let affected = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?",
                    table.name(),
                    table.primary_key()
                ),
                vec![Value::from(key.into())],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Remove every row of a table
    pub async fn clear(&self, table: Table) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(&format!("DELETE FROM {}", table.name()), ())
            .await?;
        Ok(())
    }

    /// Number of rows in a table
    pub async fn count(&self, table: Table) -> Result<usize> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(&format!("SELECT COUNT(*) FROM {}", table.name()), ())
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|error| Error::Database(error.to_string()))
    }

    /// Replace a table's contents with `rows` (clear-then-insert).
    ///
    /// Runs in a transaction scoped to this one table.
    pub async fn replace_all<T: StoredRow>(&self, rows: &[T]) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            conn.execute(&format!("DELETE FROM {}", T::TABLE.name()), ())
                .await?;
            for row in rows {
                put_row(&conn, row).await?;
            }
            Ok::<(), Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(())
            }
            Err(e) => {
                conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }
}

async fn put_row<T: StoredRow>(conn: &Connection, row: &T) -> Result<StoreKey> {
    let table = T::TABLE;
    let data = serde_json::to_string(row)?;
    let index_columns = table.index_columns();
    let index_values = row.index_values();
    if index_values.len() != index_columns.len() {
        return Err(Error::Database(format!(
            "{} expects {} index values, got {}",
            table.name(),
            index_columns.len(),
            index_values.len()
        )));
    }

    match row.key() {
        Some(key) => {
            let columns = std::iter::once(table.primary_key())
                .chain(index_columns.iter().copied())
                .chain(std::iter::once("data"))
                .collect::<Vec<_>>();
            let placeholders = vec!["?"; columns.len()].join(", ");

            let mut params = Vec::with_capacity(columns.len());
            params.push(Value::from(key.clone()));
            params.extend(index_values);
            params.push(Value::Text(data));

            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
                    table.name(),
                    columns.join(", ")
                ),
                params,
            )
            .await?;
            Ok(key)
        }
        None if table.is_auto_increment() => {
            let columns = index_columns
                .iter()
                .copied()
                .chain(std::iter::once("data"))
                .collect::<Vec<_>>();
            let placeholders = vec!["?"; columns.len()].join(", ");

            let mut params = index_values;
            params.push(Value::Text(data));

            conn.execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES ({placeholders})",
                    table.name(),
                    columns.join(", ")
                ),
                params,
            )
            .await?;

            let id = conn.last_insert_rowid();
            conn.execute(
                &format!(
                    "UPDATE {} SET data = json_set(data, '$.{pk}', ?1) WHERE {pk} = ?1",
                    table.name(),
                    pk = table.primary_key()
                ),
                vec![Value::Integer(id)],
            )
            .await?;
            Ok(StoreKey::Integer(id))
        }
        None => Err(Error::InvalidInput(format!(
            "{} rows require a primary key",
            table.name()
        ))),
    }
}

async fn collect<T: StoredRow>(mut rows: libsql::Rows) -> Result<Vec<T>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next().await? {
        items.push(decode(&row.get::<String>(0)?)?);
    }
    Ok(items)
}

fn decode<T: StoredRow>(data: &str) -> Result<T> {
    Ok(serde_json::from_str(data)?)
}
