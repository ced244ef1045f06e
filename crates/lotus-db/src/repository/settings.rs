//! Store settings repository. A singleton row, written with upsert
//! semantics so the first save creates it and later saves replace it.

use sqlx::SqlitePool;

use crate::error::DbResult;
use lotus_core::{NewStoreSettings, StoreSettings};

const SETTINGS_COLUMNS: &str =
    "id, store_name, address, phone, email, currency_symbol, opening_hours";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns the settings row if one has been saved yet.
    pub async fn get(&self) -> DbResult<Option<StoreSettings>> {
        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM store_settings WHERE id = 1");

        Ok(sqlx::query_as::<_, StoreSettings>(&sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Creates or replaces the singleton settings row.
    pub async fn upsert(&self, draft: NewStoreSettings) -> DbResult<StoreSettings> {
        sqlx::query(
            "INSERT INTO store_settings \
             (id, store_name, address, phone, email, currency_symbol, opening_hours) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
             store_name = excluded.store_name, address = excluded.address, \
             phone = excluded.phone, email = excluded.email, \
             currency_symbol = excluded.currency_symbol, \
             opening_hours = excluded.opening_hours",
        )
        .bind(&draft.store_name)
        .bind(&draft.address)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.currency_symbol)
        .bind(&draft.opening_hours)
        .execute(&self.pool)
        .await?;

        Ok(StoreSettings {
            id: 1,
            store_name: draft.store_name,
            address: draft.address,
            phone: draft.phone,
            email: draft.email,
            currency_symbol: draft.currency_symbol,
            opening_hours: draft.opening_hours,
        })
    }
}
