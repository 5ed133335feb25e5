use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database operation failed: {0}")]
    DatabaseFailed(#[from] sqlx::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FavoriteCity {
    pub id: String,
    pub name: String,
    pub aqi: i64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppSettings {
    pub theme: String,
    pub units: String,
    pub language: String,
    pub notifications: bool,
    pub auto_refresh: bool,
    pub refresh_interval_minutes: i64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            units: "metric".to_string(),
            language: "en".to_string(),
            notifications: true,
            auto_refresh: true,
            refresh_interval_minutes: 15,
        }
    }
}

/// Partial settings update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettingsUpdate {
    pub theme: Option<String>,
    pub units: Option<String>,
    pub language: Option<String>,
    pub notifications: Option<bool>,
    pub auto_refresh: Option<bool>,
    pub refresh_interval_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchHistoryItem {
    pub city: String,
    pub searched_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: String,
    pub email: String,
    pub subscribed_at: chrono::DateTime<Utc>,
    pub active: bool,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionSource {
    Overlay,
    Manual,
}

impl SubscriptionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionSource::Overlay => "overlay",
            SubscriptionSource::Manual => "manual",
        }
    }
}

const LAST_SEARCHED_KEY: &str = "last_searched_city";
const SUBSCRIBED_KEY: &str = "subscribed";
const SEARCH_HISTORY_LIMIT: i64 = 10;

/// Persisted user preferences: favorites, last searched city, search history,
/// and app settings. Reads degrade to defaults when storage is unavailable so
/// the dashboard keeps rendering.
pub struct PreferencesStore {
    pool: SqlitePool,
}

impl PreferencesStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_tables(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS favorites (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                aqi INTEGER NOT NULL,
                last_updated TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                theme TEXT NOT NULL,
                units TEXT NOT NULL,
                language TEXT NOT NULL,
                notifications INTEGER NOT NULL,
                auto_refresh INTEGER NOT NULL,
                refresh_interval_minutes INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS search_history (
                city TEXT NOT NULL,
                searched_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_favorites(&self) -> Vec<FavoriteCity> {
        let result = sqlx::query_as::<_, FavoriteCity>(
            "SELECT id, name, aqi, last_updated FROM favorites ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(favorites) => favorites,
            Err(error) => {
                tracing::warn!(error = %error, "failed to load favorites");
                Vec::new()
            }
        }
    }

    pub async fn save_favorites(&self, favorites: &[FavoriteCity]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM favorites")
            .execute(&mut *tx)
            .await?;

        for favorite in favorites {
            sqlx::query(
                "INSERT INTO favorites (id, name, aqi, last_updated) VALUES (?, ?, ?, ?)",
            )
            .bind(&favorite.id)
            .bind(&favorite.name)
            .bind(favorite.aqi)
            .bind(&favorite.last_updated)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_last_searched_city(&self) -> Option<String> {
        let result = sqlx::query_scalar::<_, String>(
            "SELECT value FROM app_state WHERE key = ?",
        )
        .bind(LAST_SEARCHED_KEY)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(city) => city.filter(|c| !c.trim().is_empty()),
            Err(error) => {
                tracing::warn!(error = %error, "failed to load last searched city");
                None
            }
        }
    }

    pub async fn save_last_searched_city(&self, city: &str) -> Result<(), StorageError> {
        let city = city.trim();
        if city.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO app_state (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(LAST_SEARCHED_KEY)
        .bind(city)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn clear_last_searched_city(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM app_state WHERE key = ?")
            .bind(LAST_SEARCHED_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_settings(&self) -> AppSettings {
        let result = sqlx::query_as::<_, AppSettings>(
            r#"
            SELECT theme, units, language, notifications, auto_refresh, refresh_interval_minutes
            FROM settings WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(settings)) => settings,
            Ok(None) => AppSettings::default(),
            Err(error) => {
                tracing::warn!(error = %error, "failed to load settings");
                AppSettings::default()
            }
        }
    }

    pub async fn save_settings(
        &self,
        update: AppSettingsUpdate,
    ) -> Result<AppSettings, StorageError> {
        let current = self.get_settings().await;
        let merged = AppSettings {
            theme: update.theme.unwrap_or(current.theme),
            units: update.units.unwrap_or(current.units),
            language: update.language.unwrap_or(current.language),
            notifications: update.notifications.unwrap_or(current.notifications),
            auto_refresh: update.auto_refresh.unwrap_or(current.auto_refresh),
            refresh_interval_minutes: update
                .refresh_interval_minutes
                .unwrap_or(current.refresh_interval_minutes),
        };

        sqlx::query(
            r#"
            INSERT INTO settings (id, theme, units, language, notifications, auto_refresh, refresh_interval_minutes)
            VALUES (1, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                theme = excluded.theme,
                units = excluded.units,
                language = excluded.language,
                notifications = excluded.notifications,
                auto_refresh = excluded.auto_refresh,
                refresh_interval_minutes = excluded.refresh_interval_minutes
            "#,
        )
        .bind(&merged.theme)
        .bind(&merged.units)
        .bind(&merged.language)
        .bind(merged.notifications)
        .bind(merged.auto_refresh)
        .bind(merged.refresh_interval_minutes)
        .execute(&self.pool)
        .await?;

        Ok(merged)
    }

    pub async fn add_to_search_history(&self, city: &str) -> Result<(), StorageError> {
        let city = city.trim();
        if city.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM search_history WHERE LOWER(city) = LOWER(?)")
            .bind(city)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO search_history (city, searched_at) VALUES (?, ?)")
            .bind(city)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            DELETE FROM search_history WHERE rowid NOT IN (
                SELECT rowid FROM search_history ORDER BY searched_at DESC, rowid DESC LIMIT ?
            )
            "#,
        )
        .bind(SEARCH_HISTORY_LIMIT)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_search_history(&self) -> Vec<SearchHistoryItem> {
        let result = sqlx::query_as::<_, SearchHistoryItem>(
            "SELECT city, searched_at FROM search_history ORDER BY searched_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(history) => history,
            Err(error) => {
                tracing::warn!(error = %error, "failed to load search history");
                Vec::new()
            }
        }
    }

    pub async fn clear_search_history(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM search_history")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Email subscription records plus the current session's subscribed flag.
pub struct SubscriptionStore {
    pool: SqlitePool,
}

impl SubscriptionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_tables(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                subscribed_at TEXT NOT NULL,
                active INTEGER NOT NULL,
                source TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adds (or reactivates) a subscription and marks the session subscribed.
    pub async fn add_subscription(
        &self,
        email: &str,
        source: SubscriptionSource,
    ) -> Result<(), StorageError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(StorageError::InvalidData(format!(
                "invalid email address: {}",
                email
            )));
        }

        let existing = sqlx::query_as::<_, Subscription>(
            "SELECT id, email, subscribed_at, active, source FROM subscriptions WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(subscription) if subscription.active => {}
            Some(_) => {
                sqlx::query(
                    "UPDATE subscriptions SET active = 1, subscribed_at = ? WHERE email = ?",
                )
                .bind(Utc::now())
                .bind(&email)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO subscriptions (id, email, subscribed_at, active, source)
                    VALUES (?, ?, ?, 1, ?)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&email)
                .bind(Utc::now())
                .bind(source.as_str())
                .execute(&self.pool)
                .await?;
            }
        }

        self.set_subscription_status(true).await
    }

    pub async fn is_email_subscribed(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT active FROM subscriptions WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(active) => active.unwrap_or(false),
            Err(error) => {
                tracing::warn!(error = %error, "failed to check subscription");
                false
            }
        }
    }

    pub async fn get_subscription_status(&self) -> bool {
        let result = sqlx::query_scalar::<_, String>(
            "SELECT value FROM app_state WHERE key = ?",
        )
        .bind(SUBSCRIBED_KEY)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(value) => value.as_deref() == Some("true"),
            Err(error) => {
                tracing::warn!(error = %error, "failed to load subscription status");
                false
            }
        }
    }

    pub async fn set_subscription_status(&self, subscribed: bool) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO app_state (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(SUBSCRIBED_KEY)
        .bind(if subscribed { "true" } else { "false" })
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && email.len() > 5
        && email.len() < 255
}
