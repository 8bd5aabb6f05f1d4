//! SQLite database layer (embedded, no external dependencies)

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use starlog_types::{Favorite, FavoriteKind, Person, Planet, UnknownFavoriteKind, User};
use std::str::FromStr;
use std::sync::Arc;

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        if let Some(parent) = std::path::Path::new(database_path).parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        tracing::info!("SQLite connection established, running migrations...");

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS people (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                species TEXT,
                homeworld TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS planets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                climate TEXT,
                terrain TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        // item_id is deliberately not a foreign key: it points at a person
        // or a planet depending on item_type, and a deleted target leaves
        // the favorite dangling. user_id does cascade.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS favorites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                item_type TEXT NOT NULL,
                item_id INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // User operations

    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, is_active)
            VALUES (?1, ?2, 1)
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .execute(&*self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, is_active FROM users WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, is_active FROM users WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, is_active FROM users
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    // Person operations

    pub async fn list_people(&self) -> Result<Vec<Person>> {
        let rows: Vec<PersonRow> = sqlx::query_as(
            r#"
            SELECT id, name, species, homeworld FROM people
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn get_person(&self, id: i64) -> Result<Option<Person>> {
        let row: Option<PersonRow> = sqlx::query_as(
            r#"
            SELECT id, name, species, homeworld FROM people WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    pub async fn create_person(
        &self,
        name: &str,
        species: Option<&str>,
        homeworld: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO people (name, species, homeworld)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(name)
        .bind(species)
        .bind(homeworld)
        .execute(&*self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Partial update: a `None` field keeps the stored value.
    pub async fn update_person(
        &self,
        id: i64,
        name: Option<&str>,
        species: Option<&str>,
        homeworld: Option<&str>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE people
            SET name = COALESCE(?1, name),
                species = COALESCE(?2, species),
                homeworld = COALESCE(?3, homeworld)
            WHERE id = ?4
            "#,
        )
        .bind(name)
        .bind(species)
        .bind(homeworld)
        .bind(id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_person(&self, id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM people WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // Planet operations

    pub async fn list_planets(&self) -> Result<Vec<Planet>> {
        let rows: Vec<PlanetRow> = sqlx::query_as(
            r#"
            SELECT id, name, climate, terrain FROM planets
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn get_planet(&self, id: i64) -> Result<Option<Planet>> {
        let row: Option<PlanetRow> = sqlx::query_as(
            r#"
            SELECT id, name, climate, terrain FROM planets WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    pub async fn create_planet(
        &self,
        name: &str,
        climate: Option<&str>,
        terrain: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO planets (name, climate, terrain)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(name)
        .bind(climate)
        .bind(terrain)
        .execute(&*self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Partial update: a `None` field keeps the stored value.
    pub async fn update_planet(
        &self,
        id: i64,
        name: Option<&str>,
        climate: Option<&str>,
        terrain: Option<&str>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE planets
            SET name = COALESCE(?1, name),
                climate = COALESCE(?2, climate),
                terrain = COALESCE(?3, terrain)
            WHERE id = ?4
            "#,
        )
        .bind(name)
        .bind(climate)
        .bind(terrain)
        .bind(id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_planet(&self, id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM planets WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // Favorite operations

    pub async fn find_favorite(
        &self,
        user_id: i64,
        kind: FavoriteKind,
        item_id: i64,
    ) -> Result<Option<Favorite>> {
        let row: Option<FavoriteRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, item_type, item_id FROM favorites
            WHERE user_id = ?1 AND item_type = ?2 AND item_id = ?3
            "#,
        )
        .bind(user_id)
        .bind(kind.to_string())
        .bind(item_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.map(Favorite::try_from).transpose().map_err(Into::into)
    }

    /// Insert a favorite unless the (user, kind, item) triple already
    /// exists. The duplicate check and the insert run in one transaction,
    /// so two concurrent requests cannot both insert. Returns the new row
    /// id, or `None` if the favorite was already present.
    pub async fn create_favorite(
        &self,
        user_id: i64,
        kind: FavoriteKind,
        item_id: i64,
    ) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM favorites
            WHERE user_id = ?1 AND item_type = ?2 AND item_id = ?3
            "#,
        )
        .bind(user_id)
        .bind(kind.to_string())
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Ok(None);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, item_type, item_id)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(user_id)
        .bind(kind.to_string())
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(result.last_insert_rowid()))
    }

    pub async fn list_favorites(&self, user_id: i64) -> Result<Vec<Favorite>> {
        let rows: Vec<FavoriteRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, item_type, item_id FROM favorites
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| match Favorite::try_from(r) {
                Ok(fav) => Some(fav),
                Err(e) => {
                    tracing::warn!("Skipping favorite with bad item_type: {}", e);
                    None
                }
            })
            .collect())
    }

    pub async fn delete_favorite(
        &self,
        user_id: i64,
        kind: FavoriteKind,
        item_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM favorites
            WHERE user_id = ?1 AND item_type = ?2 AND item_id = ?3
            "#,
        )
        .bind(user_id)
        .bind(kind.to_string())
        .bind(item_id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            is_active: r.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PersonRow {
    id: i64,
    name: String,
    species: Option<String>,
    homeworld: Option<String>,
}

impl From<PersonRow> for Person {
    fn from(r: PersonRow) -> Self {
        Person {
            id: r.id,
            name: r.name,
            species: r.species,
            homeworld: r.homeworld,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlanetRow {
    id: i64,
    name: String,
    climate: Option<String>,
    terrain: Option<String>,
}

impl From<PlanetRow> for Planet {
    fn from(r: PlanetRow) -> Self {
        Planet {
            id: r.id,
            name: r.name,
            climate: r.climate,
            terrain: r.terrain,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    id: i64,
    user_id: i64,
    item_type: String,
    item_id: i64,
}

impl TryFrom<FavoriteRow> for Favorite {
    type Error = UnknownFavoriteKind;

    fn try_from(r: FavoriteRow) -> Result<Self, Self::Error> {
        Ok(Favorite {
            id: r.id,
            user_id: r.user_id,
            kind: FavoriteKind::from_str(&r.item_type)?,
            item_id: r.item_id,
        })
    }
}
