use crate::{
    error::RepositoryError,
    models::{Comic, ComicRow, ComicWithOwner, NewComic, OwnerSummary, User},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::{
    cmp::Ordering,
    sync::{Arc, RwLock},
};
use uuid::Uuid;

/// ComicFilter
///
/// The row predicate the listing endpoint hands to the store. Produced only by
/// `comics::ListingIntent::filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComicFilter {
    /// `is_public = true`.
    PublicOnly,
    /// `user_id = <id>`, regardless of visibility.
    Owner(Uuid),
}

impl ComicFilter {
    pub fn matches(&self, comic: &Comic) -> bool {
        match self {
            ComicFilter::PublicOnly => comic.is_public,
            ComicFilter::Owner(owner_id) => comic.owner_id == *owner_id,
        }
    }
}

/// Repository Trait
///
/// Abstract contract for every persistence operation the service needs. Handlers only
/// see `Arc<dyn Repository>`, so Postgres and the in-memory store are interchangeable.
///
/// Listing results must be ordered by episode ascending (unnumbered episodes last),
/// then by creation time descending.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Comics ---
    async fn list_comics(&self, filter: ComicFilter) -> Result<Vec<ComicWithOwner>, RepositoryError>;
    // Inserts exactly one row and returns it joined with the owner projection.
    async fn create_comic(&self, comic: NewComic) -> Result<ComicWithOwner, RepositoryError>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
}

/// RepositoryState
///
/// The shared handle stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// Listing order shared by every implementation: episode ascending with unnumbered
/// episodes last, then newest first.
pub fn listing_order(a: &Comic, b: &Comic) -> Ordering {
    let by_episode = match (a.episode, b.episode) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_episode.then_with(|| b.created_at.cmp(&a.created_at))
}

const COMIC_COLUMNS: &str = r#"
    c.id, c.user_id, c.title, c.thumbnail, c.image_url, c.color, c.price,
    c.episode, c.description, c.tags, c.is_public, c.created_at,
    u.name AS user_name, u.email AS user_email
"#;

/// PostgresRepository
///
/// The production implementation, backed by a sqlx connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_comics
    ///
    /// Builds the filtered query with QueryBuilder so the owner id is always bound, never
    /// interpolated. `ORDER BY episode ASC` puts NULL episodes last (Postgres default).
    async fn list_comics(&self, filter: ComicFilter) -> Result<Vec<ComicWithOwner>, RepositoryError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("SELECT ");
        builder.push(COMIC_COLUMNS);
        builder.push(" FROM comics c JOIN users u ON u.id = c.user_id WHERE ");

        match filter {
            ComicFilter::PublicOnly => {
                builder.push("c.is_public = true");
            }
            ComicFilter::Owner(owner_id) => {
                builder.push("c.user_id = ");
                builder.push_bind(owner_id);
            }
        }

        builder.push(" ORDER BY c.episode ASC, c.created_at DESC");

        let rows = builder
            .build_query_as::<ComicRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ComicWithOwner::from).collect())
    }

    /// create_comic
    ///
    /// Insert and owner join in a single statement via a CTE, so the response is built
    /// from exactly the row that was written.
    async fn create_comic(&self, comic: NewComic) -> Result<ComicWithOwner, RepositoryError> {
        let query = r#"
            WITH inserted AS (
                INSERT INTO comics (
                    id, user_id, title, thumbnail, image_url, color, price,
                    episode, description, tags, is_public, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
                RETURNING *
            )
            SELECT
                c.id, c.user_id, c.title, c.thumbnail, c.image_url, c.color, c.price,
                c.episode, c.description, c.tags, c.is_public, c.created_at,
                u.name AS user_name, u.email AS user_email
            FROM inserted c JOIN users u ON u.id = c.user_id
        "#;

        let row = sqlx::query_as::<_, ComicRow>(query)
            .bind(Uuid::new_v4())
            .bind(comic.owner_id)
            .bind(comic.title)
            .bind(comic.thumbnail)
            .bind(comic.image_url)
            .bind(comic.color)
            .bind(comic.price)
            .bind(comic.episode)
            .bind(comic.description)
            .bind(comic.tags)
            .bind(comic.is_public)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    /// get_user
    ///
    /// Identity lookup for the local bypass. Credential columns are never selected.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. Used by the test suite and for
/// running the API without a database. Enforces the same owner foreign key and
/// listing order as the Postgres implementation.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<Vec<User>>,
    comics: RwLock<Vec<Comic>>,
    /// When true, every operation returns a simulated failure.
    pub should_fail: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
            ..Self::default()
        }
    }

    /// Inserts a fully formed comic, bypassing validation. Test seeding only.
    pub fn seed_comic(&self, comic: Comic) {
        self.comics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(comic);
    }

    pub fn comic_count(&self) -> usize {
        self.comics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(RepositoryError::Unavailable(
                "simulated failure requested".to_string(),
            ));
        }
        Ok(())
    }

    fn owner_summary(&self, owner_id: Uuid) -> Result<OwnerSummary, RepositoryError> {
        self.users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|user| user.id == owner_id)
            .map(OwnerSummary::from)
            .ok_or(RepositoryError::OwnerNotFound(owner_id))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_comics(&self, filter: ComicFilter) -> Result<Vec<ComicWithOwner>, RepositoryError> {
        self.check_available()?;

        let mut matching: Vec<Comic> = self
            .comics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|comic| filter.matches(comic))
            .cloned()
            .collect();
        matching.sort_by(listing_order);

        // Mirrors the inner join: a row whose owner vanished is an integrity error.
        matching
            .into_iter()
            .map(|comic| {
                let user = self.owner_summary(comic.owner_id)?;
                Ok(ComicWithOwner { comic, user })
            })
            .collect()
    }

    async fn create_comic(&self, comic: NewComic) -> Result<ComicWithOwner, RepositoryError> {
        self.check_available()?;
        let user = self.owner_summary(comic.owner_id)?;

        let stored = Comic {
            id: Uuid::new_v4(),
            owner_id: comic.owner_id,
            title: comic.title,
            thumbnail: comic.thumbnail,
            image_url: comic.image_url,
            color: comic.color,
            price: comic.price,
            episode: comic.episode,
            description: comic.description,
            tags: comic.tags,
            is_public: comic.is_public,
            created_at: Utc::now(),
        };

        self.comics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(stored.clone());

        Ok(ComicWithOwner { comic: stored, user })
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }
}
