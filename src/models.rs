use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Records (Mapped to Database) ---

/// User
///
/// The owner record from the `users` table. Only the columns needed for identity
/// resolution are ever selected; credential columns stay in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    // 'ADMIN' or 'USER'.
    pub role: String,
}

/// OwnerSummary
///
/// The restricted owner projection attached to every comic: id, display name and
/// contact address. Never carries role or credential data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Comic
///
/// A persisted comic episode from the `comics` table, serialized in camelCase for the
/// web client. `created_at` is assigned on insert and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comic {
    pub id: Uuid,
    // FK to users.id. Always the identity that created the row.
    pub owner_id: Uuid,
    pub title: String,
    pub thumbnail: String,
    pub image_url: String,
    pub color: String,
    pub price: f64,
    pub episode: Option<i32>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ComicWithOwner
///
/// A comic enriched with its owner projection under `user`. This is the shape both
/// the listing and the creation responses use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ComicWithOwner {
    #[serde(flatten)]
    pub comic: Comic,
    pub user: OwnerSummary,
}

/// ComicRow
///
/// Flat row produced by the `comics JOIN users` queries. Converted into
/// `ComicWithOwner` right after fetching.
#[derive(Debug, Clone, FromRow)]
pub struct ComicRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub thumbnail: String,
    pub image_url: String,
    pub color: String,
    pub price: f64,
    pub episode: Option<i32>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: String,
}

impl From<ComicRow> for ComicWithOwner {
    fn from(row: ComicRow) -> Self {
        Self {
            comic: Comic {
                id: row.id,
                owner_id: row.user_id,
                title: row.title,
                thumbnail: row.thumbnail,
                image_url: row.image_url,
                color: row.color,
                price: row.price,
                episode: row.episode,
                description: row.description,
                tags: row.tags,
                is_public: row.is_public,
                created_at: row.created_at,
            },
            user: OwnerSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
        }
    }
}

/// NewComic
///
/// A validated insert: required fields present, defaults applied, owner taken from the
/// authenticated caller. Only `comics::validate_new_comic` builds one from client input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComic {
    pub owner_id: Uuid,
    pub title: String,
    pub thumbnail: String,
    pub image_url: String,
    pub color: String,
    pub price: f64,
    pub episode: Option<i32>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
}

// --- Request Payloads (Input Schemas) ---

/// CreateComicRequest
///
/// Input payload for `POST /api/comic`. Every field is optional at the wire level so
/// that presence validation can answer with the endpoint's own 400 instead of a
/// deserialization rejection. Unknown fields (including any client-sent owner id) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateComicRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub episode: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

// --- Response Envelopes (Output Schemas) ---

/// ComicListResponse
///
/// `{ "comics": [...] }` envelope returned by `GET /api/comic`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ComicListResponse {
    pub comics: Vec<ComicWithOwner>,
}

/// ComicResponse
///
/// `{ "comic": {...} }` envelope returned by `POST /api/comic`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ComicResponse {
    pub comic: ComicWithOwner,
}

/// ErrorResponse
///
/// `{ "error": "<message>" }` body used by every failure status.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
