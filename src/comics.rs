//! Decision rules for the comic endpoint: which rows a listing may see, and what a
//! creation request must carry before anything is written.

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::Identity,
    error::{ApiError, MISSING_FIELDS},
    models::{CreateComicRequest, NewComic},
    repository::ComicFilter,
};

/// ListingQuery
///
/// Query parameters accepted by `GET /api/comic`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct ListingQuery {
    /// Only the exact string `"true"` restricts the listing to public comics.
    pub public: Option<String>,
    /// Lists every comic owned by this user, public or not.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl ListingQuery {
    fn public_only(&self) -> bool {
        self.public.as_deref() == Some("true")
    }

    fn target_owner(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// ListingIntent
///
/// Which slice of the catalogue a listing request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingIntent {
    /// `public=true` was sent.
    PublicOnly,
    /// A `userId` was sent. Visibility is not restricted, so anyone can list another
    /// user's private comics by id.
    ByOwner(String),
    /// An elevated caller with no parameters sees all of their own comics.
    SelfElevated(Uuid),
    /// Anyone else with no parameters.
    DefaultPublic,
}

/// resolve_listing
///
/// First matching rule wins: public flag, then explicit owner, then elevated self-view,
/// then the public default.
pub fn resolve_listing(identity: Option<&Identity>, query: &ListingQuery) -> ListingIntent {
    match (query.public_only(), query.target_owner(), identity) {
        (true, _, _) => ListingIntent::PublicOnly,
        (false, Some(owner), _) => ListingIntent::ByOwner(owner.to_string()),
        (false, None, Some(caller)) if caller.is_elevated() => ListingIntent::SelfElevated(caller.id),
        _ => ListingIntent::DefaultPublic,
    }
}

impl ListingIntent {
    /// The store predicate for this intent. `None` when the requested owner id is not a
    /// well-formed id: no row can match, so the store is not consulted.
    pub fn filter(&self) -> Option<ComicFilter> {
        match self {
            ListingIntent::PublicOnly | ListingIntent::DefaultPublic => Some(ComicFilter::PublicOnly),
            ListingIntent::ByOwner(raw) => Uuid::parse_str(raw).ok().map(ComicFilter::Owner),
            ListingIntent::SelfElevated(id) => Some(ComicFilter::Owner(*id)),
        }
    }
}

/// validate_new_comic
///
/// Turns a creation payload into an insert owned by `owner_id`. An absent field, an empty
/// string or a zero price all count as missing, and the error does not say which field.
/// Tags default to empty and visibility to public.
pub fn validate_new_comic(req: CreateComicRequest, owner_id: Uuid) -> Result<NewComic, ApiError> {
    let (Some(title), Some(thumbnail), Some(image_url), Some(color), Some(price)) = (
        present(req.title),
        present(req.thumbnail),
        present(req.image_url),
        present(req.color),
        req.price.filter(|price| *price != 0.0),
    ) else {
        return Err(ApiError::BadRequest(MISSING_FIELDS));
    };

    Ok(NewComic {
        owner_id,
        title,
        thumbnail,
        image_url,
        color,
        price,
        episode: req.episode,
        description: req.description,
        tags: req.tags.unwrap_or_default(),
        is_public: req.is_public.unwrap_or(true),
    })
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}
