use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{TimeZone, Utc};
use comic_api::{
    ApiError, AppState,
    auth::{Identity, Role},
    comics::ListingQuery,
    config::AppConfig,
    handlers,
    models::{Comic, ComicListResponse, CreateComicRequest, ErrorResponse, User},
    repository::InMemoryRepository,
};
use std::sync::Arc;
use uuid::Uuid;

// --- TEST UTILITIES ---

const ADMIN_ID: Uuid = Uuid::from_u128(1);
const AUTHOR_ID: Uuid = Uuid::from_u128(2);
const READER_ID: Uuid = Uuid::from_u128(3);

fn users() -> Vec<User> {
    vec![
        User {
            id: ADMIN_ID,
            name: Some("Admin".to_string()),
            email: "admin@example.com".to_string(),
            role: "ADMIN".to_string(),
        },
        User {
            id: AUTHOR_ID,
            name: Some("Author".to_string()),
            email: "author@example.com".to_string(),
            role: "USER".to_string(),
        },
        User {
            id: READER_ID,
            name: None,
            email: "reader@example.com".to_string(),
            role: "USER".to_string(),
        },
    ]
}

fn comic(owner_id: Uuid, title: &str, episode: Option<i32>, is_public: bool, minute: u32) -> Comic {
    Comic {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        thumbnail: format!("{title}.thumb.png"),
        image_url: format!("{title}.png"),
        color: "#000".to_string(),
        price: 100.0,
        episode,
        description: None,
        tags: vec![],
        is_public,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap(),
    }
}

/// Two owners, each with public and private comics.
fn seeded_repo() -> InMemoryRepository {
    let repo = InMemoryRepository::with_users(users());
    repo.seed_comic(comic(ADMIN_ID, "admin-public", Some(1), true, 0));
    repo.seed_comic(comic(ADMIN_ID, "admin-private", Some(2), false, 1));
    repo.seed_comic(comic(AUTHOR_ID, "author-public", Some(1), true, 2));
    repo.seed_comic(comic(AUTHOR_ID, "author-private", None, false, 3));
    repo
}

fn state_with(repo: InMemoryRepository) -> AppState {
    AppState {
        repo: Arc::new(repo),
        config: AppConfig::default(),
    }
}

fn admin() -> Identity {
    Identity {
        id: ADMIN_ID,
        role: Role::Admin,
    }
}

fn author() -> Identity {
    Identity {
        id: AUTHOR_ID,
        role: Role::User,
    }
}

fn query(public: Option<&str>, user_id: Option<String>) -> ListingQuery {
    ListingQuery {
        public: public.map(str::to_string),
        user_id,
    }
}

async fn list(identity: Option<Identity>, state: AppState, q: ListingQuery) -> Vec<Comic> {
    let Json(ComicListResponse { comics }) = handlers::list_comics(identity, State(state), Query(q))
        .await
        .expect("listing should succeed");
    comics.into_iter().map(|c| c.comic).collect()
}

fn complete_request() -> CreateComicRequest {
    CreateComicRequest {
        title: Some("Ep1".to_string()),
        thumbnail: Some("t.png".to_string()),
        image_url: Some("i.png".to_string()),
        color: Some("#fff".to_string()),
        price: Some(100.0),
        ..CreateComicRequest::default()
    }
}

fn json_body(request: &CreateComicRequest) -> Bytes {
    Bytes::from(serde_json::to_vec(request).unwrap())
}

// --- LISTING TESTS ---

#[tokio::test]
async fn test_public_flag_returns_only_public_for_every_caller() {
    for identity in [None, Some(admin()), Some(author())] {
        let comics = list(identity, state_with(seeded_repo()), query(Some("true"), None)).await;
        assert_eq!(comics.len(), 2);
        assert!(comics.iter().all(|c| c.is_public));
    }
}

#[tokio::test]
async fn test_public_flag_wins_over_user_id() {
    let comics = list(
        Some(admin()),
        state_with(seeded_repo()),
        query(Some("true"), Some(AUTHOR_ID.to_string())),
    )
    .await;
    assert!(comics.iter().all(|c| c.is_public));
    assert!(comics.iter().any(|c| c.owner_id == ADMIN_ID));
}

#[tokio::test]
async fn test_user_id_lists_private_items_even_for_anonymous_callers() {
    let comics = list(None, state_with(seeded_repo()), query(None, Some(AUTHOR_ID.to_string()))).await;
    assert_eq!(comics.len(), 2);
    assert!(comics.iter().all(|c| c.owner_id == AUTHOR_ID));
    assert!(comics.iter().any(|c| !c.is_public));
}

#[tokio::test]
async fn test_admin_without_params_sees_own_comics() {
    let comics = list(Some(admin()), state_with(seeded_repo()), query(None, None)).await;
    assert_eq!(comics.len(), 2);
    assert!(comics.iter().all(|c| c.owner_id == ADMIN_ID));
    assert!(comics.iter().any(|c| !c.is_public));
}

#[tokio::test]
async fn test_regular_user_without_params_gets_public_default() {
    let comics = list(Some(author()), state_with(seeded_repo()), query(None, None)).await;
    assert_eq!(comics.len(), 2);
    assert!(comics.iter().all(|c| c.is_public));
}

#[tokio::test]
async fn test_anonymous_without_params_gets_public_default() {
    let comics = list(None, state_with(seeded_repo()), query(None, None)).await;
    assert!(!comics.is_empty());
    assert!(comics.iter().all(|c| c.is_public));
}

#[tokio::test]
async fn test_unknown_owner_id_returns_empty_list() {
    let comics = list(None, state_with(seeded_repo()), query(None, Some("cm1xyz".to_string()))).await;
    assert!(comics.is_empty());
}

#[tokio::test]
async fn test_listing_order_episode_then_newest() {
    let repo = InMemoryRepository::with_users(users());
    repo.seed_comic(comic(AUTHOR_ID, "ep2", Some(2), true, 0));
    repo.seed_comic(comic(AUTHOR_ID, "ep1-old", Some(1), true, 1));
    repo.seed_comic(comic(AUTHOR_ID, "unnumbered", None, true, 2));
    repo.seed_comic(comic(AUTHOR_ID, "ep1-new", Some(1), true, 3));

    let comics = list(None, state_with(repo), query(Some("true"), None)).await;
    let titles: Vec<&str> = comics.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["ep1-new", "ep1-old", "ep2", "unnumbered"]);

    for pair in comics.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.episode == b.episode {
            assert!(a.created_at >= b.created_at);
        }
    }
}

#[tokio::test]
async fn test_listing_rows_carry_owner_projection() {
    let state = state_with(seeded_repo());
    let Json(response) = handlers::list_comics(None, State(state), Query(query(Some("true"), None)))
        .await
        .unwrap();

    for item in &response.comics {
        assert_eq!(item.user.id, item.comic.owner_id);
    }
    let author_row = response
        .comics
        .iter()
        .find(|c| c.comic.owner_id == AUTHOR_ID)
        .unwrap();
    assert_eq!(author_row.user.email, "author@example.com");
    assert_eq!(author_row.user.name.as_deref(), Some("Author"));
}

#[tokio::test]
async fn test_listing_store_failure_is_500() {
    let state = state_with(InMemoryRepository::new_failing());
    let result = handlers::list_comics(None, State(state), Query(query(None, None))).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::Internal { .. }));

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, "Failed to fetch comics");
}

// --- CREATION TESTS ---

#[tokio::test]
async fn test_create_without_identity_is_unauthorized_and_stores_nothing() {
    let repo = Arc::new(InMemoryRepository::with_users(users()));
    let state = AppState {
        repo: repo.clone(),
        config: AppConfig::default(),
    };

    let result = handlers::create_comic(None, State(state), json_body(&complete_request())).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(repo.comic_count(), 0);
}

#[tokio::test]
async fn test_create_missing_any_required_field_is_bad_request() {
    let strip: [fn(&mut CreateComicRequest); 5] = [
        |r| r.title = None,
        |r| r.thumbnail = None,
        |r| r.image_url = Some(String::new()),
        |r| r.color = None,
        |r| r.price = None,
    ];

    for strip_field in strip {
        let repo = Arc::new(InMemoryRepository::with_users(users()));
        let state = AppState {
            repo: repo.clone(),
            config: AppConfig::default(),
        };
        let mut request = complete_request();
        strip_field(&mut request);

        let err = handlers::create_comic(Some(author()), State(state), json_body(&request))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing required fields");
        assert_eq!(repo.comic_count(), 0);
    }
}

#[tokio::test]
async fn test_create_applies_defaults_and_caller_ownership() {
    let repo = Arc::new(InMemoryRepository::with_users(users()));
    let state = AppState {
        repo: repo.clone(),
        config: AppConfig::default(),
    };

    let (status, Json(response)) =
        handlers::create_comic(Some(author()), State(state), json_body(&complete_request()))
            .await
            .expect("creation should succeed");

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.comic.comic.owner_id, AUTHOR_ID);
    assert!(response.comic.comic.tags.is_empty());
    assert!(response.comic.comic.is_public);
    assert_eq!(response.comic.user.id, AUTHOR_ID);
    assert_eq!(response.comic.user.email, "author@example.com");
    assert_eq!(repo.comic_count(), 1);
}

#[tokio::test]
async fn test_create_keeps_optional_fields() {
    let state = state_with(InMemoryRepository::with_users(users()));
    let request = CreateComicRequest {
        episode: Some(4),
        description: Some("Finale".to_string()),
        tags: Some(vec!["action".to_string(), "drama".to_string()]),
        is_public: Some(false),
        ..complete_request()
    };

    let (_, Json(response)) = handlers::create_comic(Some(author()), State(state), json_body(&request))
        .await
        .unwrap();

    let comic = response.comic.comic;
    assert_eq!(comic.episode, Some(4));
    assert_eq!(comic.description.as_deref(), Some("Finale"));
    assert_eq!(comic.tags, vec!["action", "drama"]);
    assert!(!comic.is_public);
}

#[tokio::test]
async fn test_create_store_failure_is_500() {
    let state = state_with(InMemoryRepository::new_failing());
    let err = handlers::create_comic(Some(author()), State(state), json_body(&complete_request()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "Failed to create comic");
}

#[tokio::test]
async fn test_create_for_unknown_owner_is_500() {
    // A valid token for a user that no longer exists violates the owner foreign key.
    let state = state_with(InMemoryRepository::with_users(users()));
    let ghost = Identity {
        id: Uuid::from_u128(99),
        role: Role::User,
    };

    let err = handlers::create_comic(Some(ghost), State(state), json_body(&complete_request()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_created_comic_shows_up_in_public_listing() {
    let repo = Arc::new(InMemoryRepository::with_users(users()));
    let state = AppState {
        repo: repo.clone(),
        config: AppConfig::default(),
    };

    let (status, _) =
        handlers::create_comic(Some(author()), State(state.clone()), json_body(&complete_request()))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let comics = list(None, state, query(None, None)).await;
    assert_eq!(comics.len(), 1);
    assert_eq!(comics[0].title, "Ep1");
}

#[tokio::test]
async fn test_create_keeps_fractional_price() {
    let state = state_with(InMemoryRepository::with_users(users()));
    let request = CreateComicRequest {
        price: Some(9.99),
        ..complete_request()
    };

    let (_, Json(response)) = handlers::create_comic(Some(author()), State(state), json_body(&request))
        .await
        .unwrap();

    assert_eq!(response.comic.comic.price, 9.99);
}

#[tokio::test]
async fn test_create_unparseable_body_is_500_and_stores_nothing() {
    let repo = Arc::new(InMemoryRepository::with_users(users()));
    let state = AppState {
        repo: repo.clone(),
        config: AppConfig::default(),
    };

    let err = handlers::create_comic(Some(author()), State(state), Bytes::from_static(b"{not json"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "Failed to create comic");
    assert_eq!(repo.comic_count(), 0);
}
