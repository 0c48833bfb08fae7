//! Handler behaviour around the store, using mocked ports.

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use hb_api::{configure_routes, AppState};
use hb_core::error::AppError;
use hb_core::models::House;
use hb_core::{MockForumRepo, MockIdentityProvider};
use mockall::predicate::eq;

fn state(repo: MockForumRepo, identity: MockIdentityProvider) -> web::Data<AppState> {
    web::Data::new(AppState { repo: Box::new(repo), identity: Box::new(identity) })
}

macro_rules! forum_app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state).configure(configure_routes)).await
    };
}

#[actix_web::test]
async fn test_store_outage_is_500() {
    let mut repo = MockForumRepo::new();
    repo.expect_list_houses()
        .returning(|| Err(AppError::Store("connection refused".into())));
    let app = forum_app!(state(repo, MockIdentityProvider::new()));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(!body.contains("connection refused"));
}

#[actix_web::test]
async fn test_invalid_house_never_reaches_store() {
    let mut repo = MockForumRepo::new();
    repo.expect_create_house().never();
    let app = forum_app!(state(repo, MockIdentityProvider::new()));

    let req = test::TestRequest::post().uri("/house/new").set_form([("name", "")]).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_duplicate_house_is_400() {
    let mut repo = MockForumRepo::new();
    repo.expect_create_house()
        .withf(|name| name == "Alpha")
        .times(1)
        .returning(|name| Err(AppError::DuplicateName(name.to_string())));
    let app = forum_app!(state(repo, MockIdentityProvider::new()));

    let req = test::TestRequest::post().uri("/house/new").set_form([("name", " Alpha ")]).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_thread_in_missing_house_writes_nothing() {
    let mut repo = MockForumRepo::new();
    repo.expect_get_house().with(eq(42)).returning(|_| Ok(None));
    repo.expect_create_thread().never();
    let mut identity = MockIdentityProvider::new();
    identity.expect_hash_tripcode().never();
    let app = forum_app!(state(repo, identity));

    let req = test::TestRequest::post()
        .uri("/house/42/thread/new")
        .set_form([("title", "Hello"), ("nickname", "bob"), ("content", "hi")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_failed_thread_transaction_is_500() {
    let mut repo = MockForumRepo::new();
    repo.expect_get_house()
        .with(eq(1))
        .returning(|id| Ok(Some(House { id, name: "Alpha".into() })));
    repo.expect_create_thread()
        .times(1)
        .returning(|_| Err(AppError::Store("transaction rolled back".into())));
    let mut identity = MockIdentityProvider::new();
    identity.expect_hash_tripcode().returning(|_| "00".repeat(32));
    let app = forum_app!(state(repo, identity));

    let req = test::TestRequest::post()
        .uri("/house/1/thread/new")
        .set_form([("title", "Hello"), ("nickname", "bob"), ("content", "hi")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn test_thread_fields_are_trimmed_and_hashed() {
    let mut repo = MockForumRepo::new();
    repo.expect_get_house()
        .returning(|id| Ok(Some(House { id, name: "Alpha".into() })));
    repo.expect_create_thread()
        .withf(|t| {
            t.house_id == 3
                && t.title == "Hello"
                && t.nickname == "bob"
                && t.content == "hi"
                && t.tripcode_hash == "hashed"
        })
        .times(1)
        .returning(|_| Ok(11));
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_hash_tripcode()
        .withf(|secret| secret.is_empty())
        .times(1)
        .returning(|_| "hashed".to_string());
    let app = forum_app!(state(repo, identity));

    // No tripcode field at all: hashed as the empty secret.
    let req = test::TestRequest::post()
        .uri("/house/3/thread/new")
        .set_form([("title", " Hello "), ("nickname", "bob\n"), ("content", "  hi")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/thread/11");
}

#[actix_web::test]
async fn test_invalid_reply_never_reaches_store() {
    let mut repo = MockForumRepo::new();
    repo.expect_create_reply().never();
    let mut identity = MockIdentityProvider::new();
    identity.expect_hash_tripcode().never();
    let app = forum_app!(state(repo, identity));

    let req = test::TestRequest::post()
        .uri("/post/5/reply")
        .set_form([("nickname", "alice"), ("tripcode", "s3cret")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_reply_redirects_to_owning_thread() {
    let mut repo = MockForumRepo::new();
    repo.expect_create_reply()
        .withf(|r| r.post_id == 5 && r.nickname == "alice" && r.tripcode_hash == "trip")
        .times(1)
        .returning(|_| Ok(9));
    let mut identity = MockIdentityProvider::new();
    identity
        .expect_hash_tripcode()
        .withf(|secret| secret == "s3cret")
        .returning(|_| "trip".to_string());
    let app = forum_app!(state(repo, identity));

    let req = test::TestRequest::post()
        .uri("/post/5/reply")
        .set_form([("nickname", "alice"), ("tripcode", "s3cret"), ("content", "hey")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/thread/9");
}
