//! Integration tests for library-service actions.
//!
//! Each test signs in against a mock service and checks that an action
//! sends the right request and maps the answer onto the right result.

use std::time::Duration;

use booksmart_core::{
    ClientError, NewBook, RatingInput, Role, Secret, Session, SessionSettings, SignInRequest,
};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> SessionSettings {
    SessionSettings {
        base_url: server.uri(),
        access_token_ttl: Duration::from_secs(3600),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

async fn signed_in(server: &MockServer, role: Role) -> Session {
    Mock::given(method("POST"))
        .and(path(role.sign_in_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "access-0",
            "refreshToken": "refresh-0"
        })))
        .mount(server)
        .await;

    let mut session = Session::new(settings(server)).unwrap();
    let credentials = SignInRequest {
        phone_number: "+79990001122".to_string(),
        password: Secret::new("pw"),
    };
    session.sign_in(&credentials, role).await.unwrap();
    session
}

fn reservation_json(id: Uuid) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "issue_date": "2024-03-01T10:00:00Z",
        "return_date": "2024-03-15T10:00:00Z",
        "state": "issued"
    })
}

#[tokio::test]
async fn test_add_favorite_sends_bearer_token() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;
    let book_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/favorites"))
        .and(header("Authorization", "Bearer access-0"))
        .and(body_json(serde_json::json!(book_id)))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    session.library().add_favorite(book_id).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_action_reports_unauthenticated() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;

    Mock::given(method("POST"))
        .and(path("/api/favorites"))
        .respond_with(ResponseTemplate::new(401).set_body_json("token is expired"))
        .mount(&server)
        .await;

    let err = session.library().add_favorite(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated));
    assert_eq!(err.to_string(), "you are not authenticated");
}

#[tokio::test]
async fn test_authenticated_action_requires_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let session = Session::new(settings(&server)).unwrap();
    let err = session.library().reserve(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ClientError::NotSignedIn));
}

#[tokio::test]
async fn test_reserve_domain_error_message() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;

    Mock::given(method("POST"))
        .and(path("/api/reservations"))
        .respond_with(ResponseTemplate::new(409).set_body_json("no copies left"))
        .mount(&server)
        .await;

    let err = session.library().reserve(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.to_string(), "no copies left");
}

#[tokio::test]
async fn test_book_details_without_rating() {
    let server = MockServer::start().await;
    let book_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/books/{book_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": book_id,
            "title": "The Master and Margarita",
            "author": "Bulgakov",
            "genre": "novel",
            "age_limit": 16
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ratings/avg"))
        .and(query_param("book_id", book_id.to_string()))
        .respond_with(ResponseTemplate::new(404).set_body_json("no ratings"))
        .mount(&server)
        .await;

    let session = Session::new(settings(&server)).unwrap();
    let details = session.library().book_details(book_id).await.unwrap();
    assert_eq!(details.book.author, "Bulgakov");
    assert_eq!(details.book.age_limit, 16);
    assert!(details.rating.is_none());
}

#[tokio::test]
async fn test_ratings_and_add_rating() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;
    let book_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/ratings"))
        .and(query_param("book_id", book_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"reader": "Anna", "review": "great", "rating": 5},
            {"reader": "Boris", "review": "fine", "rating": 3}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/ratings"))
        .and(body_json(serde_json::json!({
            "book_id": book_id,
            "review": "loved it",
            "rating": 5
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let ratings = session.library().ratings(book_id).await.unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[1].reader, "Boris");

    let input = RatingInput {
        book_id,
        review: "loved it".to_string(),
        rating: 5,
    };
    session.library().add_rating(&input).await.unwrap();
}

#[tokio::test]
async fn test_reservations_listing_and_extension() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;
    let ids = [Uuid::new_v4(), Uuid::new_v4()];

    Mock::given(method("GET"))
        .and(path("/api/reservations"))
        .and(header("Authorization", "Bearer access-0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([reservation_json(ids[0]), reservation_json(ids[1])])),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/reservations/{}", ids[1])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let browser = session.reservations();
    browser.enter();
    let page = session.library().reservations(&browser).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.display_offset, 0);

    let selected = browser.resolve_row(1).unwrap();
    assert_eq!(selected, ids[1]);
    session.library().extend_reservation(selected).await.unwrap();

    assert!(browser.resolve_row(2).is_err());
    browser.exit();
}

#[tokio::test]
async fn test_reservations_401_without_json_body_is_unauthenticated() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;

    Mock::given(method("GET"))
        .and(path("/api/reservations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("<html>401</html>"))
        .mount(&server)
        .await;

    let browser = session.reservations();
    let err = session.library().reservations(&browser).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated), "got {:?}", err);
}

#[tokio::test]
async fn test_reservations_browser_has_no_next_page() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;

    Mock::given(method("GET"))
        .and(path("/api/reservations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([reservation_json(Uuid::new_v4())])),
        )
        .mount(&server)
        .await;

    let browser = session.reservations();
    browser.enter();
    session.library().reservations(&browser).await.unwrap();

    // Only the signed-in token pair and the row index are cached.
    assert_eq!(session.cache().len(), 2);
    assert!(browser.fetch_next_page().await.unwrap_err().is_cache_miss());
}

#[tokio::test]
async fn test_actions_keep_base_url_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/library{}", Role::Reader.sign_in_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "access-0",
            "refreshToken": "refresh-0"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(SessionSettings {
        base_url: format!("{}/library", server.uri()),
        ..settings(&server)
    })
    .unwrap();
    let credentials = SignInRequest {
        phone_number: "+79990001122".to_string(),
        password: Secret::new("pw"),
    };
    session.sign_in(&credentials, Role::Reader).await.unwrap();

    let page = session
        .catalog()
        .fetch_first_page(Default::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_lib_card_lifecycle() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Reader).await;

    Mock::given(method("POST"))
        .and(path("/api/lib-cards"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/lib-cards"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/lib-cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lib_card_num": "1234567890123",
            "validity": 365,
            "issue_date": "2024-01-10T00:00:00Z",
            "action_status": true
        })))
        .mount(&server)
        .await;

    let library = session.library();
    library.create_lib_card().await.unwrap();
    library.update_lib_card().await.unwrap();
    let card = library.lib_card().await.unwrap();
    assert_eq!(card.lib_card_num, "1234567890123");
    assert!(card.action_status);
}

#[tokio::test]
async fn test_admin_adds_book() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Admin).await;

    Mock::given(method("POST"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let book = NewBook {
        title: "Solaris".to_string(),
        author: "Lem".to_string(),
        publisher: "MIR".to_string(),
        copies_number: 3,
        rarity: "common".to_string(),
        genre: "science fiction".to_string(),
        publishing_year: 1961,
        language: "polish".to_string(),
        age_limit: 12,
    };
    session.library().add_book(&book).await.unwrap();
}

#[tokio::test]
async fn test_reserved_book_cannot_be_deleted() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Admin).await;
    let book_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/admin/reservations"))
        .and(query_param("book_id", book_id.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([reservation_json(Uuid::new_v4())])),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = session.library().delete_book(book_id).await.unwrap_err();
    assert!(matches!(err, ClientError::Conflict { .. }));
    assert_eq!(err.to_string(), "this book cannot be deleted, it is reserved");
}

#[tokio::test]
async fn test_unreserved_book_is_deleted() {
    let server = MockServer::start().await;
    let session = signed_in(&server, Role::Admin).await;
    let book_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/admin/reservations"))
        .respond_with(ResponseTemplate::new(404).set_body_json("reservations not found"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/admin/books/{book_id}")))
        .and(header("Authorization", "Bearer access-0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    session.library().delete_book(book_id).await.unwrap();
}
