mod common;

use actix_web::{test, web, App};
use chrono::{Datelike, Duration, Utc};
use common::{register_and_login, try_state, unique_email};
use contacthub_server::contacts;
use serde_json::json;
use uuid::Uuid;

fn contact_payload(email: &str) -> serde_json::Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "phone": "+44 20 7946 0000",
        "birthday": "1990-12-10",
        "notes": "met at the analytical engine meetup",
    })
}

macro_rules! contacts_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .route("/api/contacts", web::post().to(contacts::handlers::create))
                .route("/api/contacts", web::get().to(contacts::handlers::list))
                .route(
                    "/api/contacts/search",
                    web::get().to(contacts::handlers::search),
                )
                .route(
                    "/api/contacts/birthdays",
                    web::get().to(contacts::handlers::upcoming_birthdays),
                )
                .route("/api/contacts/{id}", web::get().to(contacts::handlers::get))
                .route("/api/contacts/{id}", web::put().to(contacts::handlers::update))
                .route(
                    "/api/contacts/{id}",
                    web::delete().to(contacts::handlers::delete),
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn test_contact_crud_flow() {
    let Some(state) = try_state().await else { return };
    let (_owner, token) =
        register_and_login(&state, &unique_email("crud"), "password123").await;
    let app = contacts_app!(state);
    let auth_header = ("Authorization", format!("Bearer {}", token));

    // Create
    let response = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(auth_header.clone())
        .set_json(contact_payload("ada@example.com"))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 201);
    let created: serde_json::Value = test::read_body_json(response).await;
    let contact_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["first_name"], "Ada");

    // Get
    let response = test::TestRequest::get()
        .uri(&format!("/api/contacts/{}", contact_id))
        .insert_header(auth_header.clone())
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);

    // List
    let response = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(auth_header.clone())
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let page: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["contacts"][0]["id"].as_str().unwrap(), contact_id);

    // Update replaces the whole field set
    let response = test::TestRequest::put()
        .uri(&format!("/api/contacts/{}", contact_id))
        .insert_header(auth_header.clone())
        .set_json(json!({
            "first_name": "Augusta",
            "last_name": "King",
            "email": "ada@example.com",
            "phone": "+44 20 7946 0001",
        }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let updated: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(updated["first_name"], "Augusta");
    assert_eq!(updated["last_name"], "King");
    // Fields omitted from the replacement payload are cleared, not kept.
    assert!(updated["birthday"].is_null());
    assert!(updated["notes"].is_null());

    // Delete, then the contact is gone
    let response = test::TestRequest::delete()
        .uri(&format!("/api/contacts/{}", contact_id))
        .insert_header(auth_header.clone())
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 204);

    let response = test::TestRequest::get()
        .uri(&format!("/api/contacts/{}", contact_id))
        .insert_header(auth_header)
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 404);
}

#[actix_web::test]
async fn test_contacts_are_owner_scoped() {
    let Some(state) = try_state().await else { return };
    let (_a, token_a) =
        register_and_login(&state, &unique_email("owner-a"), "password123").await;
    let (_b, token_b) =
        register_and_login(&state, &unique_email("owner-b"), "password123").await;
    let app = contacts_app!(state);

    let response = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("Authorization", format!("Bearer {}", token_a)))
        .set_json(contact_payload("private@example.com"))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 201);
    let created: serde_json::Value = test::read_body_json(response).await;
    let contact_id = created["id"].as_str().unwrap().to_string();

    // The other owner cannot list it...
    let response = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(("Authorization", format!("Bearer {}", token_b)))
        .send_request(&app)
        .await;
    let page: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(page["total_count"], 0);

    // ...and a direct fetch, update or delete looks like a missing record.
    let response = test::TestRequest::get()
        .uri(&format!("/api/contacts/{}", contact_id))
        .insert_header(("Authorization", format!("Bearer {}", token_b)))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 404);

    let response = test::TestRequest::delete()
        .uri(&format!("/api/contacts/{}", contact_id))
        .insert_header(("Authorization", format!("Bearer {}", token_b)))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 404);

    // The record is still there for its owner.
    let response = test::TestRequest::get()
        .uri(&format!("/api/contacts/{}", contact_id))
        .insert_header(("Authorization", format!("Bearer {}", token_a)))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
}

#[actix_web::test]
async fn test_duplicate_contact_email_conflicts() {
    let Some(state) = try_state().await else { return };
    let (_owner, token) =
        register_and_login(&state, &unique_email("dup-contact"), "password123").await;
    let app = contacts_app!(state);

    let response = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(contact_payload("twin@example.com"))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 201);

    let response = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(contact_payload("twin@example.com"))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 409);
}

#[actix_web::test]
async fn test_contact_validation() {
    let Some(state) = try_state().await else { return };
    let (_owner, token) =
        register_and_login(&state, &unique_email("invalid-contact"), "password123").await;
    let app = contacts_app!(state);

    let response = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "first_name": "",
            "last_name": "Nameless",
            "email": "nameless@example.com",
            "phone": "123",
        }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);

    let response = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "first_name": "Bad",
            "last_name": "Email",
            "email": "not-an-address",
            "phone": "123",
        }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn test_contacts_require_auth() {
    let Some(state) = try_state().await else { return };
    let app = contacts_app!(state);

    let response = test::TestRequest::get()
        .uri("/api/contacts")
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 401);

    let response = test::TestRequest::post()
        .uri("/api/contacts")
        .set_json(contact_payload("anon@example.com"))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 401);
}

#[actix_web::test]
async fn test_search_contacts() {
    let Some(state) = try_state().await else { return };
    let (_owner, token) =
        register_and_login(&state, &unique_email("search"), "password123").await;
    let app = contacts_app!(state);
    let auth_header = ("Authorization", format!("Bearer {}", token));

    for (first, last, email) in [
        ("Grace", "Hopper", "grace@example.com"),
        ("Alan", "Turing", "alan@example.com"),
    ] {
        let response = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(auth_header.clone())
            .set_json(json!({
                "first_name": first,
                "last_name": last,
                "email": email,
                "phone": "555-0100",
            }))
            .send_request(&app)
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = test::TestRequest::get()
        .uri("/api/contacts/search?q=hopp")
        .insert_header(auth_header.clone())
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let results: serde_json::Value = test::read_body_json(response).await;
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["first_name"], "Grace");

    // Empty queries are a client error rather than a full-table scan.
    let response = test::TestRequest::get()
        .uri("/api/contacts/search?q=%20")
        .insert_header(auth_header)
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn test_upcoming_birthdays_window() {
    let Some(state) = try_state().await else { return };
    let (_owner, token) =
        register_and_login(&state, &unique_email("birthdays"), "password123").await;
    let app = contacts_app!(state);
    let auth_header = ("Authorization", format!("Bearer {}", token));

    // Year 2000 is a leap year, so any month/day produced here is valid.
    let today = Utc::now().date_naive();
    let soon = today + Duration::days(3);
    let later = today + Duration::days(60);
    let soon_birthday = format!("2000-{:02}-{:02}", soon.month(), soon.day());
    let later_birthday = format!("2000-{:02}-{:02}", later.month(), later.day());

    for (first, email, birthday) in [
        ("Soon", "soon@example.com", Some(soon_birthday.as_str())),
        ("Later", "later@example.com", Some(later_birthday.as_str())),
        ("Never", "never@example.com", None),
    ] {
        let response = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(auth_header.clone())
            .set_json(json!({
                "first_name": first,
                "last_name": "Birthday",
                "email": email,
                "phone": "555-0101",
                "birthday": birthday,
            }))
            .send_request(&app)
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = test::TestRequest::get()
        .uri("/api/contacts/birthdays?days=7")
        .insert_header(auth_header.clone())
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let page: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["contacts"][0]["first_name"], "Soon");

    // Window bounds are validated.
    let response = test::TestRequest::get()
        .uri("/api/contacts/birthdays?days=0")
        .insert_header(auth_header)
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn test_pagination() {
    let Some(state) = try_state().await else { return };
    let (_owner, token) =
        register_and_login(&state, &unique_email("paging"), "password123").await;
    let app = contacts_app!(state);
    let auth_header = ("Authorization", format!("Bearer {}", token));

    for i in 0..5 {
        let response = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(auth_header.clone())
            .set_json(json!({
                "first_name": format!("Person{}", i),
                "last_name": format!("Page{}", i),
                "email": format!("page{}@example.com", i),
                "phone": "555-0102",
            }))
            .send_request(&app)
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = test::TestRequest::get()
        .uri("/api/contacts?skip=2&limit=2")
        .insert_header(auth_header.clone())
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let page: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(page["total_count"], 5);
    assert_eq!(page["skip"], 2);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["contacts"].as_array().unwrap().len(), 2);

    let response = test::TestRequest::get()
        .uri("/api/contacts?limit=0")
        .insert_header(auth_header)
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn test_get_with_unknown_id_is_not_found() {
    let Some(state) = try_state().await else { return };
    let (_owner, token) =
        register_and_login(&state, &unique_email("missing"), "password123").await;
    let app = contacts_app!(state);

    let response = test::TestRequest::get()
        .uri(&format!("/api/contacts/{}", Uuid::new_v4()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 404);
}
