use reqwest::Client;
use serde_json::json;

mod common;
use common::utils::{spawn_app, TEST_PASSWORD};

#[tokio::test]
async fn register_user_working() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let username = format!("newuser{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
    let email = format!("{}@example.com", username);

    let response = client
        .post(test_app.url("/api/users/"))
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
            "email": email
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], username.as_str());
    assert_eq!(body["email"], email.as_str());
    assert!(body.get("password").is_none());

    let (saved_username, saved_email): (String, String) =
        sqlx::query_as("SELECT username, email FROM users WHERE username = $1")
            .bind(&username)
            .fetch_one(&test_app.db_pool)
            .await
            .expect("Failed to fetch saved user.");
    assert_eq!(saved_username, username);
    assert_eq!(saved_email, email);
}

#[tokio::test]
async fn registration_creates_exactly_one_profile() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(test_app.url("/api/users/"))
        .json(&json!({ "username": "profiled", "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());

    let profiles: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_profiles p JOIN users u ON u.id = p.user_id WHERE u.username = $1",
    )
    .bind("profiled")
    .fetch_one(&test_app.db_pool)
    .await
    .unwrap();
    assert_eq!(profiles, 1);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let request = json!({ "username": "twin", "password": TEST_PASSWORD });

    let first = client.post(test_app.url("/api/users/")).json(&request).send().await.unwrap();
    assert_eq!(201, first.status().as_u16());

    let second = client.post(test_app.url("/api/users/")).json(&request).send().await.unwrap();
    assert_eq!(400, second.status().as_u16());
    let body: serde_json::Value = second.json().await.unwrap();
    assert!(body["errors"]["username"].is_array());
}

#[tokio::test]
async fn invalid_registrations_return_field_errors() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let test_cases = vec![
        (json!({ "username": "has space", "password": TEST_PASSWORD }), "username"),
        (json!({ "username": "shortpw", "password": "abc" }), "password"),
        (json!({ "username": "numericpw", "password": "12345678901" }), "password"),
        (json!({ "username": "bademail", "password": TEST_PASSWORD, "email": "nope" }), "email"),
    ];

    for (body, field) in test_cases {
        let response = client.post(test_app.url("/api/users/")).json(&body).send().await.unwrap();
        assert_eq!(400, response.status().as_u16(), "payload {} should be rejected", body);
        let errors: serde_json::Value = response.json().await.unwrap();
        assert!(errors["errors"][field].is_array(), "expected an error on {}", field);
    }

    let missing = client
        .post(test_app.url("/api/users/"))
        .json(&json!({ "username": "nopassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, missing.status().as_u16());
}
