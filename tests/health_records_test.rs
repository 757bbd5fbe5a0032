use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

mod common;
use common::utils::{create_test_user_and_login, spawn_app, TestApp};

fn record(weight: f64, systolic: i32, diastolic: i32, heart_rate: i32, days_ago: i64) -> Value {
    let record_time = Utc::now() - Duration::days(days_ago);
    json!({
        "weight": weight,
        "systolic_pressure": systolic,
        "diastolic_pressure": diastolic,
        "heart_rate": heart_rate,
        "blood_sugar": 5.6,
        "record_time": record_time.to_rfc3339()
    })
}

async fn create_record(app: &TestApp, token: &str, body: &Value) -> Value {
    let response = Client::new()
        .post(app.url("/api/health-records/"))
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .expect("Failed to create record");
    assert_eq!(201, response.status().as_u16());
    response.json().await.unwrap()
}

#[tokio::test]
async fn create_and_list_records_newest_first() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app).await;

    let older = create_record(&test_app, &user.access, &record(70.456, 120, 80, 72, 2)).await;
    let newer = create_record(&test_app, &user.access, &record(70.1, 118, 79, 70, 0)).await;
    assert_eq!(older["weight"], 70.46);

    let list: Vec<Value> = client
        .get(test_app.url("/api/health-records/"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], newer["id"]);
    assert_eq!(list[1]["id"], older["id"]);
}

#[tokio::test]
async fn list_filters_by_inclusive_date_range() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app).await;

    create_record(&test_app, &user.access, &record(70.0, 120, 80, 72, 10)).await;
    create_record(&test_app, &user.access, &record(71.0, 121, 81, 73, 1)).await;

    let since = (Utc::now() - Duration::days(1)).date_naive().to_string();
    let filtered: Vec<Value> = client
        .get(test_app.url(&format!("/api/health-records/?start_date={}", since)))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["weight"], 71.0);

    let malformed: Vec<Value> = client
        .get(test_app.url("/api/health-records/?start_date=01-02-2025"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(malformed.is_empty(), "A malformed date yields an empty list");
}

#[tokio::test]
async fn invalid_records_are_rejected() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app).await;

    let response = client
        .post(test_app.url("/api/health-records/"))
        .bearer_auth(&user.access)
        .json(&record(-1.0, 120, 80, 72, 0))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["errors"]["weight"].is_array());

    let missing_field = client
        .post(test_app.url("/api/health-records/"))
        .bearer_auth(&user.access)
        .json(&json!({ "weight": 70.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, missing_field.status().as_u16());
}

#[tokio::test]
async fn update_patch_and_delete_a_record() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app).await;

    let created = create_record(&test_app, &user.access, &record(70.0, 120, 80, 72, 0)).await;
    let url = test_app.url(&format!("/api/health-records/{}/", created["id"].as_str().unwrap()));

    let replaced: Value = client
        .put(&url)
        .bearer_auth(&user.access)
        .json(&record(69.0, 115, 75, 68, 0))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replaced["weight"], 69.0);
    assert_eq!(replaced["heart_rate"], 68);

    let patched = client
        .patch(&url)
        .bearer_auth(&user.access)
        .json(&json!({ "heart_rate": 90 }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, patched.status().as_u16());
    let patched: Value = patched.json().await.unwrap();
    assert_eq!(patched["heart_rate"], 90);
    assert_eq!(patched["weight"], 69.0);

    let deleted = client.delete(&url).bearer_auth(&user.access).send().await.unwrap();
    assert_eq!(204, deleted.status().as_u16());

    let gone = client.get(&url).bearer_auth(&user.access).send().await.unwrap();
    assert_eq!(404, gone.status().as_u16());
}

#[tokio::test]
async fn records_are_isolated_between_users() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let owner = create_test_user_and_login(&test_app).await;
    let intruder = create_test_user_and_login(&test_app).await;

    let created = create_record(&test_app, &owner.access, &record(70.0, 120, 80, 72, 0)).await;
    let url = test_app.url(&format!("/api/health-records/{}/", created["id"].as_str().unwrap()));

    let read = client.get(&url).bearer_auth(&intruder.access).send().await.unwrap();
    assert_eq!(404, read.status().as_u16());

    let write = client
        .put(&url)
        .bearer_auth(&intruder.access)
        .json(&record(50.0, 100, 60, 60, 0))
        .send()
        .await
        .unwrap();
    assert_eq!(404, write.status().as_u16());

    let patch = client
        .patch(&url)
        .bearer_auth(&intruder.access)
        .json(&json!({ "weight": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(404, patch.status().as_u16());

    let delete = client.delete(&url).bearer_auth(&intruder.access).send().await.unwrap();
    assert_eq!(404, delete.status().as_u16());

    let listed: Vec<Value> = client
        .get(test_app.url("/api/health-records/"))
        .bearer_auth(&intruder.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());

    let still_there = client.get(&url).bearer_auth(&owner.access).send().await.unwrap();
    assert_eq!(200, still_there.status().as_u16());
}

#[tokio::test]
async fn batch_create_is_all_or_nothing() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app).await;

    let invalid_batch = json!([record(70.0, 120, 80, 72, 1), record(70.0, 999, 80, 72, 0)]);
    let rejected = client
        .post(test_app.url("/api/health-records/batch/"))
        .bearer_auth(&user.access)
        .json(&invalid_batch)
        .send()
        .await
        .unwrap();
    assert_eq!(400, rejected.status().as_u16());
    let body: Value = rejected.json().await.unwrap();
    assert!(body["errors"]["1.systolic_pressure"].is_array());

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM health_records")
        .fetch_one(&test_app.db_pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);

    let valid_batch = json!([record(70.0, 120, 80, 72, 1), record(71.0, 122, 82, 74, 0)]);
    let accepted = client
        .post(test_app.url("/api/health-records/batch/"))
        .bearer_auth(&user.access)
        .json(&valid_batch)
        .send()
        .await
        .unwrap();
    assert_eq!(201, accepted.status().as_u16());
    let created: Vec<Value> = accepted.json().await.unwrap();
    assert_eq!(created.len(), 2);
}

#[tokio::test]
async fn statistics_on_empty_history_are_zero() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app).await;

    let test_cases = vec![
        ("weight", json!(0.0)),
        ("bloodPressure", json!("0/0")),
        ("heartRate", json!("0")),
        ("bloodSugar", json!("0.0")),
    ];

    for (metric, zero) in test_cases {
        let response = client
            .get(test_app.url(&format!("/api/health-records/statistics/?type={}&period=month", metric)))
            .bearer_auth(&user.access)
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["average"], zero, "average for {}", metric);
        assert_eq!(body["max"], zero);
        assert_eq!(body["min"], zero);
        assert_eq!(body["count"], 0);
        assert_eq!(body["data"], json!([]));
    }
}

#[tokio::test]
async fn statistics_aggregate_the_requested_period() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let user = create_test_user_and_login(&test_app).await;

    create_record(&test_app, &user.access, &record(70.0, 120, 80, 70, 1)).await;
    create_record(&test_app, &user.access, &record(72.0, 130, 90, 80, 0)).await;
    // Outside the default week
    create_record(&test_app, &user.access, &record(90.0, 160, 100, 100, 20)).await;

    let weight: Value = client
        .get(test_app.url("/api/health-records/statistics/"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(weight["count"], 2);
    assert_eq!(weight["average"], 71.0);
    assert_eq!(weight["max"], 72.0);
    assert_eq!(weight["min"], 70.0);
    assert_eq!(weight["data"].as_array().unwrap().len(), 2);

    let pressure: Value = client
        .get(test_app.url("/api/health-records/statistics/?type=bloodPressure&period=all"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pressure["count"], 3);
    assert_eq!(pressure["max"], "160/100");
    assert_eq!(pressure["min"], "120/80");
    assert!(pressure["data"][0]["systolic"].is_number());

    let heart_rate: Value = client
        .get(test_app.url("/api/health-records/statistics/?type=heartRate&period=week"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(heart_rate["average"], "75");
}

#[tokio::test]
async fn statistics_reject_unknown_types() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app).await;

    let response = Client::new()
        .get(test_app.url("/api/health-records/statistics/?type=steps"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
}
