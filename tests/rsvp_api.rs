mod common;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use wedding_site::rsvp::{GuestRecord, RsvpRecord, RsvpStore};

fn record(id: &str, name: &str, phone: Option<&str>, day: u32) -> RsvpRecord {
    RsvpRecord {
        id: id.to_string(),
        primary_guest_name: name.to_string(),
        phone_number: phone.map(str::to_string),
        will_attend: true,
        special_message: None,
        created_at: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_submit_attending_rsvp_with_guests() {
    let site = common::start_default();

    let response = site
        .server
        .post("/api/rsvp")
        .json(&json!({
            "primaryGuestName": "  Ana Cruz ",
            "phone": "0917 555 0101",
            "guests": [
                { "id": 1, "name": "Ana Cruz" },
                { "id": 2, "name": "Ben Cruz" },
                { "id": 3, "name": "   " },
                { "id": 4, "name": "Carla Reyes" }
            ],
            "message": "",
            "willAttend": "yes"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "RSVP submitted successfully");
    assert_eq!(body["data"]["guestCount"], 2);

    let rsvps = site.rsvps.list_rsvps().await.unwrap();
    assert_eq!(rsvps.len(), 1);
    assert_eq!(rsvps[0].primary_guest_name, "Ana Cruz");
    assert_eq!(rsvps[0].special_message, None);
    assert!(rsvps[0].will_attend);

    let guests = site.rsvps.list_guests().await.unwrap();
    let names: Vec<_> = guests.iter().map(|g| g.guest_name.as_str()).collect();
    assert_eq!(names, vec!["Ben Cruz", "Carla Reyes"]);
    assert!(guests.iter().all(|g| g.rsvp_id == rsvps[0].id));
}

#[tokio::test]
async fn test_declining_rsvp_stores_no_guests() {
    let site = common::start_default();

    let response = site
        .server
        .post("/api/rsvp")
        .json(&json!({
            "primaryGuestName": "Dan",
            "guests": [{ "id": 1, "name": "Dan" }, { "id": 2, "name": "Eve" }],
            "willAttend": "no"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["guestCount"], 0);

    let rsvps = site.rsvps.list_rsvps().await.unwrap();
    assert!(!rsvps[0].will_attend);
    assert!(site.rsvps.list_guests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_null_optional_fields_are_accepted() {
    let site = common::start_default();

    let response = site
        .server
        .post("/api/rsvp")
        .json(&json!({
            "primaryGuestName": "Ana",
            "phone": null,
            "message": null,
            "guests": [{ "id": "1", "name": "Ana" }],
            "willAttend": "yes"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let rsvps = site.rsvps.list_rsvps().await.unwrap();
    assert_eq!(rsvps[0].phone_number, None);
    assert_eq!(rsvps[0].special_message, None);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let site = common::start_default();

    for body in [
        json!({ "primaryGuestName": "Ana" }),
        json!({ "primaryGuestName": "   ", "willAttend": "yes" }),
        json!({ "willAttend": "yes" }),
    ] {
        let response = site.server.post("/api/rsvp").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields");
    }

    let response = site
        .server
        .post("/api/rsvp")
        .text("not json")
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    assert!(site.rsvps.list_rsvps().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rsvp_rejects_other_methods() {
    let site = common::start_default();

    let response = site.server.get("/api/rsvp").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Method not allowed");

    let response = site.server.post("/api/rsvp-list").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_store_failures_map_to_messages() {
    let site = common::start_default();
    let body = json!({
        "primaryGuestName": "Ana",
        "guests": [{ "id": 1, "name": "Ana" }, { "id": 2, "name": "Ben" }],
        "willAttend": "yes"
    });

    site.rsvps.fail_rsvp_inserts(true);
    let response = site.server.post("/api/rsvp").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to save RSVP");

    site.rsvps.fail_rsvp_inserts(false);
    site.rsvps.fail_guest_inserts(true);
    let response = site.server.post("/api/rsvp").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to save guest information");

    site.rsvps.fail_guest_reads(true);
    let response = site.server.get("/api/rsvp-list").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to fetch guest records");

    site.rsvps.fail_reads(true);
    let response = site.server.get("/api/rsvp-list").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to fetch RSVP records");

    let response = site.server.get("/api/rsvp-list/export").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to export data to Excel");
}

#[tokio::test]
async fn test_list_is_newest_first_with_guests() {
    let site = common::start_default();
    site.rsvps
        .insert_record(record("r1", "Ana", Some("0917 555 0101"), 1))
        .await;
    site.rsvps.insert_record(record("r2", "Dan", None, 3)).await;
    site.rsvps
        .insert_guest_record(GuestRecord {
            id: "g1".to_string(),
            rsvp_id: "r1".to_string(),
            guest_name: "Ben".to_string(),
        })
        .await;

    let response = site.server.get("/api/rsvp-list").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["id"], "r2");
    assert_eq!(body["data"][0]["rsvp_guests"], json!([]));
    assert_eq!(body["data"][1]["id"], "r1");
    assert_eq!(body["data"][1]["rsvp_guests"][0]["guest_name"], "Ben");
}

#[tokio::test]
async fn test_list_search_matches_guests_and_phone() {
    let site = common::start_default();
    site.rsvps
        .insert_record(record("r1", "Ana", Some("0917 555 0101"), 1))
        .await;
    site.rsvps.insert_record(record("r2", "Dan", None, 3)).await;
    site.rsvps
        .insert_guest_record(GuestRecord {
            id: "g1".to_string(),
            rsvp_id: "r1".to_string(),
            guest_name: "Ben".to_string(),
        })
        .await;

    let response = site
        .server
        .get("/api/rsvp-list")
        .add_query_param("q", "ben")
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], "r1");

    let response = site
        .server
        .get("/api/rsvp-list")
        .add_query_param("q", "555")
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);

    let response = site
        .server
        .get("/api/rsvp-list")
        .add_query_param("q", "nobody")
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_export_downloads_workbook() {
    let site = common::start_default();
    site.rsvps.insert_record(record("r1", "Ana", None, 1)).await;

    let response = site.server.get("/api/rsvp-list/export").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );

    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"RSVP-List-"));
    assert!(disposition.ends_with(".xlsx\""));

    assert!(response.as_bytes().starts_with(b"PK"));
}

#[tokio::test]
async fn test_export_with_very_long_message() {
    let site = common::start_default();
    let response = site
        .server
        .post("/api/rsvp")
        .json(&json!({
            "primaryGuestName": "Ana",
            "message": "x".repeat(40_000),
            "willAttend": "yes"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = site.server.get("/api/rsvp-list/export").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.as_bytes().starts_with(b"PK"));
}
