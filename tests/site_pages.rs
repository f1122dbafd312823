mod common;

use axum::http::StatusCode;
use wedding_site::robots::DEFAULT_ROBOTS;
use wedding_site::story::{Profile, ScheduleEvent, TimelineEntry, TimelineVideo, VideoSource};

fn entry(title: &str, date: &str, image: &str) -> TimelineEntry {
    TimelineEntry {
        title: title.to_string(),
        date: date.to_string(),
        text: String::new(),
        image: image.to_string(),
        video: None,
    }
}

#[tokio::test]
async fn test_index_lists_galleries() {
    let mut config = common::site_config();
    config.app.couple = Some("Ana & Ben".to_string());
    let site = common::start(config);

    let response = site.server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Ana & Ben"));
    for url in [
        "/galleries/guest-gallery",
        "/galleries/prenup",
        "/galleries/proposal",
        "/galleries/wedding-day",
        "/galleries/our-story",
    ] {
        assert!(html.contains(url), "missing link to {}", url);
    }
}

#[tokio::test]
async fn test_named_pages_render() {
    let site = common::start_default();

    for path in [
        "/wedding-details",
        "/our-story",
        "/gallery-link-tree",
        "/rsvp",
        "/rsvp-admin",
    ] {
        let response = site.server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::OK, "{} failed", path);
    }
}

#[tokio::test]
async fn test_partials_and_missing_pages_are_not_found() {
    let site = common::start_default();

    for path in ["/_header", "/no-such-page", "/.hidden"] {
        let response = site.server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{}", path);
    }
}

#[tokio::test]
async fn test_robots_txt() {
    let site = common::start_default();

    let response = site.server.get("/robots.txt").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), DEFAULT_ROBOTS);
}

#[tokio::test]
async fn test_static_files_served() {
    let site = common::start_default();

    let response = site.server.get("/static/gallery.js").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("IntersectionObserver"));

    let response = site.server.get("/static/missing.css").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_story_page_renders_timeline_from_config() {
    let mut config = common::site_config();
    config.story.profiles.push(Profile {
        name: "Ana".to_string(),
        image: "/images/ana.webp".to_string(),
        text: "Loves coffee & books".to_string(),
    });
    let mut met = entry(
        "Connected Through Friends",
        "July 18, 2016",
        "/images/met-through-friend.webp",
    );
    met.text = "A <mutual> friend introduced us.".to_string();
    let mut proposal = entry("The Proposal", "December 24, 2024", "/images/proposal.webp");
    proposal.video = Some(TimelineVideo {
        source: VideoSource::Youtube,
        url: "https://www.youtube.com/watch?v=abc123".to_string(),
    });
    config.story.timeline = vec![met, proposal];
    let site = common::start(config);

    let response = site.server.get("/our-story").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Loves coffee &amp; books"));
    assert!(html.contains("Connected Through Friends"));
    assert!(html.contains("July 18, 2016"));
    assert!(html.contains("data-image=\"/images/met-through-friend.webp\""));
    assert!(html.contains("A &lt;mutual&gt; friend introduced us."));
    assert!(html.contains("data-video-source=\"youtube\""));
    assert!(html.contains("data-video-url=\"https://www.youtube.com/embed/abc123\""));
    assert!(html.contains("timeline-entry reverse"));
    assert!(html.contains("id=\"lightbox\""));
    assert!(html.contains("/static/story.js"));
    assert!(!html.contains("id=\"story-empty\""));
}

#[tokio::test]
async fn test_story_page_without_entries() {
    let site = common::start_default();

    let html = site.server.get("/our-story").await.text();
    assert!(html.contains("id=\"story-empty\""));
    assert!(!html.contains("class=\"timeline\""));
}

#[tokio::test]
async fn test_wedding_details_lists_schedule_and_countdown() {
    let mut config = common::site_config();
    config.app.wedding_date = Some("September 11, 2099".to_string());
    config.app.wedding_starts_at =
        Some(chrono::DateTime::parse_from_rfc3339("2099-09-11T16:00:00+08:00").unwrap());
    config.schedule = vec![
        ScheduleEvent {
            title: "Ceremony".to_string(),
            time: "4:00 PM - 6:00 PM".to_string(),
            venue: "Sky Garden Cafe".to_string(),
            address: Some("Lazuri Hotel Tagaytay".to_string()),
            description: Some("Join us as we exchange our vows".to_string()),
        },
        ScheduleEvent {
            title: "Reception".to_string(),
            time: "7:00 PM - 9:00 PM".to_string(),
            venue: "Sky Garden Cafe".to_string(),
            address: None,
            description: None,
        },
    ];
    let site = common::start(config);

    let html = site.server.get("/wedding-details").await.text();
    assert!(html.contains("<h3>Ceremony</h3>"));
    assert!(html.contains("4:00 PM - 6:00 PM"));
    assert!(html.contains("Sky Garden Cafe, Lazuri Hotel Tagaytay"));
    assert!(html.contains("<h3>Reception</h3>"));
    assert!(html.find("Ceremony").unwrap() < html.find("Reception").unwrap());
    assert!(!html.contains("id=\"schedule-pending\""));

    assert!(html.contains("data-countdown=\"2099-09-11T16:00:00+08:00\""));
    assert!(html.contains("<span class=\"label\">Days</span>"));
}

#[tokio::test]
async fn test_wedding_details_after_the_day() {
    let mut config = common::site_config();
    config.app.wedding_starts_at =
        Some(chrono::DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap());
    let site = common::start(config);

    let html = site.server.get("/wedding-details").await.text();
    assert!(html.contains("id=\"schedule-pending\""));
    assert!(html.contains("data-countdown=\"2020-01-01T00:00:00+00:00\" hidden"));
    assert!(!html.contains("class=\"unit\""));
}
