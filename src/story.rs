//! The couple's story timeline and the day's schedule. Both come from
//! config and reach the page templates through [`crate::templating::site_globals`].

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoryConfig {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimelineEntry {
    pub title: String,
    /// Shown as written, e.g. `July 18, 2016`.
    pub date: String,
    #[serde(default)]
    pub text: String,
    pub image: String,
    #[serde(default)]
    pub video: Option<TimelineVideo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    Youtube,
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimelineVideo {
    pub source: VideoSource,
    pub url: String,
}

impl TimelineVideo {
    /// URL the video modal loads: the embed player for YouTube links, the
    /// file itself otherwise.
    pub fn player_url(&self) -> String {
        match self.source {
            VideoSource::Youtube => youtube_embed_url(&self.url).unwrap_or_else(|| self.url.clone()),
            VideoSource::Local => self.url.clone(),
        }
    }
}

/// `watch?v=`, `youtu.be/` and `shorts/` links all map to the embed player.
pub fn youtube_embed_url(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let id = match host {
        "youtu.be" => segments.next()?.to_string(),
        "youtube.com" | "youtube-nocookie.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())?,
            "embed" => return Some(link.to_string()),
            "shorts" | "live" => segments.next()?.to_string(),
            _ => return None,
        },
        _ => return None,
    };

    if id.is_empty() {
        return None;
    }
    Some(format!("https://www.youtube.com/embed/{}", id))
}

/// One timeline entry laid out for the page. Entries alternate sides.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineCard {
    pub index: usize,
    pub title: String,
    pub date: String,
    pub text: String,
    pub image: String,
    pub reverse: bool,
    pub video_source: Option<VideoSource>,
    pub video_url: Option<String>,
}

pub fn timeline_cards(entries: &[TimelineEntry]) -> Vec<TimelineCard> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| TimelineCard {
            index,
            title: entry.title.clone(),
            date: entry.date.clone(),
            text: entry.text.clone(),
            image: entry.image.clone(),
            reverse: index % 2 == 1,
            video_source: entry.video.as_ref().map(|v| v.source),
            video_url: entry.video.as_ref().map(TimelineVideo::player_url),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleEvent {
    pub title: String,
    /// e.g. `4:00 PM - 6:00 PM`
    pub time: String,
    pub venue: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountdownUnit {
    pub value: i64,
    pub label: &'static str,
}

impl Countdown {
    /// Time left until `target`, or `None` once it has passed.
    pub fn until(target: DateTime<FixedOffset>, now: DateTime<Utc>) -> Option<Self> {
        let left = target.with_timezone(&Utc) - now;
        let total = left.num_seconds();
        if total <= 0 {
            return None;
        }
        Some(Self {
            days: total / 86_400,
            hours: total / 3_600 % 24,
            minutes: total / 60 % 60,
            seconds: total % 60,
        })
    }

    /// Non-zero units, largest first.
    pub fn units(&self) -> Vec<CountdownUnit> {
        [
            (self.days, "Day", "Days"),
            (self.hours, "Hour", "Hours"),
            (self.minutes, "Min.", "Mins."),
            (self.seconds, "Sec.", "Secs."),
        ]
        .into_iter()
        .filter(|(value, _, _)| *value > 0)
        .map(|(value, one, many)| CountdownUnit {
            value,
            label: if value == 1 { one } else { many },
        })
        .collect()
    }
}
