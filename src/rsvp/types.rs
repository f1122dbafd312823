use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuestEntry {
    #[serde(default, deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Body of `POST /api/rsvp`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RsvpRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub primary_guest_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub guests: Vec<GuestEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub will_attend: String,
}

impl RsvpRequest {
    pub fn is_attending(&self) -> bool {
        self.will_attend == "yes"
    }

    /// Everyone after the first entry, which is the primary guest, with a
    /// name that isn't blank.
    pub fn additional_guests(&self) -> impl Iterator<Item = &GuestEntry> {
        self.guests
            .iter()
            .skip(1)
            .filter(|guest| !guest.name.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRsvp {
    pub primary_guest_name: String,
    pub phone_number: Option<String>,
    pub special_message: Option<String>,
    pub will_attend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGuest {
    pub rsvp_id: String,
    pub guest_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpRecord {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub primary_guest_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub will_attend: bool,
    #[serde(default)]
    pub special_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestRecord {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(deserialize_with = "id_from_any")]
    pub rsvp_id: String,
    pub guest_name: String,
}

/// An RSVP row with its additional guests, as the admin listing shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsvpWithGuests {
    #[serde(flatten)]
    pub rsvp: RsvpRecord,
    pub rsvp_guests: Vec<GuestRecordView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestRecordView {
    pub id: String,
    pub guest_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpReceipt {
    pub rsvp_id: String,
    pub guest_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub data: RsvpReceipt,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<RsvpWithGuests>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Form clients send `null` for fields left empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Database ids may be uuids or serial integers.
fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected id value: {}",
            other
        ))),
    }
}
