use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum RsvpStoreConfig {
    Supabase(SupabaseConfig),
    #[default]
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub url: String,
    pub service_role_key: String,
    #[serde(default = "default_rsvp_table")]
    pub rsvp_table: String,
    #[serde(default = "default_guests_table")]
    pub guests_table: String,
}

fn default_rsvp_table() -> String {
    "rsvp".to_string()
}

fn default_guests_table() -> String {
    "rsvp_guests".to_string()
}
