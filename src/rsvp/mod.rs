pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod providers;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tracing::{error, info};

#[async_trait]
pub trait RsvpStore: Send + Sync {
    /// Inserts one RSVP and returns the stored row with its id and timestamp.
    async fn insert_rsvp(&self, rsvp: NewRsvp) -> Result<RsvpRecord, RsvpError>;

    async fn insert_guests(&self, guests: Vec<NewGuest>) -> Result<(), RsvpError>;

    /// All RSVPs, newest first.
    async fn list_rsvps(&self) -> Result<Vec<RsvpRecord>, RsvpError>;

    async fn list_guests(&self) -> Result<Vec<GuestRecord>, RsvpError>;

    fn name(&self) -> &str;
}

pub type DynRsvpStore = Arc<dyn RsvpStore>;

pub fn create_store(config: &RsvpStoreConfig) -> Result<DynRsvpStore, RsvpError> {
    match config {
        RsvpStoreConfig::Supabase(supabase) => Ok(Arc::new(
            providers::supabase::SupabaseStore::new(supabase)?,
        )),
        RsvpStoreConfig::Memory => Ok(Arc::new(providers::memory::MemoryRsvpStore::new())),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Stores an RSVP and, for attending parties, its additional guests.
///
/// The reported guest count is the size of the submitted guest list,
/// including the primary guest and any blank entries.
pub async fn submit_rsvp(
    store: &dyn RsvpStore,
    request: &RsvpRequest,
) -> Result<RsvpReceipt, RsvpError> {
    if request.primary_guest_name.trim().is_empty() || request.will_attend.trim().is_empty() {
        return Err(RsvpError::MissingFields);
    }

    let new_rsvp = NewRsvp {
        primary_guest_name: request.primary_guest_name.trim().to_string(),
        phone_number: non_blank(&request.phone),
        special_message: non_blank(&request.message),
        will_attend: request.is_attending(),
    };

    let record = store.insert_rsvp(new_rsvp).await.map_err(|e| {
        error!("Failed to save RSVP for '{}': {}", request.primary_guest_name, e);
        RsvpError::RsvpInsertFailed(e.to_string())
    })?;

    if request.is_attending() {
        let guests: Vec<NewGuest> = request
            .additional_guests()
            .map(|guest| NewGuest {
                rsvp_id: record.id.clone(),
                guest_name: guest.name.trim().to_string(),
            })
            .collect();

        if !guests.is_empty() {
            store.insert_guests(guests).await.map_err(|e| {
                error!("Failed to save guests for RSVP {}: {}", record.id, e);
                RsvpError::GuestInsertFailed(e.to_string())
            })?;
        }
    }

    info!(
        "RSVP {} saved for '{}' (attending: {})",
        record.id, record.primary_guest_name, record.will_attend
    );

    Ok(RsvpReceipt {
        rsvp_id: record.id,
        guest_count: request.guests.len(),
    })
}

/// Every RSVP, newest first, with its additional guests attached.
pub async fn list_with_guests(store: &dyn RsvpStore) -> Result<Vec<RsvpWithGuests>, RsvpError> {
    let mut rsvps = store
        .list_rsvps()
        .await
        .map_err(|e| RsvpError::RsvpFetchFailed(e.to_string()))?;
    let guests = store
        .list_guests()
        .await
        .map_err(|e| RsvpError::GuestFetchFailed(e.to_string()))?;

    let mut by_rsvp: HashMap<String, Vec<GuestRecordView>> = HashMap::new();
    for guest in guests {
        by_rsvp
            .entry(guest.rsvp_id)
            .or_default()
            .push(GuestRecordView {
                id: guest.id,
                guest_name: guest.guest_name,
            });
    }

    // Stable, so providers that already order ties keep their order
    rsvps.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(rsvps
        .into_iter()
        .map(|rsvp| {
            let rsvp_guests = by_rsvp.remove(&rsvp.id).unwrap_or_default();
            RsvpWithGuests { rsvp, rsvp_guests }
        })
        .collect())
}

/// Case-insensitive match on the primary guest or any additional guest, or a
/// substring of the phone number. A blank term keeps everything.
pub fn filter_listing(listing: Vec<RsvpWithGuests>, term: &str) -> Vec<RsvpWithGuests> {
    let term = term.trim();
    if term.is_empty() {
        return listing;
    }
    let needle = term.to_lowercase();

    listing
        .into_iter()
        .filter(|entry| {
            entry.rsvp.primary_guest_name.to_lowercase().contains(&needle)
                || entry
                    .rsvp
                    .phone_number
                    .as_deref()
                    .is_some_and(|phone| phone.contains(term))
                || entry
                    .rsvp_guests
                    .iter()
                    .any(|guest| guest.guest_name.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::providers::memory::MemoryRsvpStore;
    use super::*;

    fn request(will_attend: &str, names: &[&str]) -> RsvpRequest {
        RsvpRequest {
            primary_guest_name: "Ana Cruz".to_string(),
            phone: "  ".to_string(),
            guests: names
                .iter()
                .enumerate()
                .map(|(i, name)| GuestEntry {
                    id: i.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            message: "Congrats!".to_string(),
            will_attend: will_attend.to_string(),
        }
    }

    #[tokio::test]
    async fn test_attending_with_guests() {
        let store = MemoryRsvpStore::new();
        let receipt = submit_rsvp(&store, &request("yes", &["Ana Cruz", "Ben", "", "Cara"]))
            .await
            .unwrap();

        assert_eq!(receipt.guest_count, 4);
        let guests = store.list_guests().await.unwrap();
        let names: Vec<_> = guests.iter().map(|g| g.guest_name.as_str()).collect();
        assert_eq!(names, vec!["Ben", "Cara"]);
        assert!(guests.iter().all(|g| g.rsvp_id == receipt.rsvp_id));

        let rsvps = store.list_rsvps().await.unwrap();
        assert_eq!(rsvps[0].phone_number, None);
        assert_eq!(rsvps[0].special_message.as_deref(), Some("Congrats!"));
        assert!(rsvps[0].will_attend);
    }

    #[tokio::test]
    async fn test_declining_skips_guests() {
        let store = MemoryRsvpStore::new();
        let receipt = submit_rsvp(&store, &request("no", &["Ana Cruz", "Ben"]))
            .await
            .unwrap();

        assert_eq!(receipt.guest_count, 2);
        assert!(store.list_guests().await.unwrap().is_empty());
        assert!(!store.list_rsvps().await.unwrap()[0].will_attend);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let store = MemoryRsvpStore::new();
        let mut missing_name = request("yes", &[]);
        missing_name.primary_guest_name = " ".to_string();
        assert!(matches!(
            submit_rsvp(&store, &missing_name).await,
            Err(RsvpError::MissingFields)
        ));
        assert!(matches!(
            submit_rsvp(&store, &request("", &[])).await,
            Err(RsvpError::MissingFields)
        ));
        assert!(store.list_rsvps().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failures_are_distinguished() {
        let store = MemoryRsvpStore::new();
        store.fail_rsvp_inserts(true);
        assert!(matches!(
            submit_rsvp(&store, &request("yes", &["Ana", "Ben"])).await,
            Err(RsvpError::RsvpInsertFailed(_))
        ));

        store.fail_rsvp_inserts(false);
        store.fail_guest_inserts(true);
        assert!(matches!(
            submit_rsvp(&store, &request("yes", &["Ana", "Ben"])).await,
            Err(RsvpError::GuestInsertFailed(_))
        ));

        // No guest rows to write, so the guest table is never touched
        assert!(
            submit_rsvp(&store, &request("yes", &["Ana"]))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_listing_groups_guests_newest_first() {
        let store = MemoryRsvpStore::new();
        let first = submit_rsvp(&store, &request("yes", &["Ana", "Ben"]))
            .await
            .unwrap();
        let second = submit_rsvp(&store, &request("no", &["Dan"])).await.unwrap();

        let listing = list_with_guests(&store).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].rsvp.id, second.rsvp_id);
        assert!(listing[0].rsvp_guests.is_empty());
        assert_eq!(listing[1].rsvp.id, first.rsvp_id);
        assert_eq!(listing[1].rsvp_guests[0].guest_name, "Ben");
    }

    #[tokio::test]
    async fn test_listing_failures_name_the_table() {
        let store = MemoryRsvpStore::new();
        store.fail_guest_reads(true);
        assert!(matches!(
            list_with_guests(&store).await,
            Err(RsvpError::GuestFetchFailed(_))
        ));

        store.fail_reads(true);
        assert!(matches!(
            list_with_guests(&store).await,
            Err(RsvpError::RsvpFetchFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_filter_listing() {
        let store = MemoryRsvpStore::new();
        submit_rsvp(&store, &request("yes", &["Ana Cruz", "Benedict"]))
            .await
            .unwrap();
        let mut other = request("no", &[]);
        other.primary_guest_name = "Dan Reyes".to_string();
        other.phone = "0917 555 0101".to_string();
        submit_rsvp(&store, &other).await.unwrap();

        let listing = list_with_guests(&store).await.unwrap();
        assert_eq!(filter_listing(listing.clone(), "").len(), 2);
        assert_eq!(filter_listing(listing.clone(), "BENE").len(), 1);
        assert_eq!(
            filter_listing(listing.clone(), "555")[0].rsvp.primary_guest_name,
            "Dan Reyes"
        );
        assert!(filter_listing(listing, "zzz").is_empty());
    }
}
