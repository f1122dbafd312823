use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::rsvp::{GuestRecord, NewGuest, NewRsvp, RsvpError, RsvpRecord, RsvpStore};

/// In-process RSVP tables for local runs and tests.
#[derive(Default)]
pub struct MemoryRsvpStore {
    rsvps: RwLock<Vec<(u64, RsvpRecord)>>,
    guests: RwLock<Vec<GuestRecord>>,
    next_id: AtomicU64,
    fail_rsvps: AtomicBool,
    fail_guests: AtomicBool,
    fail_rsvp_reads: AtomicBool,
    fail_guest_reads: AtomicBool,
}

impl MemoryRsvpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn fail_rsvp_inserts(&self, fail: bool) {
        self.fail_rsvps.store(fail, Ordering::SeqCst);
    }

    pub fn fail_guest_inserts(&self, fail: bool) {
        self.fail_guests.store(fail, Ordering::SeqCst);
    }

    /// Fails reads of both tables.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_rsvp_reads.store(fail, Ordering::SeqCst);
        self.fail_guest_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_guest_reads(&self, fail: bool) {
        self.fail_guest_reads.store(fail, Ordering::SeqCst);
    }

    /// Stores a row as-is, keeping its id and timestamp.
    pub async fn insert_record(&self, record: RsvpRecord) {
        let seq = self.next_id();
        self.rsvps.write().await.push((seq, record));
    }

    pub async fn insert_guest_record(&self, guest: GuestRecord) {
        self.guests.write().await.push(guest);
    }

    fn check_reads(&self, flag: &AtomicBool) -> Result<(), RsvpError> {
        if flag.load(Ordering::SeqCst) {
            return Err(RsvpError::RemoteStatus {
                status: 503,
                body: "reads disabled".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RsvpStore for MemoryRsvpStore {
    async fn insert_rsvp(&self, rsvp: NewRsvp) -> Result<RsvpRecord, RsvpError> {
        if self.fail_rsvps.load(Ordering::SeqCst) {
            return Err(RsvpError::RemoteStatus {
                status: 500,
                body: "rsvp inserts disabled".to_string(),
            });
        }

        let seq = self.next_id();
        let record = RsvpRecord {
            id: seq.to_string(),
            primary_guest_name: rsvp.primary_guest_name,
            phone_number: rsvp.phone_number,
            will_attend: rsvp.will_attend,
            special_message: rsvp.special_message,
            created_at: Utc::now(),
        };
        self.rsvps.write().await.push((seq, record.clone()));
        Ok(record)
    }

    async fn insert_guests(&self, guests: Vec<NewGuest>) -> Result<(), RsvpError> {
        if self.fail_guests.load(Ordering::SeqCst) {
            return Err(RsvpError::RemoteStatus {
                status: 500,
                body: "guest inserts disabled".to_string(),
            });
        }

        let mut table = self.guests.write().await;
        for guest in guests {
            table.push(GuestRecord {
                id: format!("g{}", self.next_id()),
                rsvp_id: guest.rsvp_id,
                guest_name: guest.guest_name,
            });
        }
        Ok(())
    }

    async fn list_rsvps(&self) -> Result<Vec<RsvpRecord>, RsvpError> {
        self.check_reads(&self.fail_rsvp_reads)?;
        let mut rows = self.rsvps.read().await.clone();
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_seq.cmp(a_seq))
        });
        Ok(rows.into_iter().map(|(_, record)| record).collect())
    }

    async fn list_guests(&self) -> Result<Vec<GuestRecord>, RsvpError> {
        self.check_reads(&self.fail_guest_reads)?;
        Ok(self.guests.read().await.clone())
    }

    fn name(&self) -> &str {
        "Memory"
    }
}
