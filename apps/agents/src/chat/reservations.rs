//! Reservation book over the record store.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::ChatError;
use crate::extraction::JsonObject;
use crate::storage::{RecordStore, TableRef};

/// Most reservations a name or phone search returns.
pub const MAX_MATCHES: usize = 5;
/// Items read when searching without a reservation id.
const SCAN_LIMIT: usize = 500;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,
    pub customer_name: String,
    pub party_size: u32,
    pub reservation_date: String,
    pub reservation_time: String,
    pub reservation_datetime: NaiveDateTime,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewReservation {
    pub customer_name: String,
    pub party_size: u32,
    pub date: String,
    pub time: String,
    pub phone: String,
    pub email: String,
}

/// Search terms for [`ReservationBook::find`]. An id wins over the others;
/// name and phone match when either does.
#[derive(Debug, Clone, Default)]
pub struct ReservationQuery {
    pub reservation_id: Option<String>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReservationChanges {
    pub new_date: Option<String>,
    pub new_time: Option<String>,
    pub new_party_size: Option<u32>,
}

impl ReservationChanges {
    fn is_empty(&self) -> bool {
        self.new_date.is_none() && self.new_time.is_none() && self.new_party_size.is_none()
    }
}

/// `RES-<YYYYMMDDHHMMSS>-<4 hex>`; the suffix keeps ids made in the same
/// second apart.
pub fn new_reservation_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("RES-{}-{}", now.format("%Y%m%d%H%M%S"), &suffix[..4])
}

/// Parses a `YYYY-MM-DD` date and a 24-hour `HH:MM` time.
pub fn parse_slot(date: &str, time: &str) -> Result<NaiveDateTime, ChatError> {
    let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| {
        ChatError::InvalidRequest(format!("Date '{date}' must use the YYYY-MM-DD format"))
    })?;
    let at = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).map_err(|_| {
        ChatError::InvalidRequest(format!("Time '{time}' must use the 24-hour HH:MM format"))
    })?;
    Ok(day.and_time(at))
}

/// Reads a party size from a number or a numeric string such as `"4"` or `"4 people"`.
pub fn party_size(value: &Value) -> Result<u32, ChatError> {
    let size = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    };
    match size {
        Some(size @ 1..=100) => Ok(size as u32),
        _ => Err(ChatError::InvalidRequest(format!(
            "Party size must be a number between 1 and 100, got {value}"
        ))),
    }
}

pub struct ReservationBook<'a> {
    store: &'a dyn RecordStore,
    table: &'a TableRef,
}

impl<'a> ReservationBook<'a> {
    pub fn new(store: &'a dyn RecordStore, table: &'a TableRef) -> Self {
        Self { store, table }
    }

    pub async fn make(&self, request: NewReservation) -> Result<Reservation, ChatError> {
        let name = request.customer_name.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidRequest("A name is required for the reservation".into()));
        }
        if request.party_size == 0 {
            return Err(ChatError::InvalidRequest("Party size must be at least 1".into()));
        }
        let slot = parse_slot(&request.date, &request.time)?;

        let now = Utc::now();
        let reservation = Reservation {
            reservation_id: new_reservation_id(now),
            customer_name: name.to_string(),
            party_size: request.party_size,
            reservation_date: slot.format(DATE_FORMAT).to_string(),
            reservation_time: slot.format(TIME_FORMAT).to_string(),
            reservation_datetime: slot,
            phone: request.phone.trim().to_string(),
            email: request.email.trim().to_string(),
            status: ReservationStatus::Confirmed,
            created_at: now,
            modified_at: now,
        };
        self.store
            .put_item(self.table, serde_json::to_value(&reservation)?)
            .await?;

        info!(reservation_id = %reservation.reservation_id, party_size = reservation.party_size, "Reservation created");
        Ok(reservation)
    }

    pub async fn get(&self, reservation_id: &str) -> Result<Reservation, ChatError> {
        let item = self
            .store
            .get_item(self.table, reservation_id.trim())
            .await?
            .ok_or_else(|| ChatError::ReservationNotFound(reservation_id.to_string()))?;
        Ok(serde_json::from_value(item)?)
    }

    /// Up to [`MAX_MATCHES`] reservations, newest first. Names match as a
    /// case-insensitive substring, phones exactly.
    pub async fn find(&self, query: &ReservationQuery) -> Result<Vec<Reservation>, ChatError> {
        if let Some(id) = non_blank(&query.reservation_id) {
            return Ok(vec![self.get(id).await?]);
        }

        let name = non_blank(&query.customer_name).map(str::to_lowercase);
        let phone = non_blank(&query.phone);
        if name.is_none() && phone.is_none() {
            return Err(ChatError::InvalidRequest(
                "Please provide either a reservation ID, customer name, or phone number to search."
                    .into(),
            ));
        }

        let mut matches = Vec::new();
        for item in self.store.scan(self.table, SCAN_LIMIT).await? {
            let reservation: Reservation = serde_json::from_value(item)?;
            let by_name = name
                .as_deref()
                .is_some_and(|n| reservation.customer_name.to_lowercase().contains(n));
            let by_phone = phone.is_some_and(|p| reservation.phone == p);
            if by_name || by_phone {
                matches.push(reservation);
                if matches.len() == MAX_MATCHES {
                    break;
                }
            }
        }
        Ok(matches)
    }

    pub async fn modify(
        &self,
        reservation_id: &str,
        changes: ReservationChanges,
    ) -> Result<Reservation, ChatError> {
        if changes.is_empty() {
            return Err(ChatError::InvalidRequest(
                "No changes specified. Please provide new date, time, or party size.".into(),
            ));
        }
        let current = self.get(reservation_id).await?;

        let mut patch = JsonObject::new();
        if let Some(size) = changes.new_party_size {
            if size == 0 {
                return Err(ChatError::InvalidRequest("Party size must be at least 1".into()));
            }
            patch.insert("party_size".into(), Value::from(size));
        }
        if changes.new_date.is_some() || changes.new_time.is_some() {
            let date = changes.new_date.as_deref().unwrap_or(current.reservation_date.as_str());
            let time = changes.new_time.as_deref().unwrap_or(current.reservation_time.as_str());
            let slot = parse_slot(date, time)?;
            patch.insert("reservation_date".into(), Value::String(slot.format(DATE_FORMAT).to_string()));
            patch.insert("reservation_time".into(), Value::String(slot.format(TIME_FORMAT).to_string()));
            patch.insert("reservation_datetime".into(), serde_json::to_value(slot)?);
        }

        let updated = self.apply(&current.reservation_id, patch).await?;
        info!(reservation_id = %updated.reservation_id, "Reservation modified");
        Ok(updated)
    }

    pub async fn cancel(&self, reservation_id: &str) -> Result<Reservation, ChatError> {
        let mut patch = JsonObject::new();
        patch.insert("status".into(), serde_json::to_value(ReservationStatus::Cancelled)?);

        let cancelled = self.apply(reservation_id.trim(), patch).await?;
        info!(reservation_id = %cancelled.reservation_id, "Reservation cancelled");
        Ok(cancelled)
    }

    async fn apply(&self, reservation_id: &str, mut patch: JsonObject) -> Result<Reservation, ChatError> {
        patch.insert("modified_at".into(), serde_json::to_value(Utc::now())?);
        let item = self
            .store
            .update_item(self.table, reservation_id, patch)
            .await?
            .ok_or_else(|| ChatError::ReservationNotFound(reservation_id.to_string()))?;
        Ok(serde_json::from_value(item)?)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn format_reservation_details(reservation: &Reservation) -> String {
    let mut details = format!(
        "Reservation Details:\n\
         Reservation ID: {}\n\
         Name: {}\n\
         Party Size: {} people\n\
         Date & Time: {} at {}\n\
         Status: {}",
        reservation.reservation_id,
        reservation.customer_name,
        reservation.party_size,
        reservation.reservation_date,
        reservation.reservation_time,
        capitalize(reservation.status.as_str()),
    );
    if !reservation.phone.is_empty() {
        details.push_str(&format!("\nPhone: {}", reservation.phone));
    }
    if !reservation.email.is_empty() {
        details.push_str(&format!("\nEmail: {}", reservation.email));
    }
    details
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
