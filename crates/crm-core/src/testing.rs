//! Builders shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::client::{Address, Client, ClientStatus};
use crate::quote::{Quote, QuoteStatus};
use crate::request::{Request, RequestSource, RequestStatus};

/// Noon on the given day of June 2024.
pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()
}

pub fn client(id: &str, name: &str) -> Client {
    Client {
        id: id.to_string(),
        name: name.to_string(),
        email: Some(format!("{}@example.test", id)),
        phone: Some("555-0100".to_string()),
        address: Address {
            street: "12 Elm St".to_string(),
            city: "Riverside".to_string(),
            region: String::new(),
            postal_code: String::new(),
        },
        tags: Default::default(),
        status: ClientStatus::Lead,
        created_at: at(1),
        last_activity_at: at(1),
    }
}

pub fn request(id: &str, client_id: &str, status: RequestStatus, day: u32) -> Request {
    Request {
        id: id.to_string(),
        client_id: client_id.to_string(),
        title: format!("Service {}", id),
        service_details: String::new(),
        requested_at: at(day),
        status,
        notes: None,
        source: RequestSource::Intake,
        manual_stage: None,
    }
}

pub fn quote(
    id: &str,
    client_id: &str,
    request_id: Option<&str>,
    status: QuoteStatus,
    amount: f64,
    day: u32,
) -> Quote {
    Quote {
        id: id.to_string(),
        client_id: client_id.to_string(),
        request_id: request_id.map(str::to_string),
        quote_number: id.to_string(),
        amount,
        status,
        created_at: at(day),
        sent_at: None,
        approved_at: None,
        converted_at: None,
        salesperson: None,
        notes: None,
    }
}
