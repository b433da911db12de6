//! Clients.

pub mod model;

pub use model::{Address, Client, ClientStatus};

/// Find a client by ID.
pub fn find<'a>(clients: &'a [Client], id: &str) -> Option<&'a Client> {
    clients.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn client(status: ClientStatus) -> Client {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Client {
            id: "c-1".to_string(),
            name: "Acme".to_string(),
            email: Some("ops@acme.test".to_string()),
            phone: None,
            address: Address {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                ..Default::default()
            },
            tags: Default::default(),
            status,
            created_at: at,
            last_activity_at: at,
        }
    }

    #[test]
    fn test_activate_only_moves_leads_forward() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

        let mut lead = client(ClientStatus::Lead);
        assert!(lead.activate(now));
        assert_eq!(lead.status, ClientStatus::Active);
        assert_eq!(lead.last_activity_at, now);

        let mut archived = client(ClientStatus::Archived);
        assert!(!archived.activate(now));
        assert_eq!(archived.status, ClientStatus::Archived);
    }

    #[test]
    fn test_contact_line_and_address() {
        let mut c = client(ClientStatus::Lead);
        assert_eq!(c.contact_line(), "ops@acme.test");
        c.phone = Some("555-0100".to_string());
        assert_eq!(c.contact_line(), "ops@acme.test · 555-0100");
        assert_eq!(c.address.to_string(), "1 Main St, Springfield");
    }
}
