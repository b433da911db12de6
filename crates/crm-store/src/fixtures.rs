//! Bundled seed datasets.
//!
//! Two static datasets seed every session: clients with their requests, and
//! quotes. Each record also gets a history entry for its current status so
//! derived timestamps have something to start from.

use serde::Deserialize;

use crm_core::client::Client;
use crm_core::history::{TransitionKind, TransitionLog};
use crm_core::quote::Quote;
use crm_core::request::Request;

use crate::error::StoreResult;

const CLIENTS_DATASET: &str = include_str!("../fixtures/clients.json");
const QUOTES_DATASET: &str = include_str!("../fixtures/quotes.json");

#[derive(Deserialize)]
struct ClientDataset {
    clients: Vec<Client>,
    requests: Vec<Request>,
}

#[derive(Deserialize)]
struct QuoteDataset {
    quotes: Vec<Quote>,
}

/// Entity collections parsed from the datasets.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub clients: Vec<Client>,
    pub requests: Vec<Request>,
    pub quotes: Vec<Quote>,
}

/// Parse the bundled datasets.
pub fn load() -> StoreResult<Dataset> {
    parse(CLIENTS_DATASET, QUOTES_DATASET)
}

pub fn parse(clients_json: &str, quotes_json: &str) -> StoreResult<Dataset> {
    let ClientDataset { clients, requests } = serde_json::from_str(clients_json)?;
    let QuoteDataset { quotes } = serde_json::from_str(quotes_json)?;
    Ok(Dataset {
        clients,
        requests,
        quotes,
    })
}

/// One status entry per record, dated at the record's latest milestone.
pub fn seed_history(dataset: &Dataset) -> TransitionLog {
    let mut log = TransitionLog::new();
    for request in &dataset.requests {
        log.record(
            &request.id,
            TransitionKind::RequestStatus,
            None,
            request.status.as_str(),
            request.requested_at,
        );
    }
    for quote in &dataset.quotes {
        let at = [quote.converted_at, quote.approved_at, quote.sent_at]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(quote.created_at);
        log.record(&quote.id, TransitionKind::QuoteStatus, None, quote.status.as_str(), at);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::PipelineConfig;

    #[test]
    fn test_bundled_datasets_parse() {
        let dataset = load().unwrap();
        assert_eq!(dataset.clients.len(), 6);
        assert_eq!(dataset.requests.len(), 11);
        assert_eq!(dataset.quotes.len(), 6);
    }

    #[test]
    fn test_records_reference_known_clients() {
        let dataset = load().unwrap();
        let known = |id: &str| dataset.clients.iter().any(|c| c.id == id);
        assert!(dataset.requests.iter().all(|r| known(&r.client_id)));
        assert!(dataset.quotes.iter().all(|q| known(&q.client_id)));
    }

    #[test]
    fn test_distribution_targets_exist() {
        let dataset = load().unwrap();
        let config = PipelineConfig::default();
        for request_id in config.distribution.keys() {
            assert!(dataset.requests.iter().any(|r| &r.id == request_id));
        }
    }

    #[test]
    fn test_seed_history_dates_quotes_at_latest_milestone() {
        let dataset = load().unwrap();
        let log = seed_history(&dataset);
        assert_eq!(log.len(), dataset.requests.len() + dataset.quotes.len());

        let converted = dataset.quotes.iter().find(|q| q.id == "q-2005").unwrap();
        assert_eq!(log.last_status_change("q-2005"), converted.converted_at);
    }

    #[test]
    fn test_parse_rejects_malformed_dataset() {
        assert!(parse("{\"clients\": []}", "{\"quotes\": []}").is_err());
    }
}
