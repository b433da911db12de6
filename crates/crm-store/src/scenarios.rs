//! End-to-end pipeline scenarios over the seeded session.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crm_core::client::ClientStatus;
use crm_core::deal::{ClosedOutcome, Deal, Placement};
use crm_core::history::TransitionKind;
use crm_core::metrics::{overdue_deals, pipeline_metrics, stage_summaries};
use crm_core::quote::QuoteStatus;
use crm_core::request::{backfill_request_id, RequestSource, RequestStatus};
use crm_core::store::EntityStore;
use crm_core::workflow::{self, NewQuote, NewRequest};
use crm_core::{PipelineConfig, PipelineError, Verdict};

use crate::queries::{clients, quotes, requests};
use crate::session::SessionStore;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

fn setup() -> (SessionStore, PipelineConfig) {
    (SessionStore::seeded().unwrap(), PipelineConfig::default())
}

fn board(deals: &[Deal]) -> BTreeMap<&str, &str> {
    deals
        .iter()
        .filter_map(|d| d.stage_id().map(|stage| (d.id.as_str(), stage)))
        .collect()
}

fn find<'a>(deals: &'a [Deal], id: &str) -> Option<&'a Deal> {
    deals.iter().find(|d| d.id == id)
}

#[test]
fn test_seeded_board() {
    let (mut store, config) = setup();
    let derivation = workflow::refresh(&mut store, &config, now()).unwrap();
    assert!(derivation.orphans.is_empty());

    let expected: BTreeMap<&str, &str> = [
        ("req-1001", "draft-quote"),
        ("req-1002", "assessment-completed"),
        ("req-1003", "contacted"),
        ("req-1004", "overdue-assessment"),
        ("req-1005", "quote-awaiting-response"),
        ("req-1006", "followup"),
        ("req-1007", "unscheduled-assessment"),
        ("req-1010", "quote-changes-requested"),
        ("req-q-2002", "draft-quote"),
    ]
    .into_iter()
    .collect();
    assert_eq!(board(&derivation.deals), expected);

    for deal in &derivation.deals {
        assert!(deal.amount.map_or(true, |a| a > 0.0), "{} has a non-positive amount", deal.id);
    }
    assert_eq!(find(&derivation.deals, "req-1003").unwrap().amount, None);
    assert_eq!(find(&derivation.deals, "req-1005").unwrap().amount, Some(1250.0));
}

#[test]
fn test_acme_quote_approval_closes_deal() {
    let (mut store, config) = setup();
    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    let acme = find(&deals, "req-1001").unwrap();
    assert_eq!(acme.stage_id(), Some("draft-quote"));
    assert_eq!(acme.amount, Some(500.0));
    assert_eq!(acme.client_name, "Acme Property Management");

    workflow::change_quote_status(&mut store, "q-2001", QuoteStatus::Approved, now()).unwrap();

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    assert!(find(&deals, "req-1001").is_none());
    assert_eq!(clients::get_client(&store, "cl-1001").unwrap().status, ClientStatus::Active);
    assert_eq!(
        requests::get_request(&store, "req-1001").unwrap().status,
        RequestStatus::Converted
    );
    assert_eq!(quotes::get_quote(&store, "q-2001").unwrap().approved_at, Some(now()));

    let all = workflow::all_deals(&mut store, &config).unwrap().deals;
    let closed = find(&all, "req-1001").unwrap();
    assert_eq!(closed.placement, Placement::Closed(ClosedOutcome::Won));
    assert_eq!(closed.amount, Some(500.0));
}

#[test]
fn test_standalone_quote_is_backfilled() {
    let (mut store, config) = setup();
    workflow::refresh(&mut store, &config, now()).unwrap();
    let before = store.requests().len();

    let quote = workflow::create_quote(
        &mut store,
        NewQuote {
            client_id: "cl-1003".to_string(),
            request_id: None,
            amount: 800.0,
            salesperson: None,
            notes: None,
        },
        now(),
    )
    .unwrap();
    assert_eq!(quote.status, QuoteStatus::Draft);
    assert_eq!(quote.quote_number, "1007");

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    assert_eq!(store.requests().len(), before + 1);

    let request_id = backfill_request_id(&quote.id);
    let request = requests::get_request(&store, &request_id).unwrap();
    assert_eq!(
        request.source,
        RequestSource::QuoteBackfill {
            quote_id: quote.id.clone()
        }
    );
    assert_eq!(
        quotes::get_quote(&store, &quote.id).unwrap().request_id.as_deref(),
        Some(request_id.as_str())
    );

    let creation: Vec<_> = store
        .history()
        .events_for(&request_id)
        .filter(|e| e.kind == TransitionKind::RequestStatus)
        .collect();
    assert_eq!(creation.len(), 1);
    assert_eq!(creation[0].from, None);
    assert_eq!(creation[0].to, "new");
    assert_eq!(creation[0].at, now());

    let deal = find(&deals, &request_id).unwrap();
    assert_eq!(deal.stage_id(), Some("draft-quote"));
    assert_eq!(deal.amount, Some(800.0));
    assert_eq!(deal.created_at, now());

    workflow::refresh(&mut store, &config, now()).unwrap();
    assert_eq!(store.requests().len(), before + 1);
}

#[test]
fn test_drag_into_system_stage_is_denied() {
    let (mut store, config) = setup();
    let verdict = workflow::move_deal(&mut store, &config, "req-1003", "draft-quote", now()).unwrap();
    match verdict {
        Verdict::Deny(message) => assert!(message.contains("automatically managed")),
        Verdict::Allow => panic!("drop into a system stage was allowed"),
    }

    let request = requests::get_request(&store, "req-1003").unwrap();
    assert_eq!(request.status, RequestStatus::New);
    assert_eq!(request.manual_stage, None);
    assert!(quotes::list_quotes_for_request(&store, "req-1003").is_empty());

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    assert_eq!(find(&deals, "req-1003").unwrap().stage_id(), Some("contacted"));
}

#[test]
fn test_drag_out_of_system_stage_is_denied() {
    let (mut store, config) = setup();
    let verdict = workflow::move_deal(&mut store, &config, "req-1001", "contacted", now()).unwrap();
    assert!(verdict.message().unwrap().contains("cannot be moved from here"));
}

#[test]
fn test_drag_between_user_stages() {
    let (mut store, config) = setup();
    workflow::refresh(&mut store, &config, now()).unwrap();

    let later = now() + Duration::hours(3);
    let verdict = workflow::move_deal(&mut store, &config, "req-1003", "followup", later).unwrap();
    assert_eq!(verdict, Verdict::Allow);

    let deals = workflow::refresh(&mut store, &config, later).unwrap().deals;
    let deal = find(&deals, "req-1003").unwrap();
    assert_eq!(deal.stage_id(), Some("followup"));
    assert_eq!(deal.stage_entered_at, later);

    let entry = store.history().last_stage_entry("req-1003").unwrap();
    assert_eq!(entry.from.as_deref(), Some("contacted"));
    assert_eq!(entry.to, "followup");
}

#[test]
fn test_move_unknown_deal_fails() {
    let (mut store, config) = setup();
    let err = workflow::move_deal(&mut store, &config, "req-1008", "contacted", now()).unwrap_err();
    assert!(matches!(err, PipelineError::RequestNotFound(id) if id == "req-1008"));
}

#[test]
fn test_deleted_stage_falls_through() {
    let (mut store, config) = setup();
    let verdict = store.edit_stages(|stages| stages.delete("followup")).unwrap();
    assert_eq!(verdict, Verdict::Allow);

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    assert_eq!(find(&deals, "req-1006").unwrap().stage_id(), Some("new-deals"));
}

#[test]
fn test_drag_from_fallback_stage_moves_deal() {
    let (mut store, config) = setup();
    store.edit_stages(|stages| stages.delete("overdue-assessment")).unwrap();

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    assert_eq!(find(&deals, "req-1004").unwrap().stage_id(), Some("contacted"));

    let verdict = workflow::move_deal(&mut store, &config, "req-1004", "followup", now()).unwrap();
    assert_eq!(verdict, Verdict::Allow);

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    assert_eq!(find(&deals, "req-1004").unwrap().stage_id(), Some("followup"));
    assert_eq!(
        requests::get_request(&store, "req-1004").unwrap().status,
        RequestStatus::Overdue
    );
}

#[test]
fn test_pinned_stage_survives_edits() {
    let (mut store, _) = setup();
    let verdict = store.edit_stages(|stages| stages.delete("new-deals")).unwrap();
    assert!(!verdict.is_allowed());

    let order = vec!["followup".to_string(), "new-deals".to_string()];
    store.edit_stages(|stages| stages.reorder(&order)).unwrap();
    let first = &store.stages().stages()[0];
    assert_eq!(first.id, "new-deals");
    assert_eq!(first.order, 1);
    assert_eq!(store.stages().stages()[1].id, "followup");
}

#[test]
fn test_derivation_is_idempotent() {
    let (mut store, config) = setup();
    let summary = |deals: &[Deal]| -> Vec<(String, Option<String>, Option<f64>)> {
        deals
            .iter()
            .map(|d| (d.id.clone(), d.stage_id().map(str::to_string), d.amount))
            .collect()
    };
    let first = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    let second = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    assert_eq!(summary(&first), summary(&second));
}

#[test]
fn test_status_change_records_stage_entry() {
    let (mut store, config) = setup();
    workflow::refresh(&mut store, &config, now()).unwrap();

    let later = now() + Duration::days(2);
    workflow::change_request_status(&mut store, "req-1003", RequestStatus::Unscheduled, later).unwrap();
    let deals = workflow::refresh(&mut store, &config, later).unwrap().deals;

    let deal = find(&deals, "req-1003").unwrap();
    assert_eq!(deal.stage_id(), Some("unscheduled-assessment"));
    assert_eq!(deal.stage_entered_at, later);
    assert_eq!(deal.time_in_stage(later), Duration::zero());
}

#[test]
fn test_closed_won_request_activates_client() {
    let (mut store, config) = setup();
    workflow::change_request_status(&mut store, "req-1003", RequestStatus::ClosedWon, now()).unwrap();
    assert_eq!(clients::get_client(&store, "cl-1003").unwrap().status, ClientStatus::Active);

    let all = workflow::all_deals(&mut store, &config).unwrap().deals;
    assert!(find(&all, "req-1003").unwrap().is_won());
}

#[test]
fn test_create_quote_validation() {
    let (mut store, _) = setup();
    let input = |client_id: &str, request_id: Option<&str>, amount: f64| NewQuote {
        client_id: client_id.to_string(),
        request_id: request_id.map(str::to_string),
        amount,
        salesperson: None,
        notes: None,
    };

    let err = workflow::create_quote(&mut store, input("cl-1001", None, 0.0), now()).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidAmount(_)));

    let err = workflow::create_quote(&mut store, input("cl-9999", None, 10.0), now()).unwrap_err();
    assert!(matches!(err, PipelineError::ClientNotFound(_)));

    let err = workflow::create_quote(&mut store, input("cl-1001", Some("req-9999"), 10.0), now()).unwrap_err();
    assert!(matches!(err, PipelineError::RequestNotFound(_)));

    let err = workflow::create_quote(&mut store, input("cl-1001", Some("req-1003"), 10.0), now()).unwrap_err();
    assert!(matches!(err, PipelineError::Store(_)));
}

#[test]
fn test_new_quote_becomes_live() {
    let (mut store, config) = setup();
    let quote = workflow::create_quote(
        &mut store,
        NewQuote {
            client_id: "cl-1005".to_string(),
            request_id: Some("req-1005".to_string()),
            amount: 1100.0,
            salesperson: Some("Sam Okafor".to_string()),
            notes: None,
        },
        now(),
    )
    .unwrap();

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    let deal = find(&deals, "req-1005").unwrap();
    assert_eq!(deal.quote_id.as_deref(), Some(quote.id.as_str()));
    assert_eq!(deal.stage_id(), Some("draft-quote"));
    assert_eq!(deal.amount, Some(1100.0));
}

#[test]
fn test_intake_request_lands_in_new_deals() {
    let (mut store, config) = setup();
    let request = workflow::create_request(
        &mut store,
        NewRequest {
            client_id: "cl-1002".to_string(),
            title: "Pool deck repair".to_string(),
            service_details: String::new(),
            notes: None,
        },
        now(),
    )
    .unwrap();

    let deals = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    let deal = find(&deals, &request.id).unwrap();
    assert_eq!(deal.stage_id(), Some("new-deals"));
    assert_eq!(deal.created_at, now());
}

#[test]
fn test_metrics_over_seeded_session() {
    let (mut store, mut config) = setup();
    config.conversion_window_days = 45;

    let open = workflow::refresh(&mut store, &config, now()).unwrap().deals;
    let summaries = stage_summaries(store.stages(), &open);
    let draft = summaries.iter().find(|s| s.stage_id == "draft-quote").unwrap();
    assert_eq!(draft.count, 2);
    assert_eq!(draft.total_amount, 1300.0);

    let all = workflow::all_deals(&mut store, &config).unwrap().deals;
    assert_eq!(all.len(), 12);
    let metrics = pipeline_metrics(&all, now(), config.conversion_window_days);
    assert_eq!(metrics.open_leads, 9);
    assert_eq!(metrics.pipeline_value, 3530.0);
    assert_eq!(metrics.conversion_rate, 8.3);

    assert!(!overdue_deals(store.stages(), &open, now()).is_empty());
}
