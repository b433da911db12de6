//! Aggregate metrics over derived deals. Recomputed on every read.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::deal::Deal;
use crate::stage::StageRegistry;

/// Count and value of the deals in one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage_id: String,
    pub title: String,
    pub count: usize,
    pub total_amount: f64,
}

/// Pipeline-wide headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineMetrics {
    pub open_leads: usize,
    /// Percentage of deals requested within the window that were won,
    /// rounded to one decimal.
    pub conversion_rate: f64,
    pub pipeline_value: f64,
    /// Mean age of open deals in whole days.
    pub average_lead_age_days: i64,
}

/// Per-stage counts and totals, in registry order.
pub fn stage_summaries(registry: &StageRegistry, deals: &[Deal]) -> Vec<StageSummary> {
    registry
        .stages()
        .iter()
        .map(|stage| {
            let in_stage = deals.iter().filter(|d| d.stage_id() == Some(stage.id.as_str()));
            let (count, total_amount) = in_stage.fold((0, 0.0), |(count, total), d| {
                (count + 1, total + d.amount.unwrap_or(0.0))
            });
            StageSummary {
                stage_id: stage.id.clone(),
                title: stage.title.clone(),
                count,
                total_amount,
            }
        })
        .collect()
}

/// Headline metrics. Expects the all-deals view so won deals count toward
/// the conversion rate.
pub fn pipeline_metrics(deals: &[Deal], now: DateTime<Utc>, window_days: i64) -> PipelineMetrics {
    let open: Vec<&Deal> = deals.iter().filter(|d| d.is_open()).collect();

    // A window reaching past the representable range covers every deal.
    let window_start = Duration::try_days(window_days).and_then(|w| now.checked_sub_signed(w));
    let recent: Vec<&Deal> = deals
        .iter()
        .filter(|d| window_start.map_or(true, |start| d.requested_at >= start))
        .collect();
    let won = recent.iter().filter(|d| d.is_won()).count();
    let conversion_rate = if recent.is_empty() {
        0.0
    } else {
        round_one_decimal(won as f64 / recent.len() as f64 * 100.0)
    };

    let pipeline_value: f64 = open.iter().filter_map(|d| d.amount).sum();

    let average_lead_age_days = if open.is_empty() {
        0
    } else {
        let total_days: f64 = open
            .iter()
            .map(|d| d.age(now).num_seconds() as f64 / 86_400.0)
            .sum();
        (total_days / open.len() as f64).round() as i64
    };

    PipelineMetrics {
        open_leads: open.len(),
        conversion_rate,
        pipeline_value,
        average_lead_age_days,
    }
}

/// Open deals that have sat in their stage longer than its time limit.
pub fn overdue_deals<'a>(
    registry: &StageRegistry,
    deals: &'a [Deal],
    now: DateTime<Utc>,
) -> Vec<&'a Deal> {
    deals
        .iter()
        .filter(|deal| {
            deal.stage_id()
                .and_then(|id| registry.get(id))
                .and_then(|stage| stage.time_limit_days)
                .is_some_and(|days| deal.time_in_stage(now) > Duration::days(i64::from(days)))
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{ClosedOutcome, DealKind, Placement};
    use crate::stage::NEW_DEALS;
    use crate::testing::at;

    fn deal(id: &str, placement: Placement, amount: Option<f64>, day: u32) -> Deal {
        Deal {
            id: id.to_string(),
            client_id: "c-1".to_string(),
            client_name: "Acme".to_string(),
            title: id.to_string(),
            property_address: String::new(),
            contact: String::new(),
            requested_at: at(day),
            amount,
            placement,
            kind: if amount.is_some() {
                DealKind::Quote
            } else {
                DealKind::Request
            },
            quote_id: None,
            created_at: at(day),
            stage_entered_at: at(day),
        }
    }

    fn stage(id: &str) -> Placement {
        Placement::Stage(id.to_string())
    }

    #[test]
    fn test_stage_summaries() {
        let registry = StageRegistry::with_defaults();
        let deals = vec![
            deal("r-1", stage(NEW_DEALS), None, 1),
            deal("r-2", stage("draft-quote"), Some(500.0), 1),
            deal("r-3", stage("draft-quote"), Some(250.0), 1),
            deal("r-4", Placement::Closed(ClosedOutcome::Won), Some(900.0), 1),
        ];

        let summaries = stage_summaries(&registry, &deals);
        assert_eq!(summaries.len(), registry.stages().len());
        assert_eq!(summaries[0].stage_id, NEW_DEALS);
        assert_eq!(summaries[0].count, 1);
        assert_eq!(summaries[0].total_amount, 0.0);

        let draft = summaries.iter().find(|s| s.stage_id == "draft-quote").unwrap();
        assert_eq!(draft.count, 2);
        assert_eq!(draft.total_amount, 750.0);
        assert_eq!(summaries.iter().map(|s| s.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_pipeline_metrics() {
        let now = at(30);
        let deals = vec![
            deal("r-1", stage(NEW_DEALS), None, 28),
            deal("r-2", stage("draft-quote"), Some(500.0), 25),
            deal("r-3", Placement::Closed(ClosedOutcome::Won), Some(900.0), 20),
            deal("r-4", Placement::Closed(ClosedOutcome::Lost), None, 10),
        ];

        let metrics = pipeline_metrics(&deals, now, 30);
        assert_eq!(metrics.open_leads, 2);
        assert_eq!(metrics.pipeline_value, 500.0);
        assert_eq!(metrics.conversion_rate, 25.0);
        // (2 + 5) / 2 = 3.5 rounds away from zero
        assert_eq!(metrics.average_lead_age_days, 4);

        let metrics = pipeline_metrics(&deals, now, 3);
        assert_eq!(metrics.conversion_rate, 0.0);
    }

    #[test]
    fn test_conversion_rate_rounds_to_one_decimal() {
        let now = at(30);
        let deals = vec![
            deal("r-1", Placement::Closed(ClosedOutcome::Won), None, 29),
            deal("r-2", stage(NEW_DEALS), None, 29),
            deal("r-3", stage(NEW_DEALS), None, 29),
        ];
        assert_eq!(pipeline_metrics(&deals, now, 30).conversion_rate, 33.3);
    }

    #[test]
    fn test_unbounded_window_covers_every_deal() {
        let deals = vec![
            deal("r-1", Placement::Closed(ClosedOutcome::Won), None, 1),
            deal("r-2", stage(NEW_DEALS), None, 29),
        ];
        let metrics = pipeline_metrics(&deals, at(30), i64::MAX);
        assert_eq!(metrics.conversion_rate, 50.0);
    }

    #[test]
    fn test_empty_inputs_yield_zero() {
        let metrics = pipeline_metrics(&[], at(30), 30);
        assert_eq!(
            metrics,
            PipelineMetrics {
                open_leads: 0,
                conversion_rate: 0.0,
                pipeline_value: 0.0,
                average_lead_age_days: 0,
            }
        );
    }

    #[test]
    fn test_overdue_deals() {
        let registry = StageRegistry::with_defaults();
        let deals = vec![
            deal("r-1", stage(NEW_DEALS), None, 20),
            deal("r-2", stage(NEW_DEALS), None, 29),
            deal("r-3", Placement::Closed(ClosedOutcome::Won), None, 1),
        ];
        let overdue = overdue_deals(&registry, &deals, at(30));
        let ids: Vec<&str> = overdue.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["r-1"]);
    }
}
