//! Pipeline metrics command.

use anyhow::Result;
use chrono::Utc;
use crm_core::metrics::{overdue_deals, pipeline_metrics, stage_summaries};
use crm_core::store::EntityStore;
use crm_core::workflow;

use super::Session;
use crate::output;

pub fn execute(session: &mut Session) -> Result<()> {
    let now = Utc::now();
    let open = workflow::refresh(&mut session.store, &session.config, now)?.deals;
    let all = workflow::all_deals(&mut session.store, &session.config)?.deals;

    let registry = session.store.stages();
    let metrics = pipeline_metrics(&all, now, session.config.conversion_window_days);
    output::print_metrics(&metrics, session.config.conversion_window_days);
    output::print_stage_summaries(&stage_summaries(registry, &open));
    output::print_overdue(registry, &overdue_deals(registry, &open, now), now);
    Ok(())
}
