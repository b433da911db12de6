//! Kanban board command.

use anyhow::Result;
use chrono::Utc;
use crm_core::store::EntityStore;
use crm_core::workflow;

use super::Session;
use crate::output;

pub fn execute(session: &mut Session) -> Result<()> {
    let now = Utc::now();
    let derivation = workflow::refresh(&mut session.store, &session.config, now)?;
    output::print_board(session.store.stages(), &derivation.deals, now);
    output::print_orphans(&derivation.orphans);
    Ok(())
}
