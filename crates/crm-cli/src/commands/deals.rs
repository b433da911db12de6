//! Deal list command.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use crm_core::store::EntityStore;
use crm_core::workflow;

use super::Session;
use crate::output;

#[derive(Args, Debug, Default)]
pub struct DealsArgs {
    /// Include closed won and closed lost deals
    #[arg(short, long)]
    pub all: bool,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(session: &mut Session, args: DealsArgs) -> Result<()> {
    let now = Utc::now();
    let derivation = if args.all {
        workflow::all_deals(&mut session.store, &session.config)?
    } else {
        workflow::refresh(&mut session.store, &session.config, now)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&derivation.deals)?);
    } else {
        output::print_deals_table(session.store.stages(), &derivation.deals, now);
        output::print_orphans(&derivation.orphans);
    }
    Ok(())
}
