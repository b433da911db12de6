//! Client list command.

use anyhow::Result;
use clap::Args;
use crm_core::client::{Client, ClientStatus};
use crm_store::queries::{clients, requests};

use super::Session;
use crate::output;

#[derive(Args, Debug, Default)]
pub struct ClientsArgs {
    /// Only clients with this status (lead, active, archived)
    #[arg(short, long)]
    pub status: Option<String>,
}

pub fn execute(session: &Session, args: ClientsArgs) -> Result<()> {
    let store = &session.store;
    let listed: Vec<&Client> = match args.status.as_deref() {
        Some(status) => clients::list_clients_by_status(store, ClientStatus::try_from(status)?),
        None => clients::list_clients(store).iter().collect(),
    };

    let rows: Vec<(&Client, usize)> = listed
        .into_iter()
        .map(|client| (client, requests::list_requests_for_client(store, &client.id).len()))
        .collect();
    output::print_clients(&rows);
    Ok(())
}
