//! Quotes and live-quote selection.

pub mod model;

pub use model::{Amount, Quote, QuoteStatus};

/// Find a quote by ID.
pub fn find<'a>(quotes: &'a [Quote], id: &str) -> Option<&'a Quote> {
    quotes.iter().find(|q| q.id == id)
}

/// The live quote of a request: the most recently created quote linked to
/// it. Ties keep the first one encountered.
pub fn live_quote<'a, I>(quotes: I, request_id: &str) -> Option<&'a Quote>
where
    I: IntoIterator<Item = &'a Quote>,
{
    let mut live: Option<&'a Quote> = None;
    for quote in quotes
        .into_iter()
        .filter(|q| q.request_id.as_deref() == Some(request_id))
    {
        if live.map_or(true, |l| quote.created_at > l.created_at) {
            live = Some(quote);
        }
    }
    live
}
