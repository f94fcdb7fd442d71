use log::warn;

use crate::bling::{BlingError, ListResponse, ReceivablesApi};

/// Entries printed per list; the rest of the page is only counted.
pub const DISPLAY_LIMIT: usize = 5;

/// Number of entries each lookup returned, `None` when it failed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupSummary {
    pub contacts: Option<usize>,
    pub payment_methods: Option<usize>,
    pub categories: Option<usize>,
}

/// Fetch and print contacts, payment methods and revenue categories.
/// Failures are reported as warnings and never stop the caller.
#[tracing::instrument(skip(api))]
pub async fn run_lookups<A: ReceivablesApi>(api: &A) -> LookupSummary {
    println!("Fetching reference data from Bling...");

    let contacts = report("Contacts", api.list_contacts().await, |c| {
        format!("id: {}, name: {}", c.id, c.name.as_deref().unwrap_or("-"))
    });

    let payment_methods = report("Payment methods", api.list_payment_methods().await, |m| {
        format!(
            "id: {}, description: {}",
            m.id,
            m.description.as_deref().unwrap_or("-")
        )
    });

    let categories = report("Categories", api.list_categories().await, |c| {
        format!(
            "id: {}, description: {}",
            c.id,
            c.description.as_deref().unwrap_or("-")
        )
    });

    LookupSummary {
        contacts,
        payment_methods,
        categories,
    }
}

fn report<T>(
    label: &str,
    result: Result<ListResponse<T>, BlingError>,
    describe: impl Fn(&T) -> String,
) -> Option<usize> {
    match result {
        Ok(list) => {
            println!("{} found: {}", label, list.data.len());
            for entry in list.data.iter().take(DISPLAY_LIMIT) {
                println!("   {}", describe(entry));
            }
            Some(list.data.len())
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}", label.to_lowercase(), e);
            None
        }
    }
}
