use anyhow::Result;
use chrono::Local;

use crate::{
    bling::{ReceivableId, ReceivableTemplate},
    runtime::Runtime,
};

pub mod config;
mod download;
mod issue;
mod lookup;
pub mod services;

pub use config::{Config, ConfigOverrides};
pub use download::{DownloadOutcome, fetch_document};
pub use issue::{IssueOutcome, issue_receivable};
pub use lookup::{DISPLAY_LIMIT, LookupSummary, run_lookups};

use services::build_bling_client;

/// Run the full flow: lookups, receivable creation, document download.
#[tracing::instrument(skip(runtime, overrides, template))]
pub async fn issue<R: Runtime>(
    runtime: R,
    overrides: ConfigOverrides,
    template: ReceivableTemplate,
) -> Result<IssueOutcome> {
    let config = Config::load(&runtime, overrides)?;
    let api = build_bling_client(&config)?;
    issue_receivable(
        &runtime,
        &api,
        &template,
        Local::now(),
        &config.output_dir,
        &config.retry,
    )
    .await
}

/// Print the reference data the receivable ids come from.
#[tracing::instrument(skip(runtime, overrides))]
pub async fn lookup<R: Runtime>(runtime: R, overrides: ConfigOverrides) -> Result<LookupSummary> {
    let config = Config::load(&runtime, overrides)?;
    let api = build_bling_client(&config)?;
    Ok(run_lookups(&api).await)
}

/// Fetch the payment slip of an existing receivable.
#[tracing::instrument(skip(runtime, overrides))]
pub async fn download<R: Runtime>(
    runtime: R,
    overrides: ConfigOverrides,
    id: ReceivableId,
) -> Result<DownloadOutcome> {
    let config = Config::load(&runtime, overrides)?;
    let api = build_bling_client(&config)?;
    fetch_document(&runtime, &api, id, &config.output_dir, &config.retry).await
}
