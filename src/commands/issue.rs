use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::info;

use crate::bling::{ReceivableId, ReceivableRecord, ReceivableTemplate, ReceivablesApi};
use crate::retry::RetryPolicy;
use crate::runtime::Runtime;

use super::download::{DownloadOutcome, fetch_document};
use super::lookup::run_lookups;

/// What a full issue run produced.
#[derive(Debug)]
pub struct IssueOutcome {
    pub id: Option<ReceivableId>,
    /// `None` when no identifier came back and the download was skipped.
    pub download: Option<DownloadOutcome>,
}

/// Look up reference data, create one receivable and fetch its payment slip.
///
/// Only a rejected creation or a failed file write return an error; lookup
/// and download failures are reported and the run carries on.
#[tracing::instrument(skip(runtime, api, template, policy))]
pub async fn issue_receivable<R: Runtime, A: ReceivablesApi>(
    runtime: &R,
    api: &A,
    template: &ReceivableTemplate,
    now: DateTime<Local>,
    output_dir: &Path,
    policy: &RetryPolicy,
) -> Result<IssueOutcome> {
    run_lookups(api).await;

    let record = ReceivableRecord::from_template(template, now.date_naive(), now.timestamp());
    info!(
        "Creating receivable {} for {:.2} due {}",
        record.document_number, record.amount, record.due_date
    );

    println!();
    println!("Creating receivable...");

    let created = api
        .create_receivable(&record)
        .await
        .context("Failed to create receivable")?;

    println!("Receivable created successfully!");
    println!("Response: {}", created.body);

    let Some(id) = created.id else {
        println!("Could not read the receivable id from the response, skipping the PDF download");
        return Ok(IssueOutcome {
            id: None,
            download: None,
        });
    };

    println!("Receivable id: {}", id);
    println!();

    let download = fetch_document(runtime, api, id, output_dir, policy).await?;
    if download.is_saved() {
        println!("Boleto generated and saved successfully!");
    }

    Ok(IssueOutcome {
        id: Some(id),
        download: Some(download),
    })
}
