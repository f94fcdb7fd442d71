use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::bling::{BlingError, ReceivableId, ReceivablesApi};
use crate::retry::{RetryPolicy, with_retry};
use crate::runtime::Runtime;

/// Terminal state of a document download.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The document was fetched on `attempt` and written to `path`.
    Saved {
        path: PathBuf,
        size: usize,
        attempt: usize,
    },
    /// Every attempt failed; `error` is the last failure.
    Unavailable { error: BlingError },
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved { .. })
    }
}

/// Fetch the payment slip of `id` under `policy` and store it in
/// `output_dir`. Running out of attempts is reported, not returned as an
/// error; failing to write the file is an error.
#[tracing::instrument(skip(runtime, api, policy))]
pub async fn fetch_document<R: Runtime, A: ReceivablesApi>(
    runtime: &R,
    api: &A,
    id: ReceivableId,
    output_dir: &Path,
    policy: &RetryPolicy,
) -> Result<DownloadOutcome> {
    println!("Waiting for the document of receivable {} to be generated...", id);

    let result = with_retry(policy, "Downloading document", |attempt| async move {
        if attempt == 1 {
            println!("Downloading PDF...");
        } else {
            println!("Retrying download ({}/{})...", attempt, policy.attempts);
        }
        api.download_document(id)
            .await
            .map(|bytes| (bytes, attempt))
    })
    .await;

    match result {
        Ok((bytes, attempt)) => {
            let path = save_document(runtime, output_dir, id, &bytes)?;
            println!("PDF saved as: {}", path.display());
            println!("PDF size: {} bytes", bytes.len());
            Ok(DownloadOutcome::Saved {
                path,
                size: bytes.len(),
                attempt,
            })
        }
        Err(error) => {
            println!(
                "The document for receivable {} is not available yet ({}).",
                id, error
            );
            println!("Try again later with `boleto download {}`.", id);
            Ok(DownloadOutcome::Unavailable { error })
        }
    }
}

/// Write `bytes` to `<output_dir>/boleto_<id>.pdf`, creating the directory if needed.
fn save_document<R: Runtime>(
    runtime: &R,
    output_dir: &Path,
    id: ReceivableId,
    bytes: &[u8],
) -> Result<PathBuf> {
    if !runtime.exists(output_dir) {
        debug!("Creating output directory {:?}", output_dir);
        runtime.create_dir_all(output_dir)?;
    }

    let path = output_dir.join(id.document_file_name());
    runtime
        .write(&path, bytes)
        .with_context(|| format!("Failed to save PDF for receivable {}", id))?;
    Ok(path)
}
