//! Client for the Bling v3 accounting API: reference lookups, receivable
//! creation and payment slip (boleto) download.

mod client;
mod error;
mod types;

#[cfg(test)]
pub use client::MockReceivablesApi;
pub use client::{BlingClient, DEFAULT_API_URL, ReceivablesApi};
pub use error::BlingError;
pub use types::{
    Category, Contact, CreatedReceivable, ListResponse, PDF_MAGIC, PaymentMethod, ReceivableId,
    ReceivableRecord, ReceivableTemplate, document_number, is_pdf,
};
