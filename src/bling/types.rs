use std::fmt;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Magic marker every PDF document starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Envelope used by every Bling list endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default)]
    pub data: Vec<T>,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

/// A contact as listed by `/contatos`, or the reference embedded in a receivable.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Contact {
    pub id: u64,
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "tipoPessoa", default, skip_serializing_if = "Option::is_none")]
    pub person_type: Option<String>,
    #[serde(
        rename = "cpf_cnpj",
        alias = "numeroDocumento",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tax_id: Option<String>,
}

impl Contact {
    pub fn with_id(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Category {
    pub id: u64,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct PaymentMethod {
    pub id: u64,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The accounts-receivable record sent to `POST /contas/receber`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReceivableRecord {
    #[serde(rename = "dataEmissao", serialize_with = "serialize_date")]
    pub issue_date: NaiveDate,
    #[serde(rename = "vencimento", serialize_with = "serialize_date")]
    pub due_date: NaiveDate,
    #[serde(rename = "valor", serialize_with = "serialize_amount")]
    pub amount: f64,
    #[serde(rename = "historico", skip_serializing_if = "String::is_empty")]
    pub memo: String,
    #[serde(rename = "nroDocumento", skip_serializing_if = "String::is_empty")]
    pub document_number: String,
    #[serde(rename = "contato")]
    pub contact: Contact,
    #[serde(rename = "categoria")]
    pub category: Category,
    #[serde(rename = "formaPagamento")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "numeroParcela")]
    pub installment: u32,
    #[serde(rename = "totalParcelas")]
    pub total_installments: u32,
}

/// Constants a receivable is assembled from, besides the current time.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivableTemplate {
    pub amount: f64,
    pub memo: String,
    pub document_prefix: String,
    pub contact_id: u64,
    pub category_id: u64,
    pub payment_method_id: u64,
}

impl Default for ReceivableTemplate {
    fn default() -> Self {
        Self {
            amount: 150.50,
            memo: "Boleto emitido via API".to_string(),
            document_prefix: "RS".to_string(),
            contact_id: 17751459653,
            category_id: 8422839,
            payment_method_id: 8422840,
        }
    }
}

impl ReceivableRecord {
    /// Builds a single-installment receivable issued on `today` and due one
    /// calendar month later. `timestamp` (unix seconds) makes the document
    /// number unique per run.
    pub fn from_template(template: &ReceivableTemplate, today: NaiveDate, timestamp: i64) -> Self {
        // Month overflow clamps to the last day (Jan 31 -> Feb 28/29).
        let due_date = today.checked_add_months(Months::new(1)).unwrap_or(today);

        Self {
            issue_date: today,
            due_date,
            amount: template.amount,
            memo: template.memo.clone(),
            document_number: document_number(&template.document_prefix, timestamp),
            contact: Contact::with_id(template.contact_id),
            category: Category {
                id: template.category_id,
                description: None,
            },
            payment_method: PaymentMethod {
                id: template.payment_method_id,
                description: None,
            },
            installment: 1,
            total_installments: 1,
        }
    }
}

/// `<prefix>-<unix seconds>`, or the bare timestamp without a prefix.
pub fn document_number(prefix: &str, timestamp: i64) -> String {
    if prefix.is_empty() {
        timestamp.to_string()
    } else {
        format!("{}-{}", prefix, timestamp)
    }
}

/// Identifier of a receivable created on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceivableId(u64);

impl ReceivableId {
    /// Returns `None` for zero, which the service never assigns.
    pub fn new(id: u64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// File name the downloaded document is stored under.
    pub fn document_file_name(self) -> String {
        format!("boleto_{}.pdf", self.0)
    }

    /// Reads a positive integer out of an arbitrary JSON value.
    /// Integral floats (`123.0`) are accepted; anything else is rejected.
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        if let Some(id) = value.as_u64() {
            return Self::new(id);
        }
        let f = value.as_f64()?;
        if f.fract() == 0.0 && f > 0.0 && f <= u64::MAX as f64 {
            Self::new(f as u64)
        } else {
            None
        }
    }
}

impl std::str::FromStr for ReceivableId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Ok(id) = s.trim().parse::<u64>() else {
            anyhow::bail!("Invalid receivable id '{}': expected a positive integer", s);
        };
        let Some(id) = Self::new(id) else {
            anyhow::bail!("Invalid receivable id '{}': must be greater than zero", s);
        };
        Ok(id)
    }
}

impl fmt::Display for ReceivableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded answer of `POST /contas/receber`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedReceivable {
    /// Identifier found at `data.id`, if it was a usable positive integer.
    pub id: Option<ReceivableId>,
    /// The full response body, for display.
    pub body: serde_json::Value,
}

impl CreatedReceivable {
    pub fn from_body(body: serde_json::Value) -> Self {
        let id = body
            .get("data")
            .and_then(|data| data.get("id"))
            .and_then(ReceivableId::from_json);
        Self { id, body }
    }
}

/// Returns true when `bytes` starts with [`PDF_MAGIC`].
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
}

// serde_json would silently write NaN and infinities as `null`.
fn serialize_amount<S>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if !amount.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "amount must be a finite number, got {}",
            amount
        )));
    }
    serializer.serialize_f64(*amount)
}
