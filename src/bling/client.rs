use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use super::error::BlingError;
use super::types::{
    Category, Contact, CreatedReceivable, ListResponse, PaymentMethod, ReceivableId,
    ReceivableRecord, is_pdf,
};

pub const DEFAULT_API_URL: &str = "https://bling.com.br/Api/v3";

const JSON: &str = "application/json";
const PDF: &str = "application/pdf";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceivablesApi: Send + Sync {
    /// `GET /contatos`: customers a receivable can be billed to.
    async fn list_contacts(&self) -> Result<ListResponse<Contact>, BlingError>;

    /// `GET /formas-pagamentos`: configured payment methods.
    async fn list_payment_methods(&self) -> Result<ListResponse<PaymentMethod>, BlingError>;

    /// `GET /categorias/receitas`: revenue categories.
    ///
    /// Like the other lookups, a non-2xx answer is only logged; an error
    /// object without `data` decodes as an empty list.
    async fn list_categories(&self) -> Result<ListResponse<Category>, BlingError>;

    /// Succeeds only when the service answers `201 Created`.
    async fn create_receivable(
        &self,
        record: &ReceivableRecord,
    ) -> Result<CreatedReceivable, BlingError>;

    /// Succeeds only on `200 OK` with a body that starts with `%PDF`.
    async fn download_document(&self, id: ReceivableId) -> Result<Vec<u8>, BlingError>;
}

/// Client for the Bling v3 REST API.
///
/// Authentication and timeouts live on the wrapped [`Client`]; see
/// `commands::services::build_http_client`.
pub struct BlingClient {
    client: Client,
    api_url: String,
}

impl BlingClient {
    #[tracing::instrument(skip(client, api_url))]
    pub fn new(client: Client, api_url: Option<String>) -> Self {
        let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// GETs a list endpoint. The status is not enforced: Bling reports
    /// errors as JSON objects without `data`, which decode as an empty list.
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ListResponse<T>, BlingError> {
        let url = format!("{}{}", self.api_url, path);
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, JSON)
            .send()
            .await
            .map_err(BlingError::Network)?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} answered HTTP {}", path, status.as_u16());
        }

        let body = response.bytes().await.map_err(BlingError::Network)?;
        serde_json::from_slice(&body).map_err(BlingError::Decode)
    }
}

#[async_trait]
impl ReceivablesApi for BlingClient {
    #[tracing::instrument(skip(self))]
    async fn list_contacts(&self) -> Result<ListResponse<Contact>, BlingError> {
        self.get_list("/contatos").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_payment_methods(&self) -> Result<ListResponse<PaymentMethod>, BlingError> {
        self.get_list("/formas-pagamentos").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_categories(&self) -> Result<ListResponse<Category>, BlingError> {
        self.get_list("/categorias/receitas").await
    }

    #[tracing::instrument(skip(self, record))]
    async fn create_receivable(
        &self,
        record: &ReceivableRecord,
    ) -> Result<CreatedReceivable, BlingError> {
        let url = format!("{}/contas/receber", self.api_url);
        let payload = serde_json::to_vec(record).map_err(BlingError::Encode)?;

        debug!("POST {} ({} bytes)...", url, payload.len());

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(payload)
            .send()
            .await
            .map_err(BlingError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(BlingError::Network)?;

        if status != StatusCode::CREATED {
            return Err(BlingError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(BlingError::Decode)?;
        Ok(CreatedReceivable::from_body(value))
    }

    #[tracing::instrument(skip(self))]
    async fn download_document(&self, id: ReceivableId) -> Result<Vec<u8>, BlingError> {
        let url = format!("{}/contas/receber/{}/pdf", self.api_url, id);
        debug!("Downloading document from {}...", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, PDF)
            .send()
            .await
            .map_err(BlingError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(BlingError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(BlingError::Network)?;
        if !is_pdf(&bytes) {
            return Err(BlingError::invalid_format(&bytes));
        }

        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bling::ReceivableTemplate;
    use chrono::NaiveDate;
    use mockito::Matcher;
    use std::time::Duration;

    fn client_for(url: &str) -> BlingClient {
        BlingClient::new(Client::new(), Some(url.to_string()))
    }

    fn sample_record() -> ReceivableRecord {
        ReceivableRecord::from_template(
            &ReceivableTemplate::default(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            1710460800,
        )
    }

    #[test]
    fn test_new_uses_default_api_url() {
        let client = BlingClient::new(Client::new(), None);
        assert_eq!(client.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = BlingClient::new(Client::new(), Some("http://localhost:1234/".to_string()));
        assert_eq!(client.api_url(), "http://localhost:1234");
    }

    #[tokio::test]
    async fn test_list_contacts() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/contatos")
            .match_header("accept", JSON)
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(r#"{"data":[{"id":17751459653,"nome":"Cliente Teste","tipoPessoa":"F"}]}"#)
            .create_async()
            .await;

        let contacts = client_for(&server.url()).list_contacts().await.unwrap();

        mock.assert_async().await;
        assert_eq!(contacts.data.len(), 1);
        assert_eq!(contacts.data[0].id, 17751459653);
        assert_eq!(contacts.data[0].name.as_deref(), Some("Cliente Teste"));
    }

    #[tokio::test]
    async fn test_list_payment_methods_and_categories() {
        let mut server = mockito::Server::new_async().await;

        let methods_mock = server
            .mock("GET", "/formas-pagamentos")
            .with_status(200)
            .with_body(r#"{"data":[{"id":8422840,"descricao":"Boleto"}]}"#)
            .create_async()
            .await;
        let categories_mock = server
            .mock("GET", "/categorias/receitas")
            .with_status(200)
            .with_body(r#"{"data":[{"id":8422839,"descricao":"Vendas"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let methods = client.list_payment_methods().await.unwrap();
        let categories = client.list_categories().await.unwrap();

        methods_mock.assert_async().await;
        categories_mock.assert_async().await;
        assert_eq!(methods.data[0].description.as_deref(), Some("Boleto"));
        assert_eq!(categories.data[0].id, 8422839);
    }

    #[tokio::test]
    async fn test_list_error_status_decodes_as_empty() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/contatos")
            .with_status(401)
            .with_body(r#"{"error":{"type":"invalid_token","message":"invalid_token"}}"#)
            .create_async()
            .await;

        let contacts = client_for(&server.url()).list_contacts().await.unwrap();
        assert!(contacts.data.is_empty());
    }

    #[tokio::test]
    async fn test_list_non_json_is_decode_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/contatos")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let result = client_for(&server.url()).list_contacts().await;
        assert!(matches!(result, Err(BlingError::Decode(_))));
    }

    #[tokio::test]
    async fn test_get_list_decodes_any_element_type() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Situation {
            id: u64,
            valor: String,
        }

        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/situacoes/modulos")
            .match_header("accept", JSON)
            .with_status(200)
            .with_body(r#"{"data":[{"id":1,"valor":"Em aberto"},{"id":2,"valor":"Recebido"}]}"#)
            .create_async()
            .await;

        let list: ListResponse<Situation> = client_for(&server.url())
            .get_list("/situacoes/modulos")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(list.data.len(), 2);
        assert_eq!(
            list.data[1],
            Situation {
                id: 2,
                valor: "Recebido".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_receivable_non_finite_amount_is_encode_error() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/contas/receber")
            .with_status(201)
            .with_body(r#"{"data":{"id":123}}"#)
            .expect(0)
            .create_async()
            .await;

        let mut record = sample_record();
        record.amount = f64::NAN;

        let result = client_for(&server.url()).create_receivable(&record).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(BlingError::Encode(_))));
    }

    #[tokio::test]
    async fn test_create_receivable_created() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/contas/receber")
            .match_header("content-type", JSON)
            .match_header("accept", JSON)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "dataEmissao": "2024-03-15",
                "vencimento": "2024-04-15",
                "valor": 150.5,
                "nroDocumento": "RS-1710460800",
                "categoria": { "id": 8422839 },
                "formaPagamento": { "id": 8422840 }
            })))
            .with_status(201)
            .with_body(r#"{"data":{"id":123}}"#)
            .create_async()
            .await;

        let created = client_for(&server.url())
            .create_receivable(&sample_record())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, ReceivableId::new(123));
        assert_eq!(created.body["data"]["id"], 123);
    }

    #[tokio::test]
    async fn test_create_receivable_rejects_ok_status() {
        // Only 201 counts as created, even for other 2xx answers.
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/contas/receber")
            .with_status(200)
            .with_body(r#"{"data":{"id":123}}"#)
            .create_async()
            .await;

        let result = client_for(&server.url())
            .create_receivable(&sample_record())
            .await;

        match result {
            Err(BlingError::RemoteStatus { status, body }) => {
                assert_eq!(status, 200);
                assert_eq!(body, r#"{"data":{"id":123}}"#);
            }
            other => panic!("Expected RemoteStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_receivable_bad_request_keeps_body() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/contas/receber")
            .with_status(400)
            .with_body(r#"{"error":"invalid category"}"#)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .create_receivable(&sample_record())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains(r#"{"error":"invalid category"}"#));
    }

    #[tokio::test]
    async fn test_create_receivable_created_with_garbage_body() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/contas/receber")
            .with_status(201)
            .with_body("created")
            .create_async()
            .await;

        let result = client_for(&server.url())
            .create_receivable(&sample_record())
            .await;
        assert!(matches!(result, Err(BlingError::Decode(_))));
    }

    #[tokio::test]
    async fn test_download_document_success() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/contas/receber/123/pdf")
            .match_header("accept", PDF)
            .with_status(200)
            .with_header("content-type", PDF)
            .with_body("%PDF-1.4 fake document")
            .create_async()
            .await;

        let bytes = client_for(&server.url())
            .download_document(ReceivableId::new(123).unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"%PDF-1.4 fake document");
    }

    #[tokio::test]
    async fn test_download_document_rejects_non_pdf_with_ok_status() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/contas/receber/123/pdf")
            .with_status(200)
            .with_body(r#"{"data":{"status":"processing"}}"#)
            .create_async()
            .await;

        let result = client_for(&server.url())
            .download_document(ReceivableId::new(123).unwrap())
            .await;
        assert!(matches!(result, Err(BlingError::InvalidFormat { .. })));
    }

    #[tokio::test]
    async fn test_download_document_not_found() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/contas/receber/123/pdf")
            .with_status(404)
            .with_body(r#"{"error":{"type":"RESOURCE_NOT_FOUND"}}"#)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .download_document(ReceivableId::new(123).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("RESOURCE_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_download_document_non_ok_status_checked_before_magic() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/contas/receber/7/pdf")
            .with_status(202)
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let err = client_for(&server.url())
            .download_document(ReceivableId::new(7).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(202));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        // Accepts connections but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let http = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let client = BlingClient::new(http, Some(url));

        let err = client.list_contacts().await.unwrap_err();
        match err {
            BlingError::Network(e) => assert!(e.is_timeout()),
            other => panic!("Expected Network error, got {:?}", other),
        }
        drop(listener);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = client_for(&url)
            .download_document(ReceivableId::new(1).unwrap())
            .await;
        assert!(matches!(result, Err(BlingError::Network(_))));
    }
}
