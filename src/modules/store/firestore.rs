use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::time::Duration;

use super::service_account::{AccessTokenProvider, ServiceAccountKey};
use super::value::{decode_fields, parse_document_name};
use super::{DocumentStore, Registration, StoredToken};
use crate::constants;
use crate::error::{AppError, AppResult};
use crate::models::config::FirestoreConfig;

const DEFAULT_DATABASE: &str = "(default)";
const PAGE_SIZE: u32 = 300;

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<Document>,
}

/// Firestore accessed over its REST API.
pub struct FirestoreStore {
    http: Client,
    documents_url: String,
    // None when talking to the emulator.
    auth: Option<AccessTokenProvider>,
}

impl FirestoreStore {
    pub fn from_config(config: &FirestoreConfig) -> AppResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(Duration::from_secs(60))
            .user_agent(constants::USER_AGENT.as_str())
            .build()?;
        let database = config.database_id.as_deref().unwrap_or(DEFAULT_DATABASE);

        if let Some(host) = config.emulator_host.as_deref().filter(|h| !h.trim().is_empty()) {
            let project = config.project_id.as_deref().ok_or_else(|| {
                AppError::Config("store.firestore.project_id is required with the emulator".into())
            })?;
            tracing::info!("Using Firestore emulator at {}", host);
            let base = format!("http://{}/v1", host.trim());
            return Ok(Self {
                http,
                documents_url: documents_url(&base, project, database),
                auth: None,
            });
        }

        let raw_key = match (&config.service_account_json, &config.service_account_path) {
            (Some(json), _) if !json.trim().is_empty() => json.clone(),
            (_, Some(path)) => std::fs::read_to_string(path)?,
            _ => {
                return Err(AppError::Config(
                    "Firestore credentials missing: set FIREBASE_SERVICE_ACCOUNT or store.firestore.service_account_path".into(),
                ))
            }
        };
        let key = ServiceAccountKey::from_json(&raw_key)?;
        let project = config
            .project_id
            .clone()
            .unwrap_or_else(|| key.project_id.clone());
        Ok(Self {
            documents_url: documents_url(constants::FIRESTORE_BASE_URL, &project, database),
            auth: Some(AccessTokenProvider::new(key, http.clone())),
            http,
        })
    }

    async fn authorized(&self, request: RequestBuilder) -> AppResult<RequestBuilder> {
        match &self.auth {
            Some(provider) => Ok(request.bearer_auth(provider.access_token().await?)),
            None => Ok(request),
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> AppResult<T> {
        let response = self.authorized(request).await?.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!("{} failed ({}): {}", what, status, body)));
        }
        Ok(response.json::<T>().await?)
    }
}

fn documents_url(base: &str, project: &str, database: &str) -> String {
    format!(
        "{}/projects/{}/databases/{}/documents",
        base.trim_end_matches('/'),
        project,
        database
    )
}

fn active_servers_query(now: DateTime<Utc>) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": constants::SERVERS_COLLECTION, "allDescendants": true }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "expired" },
                    "op": "GREATER_THAN",
                    "value": { "timestampValue": now.to_rfc3339_opts(SecondsFormat::Micros, true) }
                }
            }
        }
    })
}

fn registration_from_document(document: Document) -> Option<Registration> {
    let path = parse_document_name(&document.name)?;
    let nickname = path.parent_id?;
    Some(Registration {
        nickname,
        server_id: path.id,
        fields: decode_fields(&document.fields),
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn fetch_user_tokens(&self) -> AppResult<Vec<StoredToken>> {
        let url = format!("{}/{}", self.documents_url, constants::USERS_COLLECTION);
        let mut tokens = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("pageSize", PAGE_SIZE.to_string()),
                ("mask.fieldPaths", "token".to_string()),
            ];
            if let Some(t) = &page_token {
                query.push(("pageToken", t.clone()));
            }
            let page: ListDocumentsResponse = self
                .send_json(self.http.get(&url).query(&query), "list users")
                .await?;

            for document in page.documents {
                let owner = parse_document_name(&document.name)
                    .map(|p| p.id)
                    .unwrap_or_else(|| document.name.clone());
                let value = document
                    .fields
                    .get("token")
                    .map(super::value::decode_value)
                    .unwrap_or(Value::Null);
                tokens.push(StoredToken { owner, value });
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(tokens)
    }

    async fn fetch_active_registrations(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Registration>> {
        let url = format!("{}:runQuery", self.documents_url);
        let rows: Vec<RunQueryRow> = self
            .send_json(
                self.http.post(&url).json(&active_servers_query(now)),
                "active servers query",
            )
            .await?;

        let mut registrations = Vec::new();
        for document in rows.into_iter().filter_map(|row| row.document) {
            let name = document.name.clone();
            match registration_from_document(document) {
                Some(r) => registrations.push(r),
                None => tracing::warn!("Ignoring server document with unexpected path: {}", name),
            }
        }
        Ok(registrations)
    }
}
