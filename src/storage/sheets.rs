//! Google Sheets backed vocabulary store.
//!
//! Rows live on the first tab as `id | word | translation | transcription |
//! created_at | updated_at`, with a header in row 1. Authentication uses a
//! service account: a signed JWT is exchanged for a short-lived access token
//! which is cached until shortly before it expires.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{keep_latest, NewEntry, RetrieveFilter, StoreError, VocabularyEntry, VocabularyStore};

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const APPEND_RANGE: &str = "Sheet1!A1";
const READ_RANGE: &str = "Sheet1!A:F";
const ROW_WIDTH: usize = 6;
const TOKEN_LIFETIME_SECS: i64 = 3600;
// Refresh this long before the token actually expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The parts of a service-account key file this store needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Credentials(e.to_string()))
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"***")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ValueRangeBody {
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct GoogleSheets {
    client: Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    sheet_id: String,
    api_base: String,
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSheets {
    pub fn new(key: ServiceAccountKey, sheet_id: impl Into<String>) -> Result<Self, StoreError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("private_key: {}", e)))?;
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            key,
            signing_key,
            sheet_id: sheet_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point the store at a different Sheets endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Verifies the credentials by fetching the first access token.
    pub async fn connect(&self) -> Result<(), StoreError> {
        self.access_token().await?;
        log::info!("Connected to Google Sheets API.");
        Ok(())
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.request_token(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn request_token(&self, now: DateTime<Utc>) -> Result<AccessToken, StoreError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StoreError::Auth(format!("failed to sign assertion: {}", e)))?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        log::debug!("Obtained access token valid for {}s", token.expires_in);
        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/v4/spreadsheets/{}/values/{}", self.api_base, self.sheet_id, range)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl VocabularyStore for GoogleSheets {
    async fn save(&self, entry: &NewEntry) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let body = ValueRangeBody {
            values: vec![entry_to_row(entry)],
        };

        let response = self
            .client
            .post(format!("{}:append", self.values_url(APPEND_RANGE)))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;

        log::info!("Saved entry {} to Google Sheets.", entry.id);
        Ok(())
    }

    async fn retrieve(&self, filter: &RetrieveFilter) -> Result<Vec<VocabularyEntry>, StoreError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.values_url(READ_RANGE))
            .bearer_auth(token)
            .send()
            .await?;
        let range: ValueRange = check_status(response).await?.json().await?;

        if range.values.is_empty() {
            log::info!("No data found in Google Sheets.");
            return Ok(Vec::new());
        }

        let entries = rows_to_entries(range.values);
        log::info!("Retrieved {} entries from Google Sheets.", entries.len());
        Ok(keep_latest(entries, filter))
    }
}

fn entry_to_row(entry: &NewEntry) -> Vec<String> {
    vec![
        entry.id.clone(),
        entry.word.clone(),
        entry.translation.clone(),
        entry.transcription.clone(),
        entry.created_at.to_rfc3339(),
        entry.updated_at.to_rfc3339(),
    ]
}

/// Skips the header row and every row that cannot be read back as an entry.
fn rows_to_entries(rows: Vec<Vec<String>>) -> Vec<VocabularyEntry> {
    rows.into_iter().skip(1).filter_map(row_to_entry).collect()
}

fn row_to_entry(row: Vec<String>) -> Option<VocabularyEntry> {
    if row.len() < ROW_WIDTH {
        return None;
    }
    let [id, word, translation, _transcription, created_at, updated_at]: [String; ROW_WIDTH] =
        row.into_iter().take(ROW_WIDTH).collect::<Vec<_>>().try_into().ok()?;

    if id.is_empty() || word.trim().is_empty() || translation.trim().is_empty() {
        return None;
    }

    Some(VocabularyEntry {
        id,
        word,
        translation,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
