use std::time::Duration;

use crate::config::TallyConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::SessionRecord;
use crate::source::DataSource;

/// Data source backed by the clinic REST API.
///
/// `GET {api_url}/Sessions/{id}/prontuario` loads a record (404 means none yet),
/// `PUT` on the same path saves it. No retries: a failed call is reported to
/// the caller as is.
pub struct RemoteDataSource {
    api_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl RemoteDataSource {
    pub fn new(api_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            agent,
        }
    }

    pub fn from_config(config: &TallyConfig) -> StoreResult<Self> {
        Ok(Self::new(
            config.api_url.clone(),
            config.api_token.clone(),
            config.timeout(),
        ))
    }

    fn record_url(&self, session_id: &str) -> String {
        format!("{}/Sessions/{}/prontuario", self.api_url, session_id)
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

impl DataSource for RemoteDataSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        let url = self.record_url(session_id);
        tracing::debug!(%url, "remote load");
        let mut req = self.agent.get(&url).header("Accept", "application/json");
        if let Some(auth) = self.auth_header() {
            req = req.header("Authorization", &auth);
        }
        let mut resp = req.call().map_err(|e| http_error(&url, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| http_error(&url, e))?;

        if status == 404 {
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            return Err(api_error(&url, status, &body));
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn save(&mut self, record: &SessionRecord) -> StoreResult<()> {
        let url = self.record_url(&record.session_id);
        let payload = serde_json::to_string(record)?;
        tracing::debug!(%url, bytes = payload.len(), "remote save");
        let mut req = self
            .agent
            .put(&url)
            .header("Content-Type", "application/json");
        if let Some(auth) = self.auth_header() {
            req = req.header("Authorization", &auth);
        }
        let mut resp = req.send(payload).map_err(|e| http_error(&url, e))?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.body_mut().read_to_string().unwrap_or_default();
            return Err(api_error(&url, status, &body));
        }
        Ok(())
    }
}

fn http_error(url: &str, e: ureq::Error) -> StoreError {
    StoreError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

fn api_error(url: &str, status: u16, body: &str) -> StoreError {
    let message = api_error_message(status, body);
    tracing::warn!(%url, status, %message, "api rejected request");
    StoreError::Api {
        url: url.to_string(),
        status,
        message,
    }
}

/// Pick the most useful message out of an error body: `message`, else the
/// joined values of the `errors` map, else `"API Error: <status>"`.
fn api_error_message(status: u16, body: &str) -> String {
    let fallback = format!("API Error: {status}");
    let Ok(val) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback;
    };
    if let Some(msg) = val.get("message").and_then(|m| m.as_str()) {
        if !msg.is_empty() {
            return msg.to_string();
        }
    }
    if let Some(errors) = val.get("errors").and_then(|e| e.as_object()) {
        let messages: Vec<String> = errors
            .values()
            .flat_map(|v| match v {
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|i| i.as_str().map_or_else(|| i.to_string(), str::to_string))
                    .collect(),
                serde_json::Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            })
            .collect();
        if !messages.is_empty() {
            return messages.join(", ");
        }
    }
    fallback
}
