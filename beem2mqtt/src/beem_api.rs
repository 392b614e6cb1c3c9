use chrono::{Datelike, Local};
use log::{error, info};
use serde_derive::{Deserialize, Serialize};

static BASE_URL: &str = "https://api-x.beem.energy/beemapp";
static LOGIN_ENDPOINT: &str = "/user/login";
static SUMMARY_ENDPOINT: &str = "/box/summary";

/// Failure modes of the Beem cloud API client. All of them are logged at the
/// call site and converted to the soft `bool`/`Option` contract of the public
/// methods; none of them aborts the process.
#[derive(Debug)]
pub enum ApiError {
    MissingToken,
    Transport(String),
    Http { status: u16 },
    Body(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::MissingToken => write!(f, "no access token available"),
            ApiError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApiError::Http { status } => write!(f, "http status {status}"),
            ApiError::Body(msg) => write!(f, "malformed response body: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ureq::Error> for ApiError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status, _) => ApiError::Http { status },
            ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(error: std::io::Error) -> Self {
        ApiError::Body(error.to_string())
    }
}

/// One solar box as reported by the summary endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeemBox {
    pub serial_number: String,
    pub name: String,
    /// Instantaneous production in W.
    pub watt_hour: f64,
    /// Production total for the current day in Wh.
    pub total_day: f64,
    /// Production total for the current month in Wh.
    pub total_month: f64,
    /// Signal strength of the last report in dBm.
    pub last_dbm: f64,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

#[derive(Serialize)]
struct SummaryRequest {
    month: u32,
    year: i32,
}

pub struct BeemApi {
    agent: ureq::Agent,
    base_url: String,
    access_token: Option<String>,
}

impl BeemApi {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.into(),
            access_token: None,
        }
    }

    /// Authenticate against the Beem cloud. The bearer token obtained here is
    /// reused for the remaining lifetime of the process, there is no refresh.
    pub fn login(&mut self, email: &str, password: &str) -> bool {
        match self.request_token(email, password) {
            Ok(token) => {
                self.access_token = Some(token);
                info!("Successfully logged in to Beem Energy");
                true
            }
            Err(e) => {
                error!("Login failed: {e}");
                false
            }
        }
    }

    /// Fetch the box summary for the current calendar month. Requires a prior
    /// successful login; all failures are soft and yield `None`.
    pub fn fetch_summary(&self) -> Option<Vec<BeemBox>> {
        let now = Local::now();
        match self.request_summary(now.month(), now.year()) {
            Ok(boxes) => Some(boxes),
            Err(e) => {
                error!("Failed to get box summary: {e}");
                None
            }
        }
    }

    fn request_token(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .agent
            .post(&format!("{}{}", self.base_url, LOGIN_ENDPOINT))
            .send_json(LoginRequest { email, password })?;
        let login: LoginResponse = response.into_json()?;
        Ok(login.access_token)
    }

    fn request_summary(&self, month: u32, year: i32) -> Result<Vec<BeemBox>, ApiError> {
        let token = self.access_token.as_ref().ok_or(ApiError::MissingToken)?;
        let response = self
            .agent
            .post(&format!("{}{}", self.base_url, SUMMARY_ENDPOINT))
            .set("Authorization", &format!("Bearer {token}"))
            .send_json(SummaryRequest { month, year })?;
        Ok(response.into_json()?)
    }
}

impl Default for BeemApi {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_fields_deserialize_from_camel_case() {
        let payload = r#"[{
            "serialNumber": "ABC123",
            "name": "Roof",
            "wattHour": 150,
            "totalDay": 900,
            "totalMonth": 20000,
            "lastDbm": -60
        }]"#;
        let boxes: Vec<BeemBox> = serde_json::from_str(payload).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].serial_number, "ABC123");
        assert_eq!(boxes[0].name, "Roof");
        assert_eq!(boxes[0].watt_hour, 150.0);
        assert_eq!(boxes[0].total_day, 900.0);
        assert_eq!(boxes[0].total_month, 20000.0);
        assert_eq!(boxes[0].last_dbm, -60.0);
    }

    #[test]
    fn summary_without_login_is_a_local_error() {
        let api = BeemApi::new();
        let result = api.request_summary(8, 2026);
        assert!(matches!(result, Err(ApiError::MissingToken)));
    }

    #[test]
    fn fetch_summary_without_login_returns_none() {
        let api = BeemApi::new();
        assert!(api.fetch_summary().is_none());
    }
}
