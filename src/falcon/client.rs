use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::fetch::HttpClient;
use crate::fetch::auth::ApiKey;
use crate::infra::keys::Credentials;
use crate::services::{ApiErrorDetail, DeviceAction, HideActionResult, HostQueryResult, HostsApi};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Default)]
struct QueryEnvelope {
    #[serde(default)]
    resources: Option<Vec<String>>,
    #[serde(default)]
    errors: Option<Vec<ApiErrorDetail>>,
}

#[derive(Deserialize, Default)]
struct ActionEnvelope {
    #[serde(default)]
    errors: Option<Vec<ApiErrorDetail>>,
}

#[derive(Serialize)]
struct ActionRequest<'a> {
    ids: [&'a str; 1],
}

/// Result of the OAuth2 client-credentials exchange.
#[derive(Debug)]
enum TokenGrant {
    Granted(String),
    /// The API refused the credentials. Carried through as the status of
    /// whatever call needed the token so it can be classified.
    Rejected(u16),
}

/// Falcon API client built once per process from resolved credentials and the
/// tenant's cloud endpoint.
pub struct FalconClient<C> {
    http: C,
    base_url: String,
    credentials: Credentials,
}

impl<C: HttpClient> FalconClient<C> {
    pub fn new(http: C, base_url: &str, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Opens a session. The bearer token is requested lazily, at most once per
    /// session.
    pub fn session(&self) -> FalconSession<'_, C> {
        FalconSession {
            client: self,
            token: OnceCell::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .with_context(|| format!("Invalid Falcon endpoint '{}{}'", self.base_url, path))
    }

    async fn request_token(&self) -> Result<TokenGrant> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("client_secret", &self.credentials.client_secret)
            .finish();

        let mut req = Request::new(Method::POST, self.endpoint("/oauth2/token")?);
        req.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(body.into());

        let response = self
            .http
            .execute(req)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send token request: {}", e))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            debug!(status = status.as_u16(), "Token request rejected");
            return Ok(TokenGrant::Rejected(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Token exchange failed with status {}: {}",
                status,
                body
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse token response: {}", e))?;

        Ok(TokenGrant::Granted(token.access_token))
    }
}

/// One authenticated conversation with the Falcon API, scoped to a single
/// invocation.
pub struct FalconSession<'a, C> {
    client: &'a FalconClient<C>,
    token: OnceCell<TokenGrant>,
}

impl<C: HttpClient> FalconSession<'_, C> {
    async fn token(&self) -> Result<&TokenGrant> {
        self.token
            .get_or_try_init(|| self.client.request_token())
            .await
    }

    async fn send(&self, token: &str, req: Request) -> Result<Response> {
        let authorized = ApiKey::bearer(&self.client.http, token)?;
        let url = req.url().path().to_string();
        authorized
            .execute(req)
            .await
            .with_context(|| format!("Falcon request to '{url}' failed"))
    }
}

/// Reads a Falcon JSON envelope. Error responses may carry no body or a non
/// JSON body; those decode to an empty envelope so the status can still be
/// classified.
async fn read_envelope<T>(response: Response) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    let success = response.status().is_success();
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(T::default());
    }
    match serde_json::from_slice(&bytes) {
        Ok(envelope) => Ok(envelope),
        Err(e) if success => Err(e).context("Failed to parse Falcon response"),
        Err(_) => Ok(T::default()),
    }
}

#[async_trait]
impl<'a, C: HttpClient> HostsApi for FalconSession<'a, C> {
    #[tracing::instrument(skip(self))]
    async fn query_devices_by_filter(&self, filter: &str) -> Result<HostQueryResult> {
        let token = match self.token().await? {
            TokenGrant::Granted(token) => token,
            TokenGrant::Rejected(status) => {
                return Ok(HostQueryResult {
                    status_code: *status,
                    ..Default::default()
                });
            }
        };

        let mut url = self.client.endpoint("/devices/queries/devices/v1")?;
        url.query_pairs_mut().append_pair("filter", filter);

        let response = self.send(token, Request::new(Method::GET, url)).await?;
        let status_code = response.status().as_u16();
        let envelope: QueryEnvelope = read_envelope(response).await?;

        debug!(status_code, "Host query answered");
        Ok(HostQueryResult {
            status_code,
            resources: envelope.resources.unwrap_or_default(),
            errors: envelope.errors.unwrap_or_default(),
        })
    }

    #[tracing::instrument(skip(self, action), fields(action = action.as_str()))]
    async fn perform_action(&self, action: DeviceAction, host_id: &str) -> Result<HideActionResult> {
        let token = match self.token().await? {
            TokenGrant::Granted(token) => token,
            TokenGrant::Rejected(status) => {
                return Ok(HideActionResult {
                    status_code: *status,
                    ..Default::default()
                });
            }
        };

        let mut url = self.client.endpoint("/devices/entities/devices-actions/v2")?;
        url.query_pairs_mut()
            .append_pair("action_name", action.as_str());

        let mut req = Request::new(Method::POST, url);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(serde_json::to_vec(&ActionRequest { ids: [host_id] })?.into());

        let response = self.send(token, req).await?;
        let status_code = response.status().as_u16();
        let envelope: ActionEnvelope = read_envelope(response).await?;

        debug!(status_code, "Device action answered");
        Ok(HideActionResult {
            status_code,
            errors: envelope.errors.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedClient;
    use reqwest::header::AUTHORIZATION;

    fn credentials() -> Credentials {
        Credentials {
            client_id: "client-id".to_string(),
            client_secret: "s3cr&t".to_string(),
        }
    }

    fn token_ok() -> (u16, String) {
        (201, r#"{"access_token":"tok","token_type":"bearer","expires_in":1799}"#.to_string())
    }

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[tokio::test]
    async fn test_query_exchanges_token_then_filters() {
        let http = ScriptedClient::new(vec![
            token_ok(),
            (200, r#"{"meta":{},"resources":["aid-1"],"errors":[]}"#.to_string()),
        ]);
        let client = FalconClient::new(&http, "https://api.crowdstrike.com/", credentials());

        let result = client
            .session()
            .query_devices_by_filter("instance_id:'i-1'")
            .await
            .unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.resources, vec!["aid-1".to_string()]);

        let requests = http.requests();
        assert_eq!(requests.len(), 2);

        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url.as_str(), "https://api.crowdstrike.com/oauth2/token");
        assert_eq!(
            requests[0].body_str(),
            "client_id=client-id&client_secret=s3cr%26t"
        );

        assert_eq!(requests[1].method, Method::GET);
        assert_eq!(requests[1].url.path(), "/devices/queries/devices/v1");
        assert_eq!(
            query_pairs(&requests[1].url),
            vec![("filter".to_string(), "instance_id:'i-1'".to_string())]
        );
        assert_eq!(requests[1].headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[tokio::test]
    async fn test_session_reuses_token_for_action() {
        let http = ScriptedClient::new(vec![
            token_ok(),
            (200, r#"{"resources":["aid-1"]}"#.to_string()),
            (202, r#"{"resources":[{"id":"aid-1","path":""}],"errors":[]}"#.to_string()),
        ]);
        let client = FalconClient::new(&http, "https://api.crowdstrike.com", credentials());
        let session = client.session();

        session.query_devices_by_filter("instance_id:'i-1'").await.unwrap();
        let action = session
            .perform_action(DeviceAction::HideHost, "aid-1")
            .await
            .unwrap();

        assert_eq!(action.status_code, 202);
        assert!(action.errors.is_empty());

        let requests = http.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].method, Method::POST);
        assert_eq!(requests[2].url.path(), "/devices/entities/devices-actions/v2");
        assert_eq!(
            query_pairs(&requests[2].url),
            vec![("action_name".to_string(), "hide_host".to_string())]
        );
        assert_eq!(requests[2].body_str(), r#"{"ids":["aid-1"]}"#);
        assert_eq!(requests[2].headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[tokio::test]
    async fn test_rejected_token_surfaces_as_query_status() {
        let http = ScriptedClient::new(vec![(
            401,
            r#"{"errors":[{"code":401,"message":"access denied, invalid client"}]}"#.to_string(),
        )]);
        let client = FalconClient::new(&http, "https://api.crowdstrike.com", credentials());

        let result = client
            .session()
            .query_devices_by_filter("instance_id:'i-1'")
            .await
            .unwrap();

        assert_eq!(result.status_code, 401);
        assert!(result.resources.is_empty());
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_token_server_error_is_transport_failure() {
        let http = ScriptedClient::new(vec![(500, "oops".to_string())]);
        let client = FalconClient::new(&http, "https://api.crowdstrike.com", credentials());

        let err = client
            .session()
            .query_devices_by_filter("instance_id:'i-1'")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Token exchange failed"));
    }

    #[tokio::test]
    async fn test_action_errors_are_decoded() {
        let http = ScriptedClient::new(vec![
            token_ok(),
            (
                400,
                r#"{"resources":null,"errors":[{"code":400,"message":"invalid id"}]}"#.to_string(),
            ),
        ]);
        let client = FalconClient::new(&http, "https://api.crowdstrike.com", credentials());

        let action = client
            .session()
            .perform_action(DeviceAction::HideHost, "aid-1")
            .await
            .unwrap();

        assert_eq!(action.status_code, 400);
        assert_eq!(
            action.errors,
            vec![ApiErrorDetail {
                code: 400,
                message: "invalid id".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_non_json_error_body_keeps_status() {
        let http = ScriptedClient::new(vec![token_ok(), (502, "<html>bad gateway</html>".to_string())]);
        let client = FalconClient::new(&http, "https://api.crowdstrike.com", credentials());

        let result = client
            .session()
            .query_devices_by_filter("instance_id:'i-1'")
            .await
            .unwrap();

        assert_eq!(result.status_code, 502);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_an_error() {
        let http = ScriptedClient::new(vec![token_ok(), (200, "not json".to_string())]);
        let client = FalconClient::new(&http, "https://api.crowdstrike.com", credentials());

        let result = client
            .session()
            .query_devices_by_filter("instance_id:'i-1'")
            .await;

        assert!(result.is_err());
    }
}
