// src/api/client.rs
//! HTTP client for the upstream ALM REST interface.
//!
//! A thin wrapper around reqwest: builds endpoint URLs and query strings,
//! threads the session cookies, and maps HTTP failures into the typed
//! error vocabulary. No business logic lives here.

use super::{AlmApi, Authenticator, ListFilter};
use crate::constants::{DOWNLOAD_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use crate::error::{AlmErrorCode, AppError};
use crate::model::{AttachmentContent, EntityKind, EntityPage};
use crate::types::{AttachmentId, Credentials, Scope, SessionToken};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Client-type string announced when opening a site session.
const CLIENT_TYPE: &str =
    "<session-parameters><client-type>rest-extraction-client</client-type></session-parameters>";

/// Longest error-body excerpt carried into an error message.
const ERROR_BODY_PREVIEW_LEN: usize = 200;

/// Per-kind upstream endpoint configuration.
struct EndpointConfig {
    /// Path segment under `/rest/domains/{d}/projects/{p}/`.
    resource: &'static str,
    /// Query field used to filter by parent, when the kind has one.
    parent_filter: Option<&'static str>,
    /// Sort clause, `{field[direction]}`.
    order_by: &'static str,
    /// Field list requested from the upstream.
    fields: &'static str,
}

fn endpoint_config(kind: EntityKind) -> Result<&'static EndpointConfig, AppError> {
    static FOLDER: EndpointConfig = EndpointConfig {
        resource: "test-folders",
        parent_filter: Some("parent-id"),
        order_by: "{id[asc]}",
        fields: "id,name,parent-id,description",
    };
    static TEST: EndpointConfig = EndpointConfig {
        resource: "tests",
        parent_filter: Some("parent-id"),
        order_by: "{id[asc]}",
        fields: "id,name,parent-id,status,description,owner,creation-time",
    };
    static DESIGN_STEP: EndpointConfig = EndpointConfig {
        resource: "design-steps",
        parent_filter: Some("parent-id"),
        order_by: "{step-order[asc]}",
        fields: "id,name,parent-id,step-order,description,expected",
    };
    static ATTACHMENT: EndpointConfig = EndpointConfig {
        resource: "attachments",
        parent_filter: Some("parent-id"),
        order_by: "{id[asc]}",
        fields: "id,name,parent-id,parent-type,file-size,description",
    };
    static RELEASE: EndpointConfig = EndpointConfig {
        resource: "releases",
        parent_filter: None,
        order_by: "{id[asc]}",
        fields: "id,name,start-date,end-date,description",
    };
    static CYCLE: EndpointConfig = EndpointConfig {
        resource: "release-cycles",
        parent_filter: Some("parent-id"),
        order_by: "{id[asc]}",
        fields: "id,name,parent-id,start-date,end-date",
    };
    static TEST_SET: EndpointConfig = EndpointConfig {
        resource: "test-sets",
        parent_filter: Some("cycle-id"),
        order_by: "{id[asc]}",
        fields: "id,name,cycle-id,status,open-date",
    };
    static RUN: EndpointConfig = EndpointConfig {
        resource: "runs",
        parent_filter: Some("testcycl-id"),
        order_by: "{id[asc]}",
        fields: "id,name,testcycl-id,cycle-id,test-id,status,owner,execution-date",
    };
    static DEFECT: EndpointConfig = EndpointConfig {
        resource: "defects",
        parent_filter: None,
        order_by: "{id[desc]}",
        fields: "id,name,status,severity,priority,detected-by,owner,creation-time,\
                 detected-in-rcyc,has-attachments,description",
    };

    match kind {
        EntityKind::Folder => Ok(&FOLDER),
        EntityKind::Test => Ok(&TEST),
        EntityKind::DesignStep => Ok(&DESIGN_STEP),
        EntityKind::Attachment => Ok(&ATTACHMENT),
        EntityKind::Release => Ok(&RELEASE),
        EntityKind::Cycle => Ok(&CYCLE),
        EntityKind::TestSet => Ok(&TEST_SET),
        EntityKind::Run => Ok(&RUN),
        EntityKind::Defect => Ok(&DEFECT),
        EntityKind::Domain | EntityKind::Project => Err(AppError::InternalError {
            message: format!("{} is served in the flat results format, use list_flat", kind),
            source: None,
        }),
    }
}

/// Flat `results`-format response (domains, projects).
#[derive(Debug, Deserialize)]
struct FlatPage {
    #[serde(default)]
    results: Vec<Value>,
}

/// HTTP client for one upstream server.
#[derive(Clone)]
pub struct AlmHttpClient {
    client: Client,
    download_client: Client,
    base_url: String,
}

impl AlmHttpClient {
    /// Creates a client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| AppError::MissingConfiguration(format!("invalid base URL: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        // Attachment downloads get a longer budget than metadata calls.
        let download_client = Client::builder()
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            download_client,
            base_url,
        })
    }

    fn scoped_url(&self, scope: &Scope, resource: &str) -> String {
        format!(
            "{}/rest/domains/{}/projects/{}/{}",
            self.base_url, scope.domain, scope.project, resource
        )
    }

    /// Builds the query string for a filtered, paginated list call.
    fn build_query_params(
        config: &EndpointConfig,
        filter: &ListFilter,
        start_index: u32,
        page_size: u32,
    ) -> Result<Vec<(String, String)>, AppError> {
        let mut params = vec![
            ("page-size".to_string(), page_size.to_string()),
            ("start-index".to_string(), start_index.to_string()),
            ("order-by".to_string(), config.order_by.to_string()),
            ("fields".to_string(), config.fields.to_string()),
        ];

        let query = match filter {
            ListFilter::All => None,
            ListFilter::ById(id) => Some(format!("{{id[{}]}}", id)),
            ListFilter::ByParent(parent_id) => {
                let field = config.parent_filter.ok_or_else(|| AppError::InternalError {
                    message: format!(
                        "endpoint {} has no parent filter field",
                        config.resource
                    ),
                    source: None,
                })?;
                Some(format!("{{{}[{}]}}", field, parent_id))
            }
            ListFilter::AttachmentsOf {
                parent_id,
                parent_kind,
            } => {
                let parent_type = parent_kind.upstream_parent_type().ok_or_else(|| {
                    AppError::UnroutableEntity {
                        kind: "attachment".to_string(),
                        parent: parent_kind.storage_tag().to_string(),
                    }
                })?;
                Some(format!(
                    "{{parent-id[{}];parent-type[{}]}}",
                    parent_id, parent_type
                ))
            }
        };
        if let Some(query) = query {
            params.push(("query".to_string(), query));
        }

        Ok(params)
    }

    /// Maps a non-success response into the typed error vocabulary.
    async fn reject(response: Response) -> AppError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let mut preview: String = body.chars().take(ERROR_BODY_PREVIEW_LEN).collect();
        if preview.is_empty() {
            preview = "<empty body>".to_string();
        }
        AppError::AlmService {
            code: AlmErrorCode::from_http_status(status),
            message: preview,
        }
    }

    /// Collects recognized session cookies from a response.
    fn absorb_cookies(token: &mut SessionToken, response: &Response) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(pair) = raw.split(';').next() else { continue };
            if let Some((name, value)) = pair.split_once('=') {
                token.absorb(name.trim(), value.trim());
            }
        }
    }
}

#[async_trait::async_trait]
impl Authenticator for AlmHttpClient {
    /// Two-step sign-in: basic-auth against the authentication point
    /// yields the SSO cookie, then opening a site session yields the
    /// remaining cookies.
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, AppError> {
        let mut token = SessionToken::default();

        let auth_url = format!("{}/authentication-point/authenticate", self.base_url);
        let response = self
            .client
            .get(&auth_url)
            .basic_auth(credentials.username.as_str(), Some(credentials.password()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::AuthenticationFailed {
                username: credentials.username.to_string(),
                message: format!("sign-in rejected with status {}", response.status()),
            });
        }
        Self::absorb_cookies(&mut token, &response);
        if token.lwsso.is_none() {
            return Err(AppError::AuthenticationFailed {
                username: credentials.username.to_string(),
                message: "sign-in response carried no SSO cookie".to_string(),
            });
        }

        let session_url = format!("{}/rest/site-session", self.base_url);
        let mut request = self
            .client
            .post(&session_url)
            .header(header::CONTENT_TYPE, "application/xml")
            .header(header::ACCEPT, "application/xml")
            .body(CLIENT_TYPE);
        if let Some(cookie) = token.cookie_header() {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await?;

        if !matches!(response.status(), StatusCode::OK | StatusCode::CREATED) {
            return Err(AppError::AuthenticationFailed {
                username: credentials.username.to_string(),
                message: format!("site session rejected with status {}", response.status()),
            });
        }
        Self::absorb_cookies(&mut token, &response);

        log::info!(
            "Authenticated {} (qc_session: {}, xsrf: {})",
            credentials.username,
            token.qc_session.is_some(),
            token.xsrf_token.is_some()
        );
        Ok(token)
    }

    async fn logout(&self, session: &SessionToken) -> Result<(), AppError> {
        let url = format!("{}/authentication-point/logout", self.base_url);
        let mut request = self.client.post(&url);
        if let Some(cookie) = session.cookie_header() {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AlmApi for AlmHttpClient {
    async fn list_page(
        &self,
        session: &SessionToken,
        scope: &Scope,
        kind: EntityKind,
        filter: &ListFilter,
        start_index: u32,
        page_size: u32,
    ) -> Result<EntityPage, AppError> {
        let config = endpoint_config(kind)?;
        let url = self.scoped_url(scope, config.resource);
        let params = Self::build_query_params(config, filter, start_index, page_size)?;

        log::debug!("GET {} (start={}, kind={})", url, start_index, kind);
        let mut request = self.client.get(&url).query(&params);
        if let Some(cookie) = session.cookie_header() {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let page: EntityPage = response.json().await?;
        Ok(page)
    }

    async fn list_flat(
        &self,
        session: &SessionToken,
        kind: EntityKind,
        domain: Option<&str>,
    ) -> Result<Vec<Value>, AppError> {
        let url = match (kind, domain) {
            (EntityKind::Domain, _) => format!("{}/rest/domains", self.base_url),
            (EntityKind::Project, Some(domain)) => {
                format!("{}/rest/domains/{}/projects", self.base_url, domain)
            }
            (EntityKind::Project, None) => {
                return Err(AppError::Validation(
                    "listing projects requires a domain".to_string(),
                ))
            }
            (other, _) => {
                return Err(AppError::InternalError {
                    message: format!("{} is not served in the flat results format", other),
                    source: None,
                })
            }
        };

        log::debug!("GET {}", url);
        let mut request = self.client.get(&url);
        if let Some(cookie) = session.cookie_header() {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let page: FlatPage = response.json().await?;
        Ok(page.results)
    }

    async fn download_attachment(
        &self,
        session: &SessionToken,
        scope: &Scope,
        id: &AttachmentId,
    ) -> Result<AttachmentContent, AppError> {
        let url = format!("{}/{}", self.scoped_url(scope, "attachments"), id);

        log::debug!("GET {} (attachment download)", url);
        let mut request = self
            .download_client
            .get(&url)
            .header(header::ACCEPT, "*/*");
        if let Some(cookie) = session.cookie_header() {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response.bytes().await?.to_vec();

        Ok(AttachmentContent {
            bytes,
            content_type,
        })
    }
}
