//! Typed API surface bindings for the HippoBox backend.
//!
//! Mechanical wrappers over the authenticated request pipeline: each call
//! builds a request from a route template, sends it, and translates
//! non-success responses into [`ApiError::Http`] values. The message
//! prefers the backend's `detail` field, then the raw body.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::cmp::Ordering;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::session::SessionStore;
use crate::config::encode_component;
use crate::net::client::ApiClient;
use crate::net::transport::{ApiRequest, ApiResponse, Method};
use crate::net::types::{
    ApiKey, ApiKeyCreated, AppConfig, Knowledge, KnowledgeForm, KnowledgeUpdate, LoginForm,
    LoginTokens, Message, SignupForm, Topic, TopicForm, User,
};
use crate::net::{ApiError, routes};

/// The HippoBox API, one method per endpoint.
pub struct Api {
    client: ApiClient,
}

impl Api {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Wire up the browser stack: `localStorage`-backed session plus the
    /// fetch transport. Requires a browser environment.
    #[cfg(feature = "browser")]
    pub fn browser(config: crate::config::ApiConfig) -> Self {
        use crate::net::transport::FetchTransport;
        use crate::util::storage::LocalStorage;

        let session = Rc::new(SessionStore::new(Rc::new(LocalStorage::new())));
        Self::new(ApiClient::new(config, session, Rc::new(FetchTransport::new())))
    }

    pub fn session(&self) -> &Rc<SessionStore> {
        self.client.session()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // ---- auth ----

    /// Authenticate and store the issued session.
    pub async fn login(&self, form: &LoginForm) -> Result<LoginTokens, ApiError> {
        let request = self
            .request(Method::Post, routes::LOGIN)
            .with_body(encode_body(form)?);
        let response = self.execute(request).await?;

        let payload: serde_json::Value = response.json()?;
        self.session().set_session_from_login(&payload);
        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<User, ApiError> {
        let request = self
            .request(Method::Post, routes::SIGNUP)
            .with_body(encode_body(form)?);
        self.fetch_json(request).await
    }

    /// End the server-side session. The local session is cleared even
    /// when the call fails; stale credentials must never outlive a
    /// logout attempt.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.execute(self.request(Method::Post, routes::LOGOUT)).await;
        self.session().clear_session();
        result.map(|_| ())
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.fetch_json(self.request(Method::Get, routes::ME)).await
    }

    pub async fn verify_email(&self, token: &str) -> Result<User, ApiError> {
        let path = routes::VERIFY_EMAIL.replace("{token}", &encode_component(token));
        self.fetch_json(self.request_at(Method::Get, routes::VERIFY_EMAIL, &path))
            .await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<Message, ApiError> {
        let request = self
            .request(Method::Post, routes::VERIFY_EMAIL_RESEND)
            .with_body(serde_json::json!({"email": email}));
        self.fetch_json(request).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<Message, ApiError> {
        let request = self
            .request(Method::Post, routes::PASSWORD_RESET_REQUEST)
            .with_body(serde_json::json!({"email": email}));
        self.fetch_json(request).await
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<Message, ApiError> {
        let request = self
            .request(Method::Post, routes::PASSWORD_RESET_CONFIRM)
            .with_body(serde_json::json!({
                "token": token,
                "new_password": new_password,
            }));
        self.fetch_json(request).await
    }

    // ---- knowledge ----

    pub async fn knowledge_list(&self) -> Result<Vec<Knowledge>, ApiError> {
        self.fetch_json(self.request(Method::Get, routes::KNOWLEDGE_LIST))
            .await
    }

    pub async fn search_knowledge(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Knowledge>, ApiError> {
        let url = self.client.config().url_with_query(
            routes::KNOWLEDGE_SEARCH,
            &[("query", query.to_owned()), ("limit", limit.to_string())],
        );
        self.fetch_json(ApiRequest::new(Method::Get, routes::KNOWLEDGE_SEARCH, url))
            .await
    }

    pub async fn knowledge(&self, id: i64) -> Result<Knowledge, ApiError> {
        let path = routes::KNOWLEDGE_ITEM.replace("{knowledge_id}", &id.to_string());
        self.fetch_json(self.request_at(Method::Get, routes::KNOWLEDGE_ITEM, &path))
            .await
    }

    pub async fn knowledge_by_topic(&self, topic: &str) -> Result<Vec<Knowledge>, ApiError> {
        let path = routes::KNOWLEDGE_BY_TOPIC.replace("{topic}", &encode_component(topic));
        self.fetch_json(self.request_at(Method::Get, routes::KNOWLEDGE_BY_TOPIC, &path))
            .await
    }

    pub async fn create_knowledge(&self, form: &KnowledgeForm) -> Result<Knowledge, ApiError> {
        let request = self
            .request(Method::Post, routes::KNOWLEDGE)
            .with_body(encode_body(form)?);
        self.fetch_json(request).await
    }

    pub async fn update_knowledge(
        &self,
        id: i64,
        update: &KnowledgeUpdate,
    ) -> Result<Knowledge, ApiError> {
        let path = routes::KNOWLEDGE_ITEM.replace("{knowledge_id}", &id.to_string());
        let request = self
            .request_at(Method::Put, routes::KNOWLEDGE_ITEM, &path)
            .with_body(encode_body(update)?);
        self.fetch_json(request).await
    }

    pub async fn delete_knowledge(&self, id: i64) -> Result<(), ApiError> {
        let path = routes::KNOWLEDGE_ITEM.replace("{knowledge_id}", &id.to_string());
        self.execute(self.request_at(Method::Delete, routes::KNOWLEDGE_ITEM, &path))
            .await
            .map(|_| ())
    }

    // ---- topics ----

    pub async fn topics(&self) -> Result<Vec<Topic>, ApiError> {
        self.fetch_json(self.request(Method::Get, routes::TOPIC)).await
    }

    pub async fn create_topic(&self, form: &TopicForm) -> Result<Topic, ApiError> {
        let request = self
            .request(Method::Post, routes::TOPIC)
            .with_body(encode_body(form)?);
        self.fetch_json(request).await
    }

    // ---- API keys ----

    /// List API keys, newest first. Keys with no creation timestamp sort
    /// last.
    pub async fn api_keys(&self) -> Result<Vec<ApiKey>, ApiError> {
        let mut keys: Vec<ApiKey> = self
            .fetch_json(self.request(Method::Get, routes::API_KEY))
            .await?;
        keys.sort_by(|a, b| match (a.created_at.is_empty(), b.created_at.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b.created_at.cmp(&a.created_at),
        });
        Ok(keys)
    }

    pub async fn create_api_key(&self, name: &str) -> Result<ApiKeyCreated, ApiError> {
        let request = self
            .request(Method::Post, routes::API_KEY)
            .with_body(serde_json::json!({"name": name}));
        self.fetch_json(request).await
    }

    pub async fn set_api_key_active(&self, key_id: i64, active: bool) -> Result<ApiKey, ApiError> {
        let path = routes::API_KEY_ITEM.replace("{key_id}", &key_id.to_string());
        let request = self
            .request_at(Method::Patch, routes::API_KEY_ITEM, &path)
            .with_body(serde_json::json!({"is_active": active}));
        self.fetch_json(request).await
    }

    pub async fn delete_api_key(&self, key_id: i64) -> Result<(), ApiError> {
        let path = routes::API_KEY_ITEM.replace("{key_id}", &key_id.to_string());
        self.execute(self.request_at(Method::Delete, routes::API_KEY_ITEM, &path))
            .await
            .map(|_| ())
    }

    // ---- runtime config ----

    pub async fn app_config(&self) -> Result<AppConfig, ApiError> {
        self.fetch_json(self.request(Method::Get, routes::APP_CONFIG))
            .await
    }

    // ---- plumbing ----

    fn request(&self, method: Method, route: &'static str) -> ApiRequest {
        ApiRequest::new(method, route, self.client.config().url_for(route))
    }

    /// Build a request for a templated route with its parameters already
    /// substituted into `path`.
    fn request_at(&self, method: Method, route: &'static str, path: &str) -> ApiRequest {
        ApiRequest::new(method, route, self.client.config().url_for(path))
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.client.send(request).await?;
        if response.ok() {
            Ok(response)
        } else {
            Err(http_error(&response))
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.execute(request).await?.json()
    }
}

fn encode_body<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Translate an unsuccessful response into an [`ApiError::Http`], pulling
/// the human-readable message out of the backend's `detail` field when one
/// is present.
fn http_error(response: &ApiResponse) -> ApiError {
    let detail = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| {
            body.get("detail")
                .and_then(serde_json::Value::as_str)
                .map(ToOwned::to_owned)
        });

    let message = detail.unwrap_or_else(|| {
        if response.body.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.body.clone()
        }
    });

    ApiError::Http {
        status: response.status,
        message,
    }
}
