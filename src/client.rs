//! HTTP client for the chat backend.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::stream::{ChatStream, process_chat_stream};
use crate::types::{ChatMessage, ChatRecord, ChatSummary, Envelope, MessagePayload, Model};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the chat backend.
///
/// Configuration is fixed at construction: the auth token is injected
/// read-only rather than read from ambient state, and its absence is not a
/// client-side error (the server enforces authentication).
#[derive(Clone)]
pub struct LexiChat {
    client: ReqwestClient,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

/// Success payload of `/ai/create`.
#[derive(Deserialize)]
struct CreatedChat {
    #[serde(
        rename = "historyId",
        deserialize_with = "crate::types::id_string::deserialize"
    )]
    history_id: String,
}

impl LexiChat {
    /// Create a new client for the backend at `base_url`, with no auth
    /// token and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(format!("Failed to build HTTP client: {e}"), Some(Box::new(e)))
            })?;
        if let Some(token) = &token {
            HeaderValue::from_str(token).map_err(|_| {
                Error::validation("auth token is not a valid header value", Some("token".to_string()))
            })?;
        }

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes traffic through this client.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create and return default headers for API requests.
    ///
    /// The `Authorization` header is attached only when a token is
    /// configured; the token was validated at construction.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            headers.insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(token).expect("token was validated at construction"),
            );
        }
        headers
    }

    fn notify(&self, err: &Error) {
        if let Some(logger) = &self.logger {
            logger.log_request_error(err);
        }
    }

    /// Map a reqwest send failure onto the transport-error taxonomy.
    fn request_error(&self, e: reqwest::Error) -> Error {
        let err = if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        };
        self.notify(&err);
        err
    }

    /// Reject non-2xx responses. A 401 maps to an authentication error,
    /// which callers typically answer by sending the user back to login.
    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body
        };
        let err = match status_code {
            401 => Error::authentication(message),
            408 => Error::timeout(message, None),
            _ => Error::status(status_code, message),
        };
        self.notify(&err);
        Err(err)
    }

    async fn parse_envelope<T: DeserializeOwned>(&self, response: Response) -> Result<Envelope<T>> {
        response.json::<Envelope<T>>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    async fn send_form(
        &self,
        builder: reqwest::RequestBuilder,
        params: &[(&str, &str)],
    ) -> Result<Response> {
        let response = builder
            .headers(self.default_headers())
            .form(params)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        self.check_status(response).await
    }

    /// Create a new chat session and return its history identifier.
    ///
    /// Fails with a validation error before any network call if `user_id`
    /// is empty.
    pub async fn create_chat(&self, user_id: &str, title: &str, kind: &str) -> Result<String> {
        if user_id.is_empty() {
            return Err(Error::validation(
                "userId is required",
                Some("userId".to_string()),
            ));
        }
        let url = format!("{}/ai/create", self.base_url);
        let params = [("userId", user_id), ("title", title), ("type", kind)];
        let response = self.send_form(self.client.post(&url), &params).await?;
        let envelope: Envelope<CreatedChat> = self.parse_envelope(response).await?;
        Ok(envelope.into_data()?.history_id)
    }

    /// Rename an existing chat session.
    pub async fn rename_chat(&self, history_id: &str, new_title: &str) -> Result<()> {
        if history_id.is_empty() {
            return Err(Error::validation(
                "historyId is required",
                Some("historyId".to_string()),
            ));
        }
        if new_title.is_empty() {
            return Err(Error::validation(
                "newTitle is required",
                Some("newTitle".to_string()),
            ));
        }
        let url = format!("{}/ai/rename", self.base_url);
        let params = [("historyId", history_id), ("newTitle", new_title)];
        let response = self.send_form(self.client.patch(&url), &params).await?;
        let envelope: Envelope<serde_json::Value> = self.parse_envelope(response).await?;
        envelope.into_optional_data()?;
        Ok(())
    }

    /// Delete a chat session.
    pub async fn delete_chat(&self, history_id: &str) -> Result<()> {
        if history_id.is_empty() {
            return Err(Error::validation(
                "historyId is required",
                Some("historyId".to_string()),
            ));
        }
        let url = format!("{}/ai/delete", self.base_url);
        let params = [("historyId", history_id)];
        let response = self.send_form(self.client.delete(&url), &params).await?;
        let envelope: Envelope<serde_json::Value> = self.parse_envelope(response).await?;
        envelope.into_optional_data()?;
        Ok(())
    }

    /// Send a chat message and get back a handle on the streamed response.
    ///
    /// The session id and model selector are merged into the payload's own
    /// encoding: extra text parts for a multipart payload, form fields next
    /// to `prompt` for a plain one.
    pub async fn send_message(
        &self,
        payload: MessagePayload,
        history_id: Option<&str>,
        model: Option<Model>,
    ) -> Result<ChatStream> {
        let url = format!("{}/ai/chat", self.base_url);
        let builder = self.client.post(&url).headers(self.default_headers());
        let builder = match payload {
            MessagePayload::Text(prompt) => {
                let mut params: Vec<(&str, String)> = vec![("prompt", prompt)];
                if let Some(history_id) = history_id {
                    params.push(("historyId", history_id.to_string()));
                }
                if let Some(model) = model {
                    params.push(("model", model.to_string()));
                }
                builder.form(&params)
            }
            MessagePayload::Multipart(mut form) => {
                if let Some(history_id) = history_id {
                    form = form.text("historyId", history_id.to_string());
                }
                if let Some(model) = model {
                    form = form.text("model", model.to_string());
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(|e| self.request_error(e))?;
        let response = self.check_status(response).await?;

        let updates = process_chat_stream(response.bytes_stream());
        Ok(match self.logger.clone() {
            Some(logger) => ChatStream::new(updates.inspect(move |item| match item {
                Ok(update) if update.done => logger.log_stream_end(update),
                Ok(update) => logger.log_stream_update(update),
                Err(err) => logger.log_request_error(err),
            })),
            None => ChatStream::new(updates),
        })
    }

    /// List the user's chat sessions of the given conversation type.
    ///
    /// This read is presentation-only and degrades to an empty list on any
    /// failure; the error is still reported through the logger.
    pub async fn list_chats(&self, user_id: &str, kind: &str) -> Vec<ChatSummary> {
        self.try_list_chats(user_id, kind).await.unwrap_or_default()
    }

    async fn try_list_chats(&self, user_id: &str, kind: &str) -> Result<Vec<ChatSummary>> {
        let url = format!("{}/ai/getHistory", self.base_url);
        let response = self
            .client
            .get(&url)
            .headers(self.default_headers())
            .query(&[("userId", user_id), ("type", kind)])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = self.check_status(response).await?;
        let envelope: Envelope<Vec<ChatSummary>> = self.parse_envelope(response).await?;
        envelope.into_data()
    }

    /// Fetch the messages of a past conversation, expanded into
    /// alternating user/assistant messages.
    ///
    /// Like [`list_chats`](Self::list_chats), this degrades to an empty
    /// list on failure.
    pub async fn chat_messages(&self, history_id: &str) -> Vec<ChatMessage> {
        self.try_chat_messages(history_id).await.unwrap_or_default()
    }

    async fn try_chat_messages(&self, history_id: &str) -> Result<Vec<ChatMessage>> {
        let url = format!("{}/ai/getChatInfo", self.base_url);
        let response = self
            .client
            .get(&url)
            .headers(self.default_headers())
            .query(&[("historyId", history_id)])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = self.check_status(response).await?;
        let envelope: Envelope<Vec<ChatRecord>> = self.parse_envelope(response).await?;
        Ok(envelope
            .into_data()?
            .into_iter()
            .flat_map(ChatRecord::into_messages)
            .collect())
    }
}

impl fmt::Debug for LexiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexiChat")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
