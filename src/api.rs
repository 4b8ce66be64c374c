//! HTTP boundary to the prompt backend
//!
//! [`PromptApi`] is what the renderer talks to. [`ApiClient`] implements it
//! over reqwest against the backend's JSON endpoints; tests substitute an
//! in-memory implementation.

use crate::error::ApiError;
use crate::model::{Category, Comment, Prompt, PromptDraft, PromptResult, Tag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// The futures are `!Send`: everything runs on one thread.
#[allow(async_fn_in_trait)]
pub trait PromptApi {
    /// The whole library; filtering happens client-side
    async fn fetch_prompts(&self) -> Result<Vec<Prompt>, ApiError>;
    async fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt, ApiError>;
    async fn update_prompt(&self, id: &str, draft: &PromptDraft) -> Result<(), ApiError>;
    async fn delete_prompt(&self, id: &str) -> Result<(), ApiError>;

    async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError>;
    async fn add_category(&self, name: &str) -> Result<Category, ApiError>;
    async fn delete_category(&self, id: &str) -> Result<(), ApiError>;

    async fn fetch_tags(&self) -> Result<Vec<Tag>, ApiError>;
    async fn add_tag(&self, name: &str) -> Result<Tag, ApiError>;
    async fn delete_tag(&self, id: &str) -> Result<(), ApiError>;

    async fn fetch_comments(&self, prompt_id: &str) -> Result<Vec<Comment>, ApiError>;
    async fn add_comment(&self, prompt_id: &str, content: &str) -> Result<Comment, ApiError>;
    async fn delete_comment(&self, id: &str) -> Result<(), ApiError>;

    async fn fetch_results(&self, prompt_id: &str) -> Result<Vec<PromptResult>, ApiError>;
    async fn add_result(&self, prompt_id: &str, content: &str) -> Result<PromptResult, ApiError>;
    async fn delete_result(&self, id: &str) -> Result<(), ApiError>;
}

/// `{ "ok": true }` acknowledgement used by update/delete endpoints
#[derive(Debug, Deserialize)]
struct Ack {
    #[serde(alias = "success")]
    ok: bool,
    #[serde(default, alias = "error")]
    message: Option<String>,
}

impl Ack {
    fn into_result(self) -> Result<(), ApiError> {
        if self.ok {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct PromptEnvelope {
    prompt: Prompt,
}

#[derive(Debug, Deserialize)]
struct CategoryEnvelope {
    category: Category,
}

#[derive(Debug, Deserialize)]
struct TagEnvelope {
    tag: Tag,
}

#[derive(Debug, Deserialize)]
struct CommentEnvelope {
    comment: Comment,
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    result: PromptResult,
}

/// List endpoints answer either a bare array or `{ "<key>": [...], ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<Value>),
    Wrapped(Map<String, Value>),
}

impl ListBody {
    fn into_items<T: DeserializeOwned>(self, key: &str) -> Result<Vec<T>, ApiError> {
        let items = match self {
            ListBody::Bare(items) => Value::Array(items),
            ListBody::Wrapped(mut map) => map
                .remove(key)
                .ok_or_else(|| ApiError::Decode(format!("missing '{}' in response", key)))?,
        };
        serde_json::from_value(items).map_err(|e| ApiError::Decode(format!("{}: {}", key, e)))
    }
}

#[derive(Debug, Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

#[cfg(feature = "http")]
pub use http::ApiClient;

#[cfg(feature = "http")]
mod http {
    use super::*;
    use reqwest::{Client, RequestBuilder, Response};
    use std::time::Duration;
    use tracing::{debug, warn};

    #[derive(Debug, Clone)]
    pub struct ApiClient {
        base_url: String,
        client: Client,
    }

    impl ApiClient {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
            let client = Client::builder()
                .timeout(timeout)
                .user_agent(concat!(
                    env!("CARGO_PKG_NAME"),
                    "/",
                    env!("CARGO_PKG_VERSION")
                ))
                .build()?;

            Ok(Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                client,
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        pub(crate) fn url(&self, path: &str) -> String {
            format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
        }

        async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, ApiError> {
            let response = request.send().await?;
            let status = response.status();
            debug!(request = what, status = status.as_u16(), "API response");

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(request = what, status = status.as_u16(), "API request failed");
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(response)
        }

        async fn json<T: DeserializeOwned>(
            &self,
            request: RequestBuilder,
            what: &str,
        ) -> Result<T, ApiError> {
            let text = self.send(request, what).await?.text().await?;
            serde_json::from_str(&text)
                .map_err(|e| ApiError::Decode(format!("{}: {}", what, e)))
        }

        async fn list<T: DeserializeOwned>(
            &self,
            request: RequestBuilder,
            what: &str,
            key: &str,
        ) -> Result<Vec<T>, ApiError> {
            self.json::<ListBody>(request, what).await?.into_items(key)
        }

        async fn ack(&self, request: RequestBuilder, what: &str) -> Result<(), ApiError> {
            self.json::<Ack>(request, what).await?.into_result()
        }
    }

    impl PromptApi for ApiClient {
        async fn fetch_prompts(&self) -> Result<Vec<Prompt>, ApiError> {
            let request = self.client.get(self.url("prompts"));
            self.list(request, "fetch_prompts", "prompts").await
        }

        async fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt, ApiError> {
            let request = self.client.post(self.url("prompts")).json(draft);
            let envelope: PromptEnvelope = self.json(request, "create_prompt").await?;
            Ok(envelope.prompt)
        }

        async fn update_prompt(&self, id: &str, draft: &PromptDraft) -> Result<(), ApiError> {
            let request = self.client.put(self.url(&format!("prompts/{}", id))).json(draft);
            self.ack(request, "update_prompt").await
        }

        async fn delete_prompt(&self, id: &str) -> Result<(), ApiError> {
            let request = self.client.delete(self.url(&format!("prompts/{}", id)));
            self.ack(request, "delete_prompt").await
        }

        async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
            let request = self.client.get(self.url("categories"));
            self.list(request, "fetch_categories", "categories").await
        }

        async fn add_category(&self, name: &str) -> Result<Category, ApiError> {
            let request = self.client.post(self.url("categories")).json(&NameBody { name });
            let envelope: CategoryEnvelope = self.json(request, "add_category").await?;
            Ok(envelope.category)
        }

        async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
            let request = self.client.delete(self.url(&format!("categories/{}", id)));
            self.ack(request, "delete_category").await
        }

        async fn fetch_tags(&self) -> Result<Vec<Tag>, ApiError> {
            let request = self.client.get(self.url("tags"));
            self.list(request, "fetch_tags", "tags").await
        }

        async fn add_tag(&self, name: &str) -> Result<Tag, ApiError> {
            let request = self.client.post(self.url("tags")).json(&NameBody { name });
            let envelope: TagEnvelope = self.json(request, "add_tag").await?;
            Ok(envelope.tag)
        }

        async fn delete_tag(&self, id: &str) -> Result<(), ApiError> {
            let request = self.client.delete(self.url(&format!("tags/{}", id)));
            self.ack(request, "delete_tag").await
        }

        async fn fetch_comments(&self, prompt_id: &str) -> Result<Vec<Comment>, ApiError> {
            let request = self
                .client
                .get(self.url(&format!("prompts/{}/comments", prompt_id)));
            self.list(request, "fetch_comments", "comments").await
        }

        async fn add_comment(&self, prompt_id: &str, content: &str) -> Result<Comment, ApiError> {
            let request = self
                .client
                .post(self.url(&format!("prompts/{}/comments", prompt_id)))
                .json(&ContentBody { content });
            let envelope: CommentEnvelope = self.json(request, "add_comment").await?;
            Ok(envelope.comment)
        }

        async fn delete_comment(&self, id: &str) -> Result<(), ApiError> {
            let request = self.client.delete(self.url(&format!("comments/{}", id)));
            self.ack(request, "delete_comment").await
        }

        async fn fetch_results(&self, prompt_id: &str) -> Result<Vec<PromptResult>, ApiError> {
            let request = self
                .client
                .get(self.url(&format!("prompts/{}/results", prompt_id)));
            self.list(request, "fetch_results", "results").await
        }

        async fn add_result(
            &self,
            prompt_id: &str,
            content: &str,
        ) -> Result<PromptResult, ApiError> {
            let request = self
                .client
                .post(self.url(&format!("prompts/{}/results", prompt_id)))
                .json(&ContentBody { content });
            let envelope: ResultEnvelope = self.json(request, "add_result").await?;
            Ok(envelope.result)
        }

        async fn delete_result(&self, id: &str) -> Result<(), ApiError> {
            let request = self.client.delete(self.url(&format!("results/{}", id)));
            self.ack(request, "delete_result").await
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_client_normalizes_base_url() {
            let client =
                ApiClient::new("https://prompts.example.com/", Duration::from_secs(5)).unwrap();
            assert_eq!(client.base_url(), "https://prompts.example.com");
            assert_eq!(
                client.url("/prompts/42"),
                "https://prompts.example.com/api/prompts/42"
            );
        }
    }
}
