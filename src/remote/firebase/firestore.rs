//! Firestore REST document operations.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::FirebaseBackend;
use crate::remote::error::RemoteError;

const PAGE_SIZE: &str = "300";

/// A document as returned by Firestore: resource name plus encoded fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Value,
}

impl Document {
    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

async fn check_status(response: Response) -> Result<String, RemoteError> {
    let status = response.status();
    let text = response.text().await?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RemoteError::RateLimit(
            "Rate limit exceeded. Please wait before retrying.".to_string(),
        ));
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RemoteError::Authentication(
            "Session expired or permission denied".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(RemoteError::Backend {
            status: status.as_u16(),
            message: backend_message(&text),
        });
    }
    Ok(text)
}

/// `{"error": {"message": ...}}` when present, the raw body otherwise.
fn backend_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

impl FirebaseBackend {
    fn document_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.firestore_base, self.project_id, path
        )
    }

    async fn send(&self, request: RequestBuilder, id_token: &str) -> Result<String, RemoteError> {
        self.throttle.wait().await;
        let response = request.bearer_auth(id_token).send().await?;
        check_status(response).await
    }

    /// `None` when the document does not exist.
    pub(super) async fn get_document(&self, path: &str, id_token: &str) -> Result<Option<Document>, RemoteError> {
        self.throttle.wait().await;
        let response = self
            .http_client
            .get(self.document_url(path))
            .bearer_auth(id_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = check_status(response).await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Writes `fields`. Without a mask the whole document is replaced;
    /// with one only the listed top-level fields change.
    pub(super) async fn set_document(
        &self,
        path: &str,
        id_token: &str,
        fields: Value,
        mask: Option<&[&str]>,
    ) -> Result<(), RemoteError> {
        let mut request = self
            .http_client
            .patch(self.document_url(path))
            .json(&json!({ "fields": fields }));
        if let Some(mask) = mask {
            let params: Vec<(&str, &str)> = mask.iter().map(|f| ("updateMask.fieldPaths", *f)).collect();
            request = request.query(&params);
        }
        self.send(request, id_token).await?;
        Ok(())
    }

    pub(super) async fn delete_document(&self, path: &str, id_token: &str) -> Result<(), RemoteError> {
        let request = self.http_client.delete(self.document_url(path));
        self.send(request, id_token).await?;
        Ok(())
    }

    /// Every document in a collection, following page tokens.
    pub(super) async fn list_documents(&self, collection: &str, id_token: &str) -> Result<Vec<Document>, RemoteError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }
            let request = self.http_client.get(self.document_url(collection)).query(&params);
            let text = self.send(request, id_token).await?;

            let page: ListResponse = serde_json::from_str(&text)?;
            documents.extend(page.documents);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }
}
