use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::from_str;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("{method} {url} transport failure: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} failed: {status} {body}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("{method} {url} decode failed: {message} | {body}")]
    Decode {
        method: &'static str,
        url: String,
        message: String,
        body: String,
    },
}

impl HttpError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HttpError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Blocking JSON client shared by the embedding, chat and store adapters.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    bearer: Option<String>,
}

impl HttpClient {
    pub fn new(timeout: Duration, bearer: Option<String>) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| HttpError::Transport {
                method: "BUILD",
                url: String::new(),
                source,
            })?;
        Ok(Self { client, bearer })
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        self.send("GET", url, self.client.get(url))
    }

    pub fn post_json<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T, HttpError> {
        let req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        self.send("POST", url, req)
    }

    pub fn put_json<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T, HttpError> {
        let req = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        self.send("PUT", url, req)
    }

    pub fn delete_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        self.send("DELETE", url, self.client.delete(url))
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: &'static str,
        url: &str,
        mut req: RequestBuilder,
    ) -> Result<T, HttpError> {
        if let Some(token) = &self.bearer {
            req = req.bearer_auth(token);
        }
        let resp = req.send().map_err(|source| HttpError::Transport {
            method,
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        let text = resp.text().map_err(|source| HttpError::Transport {
            method,
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(HttpError::Status {
                method,
                url: url.to_string(),
                status,
                body: text,
            });
        }
        from_str::<T>(&text).map_err(|e| HttpError::Decode {
            method,
            url: url.to_string(),
            message: e.to_string(),
            body: text,
        })
    }
}
