//! HTTP seam between the client and the browser's fetch
use crate::error::ClientError;
use url::Url;

pub type Headers = Vec<(&'static str, String)>;

/// Minimal request surface the client needs; bodies come back as text
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: Url, headers: Headers) -> Result<String, ClientError>;

    async fn post_form(
        &self,
        url: Url,
        headers: Headers,
        form: &[(&str, String)],
    ) -> Result<String, ClientError>;
}

/// `reqwest` over the browser fetch API, sending the user's cookies
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    client: reqwest::Client,
}

impl FetchTransport {
    pub fn new() -> FetchTransport {
        FetchTransport::default()
    }

    fn get_request(&self, url: Url, headers: Headers) -> reqwest::RequestBuilder {
        with_headers(self.client.get(url), headers)
    }

    /// `.form()` url-encodes the body and sets the form content type
    fn post_form_request(
        &self,
        url: Url,
        headers: Headers,
        form: &[(&str, String)],
    ) -> reqwest::RequestBuilder {
        with_headers(self.client.post(url), headers).form(form)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ClientError> {
        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        let response = request.send().await?;
        check_status(response.status(), response.url())?;
        Ok(response.text().await?)
    }
}

fn with_headers(mut request: reqwest::RequestBuilder, headers: Headers) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        request = request.header(name, value);
    }
    request
}

fn check_status(status: reqwest::StatusCode, url: &Url) -> Result<(), ClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

impl Transport for FetchTransport {
    async fn get(&self, url: Url, headers: Headers) -> Result<String, ClientError> {
        log::debug!("GET {}", url);
        self.send(self.get_request(url, headers)).await
    }

    async fn post_form(
        &self,
        url: Url,
        headers: Headers,
        form: &[(&str, String)],
    ) -> Result<String, ClientError> {
        log::debug!("POST {}", url);
        self.send(self.post_form_request(url, headers, form)).await
    }
}
