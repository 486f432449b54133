//! `reqwest` implementation of [`LprApi`].
//!
//! Every request carries `Authorization: Bearer <token>`. Plates travel as
//! percent-encoded path segments. Status mapping and body decoding are
//! shared by all endpoints through `send_json`/`send_empty`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::LprApi;
use super::types::{
    CorrectionRequest, CorrectionResponse, CurrentUser, DepartureFilters, DeparturesPage, ExcludedVehicle, Session,
    SnapshotBody, Station, VisitRecord,
};
use crate::config::MonitorConfig;
use crate::error::ApiError;

pub struct HttpApi {
    http: reqwest::Client,
    base: Url,
}

impl HttpApi {
    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing, the base URL is invalid, or
    /// the HTTP client cannot be built.
    pub fn new(config: &MonitorConfig) -> Result<Self, ApiError> {
        let token = config.token.as_deref().ok_or(ApiError::MissingToken)?;
        let base = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, base })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint_url(&self.base, segments)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.request(method, self.url(segments)?))
    }
}

/// Parse the configured base URL; any path it carries is kept as a prefix.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidBaseUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(url)
}

/// Append path segments to the base URL, percent-encoding each one.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(base.to_string()))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;

    if !(200..300).contains(&status) {
        return Err(ApiError::from_status(status, text));
    }

    parse_body(&text)
}

async fn send_empty(request: RequestBuilder) -> Result<(), ApiError> {
    let response = request.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, text));
    }
    Ok(())
}

pub(crate) fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::Parse("empty response body".to_owned()));
    }
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait]
impl LprApi for HttpApi {
    async fn snapshot(&self) -> Result<Vec<Station>, ApiError> {
        let body: SnapshotBody = send_json(self.request(Method::GET, &["lpr", "estado"])?).await?;
        Ok(body.into_stations())
    }

    async fn history(&self, plate: &str, session_id: Option<&str>) -> Result<Vec<VisitRecord>, ApiError> {
        let mut request = self.request(Method::GET, &["lpr", "historial", plate])?;
        if let Some(session_id) = session_id {
            request = request.query(&[("sesion_id", session_id)]);
        }
        send_json(request).await
    }

    async fn sessions(&self, plate: &str) -> Result<Vec<Session>, ApiError> {
        send_json(self.request(Method::GET, &["lpr", "sesiones", plate])?).await
    }

    async fn departures(&self, filters: &DepartureFilters) -> Result<DeparturesPage, ApiError> {
        let request = self
            .request(Method::GET, &["lpr", "salidas"])?
            .query(&filters.query_pairs());
        send_json(request).await
    }

    async fn correct_plate(&self, original: &str, corrected: &str) -> Result<CorrectionResponse, ApiError> {
        let body = CorrectionRequest { placa_original: original.to_owned(), placa_nueva: corrected.to_owned() };
        let request = self.request(Method::PUT, &["lpr", "corregir"])?.json(&body);

        let response = request.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(ApiError::from_status(status, text));
        }
        // A bare 2xx without a body is a plain rename.
        if text.trim().is_empty() {
            return Ok(CorrectionResponse::default());
        }
        parse_body(&text)
    }

    async fn excluded(&self) -> Result<Vec<ExcludedVehicle>, ApiError> {
        send_json(self.request(Method::GET, &["lpr", "internos"])?).await
    }

    async fn add_excluded(&self, vehicle: &ExcludedVehicle) -> Result<(), ApiError> {
        send_empty(self.request(Method::POST, &["lpr", "internos"])?.json(vehicle)).await
    }

    async fn remove_excluded(&self, plate: &str) -> Result<(), ApiError> {
        send_empty(self.request(Method::DELETE, &["lpr", "internos", plate])?).await
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        send_json(self.request(Method::GET, &["auth", "me"])?).await
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;
