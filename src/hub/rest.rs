// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! DIRIGERA REST API client.
//!
//! Covers device and scene queries, attribute patches and the PKCE token
//! provisioning flow. All calls go to `https://{host}:8443/v1` with Bearer
//! token authentication and (by default) relaxed certificate verification,
//! since the hub serves a self-signed certificate.

use crate::configuration::DirigeraSettings;
use crate::errors::ServiceError;
use crate::hub::model::{AuthCode, Device, Scene, TokenResponse};
use crate::util::new_http_client;
use actix_web::http::StatusCode;
use awc::ClientResponse;
use awc::error::PayloadError;
use awc::http::header;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bytes::Bytes;
use futures::Stream;
use log::debug;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

/// Pending PKCE authorization.
///
/// Holds the authorization code returned by the hub and the code verifier
/// required to redeem it with [DirigeraApi::get_token] once the user pressed
/// the action button. Intentionally opaque, the verifier is a credential.
#[derive(Clone)]
pub struct PkceAuthorization {
    code: String,
    verifier: String,
}

#[derive(Clone)]
pub struct DirigeraApi {
    client: awc::Client,
    base_url: String,
    token: String,
}

impl DirigeraApi {
    pub fn new(settings: &DirigeraSettings) -> Self {
        let client = new_http_client(
            Duration::from_secs(settings.connection_timeout as u64),
            Duration::from_secs(settings.request_timeout as u64),
            settings.disable_cert_validation,
        );
        Self {
            client,
            base_url: settings.rest_url(),
            token: settings.get_token(),
        }
    }

    pub async fn get_devices(&self) -> Result<Vec<Device>, ServiceError> {
        let response = self.get("/devices").send().await?;
        let mut response = expect_success(response).await?;
        Ok(response.json().await?)
    }

    pub async fn get_device(&self, device_id: &str) -> Result<Device, ServiceError> {
        let response = self.get(&format!("/devices/{device_id}")).send().await?;
        let mut response = expect_success(response).await?;
        Ok(response.json().await?)
    }

    /// Patch device attributes.
    ///
    /// The request body is an array with a single `attributes` object, the hub
    /// acknowledges accepted changes with `202`.
    pub async fn patch_device(
        &self,
        device_id: &str,
        attributes: Value,
    ) -> Result<(), ServiceError> {
        debug!("PATCH /devices/{device_id}: {attributes}");
        let body = json!([{ "attributes": attributes }]);
        let response = self
            .patch(&format!("/devices/{device_id}"))
            .send_json(&body)
            .await?;
        expect_status(response, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    pub async fn get_scenes(&self) -> Result<Vec<Scene>, ServiceError> {
        let response = self.get("/scenes").send().await?;
        let mut response = expect_success(response).await?;
        Ok(response.json().await?)
    }

    pub async fn trigger_scene(&self, scene_id: &str) -> Result<(), ServiceError> {
        debug!("POST /scenes/{scene_id}/trigger");
        let response = self
            .post(&format!("/scenes/{scene_id}/trigger"))
            .send()
            .await?;
        expect_status(response, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    pub async fn undo_scene(&self, scene_id: &str) -> Result<(), ServiceError> {
        debug!("POST /scenes/{scene_id}/undo");
        let response = self.post(&format!("/scenes/{scene_id}/undo")).send().await?;
        expect_status(response, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    /// Start the PKCE authorization flow for a new access token.
    ///
    /// Returns the pending authorization which can be redeemed with
    /// [get_token](Self::get_token) after the user pressed the action button on
    /// the bottom of the hub.
    pub async fn start_authorization(&self) -> Result<PkceAuthorization, ServiceError> {
        let verifier = code_verifier();
        let challenge = code_challenge(&verifier);
        // challenge is base64 url-safe, no query encoding required
        let url = format!(
            "{}/oauth/authorize?audience=homesmart.local&response_type=code&code_challenge={challenge}&code_challenge_method=S256",
            self.base_url
        );
        let response = self.client.get(url).send().await?;
        let mut response = expect_success(response).await?;
        let auth: AuthCode = response.json().await?;
        debug!("Got authorization code, waiting for action button press");

        Ok(PkceAuthorization {
            code: auth.code,
            verifier,
        })
    }

    /// Exchange a pending authorization for an access token.
    ///
    /// Fails with an authentication error if the action button was not pressed.
    pub async fn get_token(
        &self,
        authorization: PkceAuthorization,
    ) -> Result<String, ServiceError> {
        let name = hostname::get()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_else(|_| "uc-intg-dirigera".into());
        let form = [
            ("code", authorization.code.as_str()),
            ("name", name.as_str()),
            ("grant_type", "authorization_code"),
            ("code_verifier", authorization.verifier.as_str()),
        ];
        let response = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .send_form(&form)
            .await?;
        let mut response = expect_success(response).await?;
        let token: TokenResponse = response.json().await?;

        Ok(token.access_token)
    }

    fn get(&self, path: &str) -> awc::ClientRequest {
        self.client
            .get(format!("{}{path}", self.base_url))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", self.token)))
    }

    fn post(&self, path: &str) -> awc::ClientRequest {
        self.client
            .post(format!("{}{path}", self.base_url))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", self.token)))
    }

    fn patch(&self, path: &str) -> awc::ClientRequest {
        self.client
            .patch(format!("{}{path}", self.base_url))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", self.token)))
    }
}

async fn expect_success<S>(response: ClientResponse<S>) -> Result<ClientResponse<S>, ServiceError>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    if response.status().is_success() {
        return Ok(response);
    }
    Err(into_service_error(response).await)
}

async fn expect_status<S>(
    response: ClientResponse<S>,
    expected: StatusCode,
) -> Result<(), ServiceError>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    if response.status() == expected {
        return Ok(());
    }
    Err(into_service_error(response).await)
}

async fn into_service_error<S>(mut response: ClientResponse<S>) -> ServiceError
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    let status = response.status();
    let body = response.body().await.unwrap_or_default();
    let text = String::from_utf8_lossy(&body);
    let message = if text.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", text.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ServiceError::AuthenticationError(message)
        }
        _ => ServiceError::BadRequest(message),
    }
}

/// Random PKCE code verifier: 128 characters, the maximum RFC 7636 allows.
fn code_verifier() -> String {
    let mut verifier = String::with_capacity(128);
    for _ in 0..4 {
        verifier.push_str(&Uuid::new_v4().simple().to_string());
    }
    verifier
}

/// S256 code challenge for the given verifier.
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_verifier_is_128_chars_unreserved() {
        let verifier = code_verifier();
        assert_eq!(128, verifier.len());
        assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn code_verifiers_are_random() {
        assert_ne!(code_verifier(), code_verifier());
    }

    #[test]
    fn code_challenge_matches_rfc7636_example() {
        // appendix B of RFC 7636
        assert_eq!(
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")
        );
    }
}
