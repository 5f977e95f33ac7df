//! API key authentication trait and implementation.

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Known API key providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyProvider {
    CloudSpeech,
}

impl ApiKeyProvider {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyProvider::CloudSpeech => "cloud_speech",
        }
    }
}

/// Applies provider credentials to outgoing requests.
pub trait ProviderAuth: Send + Sync {
    fn provider(&self) -> ApiKeyProvider;

    /// Apply authentication to a request builder.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}

/// API key sent in the `Authorization` header with a scheme prefix, plus the tenant
/// (folder) header the service bills against.
///
/// ```rust,ignore
/// // Authorization: Api-Key xxx
/// // x-folder-id: b1g...
/// let auth = ApiKeyAuth::cloud_speech(SecretString::new(key), "b1g...".to_string())?;
/// ```
pub struct ApiKeyAuth {
    provider: ApiKeyProvider,
    api_key: SecretString,
    scheme: String,
    tenant_header: String,
    tenant: String,
}

impl ApiKeyAuth {
    pub const CLOUD_SPEECH_SCHEME: &'static str = "Api-Key";
    pub const CLOUD_SPEECH_TENANT_HEADER: &'static str = "x-folder-id";

    /// Authenticator for the hosted speech service. Both values must be non-empty.
    pub fn cloud_speech(api_key: SecretString, folder_id: String) -> Result<Self, Error> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(api_key_error(
                ApiKeyErrorKind::InvalidFormat,
                "API key is empty",
            ));
        }
        if folder_id.trim().is_empty() {
            return Err(api_key_error(
                ApiKeyErrorKind::MissingTenant,
                "folder id is empty",
            ));
        }

        Ok(Self {
            provider: ApiKeyProvider::CloudSpeech,
            api_key,
            scheme: Self::CLOUD_SPEECH_SCHEME.to_string(),
            tenant_header: Self::CLOUD_SPEECH_TENANT_HEADER.to_string(),
            tenant: folder_id,
        })
    }

    /// The tenant (folder) id, which long-running requests also carry in their body.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }
}

impl ProviderAuth for ApiKeyAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        let auth_value = format!("{} {}", self.scheme, self.api_key.expose_secret());

        request
            .header(reqwest::header::AUTHORIZATION, auth_value)
            .header(&self.tenant_header, &self.tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_provider_as_str() {
        assert_eq!(ApiKeyProvider::CloudSpeech.as_str(), "cloud_speech");
    }

    #[test]
    fn test_authenticate_sets_scheme_and_folder_headers() {
        let auth = ApiKeyAuth::cloud_speech(
            SecretString::new("AQVN-test".to_string()),
            "b1g-folder".to_string(),
        )
        .unwrap();

        let request = auth
            .authenticate(reqwest::Client::new().get("http://localhost/recognize"))
            .build()
            .unwrap();

        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Api-Key AQVN-test"
        );
        assert_eq!(request.headers().get("x-folder-id").unwrap(), "b1g-folder");
        assert_eq!(auth.tenant(), "b1g-folder");
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = ApiKeyAuth::cloud_speech(SecretString::new(" ".to_string()), "f".to_string())
            .err()
            .unwrap();
        assert_eq!(err.error_kind, crate::ErrorKind::ApiKey(ApiKeyErrorKind::InvalidFormat));
    }

    #[test]
    fn test_empty_folder_is_rejected() {
        let err = ApiKeyAuth::cloud_speech(SecretString::new("k".to_string()), String::new())
            .err()
            .unwrap();
        assert_eq!(err.error_kind, crate::ErrorKind::ApiKey(ApiKeyErrorKind::MissingTenant));
    }
}
