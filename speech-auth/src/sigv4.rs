//! AWS Signature Version 4 for S3-compatible object storage.
//!
//! Only header-based signing is implemented: the signed headers are `host`,
//! `x-amz-content-sha256` and `x-amz-date`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{signing_error, Error, SigningErrorKind};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Headers produced by signing one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub content_sha256: String,
    pub authorization: String,
}

impl SignedHeaders {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-amz-date", &self.amz_date)
            .header("x-amz-content-sha256", &self.content_sha256)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
    }
}

pub struct Signer {
    access_key_id: String,
    secret_access_key: SecretString,
    region: String,
    service: String,
}

impl Signer {
    pub fn new(access_key_id: String, secret_access_key: SecretString, region: String) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            region,
            service: "s3".to_string(),
        }
    }

    /// Signs `method url` whose body hashes to `content_sha256` at time `now`.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        content_sha256: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders, Error> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);

        let canonical_request = format!(
            "{method}\n{}\n{}\nhost:{}\nx-amz-content-sha256:{content_sha256}\nx-amz-date:{amz_date}\n\n{SIGNED_HEADERS}\n{content_sha256}",
            canonical_uri(url),
            canonical_query(url),
            host_header(url)?,
        );

        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let key = signing_key(
            self.secret_access_key.expose_secret(),
            &date,
            &self.region,
            &self.service,
        )?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        Ok(SignedHeaders {
            amz_date,
            content_sha256: content_sha256.to_string(),
            authorization: format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
                self.access_key_id
            ),
        })
    }
}

/// Lowercase hex SHA-256 of a request body.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| signing_error(SigningErrorKind::InvalidKey, "Invalid HMAC key"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>, Error> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn host_header(url: &Url) -> Result<String, Error> {
    let host = url
        .host_str()
        .ok_or_else(|| signing_error(SigningErrorKind::InvalidUrl, "URL has no host"))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

// S3 keys are encoded once, segment by segment
fn canonical_uri(url: &Url) -> String {
    let encoded: Vec<String> = url
        .path()
        .split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            urlencoding::encode(&decoded).into_owned()
        })
        .collect();
    let path = encoded.join("/");
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                urlencoding::encode(&k).into_owned(),
                urlencoding::encode(&v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
