//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use speech_auth::error::{Error as SpeechAuthError, ErrorKind as SpeechAuthErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. The intent is to
/// translate errors between layers while maintaining layer boundaries: the worker binary
/// depends on `domain` but never directly on `entity_api` or the provider crates.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    Other(String),
}

/// Entity errors reduced to the subset that matters to callers of the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    /// The record exists but is not in a state that allows the operation (e.g. export before done)
    NotReady,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Provider,
    Other(String),
}

impl Error {
    pub(crate) fn config(message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    pub(crate) fn entity(kind: EntityErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(kind)),
        }
    }

    pub(crate) fn db_transaction(err: sea_orm::DbErr) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::DbTransaction,
            )),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error ({:?}): {source}", self.error_kind),
            None => write!(f, "Domain Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::ValidationError => EntityErrorKind::Invalid,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            EntityApiErrorKind::RecordNotUpdated => {
                EntityErrorKind::Other("RecordNotUpdated".to_string())
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<speech_ai::Error> for Error {
    fn from(err: speech_ai::Error) -> Self {
        let error_kind = match &err {
            speech_ai::Error::Network(_) | speech_ai::Error::Timeout(_) => {
                DomainErrorKind::External(ExternalErrorKind::Network)
            }
            speech_ai::Error::Configuration(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Config)
            }
            speech_ai::Error::Media(_) | speech_ai::Error::Other(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
            _ => DomainErrorKind::External(ExternalErrorKind::Provider),
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<SpeechAuthError> for Error {
    fn from(err: SpeechAuthError) -> Self {
        let error_kind = match &err.error_kind {
            SpeechAuthErrorKind::ApiKey(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            SpeechAuthErrorKind::Signing(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
