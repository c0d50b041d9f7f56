use serde::Deserialize;

use crate::error::{Error, Result};

/// The JSON response wrapper used by every non-streaming endpoint.
///
/// Application-level success is signalled by `code == 0` regardless of the
/// HTTP status; a non-zero code carries a server message explaining the
/// failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Application-level status; `0` means success.
    pub code: i64,
    /// Server-provided message, usually set when `code != 0`.
    #[serde(default)]
    pub message: Option<String>,
    /// The payload; shape depends on the endpoint.
    ///
    /// The explicit default function keeps the derived `Deserialize` impl
    /// free of a `T: Default` bound.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the envelope, converting a non-zero `code` into [`Error::Api`].
    pub fn into_data(self) -> Result<T> {
        if self.code != 0 {
            return Err(Error::api(
                self.code,
                self.message.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        self.data.ok_or_else(|| {
            Error::serialization("envelope with code 0 is missing a data field", None)
        })
    }

    /// Like [`into_data`](Self::into_data) but tolerates an absent payload,
    /// for endpoints whose success envelope carries no data.
    pub fn into_optional_data(self) -> Result<Option<T>> {
        if self.code != 0 {
            return Err(Error::api(
                self.code,
                self.message.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        Ok(self.data)
    }
}
