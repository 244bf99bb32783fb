use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Tagged result type for the wire envelope.
///
/// Every endpoint answers with the JSON shape
/// `{isSuccess, data, error, status}`. Internally this is a proper
/// two-variant result; the loose JSON representation only exists at the
/// serde boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiEnvelope<T> {
    Success { data: T, status: u16 },
    Failure { error: String, status: u16 },
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data, status: 200 }
    }

    pub fn failure(error: impl Into<String>, status: u16) -> Self {
        Self::Failure {
            error: error.into(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => *status,
        }
    }

    /// Unwrap into a plain result, losing the status code of successes.
    pub fn into_result(self) -> Result<T, (String, u16)> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { error, status } => Err((error, status)),
        }
    }
}

/// Flat JSON representation used on the wire.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeWire<T> {
    is_success: bool,
    data: Option<T>,
    error: Option<String>,
    status: u16,
}

impl<T: Serialize> Serialize for ApiEnvelope<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success { data, status } => EnvelopeWire {
                is_success: true,
                data: Some(data),
                error: None,
                status: *status,
            },
            Self::Failure { error, status } => EnvelopeWire {
                is_success: false,
                data: None,
                error: Some(error.clone()),
                status: *status,
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ApiEnvelope<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = EnvelopeWire::<T>::deserialize(deserializer)?;
        if wire.is_success {
            // `data: null` is legal for payload-free successes when T is an Option
            let data = match wire.data {
                Some(data) => data,
                None => serde_json::from_value(serde_json::Value::Null)
                    .map_err(|_| serde::de::Error::custom("success envelope without data"))?,
            };
            Ok(Self::Success {
                data,
                status: wire.status,
            })
        } else {
            Ok(Self::Failure {
                error: wire.error.unwrap_or_else(|| "Unknown error".to_string()),
                status: wire.status,
            })
        }
    }
}
