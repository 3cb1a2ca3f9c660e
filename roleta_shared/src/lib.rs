use roleta_core::WheelError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpinResponse {
    /// Winning option index.
    pub result: usize,
    pub nonce: u64,
    pub server_seed_hash: String,
    pub client_seed: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpinQuery {
    pub client_seed: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub server_seed_hash: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> usize {
    100
}

/// Returned by create, update and duplicate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SlugResponse {
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub url: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn from_wheel(err: &WheelError) -> Self {
        let message = match err {
            WheelError::InvalidInput(m)
            | WheelError::NotFound(m)
            | WheelError::Conflict(m)
            | WheelError::UpstreamFailure(m) => m.clone(),
        };
        Self {
            error: err.kind().to_string(),
            message,
        }
    }

    /// Rebuild the error kind a server reported.
    pub fn into_wheel(self) -> WheelError {
        match self.error.as_str() {
            "invalid_input" => WheelError::InvalidInput(self.message),
            "not_found" => WheelError::NotFound(self.message),
            "conflict" => WheelError::Conflict(self.message),
            _ => WheelError::UpstreamFailure(self.message),
        }
    }
}
