use crate::capture::LocalArtifact;
use serde::Serialize;

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureResponse {
    pub file_name: String,
    pub rotation_index: usize,
    pub captured_at: String, // ISO8601, UTC
    pub url: String,
}

impl From<&LocalArtifact> for CaptureResponse {
    fn from(artifact: &LocalArtifact) -> Self {
        Self {
            file_name: artifact.file_name.clone(),
            rotation_index: artifact.rotation_index,
            captured_at: artifact.captured_at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            url: format!("/captures/{}", artifact.file_name),
        }
    }
}
