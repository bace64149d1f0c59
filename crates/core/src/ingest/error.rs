use std::fmt;

/// Where in a single upstream call things went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Transport,
    Http,
    Decode,
    RateLimited,
    Schema,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Transport => "transport",
            FailureStage::Http => "http",
            FailureStage::Decode => "decode",
            FailureStage::RateLimited => "rate_limited",
            FailureStage::Schema => "schema",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub source_name: String,
    pub stage: FailureStage,
    pub detail: String,
}

impl UpstreamError {
    pub fn new(source_name: &str, stage: FailureStage, detail: impl Into<String>) -> Self {
        Self {
            source_name: source_name.to_string(),
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "upstream error (source={}, stage={}): {}",
            self.source_name,
            self.stage.as_str(),
            self.detail
        )
    }
}

impl std::error::Error for UpstreamError {}
