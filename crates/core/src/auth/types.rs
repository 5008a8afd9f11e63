use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Transport-level facts about an upload session.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct UploadSession {
    pub headers: HashMap<String, String>,
    pub source_ip: Option<IpAddr>,
}

impl UploadSession {
    pub fn new(source_ip: Option<IpAddr>) -> Self {
        Self {
            headers: HashMap::new(),
            source_ip,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// An authenticated uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uploader {
    pub method: String,
    pub source_ip: Option<IpAddr>,
}
