//! Protocol paths and the `Destination` header

use crate::DavError;
use std::fmt;

/// A decoded, normalized request path.
///
/// `/a/b/` and `/a/b` parse to the same value. The root has no segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DavPath {
    segments: Vec<String>,
}

impl DavPath {
    /// The root path `/`
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a percent-encoded URI path
    pub fn parse(raw: &str) -> Result<Self, DavError> {
        let mut segments = Vec::new();

        for raw_segment in raw.split('/').filter(|s| !s.is_empty()) {
            let segment = urlencoding::decode(raw_segment)
                .map_err(|_| DavError::bad_request(format!("invalid percent-encoding in {}", raw)))?;

            match segment.as_ref() {
                "." => continue,
                ".." => return Err(DavError::bad_request(format!("parent segment in {}", raw))),
                s if s.contains('/') || s.contains('\0') => {
                    return Err(DavError::bad_request(format!("invalid segment in {}", raw)));
                }
                _ => segments.push(segment.into_owned()),
            }
        }

        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The containing path; the parent of the root is the root
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Decoded last segment, `None` for the root
    pub fn leaf_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Whether this path is `other` or lies below it
    pub fn starts_with(&self, other: &DavPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Percent-encoded path for a multistatus `href`
    pub fn href(&self, collection: bool) -> String {
        let mut href = String::from("/");
        let encoded: Vec<String> = self
            .segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        href.push_str(&encoded.join("/"));
        if collection && !self.is_root() {
            href.push('/');
        }
        href
    }
}

/// Slash-delimited, decoded form used by the document API
impl fmt::Display for DavPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Parse a `Destination` header into a path.
///
/// Accepts an absolute URL, an absolute path, or `host/path`.
pub fn parse_destination(header: &str) -> Result<DavPath, DavError> {
    let header = header.trim();
    if header.is_empty() {
        return Err(DavError::bad_request("empty Destination header"));
    }

    let lower = header.to_ascii_lowercase();
    let raw_path = if lower.starts_with("http://") || lower.starts_with("https://") {
        let url = url::Url::parse(header)
            .map_err(|e| DavError::bad_request(format!("invalid Destination {}: {}", header, e)))?;
        url.path().to_string()
    } else if header.starts_with('/') {
        header.to_string()
    } else {
        match header.find('/') {
            Some(pos) => header[pos..].to_string(),
            None => "/".to_string(),
        }
    };

    let raw_path = raw_path.split(['?', '#']).next().unwrap_or_default();
    DavPath::parse(raw_path)
}
