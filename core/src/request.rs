use std::fmt;
use std::mem;

use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::Method;

use crate::utils::Redact;
use crate::Result;

/// Signing view of a request.
///
/// Header names are held by [`HeaderMap`], which always stores them in
/// lowercase, so every name seen by the signer is already case-folded.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP path, without query.
    pub path: String,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// HTTP body.
    pub body: Bytes,
}

impl SigningRequest {
    /// Create a signing request without headers and body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Insert a header, replacing any previous value for the same name.
    ///
    /// The name is folded to lowercase.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build a signing request from http::request::Parts and the body bytes.
    ///
    /// Headers are moved out of `parts` to avoid copy, call [`SigningRequest::apply`]
    /// to return them.
    pub fn build(parts: &mut http::request::Parts, body: Bytes) -> Self {
        SigningRequest {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            headers: mem::take(&mut parts.headers),
            body,
        }
    }

    /// Apply the signing headers back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) {
        mem::swap(&mut parts.headers, &mut self.headers);
    }

    /// Get header value by name.
    ///
    /// Returns `None` if the header is absent or not visible ASCII.
    #[inline]
    pub fn header_get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Keep only the headers whose name passes `filter`.
    pub fn header_retain(&mut self, filter: impl Fn(&str) -> bool) {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (k, v) in self.headers.iter() {
            if filter(k.as_str()) {
                headers.append(k.clone(), v.clone());
            }
        }
        self.headers = headers;
    }

    /// Get header names as sorted vector.
    pub fn header_name_to_vec_sorted(&self) -> Vec<&str> {
        let mut h = self
            .headers
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<&str>>();
        h.sort_unstable();

        h
    }

    /// Get headers with normalized values, sorted by name.
    ///
    /// Repeated headers are folded into one value joined by `,`, in the order
    /// they were received.
    pub fn header_to_vec_normalized(&self) -> Vec<(&str, Vec<u8>)> {
        self.header_name_to_vec_sorted()
            .into_iter()
            .map(|k| {
                let v = self
                    .headers
                    .get_all(k)
                    .iter()
                    .map(Self::header_value_normalize)
                    .collect::<Vec<_>>()
                    .join(&b',');
                (k, v)
            })
            .collect()
    }

    /// Normalize header value.
    ///
    /// Leading and trailing whitespace is removed, inner runs of whitespace
    /// collapse into a single space. Other bytes are kept as is, including
    /// obs-text.
    pub fn header_value_normalize(v: &HeaderValue) -> Vec<u8> {
        v.as_bytes()
            .split(|b| b.is_ascii_whitespace() || *b == b'\x0b')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(&b' ')
    }
}

impl fmt::Display for SigningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method: {}, Path: {}, Headers: ", self.method, self.path)?;
        for (idx, (k, v)) in self.headers.iter().enumerate() {
            if idx != 0 {
                f.write_str(", ")?;
            }
            let v = String::from_utf8_lossy(v.as_bytes());
            if *k == AUTHORIZATION {
                write!(f, "{k}:'{}'", Redact::from(&*v))?;
            } else {
                write!(f, "{k}:'{v}'")?;
            }
        }
        let body = String::from_utf8_lossy(&self.body);
        write!(
            f,
            ", Body: {}",
            body.split_whitespace().collect::<Vec<_>>().join(" ")
        )
    }
}

/// Normalize a request path.
///
/// - Empty path becomes `/`.
/// - Repeated `/` collapse into one.
/// - `.` segments are dropped and `..` pops the previous segment.
/// - A leading `/` of the input is preserved.
/// - A trailing `/` of the input is appended to the result, so `//` and
///   `/a/../` both give `//`. The bare root `/` stays `/`.
/// - A relative path that collapses to nothing gives `/`.
///
/// ```
/// use iasign_core::normalize_path;
///
/// assert_eq!(normalize_path("/a//b/./c/../"), "/a/b/");
/// ```
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            s => segments.push(s),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    if path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    if path != "/" && path.ends_with('/') {
        normalized.push('/');
    }

    if normalized.is_empty() {
        "/".to_string()
    } else {
        normalized
    }
}
