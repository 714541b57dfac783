use url::Url;

use super::error::JobError;

pub const NO_URL: &str = "No URL provided";
pub const INVALID_URL: &str = "Invalid URL format";

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<Url, JobError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(JobError::Validation(NO_URL.to_string()));
    }

    let url = Url::parse(raw).map_err(|_| JobError::Validation(INVALID_URL.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|host| !host.is_empty()) => Ok(url),
        _ => Err(JobError::Validation(INVALID_URL.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<Url, JobError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url("http://example.com/clip.mp4").is_ok());
        assert!(validate_url("  https://example.com/padded  ").is_ok());
    }

    #[test]
    fn test_empty_url() {
        assert_eq!(message(validate_url("")), NO_URL);
        assert_eq!(message(validate_url("   ")), NO_URL);
    }

    #[test]
    fn test_rejects_malformed_and_foreign_schemes() {
        assert_eq!(message(validate_url("not a url")), INVALID_URL);
        assert_eq!(message(validate_url("ftp://example.com/file")), INVALID_URL);
        assert_eq!(message(validate_url("file:///etc/passwd")), INVALID_URL);
        assert_eq!(message(validate_url("https://")), INVALID_URL);
    }
}
