use chrono::Utc;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::StorageConfig;

/// Issues and checks expiring download URLs for stored objects.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    base_url: String,
    secret: String,
    expiry_secs: i64,
}

impl UrlSigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, expiry_secs: i64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            expiry_secs,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.public_base_url.clone(),
            config.signing_secret.clone(),
            i64::try_from(config.signed_url_expiry_secs).unwrap_or(i64::MAX / 2),
        )
    }

    fn signature(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(key.as_bytes());
        hasher.update(b"|");
        hasher.update(expires.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn sign_at(&self, key: &str, now: i64) -> String {
        let expires = now + self.expiry_secs;
        format!(
            "{}/{}?expires={}&signature={}",
            self.base_url,
            encoded_key(key),
            expires,
            self.signature(key, expires)
        )
    }

    pub fn sign(&self, key: &str) -> String {
        self.sign_at(key, Utc::now().timestamp())
    }

    /// True when the signature matches and `now` is not past `expires`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: i64) -> bool {
        now <= expires && constant_time_eq(&self.signature(key, expires), signature)
    }
}

/// Percent-encode each `/`-separated segment of an object key.
fn encoded_key(key: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return key.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(key.split('/'));
    }
    url.path().trim_start_matches('/').to_string()
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        url.split(['?', '&'])
            .find_map(|pair| pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
            .unwrap()
    }

    #[test]
    fn signed_urls_verify_only_for_the_same_inputs() {
        let signer = UrlSigner::new("https://files.example.com/", "s3cret", 300);
        let url = signer.sign_at("projects/1/report.pdf", 1_000);

        assert!(url.starts_with("https://files.example.com/projects/1/report.pdf?expires=1300&signature="));
        let signature = query_param(&url, "signature");
        assert_eq!(signature.len(), 64);

        assert!(signer.verify("projects/1/report.pdf", 1_300, signature, 1_200));
        assert!(!signer.verify("projects/2/report.pdf", 1_300, signature, 1_200));
        assert!(!signer.verify("projects/1/report.pdf", 1_301, signature, 1_200));
        assert!(!signer.verify("projects/1/report.pdf", 1_300, signature, 1_301));

        let other = UrlSigner::new("https://files.example.com", "other", 300);
        assert!(!other.verify("projects/1/report.pdf", 1_300, signature, 1_200));

        assert!(!signer.verify("projects/1/report.pdf", 1_300, &signature[..63], 1_200));
        assert!(!signer.verify("projects/1/report.pdf", 1_300, "", 1_200));
    }

    #[test]
    fn key_segments_are_percent_encoded() {
        let signer = UrlSigner::new("http://localhost:6100/files", "s3cret", 60);

        assert!(signer.sign_at("projects/7/a#b.txt", 0).starts_with("http://localhost:6100/files/projects/7/a%23b.txt?expires=60&"));
        assert!(signer.sign_at("projects/7/what?.txt", 0).starts_with("http://localhost:6100/files/projects/7/what%3F.txt?"));
        assert!(signer.sign_at("drafts/2/site plan.pdf", 0).starts_with("http://localhost:6100/files/drafts/2/site%20plan.pdf?"));
        assert!(signer.sign_at("projects/7/100%.txt", 0).starts_with("http://localhost:6100/files/projects/7/100%25.txt?"));
    }

    #[test]
    fn signatures_cover_the_decoded_key() {
        let signer = UrlSigner::new("http://localhost:6100/files", "s3cret", 60);
        let url = signer.sign_at("projects/7/a#b.txt", 0);
        let signature = query_param(&url, "signature");
        assert!(signer.verify("projects/7/a#b.txt", 60, signature, 0));
        assert!(!signer.verify("projects/7/a%23b.txt", 60, signature, 0));
    }
}
