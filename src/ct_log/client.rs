use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use std::time::Duration;
use tracing::debug;

use super::LogSource;
use crate::types::{CertificateRecord, CT_TIMESTAMP_FORMAT};

/// Placeholder substituted with the URL-encoded domain
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

pub const CRTSH_URL_TEMPLATE: &str = "https://crt.sh/?q={domain}&output=json";
pub const GOOGLE_CT_URL_TEMPLATE: &str = "https://transparencyreport.google.com/transparencyreport/api/v3/httpsreport/ct/certsearch?include_subdomains=true&domain={domain}";

/// Anti-XSSI guard prepended by Google's Transparency Report API
const GOOGLE_XSSI_PREFIX: &str = ")]}'\n";

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .build()
        .context("Failed to build HTTP client")
}

/// Substitute the domain into a URL template
pub fn render_url(template: &str, domain: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(domain.as_bytes()).collect();
    template.replace(DOMAIN_PLACEHOLDER, &encoded)
}

/// GET a URL and return the body, failing on non-2xx
async fn get_body(http_client: &reqwest::Client, source: &str, url: &str) -> Result<String> {
    debug!("Querying {}: {}", source, url);

    let response = http_client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to connect to {}", source))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("{} returned status code {}", source, status);
    }

    response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {}", source))
}

/// crt.sh JSON search API
pub struct CrtShSource {
    name: String,
    url_template: String,
    http_client: reqwest::Client,
}

impl CrtShSource {
    pub fn new(name: String, url_template: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            name,
            url_template,
            http_client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl LogSource for CrtShSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<CertificateRecord>> {
        let url = render_url(&self.url_template, domain);
        let body = get_body(&self.http_client, &self.name, &url).await?;

        let records: Vec<CertificateRecord> = serde_json::from_str(&body)
            .with_context(|| format!("Could not parse JSON response from {} for {}", self.name, domain))?;

        debug!("Found {} certificates for {} in {}", records.len(), domain, self.name);

        Ok(records)
    }
}

/// Google Transparency Report certificate search
pub struct GoogleCtSource {
    name: String,
    url_template: String,
    http_client: reqwest::Client,
}

impl GoogleCtSource {
    pub fn new(name: String, url_template: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            name,
            url_template,
            http_client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl LogSource for GoogleCtSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<CertificateRecord>> {
        let url = render_url(&self.url_template, domain);
        let body = get_body(&self.http_client, &self.name, &url).await?;

        let records = parse_google_certsearch(&body)
            .with_context(|| format!("Could not parse response from {} for {}", self.name, domain))?;

        debug!("Found {} certificates for {} in {}", records.len(), domain, self.name);

        Ok(records)
    }
}

/// Decode a Transparency Report certsearch payload.
///
/// After the XSSI prefix the body is nested JSON arrays. Certificate rows look
/// like `[_, subject, issuer, not_before_ms, not_after_ms, ...]`; everything
/// else is envelope. Rows carry no CT log identifier.
pub fn parse_google_certsearch(body: &str) -> Result<Vec<CertificateRecord>> {
    let json = body
        .strip_prefix(GOOGLE_XSSI_PREFIX)
        .context("Unexpected response format (missing XSSI prefix)")?;

    let value: serde_json::Value = serde_json::from_str(json).context("Invalid JSON payload")?;

    let mut records = Vec::new();
    collect_certificate_rows(&value, &mut records);
    Ok(records)
}

fn collect_certificate_rows(value: &serde_json::Value, out: &mut Vec<CertificateRecord>) {
    let Some(items) = value.as_array() else {
        return;
    };

    if let Some(record) = certificate_row(items) {
        out.push(record);
        return;
    }

    for item in items {
        collect_certificate_rows(item, out);
    }
}

fn certificate_row(items: &[serde_json::Value]) -> Option<CertificateRecord> {
    if items.len() < 5 {
        return None;
    }

    items[1].as_str()?;
    let issuer = items[2].as_str()?;
    let not_before = millis_to_timestamp(items[3].as_f64()?)?;
    let not_after = millis_to_timestamp(items[4].as_f64()?)?;

    Some(CertificateRecord::new(&not_before, &not_after).with_issuer(issuer))
}

fn millis_to_timestamp(millis: f64) -> Option<String> {
    let datetime = DateTime::from_timestamp_millis(millis as i64)?;
    Some(datetime.naive_utc().format(CT_TIMESTAMP_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crtsh(server: &MockServer, timeout: Duration) -> CrtShSource {
        CrtShSource::new(
            "crt.sh".to_string(),
            format!("{}/?q={{domain}}&output=json", server.uri()),
            timeout,
        )
        .unwrap()
    }

    #[test]
    fn test_render_url_encodes_domain() {
        assert_eq!(
            render_url(CRTSH_URL_TEMPLATE, "example.com"),
            "https://crt.sh/?q=example.com&output=json"
        );
        assert_eq!(
            render_url(CRTSH_URL_TEMPLATE, "%.example.com"),
            "https://crt.sh/?q=%25.example.com&output=json"
        );
        assert_eq!(render_url("http://x/{domain}/{domain}", "a.b"), "http://x/a.b/a.b");
    }

    #[tokio::test]
    async fn test_crtsh_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "example.com"))
            .and(query_param("output", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "issuer_name": "C=US, O=Let's Encrypt, CN=R3",
                    "not_before": "2024-06-01T00:00:00",
                    "not_after": "2024-08-30T00:00:00",
                    "ct_log": "argon2024"
                },
                {
                    "issuer_name": "C=US, O=Let's Encrypt, CN=R3",
                    "not_before": "2024-06-01T00:00:00",
                    "not_after": "2024-08-30T00:00:00"
                }
            ])))
            .mount(&server)
            .await;

        let records = crtsh(&server, Duration::from_secs(5))
            .fetch("example.com")
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ct_log.as_deref(), Some("argon2024"));
        assert_eq!(records[1].ct_log, None);
    }

    #[tokio::test]
    async fn test_crtsh_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = crtsh(&server, Duration::from_secs(5))
            .fetch("example.com")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_crtsh_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let result = crtsh(&server, Duration::from_secs(5)).fetch("example.com").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_crtsh_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let result = crtsh(&server, Duration::from_millis(200))
            .fetch("example.com")
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_google_certsearch() {
        let body = format!(
            "{}{}",
            GOOGLE_XSSI_PREFIX,
            r#"[["https.ct.cdsr",[[null,"CN=example.com","R3",1717200000000,1724976000000,"aGFzaA==",null,1]],["abc",null,"def",1,3]]]"#
        );

        let records = parse_google_certsearch(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].issuer_name.as_deref(), Some("R3"));
        assert_eq!(records[0].not_before.as_deref(), Some("2024-06-01T00:00:00"));
        assert_eq!(records[0].not_after.as_deref(), Some("2024-08-30T00:00:00"));
        assert_eq!(records[0].ct_log, None);
    }

    #[test]
    fn test_parse_google_missing_prefix() {
        assert!(parse_google_certsearch("[[]]").is_err());
    }

    #[test]
    fn test_parse_google_invalid_json() {
        let body = format!("{}{{not json", GOOGLE_XSSI_PREFIX);
        assert!(parse_google_certsearch(&body).is_err());
    }

    #[tokio::test]
    async fn test_google_fetch() {
        let server = MockServer::start().await;
        let body = format!(
            "{}{}",
            GOOGLE_XSSI_PREFIX,
            r#"[["https.ct.cdsr",[[null,"CN=a.test","Test CA",1717200000000,1724976000000]]]]"#
        );
        Mock::given(method("GET"))
            .and(query_param("domain", "a.test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let source = GoogleCtSource::new(
            "google".to_string(),
            format!("{}/certsearch?include_subdomains=true&domain={{domain}}", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();

        let records = source.fetch("a.test").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].issuer_name.as_deref(), Some("Test CA"));
    }
}
