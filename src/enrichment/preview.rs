//! Link preview: fetch a page and read its Open Graph metadata

use super::types::LinkPreview;
use crate::error::{Error, Result};
use regex::Regex;
use reqwest::{Response, Url};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Only the head of a page is inspected.
const MAX_HTML_BYTES: usize = 512 * 1024;

pub struct PreviewClient {
    client: reqwest::Client,
    allow_private_hosts: bool,
    meta_tag: Regex,
    attribute: Regex,
    title_tag: Regex,
}

impl PreviewClient {
    pub fn new(client: reqwest::Client, allow_private_hosts: bool) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Internal(format!("Invalid regex: {}", e)))
        };
        Ok(Self {
            client,
            allow_private_hosts,
            meta_tag: compile(r"(?is)<meta\b[^>]*>")?,
            attribute: compile(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            title_tag: compile(r"(?is)<title[^>]*>(.*?)</title>")?,
        })
    }

    /// Fetch `url` and build a preview from its metadata
    pub async fn fetch(&self, url: &str) -> Result<LinkPreview> {
        let target = parse_http_url(url)?;
        if !self.allow_private_hosts {
            reject_private_host(&target)?;
        }

        let response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("Failed to fetch {}: {}", target, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Enrichment(format!("{} returned {}", target, status)));
        }
        // Redirects may land elsewhere; relative URLs resolve against the final page
        let final_url = response.url().clone();
        if !self.allow_private_hosts {
            reject_private_host(&final_url)?;
        }
        let body = read_head(response, MAX_HTML_BYTES)
            .await
            .map_err(|e| Error::Enrichment(format!("Failed to read {}: {}", target, e)))?;
        let body = String::from_utf8_lossy(&body);

        Ok(self.extract(url, &final_url, &body))
    }

    fn extract(&self, original: &str, base: &Url, html: &str) -> LinkPreview {
        let meta = self.meta_map(html);
        let lookup = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| meta.get(*k))
                .map(|v| decode_entities(v.trim()))
                .filter(|v| !v.is_empty())
        };

        let title = lookup(&["og:title", "twitter:title"]).or_else(|| {
            self.title_tag
                .captures(html)
                .map(|c| decode_entities(c[1].trim()))
                .filter(|t| !t.is_empty())
        });
        let image = lookup(&["og:image", "og:image:url", "twitter:image"])
            .and_then(|src| base.join(&src).ok())
            .map(|u| u.to_string());
        let site_name = lookup(&["og:site_name"]).or_else(|| base.host_str().map(str::to_string));

        LinkPreview {
            url: original.to_string(),
            title,
            description: lookup(&["og:description", "description", "twitter:description"]),
            image,
            site_name,
        }
    }

    /// Map of `property`/`name` → `content` for every meta tag; first wins
    fn meta_map(&self, html: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for tag in self.meta_tag.find_iter(html) {
            let mut key = None;
            let mut content = None;
            for cap in self.attribute.captures_iter(tag.as_str()) {
                let value = cap
                    .get(2)
                    .or_else(|| cap.get(3))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                match cap[1].to_ascii_lowercase().as_str() {
                    "property" | "name" => key = Some(value.to_ascii_lowercase()),
                    "content" => content = Some(value),
                    _ => {}
                }
            }
            if let (Some(key), Some(content)) = (key, content) {
                map.entry(key).or_insert(content);
            }
        }
        map
    }
}

fn parse_http_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid URL '{}': {}", input, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidInput(format!(
            "Unsupported URL scheme '{}'",
            other
        ))),
    }
}

/// Read at most `max` bytes of the body, then stop downloading
async fn read_head(mut response: Response, max: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = max - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Refuse hosts that resolve to this machine or a private network.
///
/// Only literal addresses and `localhost` are recognised; names are not
/// resolved here.
fn reject_private_host(url: &Url) -> Result<()> {
    let host = url
        .host_str()
        .unwrap_or_default()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase();
    let blocked = match host.parse::<IpAddr>() {
        Ok(ip) => is_private_ip(ip),
        Err(_) => host.is_empty() || host == "localhost" || host.ends_with(".localhost"),
    };
    if blocked {
        return Err(Error::InvalidInput(format!(
            "Refusing to preview private address '{}'",
            host
        )));
    }
    Ok(())
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => {
                let first = v6.segments()[0];
                v6 == Ipv6Addr::LOCALHOST
                    || v6.is_unspecified()
                    || (first & 0xfe00) == 0xfc00
                    || (first & 0xffc0) == 0xfe80
            }
        },
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.octets()[0] == 0
        // carrier-grade NAT 100.64.0.0/10
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xc0) == 64)
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::{response::Html, routing::get, Router};
    use std::time::Duration;

    fn make_client() -> PreviewClient {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        PreviewClient::new(client, true).unwrap()
    }

    const OG_PAGE: &str = r#"<!doctype html>
<html><head>
  <title>Fallback Title</title>
  <meta property="og:title" content="Bento &amp; Friends">
  <meta name="description" content='A grid of cards'>
  <meta content="/static/cover.png" property="og:image" />
  <meta property="og:site_name" content="Bento">
</head><body>hi</body></html>"#;

    const PLAIN_PAGE: &str = "<html><head><TITLE> Just a title </TITLE></head></html>";

    async fn mock_site() -> String {
        let router = Router::new()
            .route("/og", get(|| async { Html(OG_PAGE) }))
            .route("/plain", get(|| async { Html(PLAIN_PAGE) }));
        serve(router).await
    }

    #[tokio::test]
    async fn test_open_graph_preview() {
        let base = mock_site().await;
        let url = format!("{}/og", base);
        let preview = make_client().fetch(&url).await.unwrap();

        assert_eq!(preview.url, url);
        assert_eq!(preview.title.as_deref(), Some("Bento & Friends"));
        assert_eq!(preview.description.as_deref(), Some("A grid of cards"));
        assert_eq!(
            preview.image.as_deref(),
            Some(format!("{}/static/cover.png", base).as_str())
        );
        assert_eq!(preview.site_name.as_deref(), Some("Bento"));
    }

    #[tokio::test]
    async fn test_title_fallback() {
        let base = mock_site().await;
        let preview = make_client()
            .fetch(&format!("{}/plain", base))
            .await
            .unwrap();
        assert_eq!(preview.title.as_deref(), Some("Just a title"));
        assert_eq!(preview.description, None);
        assert_eq!(preview.image, None);
        assert_eq!(preview.site_name.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_rejects_non_http() {
        let client = make_client();
        assert!(matches!(
            client.fetch("javascript:alert(1)").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            client.fetch("not a url").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_page() {
        let base = mock_site().await;
        assert!(matches!(
            make_client().fetch(&format!("{}/missing", base)).await,
            Err(Error::Enrichment(_))
        ));
    }

    #[tokio::test]
    async fn test_read_head_stops_at_limit() {
        let page = format!("<title>Big</title>{}", "x".repeat(2 * MAX_HTML_BYTES));
        let base = serve(Router::new().route(
            "/big",
            get(move || {
                let page = page.clone();
                async move { Html(page) }
            }),
        ))
        .await;

        let response = reqwest::get(format!("{}/big", base)).await.unwrap();
        let head = read_head(response, 1024).await.unwrap();
        assert_eq!(head.len(), 1024);
        assert!(head.starts_with(b"<title>Big</title>"));

        let preview = make_client().fetch(&format!("{}/big", base)).await.unwrap();
        assert_eq!(preview.title.as_deref(), Some("Big"));
    }

    #[tokio::test]
    async fn test_private_hosts_rejected() {
        let base = mock_site().await;
        let guarded = PreviewClient::new(reqwest::Client::new(), false).unwrap();
        for url in [
            format!("{}/og", base),
            "http://localhost:8080/".to_string(),
            "http://10.0.0.8/".to_string(),
            "http://192.168.1.1/admin".to_string(),
            "http://169.254.169.254/latest/meta-data".to_string(),
            "http://[::1]/".to_string(),
            "http://[::ffff:127.0.0.1]/".to_string(),
            "http://0.0.0.0/".to_string(),
        ] {
            assert!(
                matches!(guarded.fetch(&url).await, Err(Error::InvalidInput(_))),
                "{} was not rejected",
                url
            );
        }
    }

    #[test]
    fn test_public_hosts_allowed() {
        for url in [
            "https://example.com/",
            "http://93.184.216.34/",
            "https://[2606:2800:220:1::]/",
        ] {
            assert!(reject_private_host(&Url::parse(url).unwrap()).is_ok(), "{}", url);
        }
    }
}
