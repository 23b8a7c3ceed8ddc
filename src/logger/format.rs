//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)
//! - Custom patterns with `$variables`

use chrono::{DateTime, Local};
use hyper::{HeaderMap, Method, Uri, Version};
use std::net::SocketAddr;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address, "-" when unknown
    pub remote_addr: String,
    /// Time the request was received
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// "1.0", "1.1", "2"
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Handler time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Start an entry for an incoming request; status and size are filled in later
    pub fn from_request(
        remote_addr: Option<SocketAddr>,
        method: &Method,
        uri: &Uri,
        version: Version,
        headers: &HeaderMap,
    ) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            remote_addr: remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            time: Local::now(),
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(ToString::to_string),
            http_version: version_label(version).to_string(),
            status: 0,
            body_bytes: 0,
            referer: header("referer"),
            user_agent: header("user-agent"),
            request_time_us: 0,
        }
    }

    /// Record the response side of the exchange
    pub fn finish(&mut self, status: u16, body_bytes: usize, request_time_us: u64) {
        self.status = status;
        self.body_bytes = body_bytes;
        self.request_time_us = request_time_us;
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$request_time` (seconds,
    /// 3 decimals), `$status`, `$body_bytes_sent`, `$http_referer`,
    /// `$http_user_agent`.
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        let vars: [(&str, String); 11] = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time.format(CLF_TIME).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", format!("{request_time:.3}")),
            ("$request_method", self.method.clone()),
            ("$request_uri", self.request_uri()),
            ("$request", self.request_line()),
            ("$status", self.status.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            (
                "$http_referer",
                self.referer.clone().unwrap_or_else(|| "-".to_string()),
            ),
            (
                "$http_user_agent",
                self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ];

        substitute(pattern, &vars)
    }
}

/// Expand `$name` variables in one pass over the pattern.
///
/// Substituted values are copied verbatim and never rescanned, so a `$status`
/// sent by the client stays literal. The longest matching name wins
/// (`$request_uri` over `$request`); an unknown `$` is kept as is.
fn substitute(pattern: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let var = vars
            .iter()
            .filter(|(name, _)| tail.starts_with(name))
            .max_by_key(|(name, _)| name.len());
        match var {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribe_entry() -> AccessLogEntry {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", "curl/8.5.0".parse().unwrap());
        headers.insert("referer", "http://127.0.0.1:3000/".parse().unwrap());

        let mut entry = AccessLogEntry::from_request(
            Some("10.0.0.7:51234".parse().unwrap()),
            &Method::GET,
            &"/subscribe?src=mail".parse().unwrap(),
            Version::HTTP_11,
            &headers,
        );
        entry.finish(404, 9, 12_345);
        entry
    }

    #[test]
    fn test_from_request_fields() {
        let entry = subscribe_entry();
        assert_eq!(entry.remote_addr, "10.0.0.7");
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.path, "/subscribe");
        assert_eq!(entry.query.as_deref(), Some("src=mail"));
        assert_eq!(entry.http_version, "1.1");
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.5.0"));
    }

    #[test]
    fn test_unknown_peer_and_missing_headers() {
        let entry = AccessLogEntry::from_request(
            None,
            &Method::POST,
            &"/".parse().unwrap(),
            Version::HTTP_10,
            &HeaderMap::new(),
        );
        assert_eq!(entry.remote_addr, "-");
        assert_eq!(entry.http_version, "1.0");
        let log = entry.format("combined");
        assert!(log.starts_with("- - - ["));
        assert!(log.ends_with("\"-\" \"-\""));
    }

    #[test]
    fn test_format_combined() {
        let log = subscribe_entry().format("combined");
        assert!(log.starts_with("10.0.0.7 - - ["));
        assert!(log.contains("\"GET /subscribe?src=mail HTTP/1.1\" 404 9"));
        assert!(log.contains("\"http://127.0.0.1:3000/\""));
        assert!(log.ends_with("\"curl/8.5.0\""));
    }

    #[test]
    fn test_format_common() {
        let log = subscribe_entry().format("common");
        assert!(log.ends_with("\"GET /subscribe?src=mail HTTP/1.1\" 404 9"));
        assert!(!log.contains("curl"));
    }

    #[test]
    fn test_format_json() {
        let log = subscribe_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["remote_addr"], "10.0.0.7");
        assert_eq!(value["path"], "/subscribe");
        assert_eq!(value["query"], "src=mail");
        assert_eq!(value["status"], 404);
        assert_eq!(value["body_bytes"], 9);
        assert_eq!(value["request_time_us"], 12_345);
    }

    #[test]
    fn test_format_custom() {
        let log = subscribe_entry().format("$request_method $request_uri -> $status in $request_time");
        assert_eq!(log, "GET /subscribe?src=mail -> 404 in 0.012");
    }

    #[test]
    fn test_format_custom_request_line() {
        let log = subscribe_entry().format("[$request] $http_referer");
        assert_eq!(
            log,
            "[GET /subscribe?src=mail HTTP/1.1] http://127.0.0.1:3000/"
        );
    }

    #[test]
    fn test_format_custom_does_not_expand_client_values() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", "x $status $request_uri".parse().unwrap());
        let mut entry = AccessLogEntry::from_request(
            None,
            &Method::GET,
            &"/subscribe?q=$remote_addr".parse().unwrap(),
            Version::HTTP_11,
            &headers,
        );
        entry.finish(302, 0, 0);

        let log = entry.format("$request_uri|$http_user_agent|$status");
        assert_eq!(log, "/subscribe?q=$remote_addr|x $status $request_uri|302");
    }

    #[test]
    fn test_substitute_unknown_and_trailing_dollar() {
        let vars = [("$status", "404".to_string())];
        assert_eq!(substitute("$nope $status$", &vars), "$nope 404$");
        assert_eq!(substitute("$$status", &vars), "$404");
    }
}
