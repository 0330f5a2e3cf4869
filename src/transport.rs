//! Session boundary to the store.
//!
//! The adapter only needs one capability from a session: "execute a
//! query string, get rows back". [`QueryTransport`] captures that
//! contract so the adapter can be exercised against a mock, and
//! [`HttpTransport`] implements it over the store's HTTP query endpoint
//! with the `JSONCompact` output format.
//!
//! The connection string names the `clickhouse+native` scheme because
//! that is the format the hosting application emits; the transport
//! itself speaks HTTP to whatever host/port the descriptor carries.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{AdapterError, AdapterResult};
use crate::row::Value;
use crate::uri::ConnectionDescriptor;

/// Raw result of a query, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// An ordered sequence of row-tuples
    Rows(Vec<Vec<Value>>),
    /// Anything else the store returned
    Opaque(Value),
}

/// Black-box session contract: execute a query string, return rows.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Execute a query verbatim and return the raw result.
    async fn execute(&self, sql: &str) -> AdapterResult<RawResult>;

    /// Trivial liveness check (`SELECT 1`) used when establishing a
    /// session.
    async fn probe(&self) -> AdapterResult<()>;
}

/// Production transport over the store's HTTP query endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    username: String,
    password: String,
    database: String,
}

impl HttpTransport {
    /// Build a transport from a parsed descriptor. Cheap; no I/O until
    /// the first request.
    pub fn from_descriptor(descriptor: &ConnectionDescriptor) -> Self {
        Self {
            base_url: format!("http://{}:{}", descriptor.host, descriptor.port),
            username: descriptor.username.clone(),
            password: descriptor.password.clone(),
            database: descriptor.database.clone(),
        }
    }

    /// POST a query to the endpoint and return the response body.
    async fn send_query(&self, sql: &str) -> AdapterResult<String> {
        let url = format!(
            "{}/?database={}&default_format=JSONCompact",
            self.base_url,
            percent_encode(&self.database)
        );
        let auth_header = basic_auth_header(&self.username, &self.password);
        let sql_body = sql.to_string();

        // smolhttp is a blocking client; keep it off the executor
        let body = smol::unblock(move || {
            let response = smolhttp::Client::new(&url)
                .map_err(|e| AdapterError::Query(format!("failed to create HTTP client: {}", e)))?
                .post()
                .headers(vec![
                    ("Authorization".to_string(), auth_header),
                    ("Content-Type".to_string(), "text/plain".to_string()),
                ])
                .body(sql_body.into_bytes())
                .send()
                .map_err(|e| AdapterError::Query(format!("HTTP request failed: {}", e)))?;

            Ok::<String, AdapterError>(response.text())
        })
        .await?;

        if is_exception_body(&body) {
            return Err(AdapterError::Query(body.trim().to_string()));
        }

        Ok(body)
    }

    /// Turn a response body into a raw result.
    fn parse_body(body: &str) -> RawResult {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            // DDL and mutations come back with an empty body
            return RawResult::Rows(vec![]);
        }

        match serde_json::from_str::<JsonValue>(trimmed) {
            Ok(json) => match parse_json_compact(&json) {
                Some(rows) => RawResult::Rows(rows),
                None => RawResult::Opaque(Value::from_json(&json)),
            },
            Err(_) => RawResult::Opaque(Value::Text(trimmed.to_string())),
        }
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn execute(&self, sql: &str) -> AdapterResult<RawResult> {
        let body = self.send_query(sql).await?;
        Ok(HttpTransport::parse_body(&body))
    }

    async fn probe(&self) -> AdapterResult<()> {
        let url = format!(
            "{}/?database={}&query=SELECT%201",
            self.base_url,
            percent_encode(&self.database)
        );
        let auth_header = basic_auth_header(&self.username, &self.password);

        let body = smol::unblock(move || {
            let response = smolhttp::Client::new(&url)
                .map_err(|e| {
                    AdapterError::Connection(format!("failed to create HTTP client: {}", e))
                })?
                .get()
                .headers(vec![("Authorization".to_string(), auth_header)])
                .send()
                .map_err(|e| AdapterError::Connection(e.to_string()))?;

            Ok::<String, AdapterError>(response.text())
        })
        .await?;

        if is_exception_body(&body) {
            return Err(AdapterError::Connection(body.trim().to_string()));
        }

        Ok(())
    }
}

/// Extract row-tuples from a `JSONCompact` response, if it is one.
fn parse_json_compact(json: &JsonValue) -> Option<Vec<Vec<Value>>> {
    let data = json.get("data")?.as_array()?;
    let rows = data
        .iter()
        .map(|row| match row.as_array() {
            Some(cells) => cells.iter().map(Value::from_json).collect(),
            None => vec![Value::from_json(row)],
        })
        .collect();
    Some(rows)
}

/// The endpoint reports errors in-band with a 200 body.
fn is_exception_body(body: &str) -> bool {
    body.contains("Code:") && body.contains("DB::Exception")
}

/// Build the HTTP Basic Auth header.
fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", base64_encode(format!("{}:{}", username, password).as_bytes()))
}

/// Minimal base64 for the auth header; not worth a dependency.
fn base64_encode(input: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);

    for chunk in input.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let group = (b0 << 16) | (b1 << 8) | b2;

        out.push(ALPHABET[(group >> 18) as usize & 0x3F] as char);
        out.push(ALPHABET[(group >> 12) as usize & 0x3F] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(group >> 6) as usize & 0x3F] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[group as usize & 0x3F] as char
        } else {
            '='
        });
    }

    out
}

/// Percent-encode a query-string component.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{:02X}", byte));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::ConnectionDescriptor;

    #[test]
    fn test_transport_from_descriptor() {
        let d = ConnectionDescriptor::parse("clickhouse+native://u:p@example-host:8123/logs")
            .unwrap();
        let t = HttpTransport::from_descriptor(&d);

        assert_eq!(t.base_url, "http://example-host:8123");
        assert_eq!(t.username, "u");
        assert_eq!(t.password, "p");
        assert_eq!(t.database, "logs");
    }

    #[test]
    fn test_parse_json_compact_rows() {
        let json = serde_json::json!({
            "meta": [
                {"name": "id", "type": "Int32"},
                {"name": "name", "type": "String"}
            ],
            "data": [
                [1, "Alice"],
                [2, "Bob"]
            ],
            "rows": 2
        });

        let rows = parse_json_compact(&json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![Value::Int64(1), Value::Text("Alice".to_string())]);
        assert_eq!(rows[1], vec![Value::Int64(2), Value::Text("Bob".to_string())]);
    }

    #[test]
    fn test_parse_json_compact_rejects_non_result() {
        let json = serde_json::json!({"status": "ok"});
        assert!(parse_json_compact(&json).is_none());

        let json = serde_json::json!(42);
        assert!(parse_json_compact(&json).is_none());
    }

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(HttpTransport::parse_body(""), RawResult::Rows(vec![]));
        assert_eq!(HttpTransport::parse_body("  \n"), RawResult::Rows(vec![]));

        let body = r#"{"meta":[{"name":"n","type":"UInt8"}],"data":[[1]],"rows":1}"#;
        assert_eq!(
            HttpTransport::parse_body(body),
            RawResult::Rows(vec![vec![Value::Int64(1)]])
        );

        assert_eq!(
            HttpTransport::parse_body("12345"),
            RawResult::Opaque(Value::Int64(12345))
        );

        assert_eq!(
            HttpTransport::parse_body("Ok."),
            RawResult::Opaque(Value::Text("Ok.".to_string()))
        );
    }

    #[test]
    fn test_is_exception_body() {
        assert!(is_exception_body(
            "Code: 60. DB::Exception: Table default.missing does not exist."
        ));
        assert!(!is_exception_body("1\n"));
        assert!(!is_exception_body("Code: not really"));
    }

    #[test]
    fn test_base64_encode() {
        assert_eq!(base64_encode(b""), "");
        assert_eq!(base64_encode(b"f"), "Zg==");
        assert_eq!(base64_encode(b"fo"), "Zm8=");
        assert_eq!(base64_encode(b"foo"), "Zm9v");
        assert_eq!(base64_encode(b"user:pass"), "dXNlcjpwYXNz");
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("default"), "default");
        assert_eq!(percent_encode("my db"), "my%20db");
        assert_eq!(percent_encode("a=b&c"), "a%3Db%26c");
    }
}
