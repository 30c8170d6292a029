use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::DispatchSink;

/// Telegram rejects messages longer than this many characters.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Push sink backed by the Telegram Bot API `sendMessage` method.
pub struct TelegramSink {
    http: Client,
    api_url: String,
    token: String,
}

impl TelegramSink {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(TelegramSink {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn send_chunk(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Telegram request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram error {}: {}", status, body);
        }

        let result: serde_json::Value = resp
            .json()
            .await
            .context("Failed to parse Telegram response")?;
        if !result["ok"].as_bool().unwrap_or(false) {
            anyhow::bail!(
                "Telegram rejected message: {}",
                result["description"].as_str().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}

#[async_trait]
impl DispatchSink for TelegramSink {
    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        debug!("Sending {} Telegram message(s) to {}", chunks.len(), destination);
        for chunk in &chunks {
            self.send_chunk(destination, chunk).await?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Telegram"
    }
}

/// Split on line boundaries so that no chunk exceeds `max_chars` characters.
/// A single over-long line is hard-split.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let mut line_chars: Vec<char> = line.chars().collect();
        while line_chars.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = line_chars.split_off(max_chars);
            chunks.push(line_chars.into_iter().collect());
            line_chars = rest;
        }

        let needed = if current.is_empty() {
            line_chars.len()
        } else {
            line_chars.len() + 1
        };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current_len += line_chars.len();
        current.extend(line_chars);
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_split_short_message() {
        assert_eq!(split_message("a\nb", 10), vec!["a\nb".to_string()]);
        assert_eq!(split_message("", 10), vec![String::new()]);
    }

    #[test]
    fn test_split_on_line_boundaries() {
        let chunks = split_message("aaaa\nbbbb\ncccc", 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_split_long_line() {
        let chunks = split_message("abcdefgh", 3);
        assert_eq!(chunks, vec!["abc", "def", "gh"]);
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_send_message() {
        let received: Arc<Mutex<Vec<Value>>> = Arc::default();
        let sink_received = Arc::clone(&received);
        let router = Router::new().route(
            "/botTOKEN/sendMessage",
            post(move |Json(body): Json<Value>| {
                let received = Arc::clone(&sink_received);
                async move {
                    received.lock().unwrap().push(body);
                    Json(json!({ "ok": true }))
                }
            }),
        );
        let base = serve(router).await;
        let sink = TelegramSink::new(&base, "TOKEN", Duration::from_secs(5)).unwrap();
        sink.send("-100123", "hello").await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["chat_id"], "-100123");
        assert_eq!(received[0]["text"], "hello");
    }

    #[tokio::test]
    async fn test_rejected_message_is_an_error() {
        let router = Router::new().route(
            "/botTOKEN/sendMessage",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "ok": false, "description": "chat not found" })),
                )
            }),
        );
        let base = serve(router).await;
        let sink = TelegramSink::new(&base, "TOKEN", Duration::from_secs(5)).unwrap();
        assert!(sink.send("1", "hello").await.is_err());
    }
}
