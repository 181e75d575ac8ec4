//! Minimal Telegram Bot API client: long polling in, messages and
//! documents out. Blocking on purpose; the engine processes one update
//! at a time to completion.

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use spoke_core::schema::{self, Keyboard};
use std::path::Path;
use std::time::Duration;

// The client timeout must exceed the long-poll window so the server, not
// the client, ends the request.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

fn http_timeout(poll_timeout: u64) -> Duration {
    Duration::from_secs(poll_timeout) + HTTP_TIMEOUT_MARGIN
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct Telegram {
    client: reqwest::blocking::Client,
    base: String,
}

impl Telegram {
    pub fn new(token: &str, poll_timeout: u64) -> anyhow::Result<Self> {
        Self::with_base(format!("https://api.telegram.org/bot{token}"), poll_timeout)
    }

    /// Base URL override for tests.
    pub fn with_base(base: String, poll_timeout: u64) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(http_timeout(poll_timeout))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base })
    }

    pub fn get_updates(&self, offset: Option<i64>, timeout: u64) -> anyhow::Result<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = offset.into();
        }
        self.call("getUpdates", &body)
    }

    /// Discard the entire backlog accumulated while the bot was down.
    /// `getUpdates` pages at 100 updates, so this keeps polling with the
    /// advancing offset until an empty page comes back. Returns the
    /// offset to poll from.
    pub fn drop_pending_updates(&self) -> anyhow::Result<Option<i64>> {
        let mut offset = None;
        loop {
            let pending = self.get_updates(offset, 0)?;
            match pending.last() {
                Some(last) => offset = Some(last.update_id + 1),
                None => return Ok(offset),
            }
        }
    }

    pub fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> anyhow::Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = reply_markup(keyboard);
        }
        let _: Value = self.call("sendMessage", &body)?;
        Ok(())
    }

    pub fn send_document(&self, chat_id: i64, path: &Path, caption: &str) -> anyhow::Result<()> {
        let form = reqwest::blocking::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .file("document", path)
            .with_context(|| format!("failed to read document {}", path.display()))?;
        let resp = self
            .client
            .post(format!("{}/sendDocument", self.base))
            .multipart(form)
            .send()
            .context("sendDocument request failed")?;
        let api: ApiResponse<Value> = resp.json().context("sendDocument returned malformed JSON")?;
        if !api.ok {
            bail!("sendDocument rejected: {}", api.description.unwrap_or_default());
        }
        Ok(())
    }

    fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> anyhow::Result<T> {
        let resp = self
            .client
            .post(format!("{}/{method}", self.base))
            .json(body)
            .send()
            .with_context(|| format!("{method} request failed"))?;
        let api: ApiResponse<T> = resp
            .json()
            .with_context(|| format!("{method} returned malformed JSON"))?;
        if !api.ok {
            bail!("{method} rejected: {}", api.description.unwrap_or_default());
        }
        api.result
            .ok_or_else(|| anyhow::anyhow!("{method} returned no result"))
    }
}

// ---------------------------------------------------------------------------
// Keyboard rendering
// ---------------------------------------------------------------------------

/// Render a core keyboard spec as Telegram reply markup.
fn reply_markup(keyboard: Keyboard) -> Value {
    let rows = match keyboard {
        Keyboard::Remove => return json!({ "remove_keyboard": true }),
        Keyboard::SerialId => json!([["Cancel"]]),
        Keyboard::Text => json!([["Back", "Skip"]]),
        Keyboard::Boolean => json!([["True", "False"], ["Back", "Skip"]]),
        Keyboard::Rate => json!([
            ["0", "1", "2", "3", "4"],
            ["5", "6", "7", "8", "9", "10"],
            ["Back", "Skip"]
        ]),
        Keyboard::Battery => json!([["0", "1", "2", "3", "4"], ["Back", "Skip"]]),
        Keyboard::SeatHeight => json!([
            ["1", "2", "3", "4", "5"],
            ["6", "7", "8", "9", "10"],
            ["Back", "Skip"]
        ]),
        Keyboard::Location => json!([
            [{ "text": "Share Location", "request_location": true }],
            ["Back", "Skip"]
        ]),
        Keyboard::FieldChoice => {
            let mut rows: Vec<Value> = schema::editable_fields()
                .map(|f| json!([f.name]))
                .collect();
            rows.push(json!(["Cancel"]));
            Value::Array(rows)
        }
    };
    json!({
        "keyboard": rows,
        "one_time_keyboard": true,
        "resize_keyboard": true,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn get_updates_parses_messages() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/getUpdates")
            .match_body(Matcher::PartialJson(json!({ "offset": 5 })))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":true,"result":[{"update_id":7,
                    "message":{"chat":{"id":42},"text":"/add"}}]}"#,
            )
            .create();

        let tg = Telegram::with_base(server.url(), 0).unwrap();
        let updates = tg.get_updates(Some(5), 0).unwrap();
        mock.assert();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 7);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/add"));
        assert!(message.location.is_none());
    }

    #[test]
    fn location_payload_deserializes() {
        let mut server = Server::new();
        server
            .mock("POST", "/getUpdates")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":true,"result":[{"update_id":1,
                    "message":{"chat":{"id":42},
                    "location":{"latitude":52.52,"longitude":13.405}}}]}"#,
            )
            .create();

        let tg = Telegram::with_base(server.url(), 0).unwrap();
        let updates = tg.get_updates(None, 0).unwrap();
        let location = updates[0].message.as_ref().unwrap().location.as_ref().unwrap();
        assert_eq!(location.latitude, 52.52);
        assert_eq!(location.longitude, 13.405);
    }

    #[test]
    fn drop_pending_consumes_backlog_beyond_first_page() {
        let mut server = Server::new();
        // First call carries no offset; exact match keeps it from
        // swallowing the follow-up pages.
        let first_page = server
            .mock("POST", "/getUpdates")
            .match_body(Matcher::Json(json!({
                "timeout": 0,
                "allowed_updates": ["message"],
            })))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":true,"result":[{"update_id":100,
                    "message":{"chat":{"id":1},"text":"/add"}}]}"#,
            )
            .create();
        // A stale destructive command sitting on the second page must be
        // consumed here, not replayed by the main loop.
        let second_page = server
            .mock("POST", "/getUpdates")
            .match_body(Matcher::PartialJson(json!({ "offset": 101 })))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":true,"result":[{"update_id":101,
                    "message":{"chat":{"id":1},"text":"/delete BK-001"}}]}"#,
            )
            .create();
        let empty_page = server
            .mock("POST", "/getUpdates")
            .match_body(Matcher::PartialJson(json!({ "offset": 102 })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"result":[]}"#)
            .create();

        let tg = Telegram::with_base(server.url(), 0).unwrap();
        assert_eq!(tg.drop_pending_updates().unwrap(), Some(102));
        first_page.assert();
        second_page.assert();
        empty_page.assert();
    }

    #[test]
    fn drop_pending_with_no_backlog_returns_no_offset() {
        let mut server = Server::new();
        server
            .mock("POST", "/getUpdates")
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"result":[]}"#)
            .create();

        let tg = Telegram::with_base(server.url(), 0).unwrap();
        assert_eq!(tg.drop_pending_updates().unwrap(), None);
    }

    #[test]
    fn http_timeout_exceeds_poll_window() {
        for poll in [0, 30, 90, 300] {
            assert!(
                http_timeout(poll) > Duration::from_secs(poll),
                "poll window {poll}s"
            );
        }
    }

    #[test]
    fn send_message_posts_text_and_markup() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/sendMessage")
            .match_body(Matcher::PartialJson(json!({
                "chat_id": 42,
                "text": "Tires Rate (0-10):",
                "reply_markup": { "one_time_keyboard": true },
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"result":{}}"#)
            .create();

        let tg = Telegram::with_base(server.url(), 0).unwrap();
        tg.send_message(42, "Tires Rate (0-10):", Some(Keyboard::Rate))
            .unwrap();
        mock.assert();
    }

    #[test]
    fn api_rejection_surfaces_description() {
        let mut server = Server::new();
        server
            .mock("POST", "/sendMessage")
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .create();

        let tg = Telegram::with_base(server.url(), 0).unwrap();
        let err = tg.send_message(42, "hi", None).unwrap_err();
        assert!(err.to_string().contains("chat not found"));
    }

    #[test]
    fn rate_keyboard_has_grid_rows() {
        let markup = reply_markup(Keyboard::Rate);
        assert_eq!(markup["keyboard"][0][0], "0");
        assert_eq!(markup["keyboard"][1][5], "10");
        assert_eq!(markup["keyboard"][2], json!(["Back", "Skip"]));
        assert_eq!(markup["one_time_keyboard"], true);
    }

    #[test]
    fn location_keyboard_requests_location() {
        let markup = reply_markup(Keyboard::Location);
        assert_eq!(markup["keyboard"][0][0]["request_location"], true);
    }

    #[test]
    fn field_choice_lists_editable_fields_then_cancel() {
        let markup = reply_markup(Keyboard::FieldChoice);
        let rows = markup["keyboard"].as_array().unwrap();
        assert_eq!(rows[0], json!(["Inventory Tag"]));
        assert_eq!(rows.last().unwrap(), &json!(["Cancel"]));
        // Serial ID and Date are never offered.
        assert!(!rows.iter().any(|r| r[0] == "Serial ID" || r[0] == "Date"));
    }

    #[test]
    fn remove_keyboard_markup() {
        assert_eq!(
            reply_markup(Keyboard::Remove),
            json!({ "remove_keyboard": true })
        );
    }
}
