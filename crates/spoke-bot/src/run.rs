//! The event loop: one logical thread of control, one update handled
//! synchronously to completion before the next. Transient transport
//! failures are logged and swallowed; store failures are logged and
//! reported to the chat generically.

use crate::telegram::{Message, Telegram};
use anyhow::Context;
use spoke_core::config::Config;
use spoke_core::dispatch;
use spoke_core::engine::{Effect, Engine, Event, Session};
use spoke_core::store::CsvStore;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(3);

pub fn run(config: Config) -> anyhow::Result<()> {
    let telegram = Telegram::new(&config.token, config.poll_timeout)?;
    let store = CsvStore::new(&config.data_file);
    store
        .ensure_initialized()
        .with_context(|| format!("failed to initialize {}", config.data_file.display()))?;
    let engine = Engine::new(store);
    let mut sessions: HashMap<i64, Session> = HashMap::new();

    let mut offset = match telegram.drop_pending_updates() {
        Ok(offset) => offset,
        Err(e) => {
            warn!("could not drop pending updates: {e:#}");
            None
        }
    };
    info!("bot running, store at {}", config.data_file.display());

    loop {
        let updates = match telegram.get_updates(offset, config.poll_timeout) {
            Ok(updates) => updates,
            Err(e) => {
                warn!("long poll failed, retrying: {e:#}");
                std::thread::sleep(RETRY_DELAY);
                continue;
            }
        };
        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(message) = update.message else { continue };
            let chat_id = message.chat.id;
            let Some(event) = classify(&message) else { continue };

            let session = sessions.entry(chat_id).or_default();
            let effects = match engine.handle(session, event) {
                Ok(effects) => effects,
                Err(e) => {
                    error!(chat_id, "store failure while handling update: {e}");
                    vec![Effect::Send {
                        text: "An error occurred. Please try again.".to_string(),
                        keyboard: None,
                    }]
                }
            };
            deliver(&telegram, chat_id, effects);
        }
    }
}

/// Classify an inbound message into an engine event. Unknown commands and
/// messages carrying neither text nor location yield None and are
/// dropped.
fn classify(message: &Message) -> Option<Event> {
    if let Some(location) = &message.location {
        return Some(Event::Location {
            lat: location.latitude,
            lon: location.longitude,
        });
    }
    let text = message.text.as_deref()?;
    if text.starts_with('/') {
        return dispatch::parse(text).map(Event::Command);
    }
    Some(Event::Text(text.to_string()))
}

fn deliver(telegram: &Telegram, chat_id: i64, effects: Vec<Effect>) {
    for effect in effects {
        let sent = match &effect {
            Effect::Send { text, keyboard } => telegram.send_message(chat_id, text, *keyboard),
            Effect::Document { path, caption } => telegram.send_document(chat_id, path, caption),
        };
        if let Err(e) = sent {
            warn!(chat_id, "outbound send failed: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::{Chat, Location};
    use spoke_core::dispatch::Command;

    fn message(text: Option<&str>, location: Option<Location>) -> Message {
        Message {
            chat: Chat { id: 1 },
            text: text.map(str::to_string),
            location,
        }
    }

    #[test]
    fn commands_classify_ahead_of_text() {
        assert_eq!(
            classify(&message(Some("/delete BK 1"), None)),
            Some(Event::Command(Command::Delete(Some("BK 1".into()))))
        );
        assert_eq!(
            classify(&message(Some("hello"), None)),
            Some(Event::Text("hello".into()))
        );
    }

    #[test]
    fn unknown_commands_are_dropped() {
        assert_eq!(classify(&message(Some("/frobnicate"), None)), None);
        assert_eq!(classify(&message(None, None)), None);
    }

    #[test]
    fn location_wins_over_text() {
        let event = classify(&message(
            None,
            Some(Location {
                latitude: 52.52,
                longitude: 13.405,
            }),
        ));
        assert_eq!(
            event,
            Some(Event::Location {
                lat: 52.52,
                lon: 13.405
            })
        );
    }
}
