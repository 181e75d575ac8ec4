//! The conversation engine: an explicit finite-state machine over the
//! schema field table. `(state, event) -> (new state, effects)`, with no
//! knowledge of the transport, so every flow is testable in-process.

use crate::dispatch::Command;
use crate::error::Result;
use crate::record::Record;
use crate::schema::{self, FieldDef, FieldKind, Keyboard, NA};
use crate::store::CsvStore;
use crate::validate::{self, Input};
use std::path::PathBuf;
use tracing::debug;

const BACK: &str = "Back";
const SKIP: &str = "Skip";
const CANCEL: &str = "Cancel";

const HELP: &str = "Bike Inspection Bot\n\n\
    Commands:\n\
    /add - Add new record\n\
    /delete <Serial ID> - Delete record\n\
    /update <Serial ID> - Update record\n\
    /see - Download CSV file\n\
    /cancel - Cancel operation";

// ---------------------------------------------------------------------------
// Events and effects
// ---------------------------------------------------------------------------

/// One inbound message, already classified by the transport adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    Text(String),
    Location { lat: f64, lon: f64 },
}

/// Outbound actions for the transport adapter to perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send `text`; `keyboard` of None leaves any visible keyboard as-is.
    Send {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Transmit the backing table as a document.
    Document { path: PathBuf, caption: String },
}

impl Effect {
    fn send(text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        Effect::Send {
            text: text.into(),
            keyboard,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ChatState {
    Idle,
    /// Add wizard, `step` indexing into [`schema::FIELDS`].
    Add { step: usize },
    /// Update flow, waiting for a field choice.
    ChooseField { serial: String },
    /// Update flow, waiting for the chosen field's new value.
    ProvideValue {
        serial: String,
        field: &'static FieldDef,
    },
}

/// Per-chat conversation state. Created on the first message from a chat,
/// cleared on completion or cancellation. A new `/add` or `/update` entry
/// silently resets whatever was in progress.
#[derive(Debug)]
pub struct Session {
    state: ChatState,
    draft: Record,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: ChatState::Idle,
            draft: Record::new(),
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ChatState::Idle
    }

    fn reset(&mut self) {
        self.state = ChatState::Idle;
        self.draft = Record::new();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    store: CsvStore,
}

impl Engine {
    pub fn new(store: CsvStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    /// Process one inbound event against the chat's session. Store
    /// failures propagate; validation problems never do (they become
    /// re-prompt effects).
    pub fn handle(&self, session: &mut Session, event: Event) -> Result<Vec<Effect>> {
        match event {
            Event::Command(cmd) => self.handle_command(session, cmd),
            Event::Text(_) | Event::Location { .. } => match session.state.clone() {
                ChatState::Idle => Ok(Vec::new()),
                ChatState::Add { step } => self.add_step(session, step, &event),
                ChatState::ChooseField { serial } => Ok(choose_field(session, &serial, &event)),
                ChatState::ProvideValue { serial, field } => {
                    self.provide_value(session, &serial, field, &event)
                }
            },
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn handle_command(&self, session: &mut Session, cmd: Command) -> Result<Vec<Effect>> {
        match cmd {
            Command::Start => Ok(vec![Effect::send(HELP, None)]),
            Command::Add => {
                session.reset();
                session.state = ChatState::Add { step: 0 };
                debug!("add wizard entered");
                Ok(vec![prompt_for(&schema::FIELDS[0])])
            }
            Command::Delete(None) => {
                Ok(vec![Effect::send("Usage: /delete <Serial ID>", None)])
            }
            Command::Delete(Some(id)) => {
                let removed = self.store.delete_by_serial(&id)?;
                let text = if removed {
                    format!("Deleted '{id}'")
                } else {
                    format!("Not found '{id}'")
                };
                Ok(vec![Effect::send(text, None)])
            }
            Command::Update(None) => {
                Ok(vec![Effect::send("Usage: /update <Serial ID>", None)])
            }
            Command::Update(Some(id)) => {
                session.reset();
                if self.store.find_by_serial(&id)?.is_none() {
                    return Ok(vec![Effect::send(format!("Not found '{id}'"), None)]);
                }
                debug!(serial = %id, "update flow entered");
                let effects = vec![choose_field_prompt(&id)];
                session.state = ChatState::ChooseField { serial: id };
                Ok(effects)
            }
            Command::See => {
                let records = self.store.load_all()?;
                if records.is_empty() {
                    return Ok(vec![Effect::send("No records", None)]);
                }
                Ok(vec![Effect::Document {
                    path: self.store.path().to_path_buf(),
                    caption: format!("{} records", records.len()),
                }])
            }
            Command::Cancel => {
                session.reset();
                Ok(vec![Effect::send("Cancelled", Some(Keyboard::Remove))])
            }
        }
    }

    // -----------------------------------------------------------------------
    // Add wizard
    // -----------------------------------------------------------------------

    fn add_step(&self, session: &mut Session, step: usize, event: &Event) -> Result<Vec<Effect>> {
        let field = &schema::FIELDS[step];
        let text = match event {
            Event::Text(t) => Some(t.as_str()),
            _ => None,
        };

        // The first step offers only Cancel; there is no Back target and
        // Skip is not available for the key field.
        if step == 0 {
            return match text {
                Some(CANCEL) => {
                    session.reset();
                    Ok(vec![Effect::send("Cancelled", Some(Keyboard::Remove))])
                }
                Some(id) => {
                    session.draft.set(field.name, id);
                    self.advance(session, step)
                }
                // Location payload at a text-only step: ignored.
                None => Ok(Vec::new()),
            };
        }

        match text {
            Some(BACK) => {
                // Navigate back without touching stored values; nothing is
                // defaulted for the step being left.
                let prev = &schema::FIELDS[step - 1];
                session.state = ChatState::Add { step: step - 1 };
                Ok(vec![prompt_for(prev)])
            }
            Some(SKIP) => {
                session.draft.set_if_absent(field.name, NA);
                self.advance(session, step)
            }
            _ => {
                let input = event_input(event);
                if field.kind != FieldKind::GeoPoint && text.is_none() {
                    // Location payload at a non-location step: ignored.
                    return Ok(Vec::new());
                }
                match validate::validate(field, input) {
                    Ok(value) => {
                        session.draft.set(field.name, value);
                        self.advance(session, step)
                    }
                    Err(msg) => Ok(vec![Effect::send(msg, None)]),
                }
            }
        }
    }

    /// Move to the next wizard step, or commit when the last field was
    /// just handled.
    fn advance(&self, session: &mut Session, step: usize) -> Result<Vec<Effect>> {
        let next = step + 1;
        if next < schema::FIELDS.len() {
            session.state = ChatState::Add { step: next };
            return Ok(vec![prompt_for(&schema::FIELDS[next])]);
        }

        session.draft.finalize();
        let summary = session.draft.summary();
        self.store.append(session.draft.clone())?;
        debug!(serial = ?session.draft.serial_id(), "record saved");
        session.reset();
        Ok(vec![
            Effect::send(summary, Some(Keyboard::Remove)),
            Effect::send("Saved", None),
        ])
    }

    // -----------------------------------------------------------------------
    // Update flow
    // -----------------------------------------------------------------------

    fn provide_value(
        &self,
        session: &mut Session,
        serial: &str,
        field: &'static FieldDef,
        event: &Event,
    ) -> Result<Vec<Effect>> {
        let text = match event {
            Event::Text(t) => Some(t.as_str()),
            _ => None,
        };

        let value = match text {
            Some(BACK) => {
                session.state = ChatState::ChooseField {
                    serial: serial.to_string(),
                };
                return Ok(vec![choose_field_prompt(serial)]);
            }
            // Unlike the add flow, Skip here overwrites unconditionally.
            Some(SKIP) => NA.to_string(),
            _ => {
                if field.kind != FieldKind::GeoPoint && text.is_none() {
                    return Ok(Vec::new());
                }
                match validate::validate(field, event_input(event)) {
                    Ok(value) => value,
                    Err(msg) => return Ok(vec![Effect::send(msg, None)]),
                }
            }
        };

        let found = self.store.upsert_field(serial, field.name, &value)?;
        let text = if found {
            "Updated".to_string()
        } else {
            // Record deleted while the conversation was open.
            format!("Not found '{serial}'")
        };
        session.reset();
        Ok(vec![Effect::send(text, Some(Keyboard::Remove))])
    }
}

fn choose_field(session: &mut Session, serial: &str, event: &Event) -> Vec<Effect> {
    let Event::Text(text) = event else {
        return Vec::new();
    };
    if text == CANCEL {
        session.reset();
        return vec![Effect::send("Cancelled", Some(Keyboard::Remove))];
    }
    match schema::field(text).filter(|f| f.name != schema::SERIAL_ID) {
        Some(field) => {
            session.state = ChatState::ProvideValue {
                serial: serial.to_string(),
                field,
            };
            vec![Effect::send(
                schema::update_prompt(field),
                Some(field.keyboard),
            )]
        }
        None => vec![Effect::send("Invalid field", None)],
    }
}

fn choose_field_prompt(serial: &str) -> Effect {
    Effect::send(
        format!("Update field for '{serial}':"),
        Some(Keyboard::FieldChoice),
    )
}

fn prompt_for(field: &FieldDef) -> Effect {
    Effect::send(field.prompt, Some(field.keyboard))
}

fn event_input(event: &Event) -> Input<'_> {
    match event {
        Event::Text(t) => Input::Text(t),
        Event::Location { lat, lon } => Input::Location {
            lat: *lat,
            lon: *lon,
        },
        Event::Command(_) => Input::Text(""),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
