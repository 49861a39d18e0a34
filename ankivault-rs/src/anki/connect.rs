//! AnkiConnect HTTP client.
//!
//! Every call is a JSON `POST` of `{action, version, params}` answered by
//! `{result, error}`. A non-null `error` is reported by the add-on itself and
//! surfaces as [`SyncError::Bridge`].

use crate::anki::NoteSource;
use crate::config::AnkiConnectConfig;
use crate::error::{Result, SyncError};
use crate::types::{AnkiNote, NoteId, RawNoteInfo};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::time::Duration;
use ureq::Agent;

/// AnkiConnect protocol version.
pub const API_VERSION: u8 = 6;

#[derive(Debug, Serialize)]
struct Request<'a, P> {
    action: &'a str,
    version: u8,
    params: P,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FindNotesParams<'a> {
    query: &'a str,
}

#[derive(Debug, Serialize)]
struct NotesInfoParams<'a> {
    notes: &'a [NoteId],
}

/// Blocking client for a running AnkiConnect add-on.
///
/// Search and detail calls use separate agents with their own timeouts.
#[derive(Clone)]
pub struct AnkiConnect {
    url: String,
    find_agent: Agent,
    info_agent: Agent,
}

fn agent(timeout_secs: u64) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .build();
    Agent::new_with_config(config)
}

impl AnkiConnect {
    pub fn new(config: &AnkiConnectConfig) -> Self {
        Self {
            url: config.url.clone(),
            find_agent: agent(config.find_timeout_secs),
            info_agent: agent(config.info_timeout_secs),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn invoke<P, T>(&self, agent: &Agent, action: &str, params: P) -> Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = Request {
            action,
            version: API_VERSION,
            params,
        };

        tracing::debug!(action, url = %self.url, "calling AnkiConnect");
        let mut response = agent
            .post(self.url.as_str())
            .send_json(&request)
            .map_err(|e| self.transport_error(action, e))?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.transport_error(action, e))?;

        decode(action, &text)
    }

    fn transport_error(&self, action: &str, err: ureq::Error) -> SyncError {
        match err {
            ureq::Error::StatusCode(status) => SyncError::HttpStatus {
                action: action.to_string(),
                status,
            },
            ureq::Error::Timeout(_) => SyncError::Timeout {
                action: action.to_string(),
            },
            ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => SyncError::ConnectionRefused {
                url: self.url.clone(),
            },
            ureq::Error::Io(e) if e.kind() == ErrorKind::TimedOut => SyncError::Timeout {
                action: action.to_string(),
            },
            ureq::Error::Io(e)
                if matches!(
                    e.kind(),
                    ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset | ErrorKind::AddrNotAvailable
                ) =>
            {
                SyncError::ConnectionRefused { url: self.url.clone() }
            }
            other => SyncError::Transport {
                action: action.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Unwrap an AnkiConnect response envelope.
fn decode<T: DeserializeOwned>(action: &str, text: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(text).map_err(|e| SyncError::MalformedResponse {
        action: action.to_string(),
        message: e.to_string(),
    })?;

    if let Some(message) = envelope.error {
        return Err(SyncError::Bridge {
            action: action.to_string(),
            message,
        });
    }
    envelope.result.ok_or_else(|| SyncError::MalformedResponse {
        action: action.to_string(),
        message: "response has neither result nor error".to_string(),
    })
}

impl NoteSource for AnkiConnect {
    fn find_note_ids(&self, query: &str) -> Result<Vec<NoteId>> {
        self.invoke(&self.find_agent, "findNotes", FindNotesParams { query })
    }

    fn notes_info(&self, ids: &[NoteId]) -> Result<Vec<AnkiNote>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<RawNoteInfo> = self.invoke(&self.info_agent, "notesInfo", NotesInfoParams { notes: ids })?;
        let received = raw.len();
        let notes: Vec<AnkiNote> = raw.into_iter().filter_map(RawNoteInfo::into_note).collect();
        if notes.len() < received {
            tracing::warn!(dropped = received - notes.len(), "notesInfo entries without a note id ignored");
        }
        Ok(notes)
    }
}
