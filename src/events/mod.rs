//! Campus events, persisted as one JSON array.
//!
//! Every mutation rewrites the whole file. Read-modify-write cycles run under
//! a single async lock and land through a temp file in the same directory.

use crate::error::{HelperError, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub location: String,
    pub details: String,
}

/// Fields supplied when creating an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub name: String,
    pub date: String,
    pub location: String,
    pub details: String,
}

impl EventInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HelperError::InvalidInput("Event name must not be empty".to_string()));
        }
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            HelperError::InvalidInput(format!("Event date '{}' is not YYYY-MM-DD", self.date))
        })?;
        Ok(())
    }

    fn into_event(self) -> Event {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            date: self.date.trim().to_string(),
            location: self.location,
            details: self.details,
        }
    }
}

/// File-backed event collection.
pub struct EventStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl EventStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All events in stored order.
    ///
    /// A missing file is created empty; an unreadable one reads as empty.
    pub async fn list(&self) -> Result<Vec<Event>> {
        let _guard = self.lock.lock().await;
        self.read()
    }

    /// Validate, assign an id, append and persist.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: EventInput) -> Result<Event> {
        input.validate()?;

        let _guard = self.lock.lock().await;
        let mut events = self.read()?;
        let event = input.into_event();
        events.push(event.clone());
        self.write(&events)?;

        info!("Created event {}", event.id);
        Ok(event)
    }

    /// Remove the event with `id`. The file is not touched when it is absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut events = self.read()?;
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(HelperError::NotFound("Event not found".to_string()));
        }
        self.write(&events)?;

        info!("Deleted event {}", id);
        Ok(())
    }

    /// Write two sample events when the file is missing or zero bytes.
    /// Returns whether it seeded.
    pub async fn seed_if_empty(&self) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let empty = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if !empty {
            return Ok(false);
        }

        let today = Utc::now().date_naive();
        let in_days = |days: i64| (today + Duration::days(days)).format(DATE_FORMAT).to_string();
        let samples = vec![
            EventInput {
                name: "Orientation Day".to_string(),
                date: in_days(7),
                location: "Main Auditorium".to_string(),
                details: "Welcome and orientation for new students.".to_string(),
            },
            EventInput {
                name: "Coding Club Meetup".to_string(),
                date: in_days(3),
                location: "Lab 204".to_string(),
                details: "Discussing algorithms and interview prep.".to_string(),
            },
        ];
        let events: Vec<Event> = samples.into_iter().map(EventInput::into_event).collect();
        self.write(&events)?;

        info!("Seeded {:?} with sample events", self.path);
        Ok(true)
    }

    fn read(&self) -> Result<Vec<Event>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.write(&[])?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(events) => Ok(events),
            Err(e) => {
                warn!("Events file {:?} is unreadable, treating as empty: {}", self.path, e);
                Ok(Vec::new())
            }
        }
    }

    fn write(&self, events: &[Event]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, events)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| HelperError::EventStore(format!("failed to replace {:?}: {}", self.path, e.error)))?;
        Ok(())
    }
}
