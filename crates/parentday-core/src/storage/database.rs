//! SQLite-backed queue store.
//!
//! Provides persistent storage for:
//! - Tickets (the queue and its history)
//! - The event settings singleton
//! - Parent registrations
//!
//! Every commit through this handle republishes the affected collection on a
//! `tokio::sync::watch` channel. Commits made by other connections to the same
//! file are picked up by [`QueueStore::refresh`], which compares SQLite's
//! `data_version` counter against the last value seen.

use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::migrations;
use super::{Config, QueueStore};
use crate::error::{CoreError, DatabaseError};
use crate::queue::{
    NewRegistration, Registration, Settings, Ticket, TicketSnapshot, TicketStatus, TicketWrite,
};

const TICKET_COLUMNS: &str = "id, number, student_name, parent_name, status, joined_at, \
     order_time, started_at, is_paused, pause_start_time, accumulated_pause_seconds, \
     completed_at, duration_seconds";

/// SQLite database for the shared queue.
pub struct Database {
    conn: Connection,
    tickets_tx: watch::Sender<TicketSnapshot>,
    settings_tx: watch::Sender<Settings>,
    data_version: Cell<i64>,
}

impl Database {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Open the database named by `store.database`, or the default file in
    /// the data directory.
    pub fn open_configured(config: &Config) -> Result<Self, CoreError> {
        let path = config.database_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::open(&path)?)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        conn.execute(
            "INSERT OR IGNORE INTO settings
                 (id, is_booking_enabled, booking_start_time, interview_start_time)
             VALUES (1, ?1, NULL, NULL)",
            params![Settings::default().is_booking_enabled],
        )?;

        let tickets = read_tickets(&conn)?;
        let settings = read_settings(&conn)?;
        let data_version = read_data_version(&conn)?;
        let (tickets_tx, _) = watch::channel(Arc::new(tickets));
        let (settings_tx, _) = watch::channel(settings);

        Ok(Self {
            conn,
            tickets_tx,
            settings_tx,
            data_version: Cell::new(data_version),
        })
    }

    fn publish_tickets(&self) -> Result<(), DatabaseError> {
        let tickets = read_tickets(&self.conn)?;
        debug!(count = tickets.len(), "publishing ticket snapshot");
        self.tickets_tx.send_replace(Arc::new(tickets));
        Ok(())
    }

    fn publish_settings(&self) -> Result<(), DatabaseError> {
        let settings = read_settings(&self.conn)?;
        self.settings_tx.send_replace(settings);
        Ok(())
    }

    /// Publish after a write that is already committed. The write stands
    /// either way, so a failed publish is logged rather than returned.
    fn publish_committed(&self, what: &str, published: Result<(), DatabaseError>) {
        if let Err(e) = published {
            error!(error = %e, "{what} committed but snapshot not published");
        }
    }
}

impl QueueStore for Database {
    fn load_tickets(&self) -> Result<Vec<Ticket>, DatabaseError> {
        read_tickets(&self.conn)
    }

    fn load_settings(&self) -> Result<Settings, DatabaseError> {
        read_settings(&self.conn)
    }

    fn load_registrations(&self) -> Result<Vec<Registration>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, parent_name, student_name, suggestions, questions, submitted_at
             FROM registrations
             ORDER BY rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut registrations = Vec::new();
        for row in rows {
            let (id, parent_name, student_name, suggestions, questions, submitted_at) = row?;
            registrations.push(Registration {
                id,
                parent_name,
                student_name,
                suggestions,
                questions,
                submitted_at: parse_ts("registrations", &submitted_at)?,
            });
        }
        // Stable on rowid order for identical timestamps.
        registrations.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(registrations)
    }

    #[instrument(skip(self, writes), fields(count = writes.len()))]
    fn apply(&self, writes: &[TicketWrite]) -> Result<Vec<String>, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = Vec::new();

        for write in writes {
            match write {
                TicketWrite::Insert(new) => {
                    let ticket = new.clone().into_ticket(Uuid::new_v4().to_string());
                    execute_ticket(
                        &tx,
                        &format!(
                            "INSERT INTO tickets ({TICKET_COLUMNS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                        ),
                        &ticket,
                    )?;
                    inserted.push(ticket.id);
                }
                TicketWrite::Update { id, patch } => {
                    let mut ticket = tx
                        .query_row(
                            &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
                            params![id],
                            raw_ticket,
                        )
                        .optional()?
                        .ok_or_else(|| DatabaseError::QueryFailed(format!("ticket {id} not found")))
                        .and_then(RawTicket::decode)?;
                    patch.apply_to(&mut ticket);
                    execute_ticket(
                        &tx,
                        "UPDATE tickets SET
                            number = ?2, student_name = ?3, parent_name = ?4, status = ?5,
                            joined_at = ?6, order_time = ?7, started_at = ?8, is_paused = ?9,
                            pause_start_time = ?10, accumulated_pause_seconds = ?11,
                            completed_at = ?12, duration_seconds = ?13
                         WHERE id = ?1",
                        &ticket,
                    )?;
                }
            }
        }

        tx.commit()?;
        self.publish_committed("ticket batch", self.publish_tickets());
        Ok(inserted)
    }

    #[instrument(skip(self, settings))]
    fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings
                 (id, is_booking_enabled, booking_start_time, interview_start_time)
             VALUES (1, ?1, ?2, ?3)",
            params![
                settings.is_booking_enabled,
                settings.booking_start_time.map(|t| t.to_rfc3339()),
                settings.interview_start_time.map(|t| t.to_rfc3339()),
            ],
        )?;
        self.publish_committed("settings", self.publish_settings());
        Ok(())
    }

    #[instrument(skip(self, registration))]
    fn add_registration(&self, registration: NewRegistration) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO registrations
                 (id, parent_name, student_name, suggestions, questions, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                registration.parent_name,
                registration.student_name,
                registration.suggestions,
                registration.questions,
                registration.submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    #[instrument(skip(self))]
    fn delete_ticket(&self, id: &str) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM tickets WHERE id = ?1", params![id])?;
        self.publish_committed("ticket delete", self.publish_tickets());
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_registration(&self, id: &str) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM registrations WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn subscribe_tickets(&self) -> watch::Receiver<TicketSnapshot> {
        self.tickets_tx.subscribe()
    }

    fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.settings_tx.subscribe()
    }

    fn refresh(&self) -> Result<bool, DatabaseError> {
        let version = read_data_version(&self.conn)?;
        if version == self.data_version.get() {
            return Ok(false);
        }
        self.data_version.set(version);
        debug!(version, "external commit detected");
        self.publish_tickets()?;
        self.publish_settings()?;
        Ok(true)
    }
}

// ── Row mapping ──────────────────────────────────────────────────────

/// Ticket columns as stored, before timestamp and status decoding.
struct RawTicket {
    id: String,
    number: i64,
    student_name: String,
    parent_name: String,
    status: String,
    joined_at: Option<String>,
    order_time: Option<String>,
    started_at: Option<String>,
    is_paused: bool,
    pause_start_time: Option<String>,
    accumulated_pause_seconds: f64,
    completed_at: Option<String>,
    duration_seconds: Option<i64>,
}

impl RawTicket {
    fn decode(self) -> Result<Ticket, DatabaseError> {
        let status = self
            .status
            .parse::<TicketStatus>()
            .map_err(|message| DatabaseError::CorruptRecord {
                table: "tickets",
                message,
            })?;
        Ok(Ticket {
            id: self.id,
            number: self.number,
            student_name: self.student_name,
            parent_name: self.parent_name,
            status,
            joined_at: parse_opt_ts("tickets", self.joined_at)?,
            order_time: parse_opt_ts("tickets", self.order_time)?,
            started_at: parse_opt_ts("tickets", self.started_at)?,
            is_paused: self.is_paused,
            pause_start_time: parse_opt_ts("tickets", self.pause_start_time)?,
            accumulated_pause_seconds: self.accumulated_pause_seconds,
            completed_at: parse_opt_ts("tickets", self.completed_at)?,
            duration_seconds: self.duration_seconds,
        })
    }
}

fn raw_ticket(row: &Row<'_>) -> rusqlite::Result<RawTicket> {
    Ok(RawTicket {
        id: row.get(0)?,
        number: row.get(1)?,
        student_name: row.get(2)?,
        parent_name: row.get(3)?,
        status: row.get(4)?,
        joined_at: row.get(5)?,
        order_time: row.get(6)?,
        started_at: row.get(7)?,
        is_paused: row.get(8)?,
        pause_start_time: row.get(9)?,
        accumulated_pause_seconds: row.get(10)?,
        completed_at: row.get(11)?,
        duration_seconds: row.get(12)?,
    })
}

fn execute_ticket(conn: &Connection, sql: &str, t: &Ticket) -> rusqlite::Result<usize> {
    let ts = |v: Option<DateTime<Utc>>| v.map(|v| v.to_rfc3339());
    conn.execute(
        sql,
        params![
            t.id,
            t.number,
            t.student_name,
            t.parent_name,
            t.status.as_str(),
            ts(t.joined_at),
            ts(t.order_time),
            ts(t.started_at),
            t.is_paused,
            ts(t.pause_start_time),
            t.accumulated_pause_seconds,
            ts(t.completed_at),
            t.duration_seconds,
        ],
    )
}

fn read_tickets(conn: &Connection) -> Result<Vec<Ticket>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([], raw_ticket)?;
    let mut tickets = Vec::new();
    for row in rows {
        tickets.push(row?.decode()?);
    }
    Ok(tickets)
}

fn read_settings(conn: &Connection) -> Result<Settings, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT is_booking_enabled, booking_start_time, interview_start_time
             FROM settings WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, bool>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((is_booking_enabled, booking, interview)) => Ok(Settings {
            is_booking_enabled,
            booking_start_time: parse_opt_ts("settings", booking)?,
            interview_start_time: parse_opt_ts("settings", interview)?,
        }),
        None => Ok(Settings::default()),
    }
}

fn read_data_version(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("PRAGMA data_version", [], |row| row.get(0))?)
}

fn parse_ts(table: &'static str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRecord {
            table,
            message: format!("bad timestamp '{value}': {e}"),
        })
}

fn parse_opt_ts(
    table: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    value.map(|v| parse_ts(table, &v)).transpose()
}
