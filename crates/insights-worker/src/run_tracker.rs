//! Resumable batch state backed by an append-only commit log.
//!
//! Each committed game appends one line `<tag> | <username> | <datetime> | <index>`.
//! The last matching line is the low-water mark: games at or before it are
//! done, and move rows tagged with `index + 1` belong to an interrupted game.
//! Games sharing the mark's exact second are told apart by how many of them
//! the log already holds.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::WorkerError;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowWaterMark {
    pub datetime: NaiveDateTime,
    pub game_index: u32,
}

impl LowWaterMark {
    /// Mark written for a user with an empty log: 2020-01-01, game 0.
    pub fn initial() -> Self {
        let datetime = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            datetime,
            game_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Replaying,
}

#[derive(Debug)]
pub struct RunTracker {
    path: PathBuf,
    tag: String,
    username: String,
    mark: LowWaterMark,
    /// Committed games whose datetime equals the mark's
    committed_at_mark: usize,
    state: RunState,
}

impl RunTracker {
    /// Read the commit log and position the tracker at its last entry for
    /// `username`. An empty (or missing) log gets the initial entry appended.
    pub async fn open(
        path: impl Into<PathBuf>,
        tag: &str,
        username: &str,
    ) -> Result<Self, WorkerError> {
        let path = path.into();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let mark = match last_mark(&contents, tag, username)? {
            Some(mark) => mark,
            None => {
                let mark = LowWaterMark::initial();
                info!(path = %path.display(), username, "Commit log empty, writing initial entry");
                append_line(&path, &format_entry(tag, username, &mark)).await?;
                mark
            }
        };

        let committed_at_mark = commits_at(&contents, tag, username, mark.datetime)?;

        info!(
            username,
            low_water_mark = %mark.datetime,
            game_index = mark.game_index,
            "Run tracker opened"
        );

        Ok(Self {
            path,
            tag: tag.to_string(),
            username: username.to_string(),
            mark,
            committed_at_mark,
            state: RunState::Idle,
        })
    }

    pub fn low_water_mark(&self) -> LowWaterMark {
        self.mark
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether a game still needs analysis: after the low-water mark and not
    /// before the configured start date.
    pub fn admits(&self, game_datetime: NaiveDateTime, start_date: NaiveDate) -> bool {
        game_datetime > self.mark.datetime && game_datetime.date() >= start_date
    }

    /// Whether a game falls on the mark's exact second (and not before the
    /// start date). Of those, the first [`RunTracker::committed_at_mark`] in
    /// archive order are done.
    pub fn ties_mark(&self, game_datetime: NaiveDateTime, start_date: NaiveDate) -> bool {
        game_datetime == self.mark.datetime && game_datetime.date() >= start_date
    }

    pub fn committed_at_mark(&self) -> usize {
        self.committed_at_mark
    }

    /// Index the next admitted game receives. Move rows already carrying this
    /// index were left by an interrupted run.
    pub fn next_game_index(&self) -> u32 {
        self.mark.game_index + 1
    }

    pub fn begin(&mut self) {
        self.state = RunState::Replaying;
    }

    pub fn finish(&mut self) {
        self.state = RunState::Idle;
    }

    /// Mark a game done. Call only once its move rows and game record are stored.
    pub async fn commit(
        &mut self,
        datetime: NaiveDateTime,
        game_index: u32,
    ) -> Result<(), WorkerError> {
        let mark = LowWaterMark {
            datetime,
            game_index,
        };
        append_line(&self.path, &format_entry(&self.tag, &self.username, &mark)).await?;
        debug!(game_index, %datetime, "Game committed");
        if datetime == self.mark.datetime {
            self.committed_at_mark += 1;
        } else {
            self.committed_at_mark = 1;
        }
        self.mark = mark;
        Ok(())
    }
}

pub fn format_entry(tag: &str, username: &str, mark: &LowWaterMark) -> String {
    format!(
        "{tag} | {username} | {} | {}",
        mark.datetime.format(DATETIME_FORMAT),
        mark.game_index
    )
}

/// Parse one log line. Lines without `tag` belong to someone else and are
/// `Ok(None)`; tagged lines that do not parse are fatal.
pub fn parse_entry(line: &str, tag: &str) -> Result<Option<(String, LowWaterMark)>, WorkerError> {
    if !line.contains(tag) {
        return Ok(None);
    }
    let malformed = |reason: &str| WorkerError::MalformedLogEntry {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(malformed("expected 4 '|'-separated fields"));
    }
    let datetime = NaiveDateTime::parse_from_str(fields[2], DATETIME_FORMAT)
        .map_err(|e| malformed(&format!("bad datetime: {e}")))?;
    let game_index = fields[3]
        .parse()
        .map_err(|e| malformed(&format!("bad game index: {e}")))?;

    Ok(Some((
        fields[1].to_string(),
        LowWaterMark {
            datetime,
            game_index,
        },
    )))
}

/// Last entry for `username` in the log contents.
pub fn last_mark(
    contents: &str,
    tag: &str,
    username: &str,
) -> Result<Option<LowWaterMark>, WorkerError> {
    let mut last = None;
    for line in contents.lines() {
        if let Some((user, mark)) = parse_entry(line, tag)? {
            if user.eq_ignore_ascii_case(username) {
                last = Some(mark);
            }
        }
    }
    Ok(last)
}

/// Committed games for `username` logged at exactly `datetime`. The initial
/// entry (index 0) is not a game.
pub fn commits_at(
    contents: &str,
    tag: &str,
    username: &str,
    datetime: NaiveDateTime,
) -> Result<usize, WorkerError> {
    let mut count = 0;
    for line in contents.lines() {
        if let Some((user, mark)) = parse_entry(line, tag)? {
            if user.eq_ignore_ascii_case(username)
                && mark.datetime == datetime
                && mark.game_index > 0
            {
                count += 1;
            }
        }
    }
    Ok(count)
}

async fn append_line(path: &Path, line: &str) -> Result<(), WorkerError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{line}\n").as_bytes()).await?;
    file.flush().await?;
    file.sync_data().await?;
    Ok(())
}
