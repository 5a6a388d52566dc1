//! Append-only replay log of emitted events, including redacted variants.
//!
//! Saved as one `tag:json` line per entry. Tags name who received the entry: `all`, `p3`
//! (seat 3 only), `!p3` (everyone but seat 3), `p[3, 1]` and `!p[3, 1]` for sets of seats.
//! Entries carrying hidden information add the kind after a `#` (`p3#dev_card:{..}`), so a
//! loaded log can be routed again under any observability mode.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use settlers_protocol::{Event, PlayerId};
use thiserror::Error;

use crate::visibility::{Audience, ScopedEvent, Secret};

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: {reason}")]
    BadLine { line: usize, reason: String },
}

/// Who a log entry was delivered to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTag {
    All,
    Only(Vec<PlayerId>),
    Except(Vec<PlayerId>),
}

impl LogTag {
    fn for_audience(audience: &Audience) -> (LogTag, LogTag) {
        match audience {
            Audience::All => (LogTag::All, LogTag::Except(Vec::new())),
            Audience::One(p) => (LogTag::Only(vec![*p]), LogTag::Except(vec![*p])),
            Audience::Players(ps) => (LogTag::Only(ps.clone()), LogTag::Except(ps.clone())),
            Audience::AllExcept(ps) => (LogTag::Except(ps.clone()), LogTag::Only(ps.clone())),
        }
    }
}

fn write_seats(f: &mut fmt::Formatter<'_>, seats: &[PlayerId]) -> fmt::Result {
    match seats {
        [one] => write!(f, "p{}", one.0),
        _ => {
            let list: Vec<String> = seats.iter().map(|p| p.0.to_string()).collect();
            write!(f, "p[{}]", list.join(", "))
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogTag::All => f.write_str("all"),
            LogTag::Only(seats) => write_seats(f, seats),
            LogTag::Except(seats) => {
                f.write_str("!")?;
                write_seats(f, seats)
            }
        }
    }
}

impl FromStr for LogTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(LogTag::All);
        }
        let (except, rest) = match s.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let rest = rest
            .strip_prefix('p')
            .ok_or_else(|| format!("bad tag {s:?}"))?;
        let seat = |n: &str| {
            n.trim()
                .parse::<u8>()
                .map(PlayerId)
                .map_err(|e| format!("bad seat in {s:?}: {e}"))
        };
        let seats = match rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            Some(list) => list.split(',').map(seat).collect::<Result<Vec<_>, _>>()?,
            None => vec![seat(rest)?],
        };
        Ok(if except {
            LogTag::Except(seats)
        } else {
            LogTag::Only(seats)
        })
    }
}

fn secret_name(secret: Secret) -> &'static str {
    match secret {
        Secret::DevCard => "dev_card",
        Secret::Resource => "resource",
    }
}

fn parse_secret(s: &str) -> Result<Secret, String> {
    match s {
        "dev_card" => Ok(Secret::DevCard),
        "resource" => Ok(Secret::Resource),
        _ => Err(format!("bad secret {s:?}")),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub tag: LogTag,
    pub event: Event,
    /// Set on both the exact entry and its redacted variant.
    pub secret: Option<Secret>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    /// One entry for the event, plus one for its redacted variant if it has one.
    pub fn record(&mut self, scoped: &ScopedEvent) {
        let (tag, outside) = LogTag::for_audience(&scoped.audience);
        self.entries.push(LogEntry {
            tag,
            event: scoped.event.clone(),
            secret: scoped.secret,
        });
        if let Some(redacted) = &scoped.redacted {
            self.entries.push(LogEntry {
                tag: outside,
                event: redacted.clone(),
                secret: scoped.secret,
            });
        }
    }

    pub fn record_all(&mut self, events: &[ScopedEvent]) {
        for e in events {
            self.record(e);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to(&self, mut out: impl Write) -> Result<(), EventLogError> {
        for entry in &self.entries {
            let json = serde_json::to_string(&entry.event)?;
            match entry.secret {
                Some(secret) => writeln!(out, "{}#{}:{json}", entry.tag, secret_name(secret))?,
                None => writeln!(out, "{}:{json}", entry.tag)?,
            }
        }
        Ok(())
    }

    pub fn read_from(input: impl BufRead) -> Result<Self, EventLogError> {
        let mut entries = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let bad = |reason: String| EventLogError::BadLine {
                line: i + 1,
                reason,
            };
            let (tag, json) = line
                .split_once(':')
                .ok_or_else(|| bad("missing ':'".into()))?;
            let (tag, secret) = match tag.split_once('#') {
                Some((tag, secret)) => (tag, Some(parse_secret(secret).map_err(bad)?)),
                None => (tag, None),
            };
            let tag = tag.parse::<LogTag>().map_err(bad)?;
            let event = serde_json::from_str(json)?;
            entries.push(LogEntry { tag, event, secret });
        }
        Ok(Self { entries })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EventLogError> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        let file = std::fs::File::open(path)?;
        Self::read_from(std::io::BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::Secret;
    use settlers_protocol::ResourceSet;

    #[test]
    fn tags_print_and_parse() {
        for (tag, text) in [
            (LogTag::All, "all"),
            (LogTag::Only(vec![PlayerId(3)]), "p3"),
            (LogTag::Except(vec![PlayerId(3)]), "!p3"),
            (LogTag::Only(vec![PlayerId(3), PlayerId(1)]), "p[3, 1]"),
            (LogTag::Except(vec![PlayerId(3), PlayerId(1)]), "!p[3, 1]"),
        ] {
            assert_eq!(tag.to_string(), text);
            assert_eq!(text.parse::<LogTag>().unwrap(), tag);
        }
        assert!("q3".parse::<LogTag>().is_err());
    }

    #[test]
    fn redacted_variant_gets_its_own_entry() {
        let mut log = EventLog::default();
        log.record(
            &ScopedEvent::players(
                vec![PlayerId(3), PlayerId(1)],
                Event::RobberyResult {
                    perpetrator: PlayerId(3),
                    victim: PlayerId(1),
                    resources: ResourceSet::new(0, 0, 1, 0, 0),
                },
            )
            .hiding(Secret::Resource),
        );
        let tags: Vec<String> = log.entries().iter().map(|e| e.tag.to_string()).collect();
        assert_eq!(tags, vec!["p[3, 1]", "!p[3, 1]"]);
        assert!(log
            .entries()
            .iter()
            .all(|e| e.secret == Some(Secret::Resource)));
    }

    #[test]
    fn secrets_survive_save_and_load() {
        let mut log = EventLog::default();
        log.record(
            &ScopedEvent::one(
                PlayerId(2),
                Event::DevCardAction {
                    player: PlayerId(2),
                    action: settlers_protocol::DevCardAction::Draw,
                    card: settlers_protocol::DevCardKind::Knight,
                },
            )
            .hiding(Secret::DevCard),
        );
        let mut buf = Vec::new();
        log.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("p2#dev_card:{"));
        assert!(text.contains("\n!p2#dev_card:{"));

        let back = EventLog::read_from(buf.as_slice()).unwrap();
        assert_eq!(back, log);
        assert_eq!(back.entries()[0].secret, Some(Secret::DevCard));
        assert!(EventLog::read_from("p2#card:{}".as_bytes()).is_err());
    }

    #[test]
    fn save_then_load_is_identical() {
        let mut log = EventLog::default();
        log.record(&ScopedEvent::all(Event::Text {
            text: "a: b".into(),
        }));
        log.record(&ScopedEvent::one(
            PlayerId(0),
            Event::DiscardRequest {
                player: PlayerId(0),
                count: 4,
            },
        ));
        let mut buf = Vec::new();
        log.write_to(&mut buf).unwrap();
        let back = EventLog::read_from(buf.as_slice()).unwrap();
        assert_eq!(back, log);
    }
}
