//! Command-line parsing

use chrono::NaiveDateTime;
use courtside_core::{BookingId, BookingRequest, CourtId, UserId};

pub const USAGE: &str = "\
Usage: courtside <command> [args]

Commands:
  user add <email> <first> <last> [--admin]
  court add <name> [description]
  court list
  book <creator> <court> <YYYY-MM-DDTHH:MM> <blocks> <participant>...
  cancel <booking> <actor>
  roster <booking> <actor> <participant>...
  show <booking>
  list <YYYY-MM-DD> [court]
  purge <court>
  retire-court <court>

Ids are numeric. COURTSIDE_CONFIG overrides the config file location.";

/// A parsed invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    AddUser {
        email: String,
        first_name: String,
        last_name: String,
        admin: bool,
    },
    AddCourt {
        name: String,
        description: Option<String>,
    },
    ListCourts,
    Book {
        creator: UserId,
        request: BookingRequest,
    },
    Cancel {
        booking: BookingId,
        actor: UserId,
    },
    Roster {
        booking: BookingId,
        actor: UserId,
        participants: Vec<UserId>,
    },
    Show {
        booking: BookingId,
    },
    List {
        /// Checked by the core date parser so a bad date is a validation error
        date: String,
        court: Option<CourtId>,
    },
    Purge {
        court: CourtId,
    },
    RetireCourt {
        court: CourtId,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing argument <{0}>")]
    Missing(&'static str),
    #[error("invalid {what} '{value}'")]
    Invalid { what: &'static str, value: String },
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

struct Args<'a> {
    inner: std::slice::Iter<'a, String>,
}

impl<'a> Args<'a> {
    fn next(&mut self, name: &'static str) -> Result<&'a str, UsageError> {
        self.inner.next().map(String::as_str).ok_or(UsageError::Missing(name))
    }

    fn id(&mut self, name: &'static str) -> Result<i64, UsageError> {
        let raw = self.next(name)?;
        parse_id(name, raw)
    }

    fn rest(&mut self) -> Vec<&'a str> {
        self.inner.by_ref().map(String::as_str).collect()
    }

    fn finish(&mut self) -> Result<(), UsageError> {
        match self.inner.next() {
            Some(extra) => Err(UsageError::Unexpected(extra.clone())),
            None => Ok(()),
        }
    }
}

fn parse_id(what: &'static str, raw: &str) -> Result<i64, UsageError> {
    raw.parse().map_err(|_| UsageError::Invalid {
        what,
        value: raw.to_string(),
    })
}

fn parse_start(raw: &str) -> Result<NaiveDateTime, UsageError> {
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| UsageError::Invalid {
            what: "start",
            value: raw.to_string(),
        })
}

fn parse_participants(raw: Vec<&str>) -> Result<Vec<UserId>, UsageError> {
    raw.into_iter()
        .map(|id| parse_id("participant", id).map(UserId))
        .collect()
}

/// Parse arguments (program name excluded)
pub fn parse(args: &[String]) -> Result<Command, UsageError> {
    let mut args = Args { inner: args.iter() };
    let command = match args.inner.next().map(String::as_str) {
        None | Some("help") | Some("--help") | Some("-h") => return Ok(Command::Help),
        Some(command) => command,
    };

    let parsed = match command {
        "user" => match args.next("subcommand")? {
            "add" => {
                let email = args.next("email")?.to_string();
                let first_name = args.next("first")?.to_string();
                let last_name = args.next("last")?.to_string();
                let admin = match args.inner.next().map(String::as_str) {
                    None => false,
                    Some("--admin") => true,
                    Some(other) => return Err(UsageError::Unexpected(other.to_string())),
                };
                Command::AddUser {
                    email,
                    first_name,
                    last_name,
                    admin,
                }
            }
            other => return Err(UsageError::UnknownCommand(format!("user {other}"))),
        },
        "court" => match args.next("subcommand")? {
            "add" => Command::AddCourt {
                name: args.next("name")?.to_string(),
                description: args.inner.next().cloned(),
            },
            "list" => Command::ListCourts,
            other => return Err(UsageError::UnknownCommand(format!("court {other}"))),
        },
        "book" => {
            let creator = UserId(args.id("creator")?);
            let court_id = CourtId(args.id("court")?);
            let start = parse_start(args.next("start")?)?;
            let raw_blocks = args.next("blocks")?;
            let duration_blocks = raw_blocks.parse().map_err(|_| UsageError::Invalid {
                what: "blocks",
                value: raw_blocks.to_string(),
            })?;
            let participants = parse_participants(args.rest())?;
            Command::Book {
                creator,
                request: BookingRequest {
                    court_id,
                    start,
                    duration_blocks,
                    participants,
                },
            }
        }
        "cancel" => Command::Cancel {
            booking: BookingId(args.id("booking")?),
            actor: UserId(args.id("actor")?),
        },
        "roster" => Command::Roster {
            booking: BookingId(args.id("booking")?),
            actor: UserId(args.id("actor")?),
            participants: parse_participants(args.rest())?,
        },
        "show" => Command::Show {
            booking: BookingId(args.id("booking")?),
        },
        "list" => {
            let date = args.next("date")?.to_string();
            let court = match args.inner.next() {
                Some(raw) => Some(CourtId(parse_id("court", raw)?)),
                None => None,
            };
            Command::List { date, court }
        }
        "purge" => Command::Purge {
            court: CourtId(args.id("court")?),
        },
        "retire-court" => Command::RetireCourt {
            court: CourtId(args.id("court")?),
        },
        other => return Err(UsageError::UnknownCommand(other.to_string())),
    };

    args.finish()?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_book() {
        let command = parse(&argv("book 1 2 2026-10-20T10:00 2 3 4 5")).unwrap();
        match command {
            Command::Book { creator, request } => {
                assert_eq!(creator, UserId(1));
                assert_eq!(request.court_id, CourtId(2));
                assert_eq!(request.duration_blocks, 2);
                assert_eq!(request.participants, vec![UserId(3), UserId(4), UserId(5)]);
                assert_eq!(request.start.to_string(), "2026-10-20 10:00:00");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse(&argv("list 2026-10-20")).unwrap(),
            Command::List {
                date: "2026-10-20".into(),
                court: None
            }
        );
        assert_eq!(
            parse(&argv("list 2026-10-20 3")).unwrap(),
            Command::List {
                date: "2026-10-20".into(),
                court: Some(CourtId(3))
            }
        );
    }

    #[test]
    fn test_parse_user_add() {
        assert_eq!(
            parse(&argv("user add desk@example.com Front Desk --admin")).unwrap(),
            Command::AddUser {
                email: "desk@example.com".into(),
                first_name: "Front".into(),
                last_name: "Desk".into(),
                admin: true,
            }
        );
    }

    #[test]
    fn test_usage_errors() {
        assert_eq!(parse(&[]).unwrap(), Command::Help);
        assert_eq!(
            parse(&argv("cancel 4")),
            Err(UsageError::Missing("actor"))
        );
        assert_eq!(
            parse(&argv("show x")),
            Err(UsageError::Invalid {
                what: "booking",
                value: "x".into()
            })
        );
        assert_eq!(
            parse(&argv("purge 1 2")),
            Err(UsageError::Unexpected("2".into()))
        );
        assert_eq!(
            parse(&argv("serve")),
            Err(UsageError::UnknownCommand("serve".into()))
        );
        assert!(matches!(
            parse(&argv("book 1 2 tomorrow 2 3")),
            Err(UsageError::Invalid { what: "start", .. })
        ));
    }
}
