//! Courtside - court booking from the command line
//!
//! Prints results as JSON on stdout. Failures go to stderr with an exit
//! code per error kind, so scripts can tell a taken slot from a typo.

use std::process::ExitCode;

use courtside_core::{
    parse_date, Actor, CourtDraft, ErrorKind, NewUser, NotFoundError, Result, UserId,
};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod state;

use cli::Command;
use state::AppState;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse(&args) {
        Ok(Command::Help) => {
            println!("{}", cli::USAGE);
            return ExitCode::SUCCESS;
        }
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}\n\n{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };

    let config = match state::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(exit_code(e.kind()));
        }
    };

    // Initialize logging; RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = AppState::new(config).and_then(|mut app| execute(&mut app, command));
    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            let report = json!({
                "kind": format!("{:?}", e.kind()),
                "retryable": e.kind().is_retryable(),
                "message": e.to_string(),
            });
            eprintln!("{report}");
            ExitCode::from(exit_code(e.kind()))
        }
    }
}

/// Process exit status for a failure kind
fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Persistence => 1,
        ErrorKind::Validation => 3,
        ErrorKind::NotFound => 4,
        ErrorKind::Authorization => 5,
        ErrorKind::Conflict => 6,
    }
}

/// Resolve the caller through the user store
fn resolve_actor(app: &AppState, user_id: UserId) -> Result<Actor> {
    match app.db.users().find_by_id(user_id)? {
        Some(user) => Ok(Actor::from(&user)),
        None => Err(NotFoundError::User {
            user_id,
            reason: "unknown actor",
        }
        .into()),
    }
}

/// Run one command, returning its JSON output
fn execute(app: &mut AppState, command: Command) -> Result<String> {
    let value = match command {
        Command::Help => json!({ "usage": cli::USAGE }),
        Command::AddUser {
            email,
            first_name,
            last_name,
            admin,
        } => {
            let mut user = NewUser::new(email, first_name, last_name);
            if admin {
                user = user.admin();
            }
            serde_json::to_value(app.db.users().create(&user)?)?
        }
        Command::AddCourt { name, description } => {
            let mut draft = CourtDraft::new(name);
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            serde_json::to_value(app.db.courts().create(&draft)?)?
        }
        Command::ListCourts => serde_json::to_value(app.db.courts().list()?)?,
        Command::Book { creator, request } => {
            serde_json::to_value(app.db.bookings().create_booking(creator, &request)?)?
        }
        Command::Cancel { booking, actor: actor_id } => {
            let actor = resolve_actor(app, actor_id)?;
            app.db.bookings().delete_booking(booking, &actor)?;
            json!({ "deleted": booking })
        }
        Command::Roster {
            booking,
            actor: actor_id,
            participants,
        } => {
            let actor = resolve_actor(app, actor_id)?;
            serde_json::to_value(app.db.bookings().replace_roster(booking, &actor, &participants)?)?
        }
        Command::Show { booking } => serde_json::to_value(app.db.bookings().get_booking(booking)?)?,
        Command::List { date, court } => {
            let date = parse_date(&date)?;
            serde_json::to_value(app.db.bookings().list_bookings(date, court)?)?
        }
        Command::Purge { court } => {
            let purged = app.db.bookings().purge_expired_bookings(court)?;
            json!({ "court_id": court, "purged": purged })
        }
        Command::RetireCourt { court } => {
            let purged = app.db.bookings().retire_court(court)?;
            json!({ "retired": court, "purged": purged })
        }
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use courtside_core::{Config, Error};

    use super::*;

    fn app(dir: &tempfile::TempDir) -> AppState {
        let mut config = Config::default();
        config.database.path = Some(dir.path().join("courtside.db"));
        AppState::new(config).unwrap()
    }

    fn run(app: &mut AppState, line: &str) -> Result<serde_json::Value> {
        let args: Vec<String> = line.split_whitespace().map(String::from).collect();
        let command = cli::parse(&args).unwrap();
        let output = execute(app, command)?;
        Ok(serde_json::from_str(&output)?)
    }

    #[test]
    fn test_book_show_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        run(&mut app, "user add ana@example.com Ana Diaz").unwrap();
        run(&mut app, "user add ben@example.com Ben Ruiz").unwrap();
        run(&mut app, "court add Central").unwrap();

        let booked = run(&mut app, "book 1 1 2026-10-20T10:00 2 2").unwrap();
        assert_eq!(booked["court_name"], "Central");
        assert_eq!(booked["participants"].as_array().unwrap().len(), 2);
        let id = booked["id"].as_i64().unwrap();

        let shown = run(&mut app, &format!("show {id}")).unwrap();
        assert_eq!(shown, booked);

        let listed = run(&mut app, "list 2026-10-20 1").unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let err = run(&mut app, &format!("cancel {id} 2")).unwrap_err();
        assert_eq!(exit_code(err.kind()), 5);

        run(&mut app, &format!("cancel {id} 1")).unwrap();
        let err = run(&mut app, &format!("show {id}")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_conflict_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        for who in ["ana", "ben", "cai", "dee"] {
            run(&mut app, &format!("user add {who}@example.com {who} Player")).unwrap();
        }
        run(&mut app, "court add Central").unwrap();
        run(&mut app, "book 1 1 2026-10-20T10:00 2 2").unwrap();

        let err = run(&mut app, "book 3 1 2026-10-20T10:30 1 4").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(exit_code(err.kind()), 6);
    }

    #[test]
    fn test_bad_date_is_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        let err = run(&mut app, "list 20/10/2026").unwrap_err();
        assert_eq!(exit_code(err.kind()), 3);
    }

    #[test]
    fn test_unknown_actor() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        let err = run(&mut app, "cancel 1 99").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
