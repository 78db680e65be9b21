use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use evsync::{
    app::{EventEditSession, EventListController, NewEventSession, SubmitError},
    calendar::{format_for_input, Event},
    storage::{Config, SessionError, StoredSession, TokenStorage},
    sync::{
        validate_account, ActionOutcome, AuthApi, Credentials, HttpAuthClient, HttpEventClient,
        LoginOutcome,
    },
};

#[derive(Debug, Parser)]
#[command(name = "evsync", version, about = "View and edit events on a shared calendar service")]
pub struct Cli {
    /// Override the configured server base URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session token
    Login {
        #[arg(long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show events active on a day (UTC, defaults to today)
    List {
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Create an event; timestamps are YYYY-MM-DDTHH:MM (UTC) or RFC 3339
    Create {
        #[arg(long)]
        begin: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        description: String,
    },
    /// Edit an existing event; omitted fields keep their current value
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        begin: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an event
    Delete {
        #[arg(long)]
        id: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_or_create().context("loading configuration")?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }
    let storage = TokenStorage::new(config.session.token_cache.clone());

    match cli.command {
        Command::Login { username, password } => {
            let password = password_or_prompt(password)?;
            check_account(&username, &password)?;
            let auth = HttpAuthClient::new(&config.server)?;
            match auth.login(&username, &password).await {
                LoginOutcome::LoggedIn(credentials) => {
                    storage.save(&StoredSession::new(&credentials, &username))?;
                    println!("Logged in as {}.", username);
                    Ok(())
                }
                LoginOutcome::Failed(outcome) => bail!(outcome.message),
            }
        }
        Command::Register { username, password } => {
            let password = password_or_prompt(password)?;
            check_account(&username, &password)?;
            let auth = HttpAuthClient::new(&config.server)?;
            let outcome = auth.register(&username, &password).await;
            report(&outcome)
        }
        Command::Logout => {
            storage.clear()?;
            println!("Logged out.");
            Ok(())
        }
        command => {
            let credentials = load_credentials(&storage)?;
            let api = HttpEventClient::new(&config.server)?;
            let result = run_event_command(command, &api, &credentials).await;
            if let Err(e) = &result
                && e.is::<SessionExpired>()
            {
                storage.clear()?;
            }
            result
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("session expired, run `evsync login` again")]
struct SessionExpired;

async fn run_event_command(
    command: Command,
    api: &HttpEventClient,
    credentials: &Credentials,
) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();

    match command {
        Command::List { day } => {
            let mut list = EventListController::new(day.unwrap_or(today));
            sync_list(&mut list, api, credentials).await?;
            print_agenda(&list);
            Ok(())
        }
        Command::Create { begin, end, description } => {
            let mut list = EventListController::new(today);
            let mut session = NewEventSession::new();
            session.toggle();
            let form = session.form_mut();
            form.begin = begin;
            form.end = end;
            form.description = description;

            let outcome = session
                .submit(&mut list, api, credentials)
                .await
                .map_err(submit_failure)?;
            report(&outcome)?;
            if let Ok(payload) = session.form().validate() {
                list.select_day(payload.begin.date_naive());
            }
            sync_list(&mut list, api, credentials).await?;
            print_agenda(&list);
            Ok(())
        }
        Command::Update { id, begin, end, description } => {
            let mut list = EventListController::new(today);
            sync_list(&mut list, api, credentials).await?;
            let event = list
                .find_event(&id)
                .cloned()
                .ok_or_else(|| anyhow!("no event with id {} is visible to you", id))?;

            let mut session = EventEditSession::new(&event.id);
            session.edit(&event);
            if let Some(form) = session.form_mut() {
                if let Some(begin) = begin {
                    form.begin = begin;
                }
                if let Some(end) = end {
                    form.end = end;
                }
                if let Some(description) = description {
                    form.description = description;
                }
            }

            let outcome = session
                .submit(&mut list, api, credentials)
                .await
                .map_err(submit_failure)?;
            report(&outcome)?;
            list.select_day(event.begin.date_naive());
            sync_list(&mut list, api, credentials).await?;
            print_agenda(&list);
            Ok(())
        }
        Command::Delete { id } => {
            let mut list = EventListController::new(today);
            let outcome = list.delete(api, credentials, &id).await;
            report(&outcome)?;
            sync_list(&mut list, api, credentials).await?;
            print_agenda(&list);
            Ok(())
        }
        Command::Login { .. } | Command::Register { .. } | Command::Logout => {
            unreachable!("account commands are handled before loading credentials")
        }
    }
}

async fn sync_list(
    list: &mut EventListController,
    api: &HttpEventClient,
    credentials: &Credentials,
) -> anyhow::Result<()> {
    if let Some(outcome) = list.refresh_if_needed(api, credentials).await
        && !outcome.succeeded()
    {
        return report(&outcome);
    }
    Ok(())
}

fn submit_failure(err: SubmitError) -> anyhow::Error {
    match err {
        SubmitError::Invalid(errors) => {
            let fields = [
                ("begin", &errors.begin),
                ("end", &errors.end),
                ("description", &errors.description),
            ];
            let details: Vec<String> = fields
                .iter()
                .filter_map(|(name, error)| error.as_ref().map(|e| format!("{}: {}", name, e)))
                .collect();
            anyhow!("invalid event: {}", details.join("; "))
        }
        other => other.into(),
    }
}

fn check_account(username: &str, password: &str) -> anyhow::Result<()> {
    validate_account(username, password)
        .map_err(|errors| anyhow!("invalid credentials: {}", errors.summary()))
}

fn report(outcome: &ActionOutcome) -> anyhow::Result<()> {
    if outcome.succeeded() {
        println!("{}", outcome.message);
        Ok(())
    } else if outcome.requires_login() {
        eprintln!("{}", outcome.message);
        Err(SessionExpired.into())
    } else {
        bail!(outcome.message.clone())
    }
}

fn load_credentials(storage: &TokenStorage) -> anyhow::Result<Credentials> {
    match storage.load() {
        Ok(session) => Ok(session.credentials()),
        Err(SessionError::NotLoggedIn) => bail!("not logged in, run `evsync login` first"),
        Err(e) => Err(e.into()),
    }
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_agenda(list: &EventListController) {
    let events = list.visible_events();
    println!();
    println!("Events on {}", list.selected_day().format("%A, %B %d, %Y"));
    if events.is_empty() {
        println!("No events scheduled.");
    }
    for event in events {
        println!("- {}", agenda_line(event));
    }
}

fn agenda_line(event: &Event) -> String {
    format!(
        "{} -> {}  {} ({}) [{}]",
        format_for_input(event.begin),
        format_for_input(event.end),
        event.description,
        event.owner_name,
        event.id
    )
}
