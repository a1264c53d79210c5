//! schedbot - weekly class schedule bot
//!
//! Fetches the group timetable from the university API, keeps it in an
//! in-memory expiring cache and answers chat commands with the schedule of a
//! requested day. The chat transport here is the console: one line on stdin is
//! one message, replies go to stdout.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use schedbot::bot::{self, registered_commands, Bot, Reply, WeekView};
use schedbot::cache::ExpiringCache;
use schedbot::cli::{parse_day_arg, Cli, Command, Settings};
use schedbot::refresh::ScheduleService;
use schedbot::schedule::WeekParity;
use schedbot::source::VlsuClient;
use schedbot::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env before parsing so its values act as environment defaults
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init_logging(cli.verbose)?;

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Failed to load .env file"),
    }

    let command = cli.command.clone().unwrap_or(Command::Chat);

    // Commands that need no schedule run before anything touches the network
    if let Command::Week { next } = command {
        print_reply(&bot::week_reply(view(next), &chrono::Local::now()));
        return Ok(());
    }

    let settings = Settings::from_cli(&cli);
    let service = Arc::new(build_service(&settings)?);

    match command {
        Command::Show { day, next } => {
            let day = parse_day_arg(&day)?;
            show_day(&service, day, next).await
        }
        _ => run_chat(Bot::new(service)).await,
    }
}

fn view(next: bool) -> WeekView {
    if next {
        WeekView::Next
    } else {
        WeekView::Current
    }
}

fn build_service(settings: &Settings) -> Result<ScheduleService, Box<dyn Error>> {
    let cache = ExpiringCache::new(settings.default_ttl, settings.sweep_interval);
    let source = VlsuClient::new(settings.request_timeout)?
        .with_base_url(settings.api_url.clone())
        .with_group_id(settings.group_id);

    info!(
        api_url = %settings.api_url,
        group_id = settings.group_id,
        schedule_ttl = ?settings.refresh.schedule_ttl,
        sweep_interval = ?settings.sweep_interval,
        "Schedule service configured"
    );

    Ok(ScheduleService::new(
        cache,
        Arc::new(source),
        settings.refresh.clone(),
    ))
}

/// Prints one day of the current (or next) week variant
async fn show_day(service: &ScheduleService, day: usize, next: bool) -> Result<(), Box<dyn Error>> {
    service.ensure_fresh().await?;

    let parity = view(next).parity(WeekParity::current());
    let day = service.day(day, parity)?;

    println!(
        "Расписание на _{}_ ({}) {}",
        day.name,
        parity.label(),
        day.render()
    );
    Ok(())
}

/// Reads messages from stdin and answers each in its own task
///
/// Replies are printed in the order the messages arrived. A message whose
/// handling fails gets no reply.
async fn run_chat(bot: Bot) -> Result<(), Box<dyn Error>> {
    let names: Vec<&str> = registered_commands().iter().map(|c| c.command).collect();
    info!(commands = ?names, "Bot ready, reading messages from stdin");

    let (tx, mut rx) = mpsc::channel::<JoinHandle<Option<Reply>>>(64);

    let printer = tokio::spawn(async move {
        while let Some(handle) = rx.recv().await {
            match handle.await {
                Ok(Some(reply)) => print_reply(&reply),
                Ok(None) => {}
                Err(e) => error!(error = %e, "Message task failed"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let bot = bot.clone();
        let handle = tokio::spawn(async move {
            match bot.handle(&line).await {
                Ok(reply) => Some(reply),
                Err(e) => {
                    error!(error = %e, kind = ?e.kind(), message = %line, "Failed to answer message");
                    None
                }
            }
        });

        if tx.send(handle).await.is_err() {
            break;
        }
    }

    drop(tx);
    printer.await?;
    Ok(())
}

fn print_reply(reply: &Reply) {
    println!("{}", reply.text);
    if let Some(menu) = &reply.menu {
        for row in &menu.rows {
            let buttons: Vec<String> = row.iter().map(|b| format!("[ {} ]", b)).collect();
            println!("{}", buttons.join(" "));
        }
    }
    println!();
}
