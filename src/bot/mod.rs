//! Chat command handling
//!
//! Turns the text of an incoming chat message into a reply. The transport that
//! delivers messages and sends replies lives outside this module; the console
//! loop in `main` is one such transport.

pub mod menu;

pub use menu::{registered_commands, BotCommand, Menu, WeekView};

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, NaiveDate, TimeZone};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::refresh::{RefreshError, ScheduleService};
use crate::schedule::WeekParity;
use menu::{CURRENT_WEEK_BUTTON, NEXT_WEEK_BUTTON, NEXT_WEEK_MARKER, WEEKDAY_BUTTONS};

/// A parsed chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`: show the current week header and menu
    Start,
    /// `/help`: list the available commands
    Help,
    /// A weekday button, 0 = Monday
    Day { index: usize, view: WeekView },
    /// One of the week switch buttons
    ShowWeek(WeekView),
    /// Anything else, echoed back exactly as received
    Unknown(String),
}

impl Command {
    /// Parses the text of a chat message
    pub fn parse(raw: &str) -> Command {
        let text = raw.trim();
        match text {
            "/start" => return Command::Start,
            "/help" => return Command::Help,
            NEXT_WEEK_BUTTON => return Command::ShowWeek(WeekView::Next),
            CURRENT_WEEK_BUTTON => return Command::ShowWeek(WeekView::Current),
            _ => {}
        }

        let (day, view) = match text.strip_suffix(NEXT_WEEK_MARKER) {
            Some(day) => (day, WeekView::Next),
            None => (text, WeekView::Current),
        };
        match WEEKDAY_BUTTONS.iter().position(|name| *name == day) {
            Some(index) => Command::Day { index, view },
            None => Command::Unknown(raw.to_string()),
        }
    }

    /// Whether answering needs the cached schedule
    pub fn needs_schedule(&self) -> bool {
        matches!(self, Command::Day { .. })
    }
}

/// Text and optional menu sent back to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub menu: Option<Menu>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
        }
    }
}

/// Answers chat messages from the cached schedule
#[derive(Clone)]
pub struct Bot {
    service: Arc<ScheduleService>,
}

impl Bot {
    pub fn new(service: Arc<ScheduleService>) -> Self {
        Self { service }
    }

    /// Handles one message using the current local time
    pub async fn handle(&self, text: &str) -> Result<Reply, RefreshError> {
        self.handle_at(text, Local::now()).await
    }

    /// Handles one message as if received at `now`
    ///
    /// The schedule cache is refreshed first for every message. A failed
    /// refresh only fails the request when the reply needs the schedule.
    #[instrument(skip(self, now))]
    pub async fn handle_at<Tz: TimeZone>(
        &self,
        text: &str,
        now: DateTime<Tz>,
    ) -> Result<Reply, RefreshError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let command = Command::parse(text);
        debug!(?command, "Handling message");

        if let Err(e) = self.service.ensure_fresh().await {
            if command.needs_schedule() {
                return Err(e);
            }
            warn!(error = %e, "Schedule refresh failed");
        }

        let current = WeekParity::for_date(now.date_naive());
        let reply = match command {
            Command::Start => week_reply(WeekView::Current, &now),
            Command::ShowWeek(view) => week_reply(view, &now),
            Command::Help => Reply::text(help_text()),
            Command::Day { index, view } => {
                let rendered = self.service.day_schedule(index, view.parity(current))?;
                Reply::text(format!(
                    "Расписание на _{}_ {}",
                    WEEKDAY_BUTTONS[index], rendered
                ))
            }
            Command::Unknown(text) => Reply::text(text),
        };
        Ok(reply)
    }
}

/// Header and menu for a week view
///
/// Shows the timestamp, the parity of the week and its Monday to Sunday
/// range. The next week is the week containing the date seven days ahead.
pub fn week_reply<Tz: TimeZone>(view: WeekView, now: &DateTime<Tz>) -> Reply
where
    Tz::Offset: std::fmt::Display,
{
    let today = now.date_naive();
    let current = WeekParity::for_date(today);
    let parity = view.parity(current);

    let (caption, reference) = match view {
        WeekView::Current => ("Текущая неделя", today),
        WeekView::Next => ("Следующая неделя", today + ChronoDuration::days(7)),
    };
    let (start, end) = week_bounds(reference);

    let text = format!(
        "_{}_\n\n{}: *{}*\nНеделя: {} - {}\nВыберите день:",
        now.format("%d.%m.%Y %H:%M"),
        caption,
        parity.label(),
        start.format("%d.%m.%Y"),
        end.format("%d.%m.%Y"),
    );

    Reply {
        text,
        menu: Some(Menu::for_view(view)),
    }
}

/// Monday and Sunday of the week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date - ChronoDuration::days(i64::from(date.weekday().num_days_from_monday()));
    (start, start + ChronoDuration::days(6))
}

fn help_text() -> String {
    let mut text = String::from("Доступные команды:");
    for command in registered_commands() {
        text.push_str(&format!("\n/{} - {}", command.command, command.description));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ExpiringCache;
    use crate::refresh::RefreshConfig;
    use crate::schedule::RawDay;
    use crate::source::{ScheduleSource, SourceError};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct StaticSource(Option<Vec<RawDay>>);

    #[async_trait]
    impl ScheduleSource for StaticSource {
        async fn fetch_raw(&self) -> Result<Vec<RawDay>, SourceError> {
            self.0
                .clone()
                .ok_or_else(|| SourceError::Other("offline".to_string()))
        }
    }

    fn week() -> Vec<RawDay> {
        WEEKDAY_BUTTONS
            .iter()
            .chain(std::iter::once(&"Суббота"))
            .map(|name| {
                let value = if *name == "Вторник" {
                    json!({ "name": name, "n2": "Algebra", "z4": "Geometry" })
                } else {
                    json!({ "name": name })
                };
                match value {
                    Value::Object(map) => map,
                    _ => unreachable!(),
                }
            })
            .collect()
    }

    fn bot(records: Option<Vec<RawDay>>) -> Bot {
        let cache = ExpiringCache::new(Duration::from_secs(60), Duration::ZERO);
        let service = ScheduleService::new(
            cache,
            Arc::new(StaticSource(records)),
            RefreshConfig::default(),
        );
        Bot::new(Arc::new(service))
    }

    /// Wednesday 2024-01-10 14:05 UTC, ISO week 2 (numerator)
    fn numerator_wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse(" /help "), Command::Help);
        assert_eq!(
            Command::parse("Вторник"),
            Command::Day {
                index: 1,
                view: WeekView::Current
            }
        );
        assert_eq!(
            Command::parse("Пятница*"),
            Command::Day {
                index: 4,
                view: WeekView::Next
            }
        );
        assert_eq!(
            Command::parse("Следующая неделя"),
            Command::ShowWeek(WeekView::Next)
        );
        assert_eq!(
            Command::parse("Текущая неделя"),
            Command::ShowWeek(WeekView::Current)
        );
        assert_eq!(
            Command::parse("Суббота"),
            Command::Unknown("Суббота".to_string())
        );
    }

    #[test]
    fn test_every_menu_button_parses_to_a_command() {
        for view in [WeekView::Current, WeekView::Next] {
            for button in Menu::for_view(view).buttons() {
                assert!(
                    !matches!(Command::parse(button), Command::Unknown(_)),
                    "Button {} should be recognised",
                    button
                );
            }
        }
    }

    #[test]
    fn test_week_bounds() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let (start, end) = week_bounds(wednesday);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());

        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(week_bounds(monday).0, monday);
    }

    #[test]
    fn test_current_week_reply() {
        let reply = week_reply(WeekView::Current, &numerator_wednesday());

        assert!(reply.text.starts_with("_10.01.2024 14:05_"));
        assert!(reply.text.contains("Текущая неделя: *Числитель*"));
        assert!(reply.text.contains("Неделя: 08.01.2024 - 14.01.2024"));
        assert_eq!(reply.menu, Some(Menu::for_view(WeekView::Current)));
    }

    #[test]
    fn test_next_week_reply() {
        let reply = week_reply(WeekView::Next, &numerator_wednesday());

        assert!(reply.text.contains("Следующая неделя: *Знаменатель*"));
        assert!(reply.text.contains("Неделя: 15.01.2024 - 21.01.2024"));
        assert_eq!(reply.menu, Some(Menu::for_view(WeekView::Next)));
    }

    #[tokio::test]
    async fn test_day_button_renders_current_parity() {
        let bot = bot(Some(week()));

        let reply = bot
            .handle_at("Вторник", numerator_wednesday())
            .await
            .expect("Reply should succeed");

        assert!(reply.text.starts_with("Расписание на _Вторник_ "));
        assert!(reply.text.contains("*-* 2 пара 10:20 - 11:50\nAlgebra"));
        assert!(!reply.text.contains("Geometry"));
        assert!(reply.menu.is_none());
    }

    #[tokio::test]
    async fn test_starred_day_button_renders_other_parity() {
        let bot = bot(Some(week()));

        let reply = bot
            .handle_at("Вторник*", numerator_wednesday())
            .await
            .expect("Reply should succeed");

        assert!(reply.text.contains("*-* 4 пара 14:00 - 15:30\nGeometry"));
        assert!(!reply.text.contains("Algebra"));
    }

    #[tokio::test]
    async fn test_day_request_fails_when_source_is_down() {
        let bot = bot(None);

        let err = bot
            .handle_at("Понедельник", numerator_wednesday())
            .await
            .unwrap_err();

        assert!(matches!(err, RefreshError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_start_works_when_source_is_down() {
        let bot = bot(None);

        let reply = bot
            .handle_at("/start", numerator_wednesday())
            .await
            .expect("Start does not need the schedule");

        assert!(reply.menu.is_some());
    }

    #[tokio::test]
    async fn test_help_and_unknown_text() {
        let bot = bot(Some(week()));

        let help = bot.handle_at("/help", numerator_wednesday()).await.unwrap();
        assert!(help.text.contains("/start - Начало работы бота"));
        assert!(help.text.contains("/help"));

        let echo = bot.handle_at("привет", numerator_wednesday()).await.unwrap();
        assert_eq!(echo.text, "привет");
        assert!(echo.menu.is_none());
    }

    #[tokio::test]
    async fn test_unknown_text_is_echoed_verbatim() {
        let bot = bot(Some(week()));

        assert_eq!(
            Command::parse("  Привет, бот! "),
            Command::Unknown("  Привет, бот! ".to_string())
        );
        let echo = bot
            .handle_at("  Привет, бот! ", numerator_wednesday())
            .await
            .unwrap();
        assert_eq!(echo.text, "  Привет, бот! ");

        // Commands still match with surrounding whitespace
        assert_eq!(Command::parse(" /start "), Command::Start);
    }
}
