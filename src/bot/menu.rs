//! Reply menus and the registered command list
//!
//! Menus are built on demand from the selected week view; nothing here is
//! global or mutable.

use serde::Serialize;

use crate::schedule::WeekParity;

/// Weekday buttons, Monday first
pub const WEEKDAY_BUTTONS: [&str; 5] = ["Понедельник", "Вторник", "Среда", "Четверг", "Пятница"];

/// Suffix marking a weekday button of the next week
pub const NEXT_WEEK_MARKER: char = '*';

/// Switches the menu to the next week
pub const NEXT_WEEK_BUTTON: &str = "Следующая неделя";

/// Switches the menu back to the current week
pub const CURRENT_WEEK_BUTTON: &str = "Текущая неделя";

/// Which week a menu or reply refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekView {
    Current,
    Next,
}

impl WeekView {
    /// Parity shown for this view, given the parity of the current week
    pub fn parity(self, current: WeekParity) -> WeekParity {
        match self {
            WeekView::Current => current,
            WeekView::Next => current.other(),
        }
    }

    /// The view the switch button leads to
    pub fn toggled(self) -> Self {
        match self {
            WeekView::Current => WeekView::Next,
            WeekView::Next => WeekView::Current,
        }
    }
}

/// A reply keyboard: rows of button labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub rows: Vec<Vec<String>>,
}

impl Menu {
    /// Builds the weekday menu for a week view
    ///
    /// Two buttons per row, with the week switch button last.
    pub fn for_view(view: WeekView) -> Self {
        let mut labels: Vec<String> = WEEKDAY_BUTTONS
            .iter()
            .map(|day| day_button(day, view))
            .collect();
        labels.push(switch_button(view.toggled()).to_string());

        Self {
            rows: labels.chunks(2).map(|row| row.to_vec()).collect(),
        }
    }

    /// Iterates over all button labels, row by row
    pub fn buttons(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Label of a weekday button in the given view
pub fn day_button(day: &str, view: WeekView) -> String {
    match view {
        WeekView::Current => day.to_string(),
        WeekView::Next => format!("{}{}", day, NEXT_WEEK_MARKER),
    }
}

/// Label of the button that switches to `target`
pub fn switch_button(target: WeekView) -> &'static str {
    match target {
        WeekView::Current => CURRENT_WEEK_BUTTON,
        WeekView::Next => NEXT_WEEK_BUTTON,
    }
}

/// A slash command announced to the chat platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BotCommand {
    pub command: &'static str,
    pub description: &'static str,
}

/// Commands the bot registers with the chat platform
pub fn registered_commands() -> &'static [BotCommand] {
    &[
        BotCommand {
            command: "start",
            description: "Начало работы бота",
        },
        BotCommand {
            command: "help",
            description: "Показать справочное сообщение",
        },
    ]
}
