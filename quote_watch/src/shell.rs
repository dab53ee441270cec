//! Terminal presentation: input parsing and view rendering.
//!
//! `render` is a pure function of the form value and the view state; the
//! `Screen` only decides whether the rendered text changed since last print.
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use crossbeam_channel::Sender;
use log::{debug, info};

use crate::error::{ClientError, Result};
use crate::event::AppEvent;
use crate::view::ViewState;

/// Title printed at the top of every frame.
pub const TITLE: &str = "Stock Price Checker";
/// Submit button caption.
pub const BUTTON_LABEL: &str = "Get Real-Time Price";

/// What the user asked for on one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Replace the form value.
    SetSymbol(String),
    /// Press the submit button.
    Submit,
    /// Leave the program.
    Quit,
}

/// Interpret one line of terminal input.
///
/// A non-empty line types a symbol, an empty line submits the form,
/// `:clear` empties the form and `:quit` / `:q` exits.
pub fn parse_input(line: &str) -> UserInput {
    match line.trim() {
        "" => UserInput::Submit,
        ":clear" => UserInput::SetSymbol(String::new()),
        ":quit" | ":q" => UserInput::Quit,
        _ => UserInput::SetSymbol(line.trim().to_string()),
    }
}

/// Whether the submit button is enabled.
pub fn submit_enabled(form: &str, view: &ViewState) -> bool {
    !view.loading && !form.trim().is_empty()
}

/// Render the whole screen for `form` and `view`.
pub fn render(form: &str, view: &ViewState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TITLE);
    let _ = writeln!(out, "Stock Symbol: {}", form);

    let caption = if view.loading { "loading..." } else { BUTTON_LABEL };
    let _ = write!(out, "[ {} ]", caption);
    if !submit_enabled(form, view) {
        out.push_str(" (disabled)");
    }
    out.push('\n');

    if let Some(error) = &view.error {
        let _ = writeln!(out, "{}", error);
    }
    if let Some(price) = view.visible_price() {
        let _ = writeln!(out, "Current Real-Time Price: ${}", price);
    }
    out
}

/// Prints frames to a writer, skipping frames identical to the previous one.
pub struct Screen<W: Write> {
    out: W,
    last: Option<String>,
}

impl<W: Write> Screen<W> {
    /// Screen printing to `out`.
    pub fn new(out: W) -> Self {
        Screen { out, last: None }
    }

    /// Print the frame if it differs from the last one. Returns whether it printed.
    pub fn refresh(&mut self, form: &str, view: &ViewState) -> Result<bool> {
        let frame = render(form, view);
        if self.last.as_deref() == Some(frame.as_str()) {
            return Ok(false);
        }
        writeln!(self.out, "{}", frame)?;
        self.out.flush()?;
        self.last = Some(frame);
        Ok(true)
    }
}

/// Blocking loop that turns input lines into `AppEvent::Input` events.
///
/// End of input is reported as `UserInput::Quit`.
pub fn read_input<R: BufRead>(reader: R, events: Sender<AppEvent>) -> Result<()> {
    for line in reader.lines() {
        let input = parse_input(&line?);
        debug!("Input: {:?}", input);
        let quit = input == UserInput::Quit;
        events
            .send(AppEvent::Input(input))
            .map_err(|e| ClientError::ChannelSend(e.to_string()))?;
        if quit {
            return Ok(());
        }
    }
    info!("End of input");
    events
        .send(AppEvent::Input(UserInput::Quit))
        .map_err(|e| ClientError::ChannelSend(e.to_string()))?;
    Ok(())
}

/// Convenience for `read_input` over the process stdin.
pub fn read_stdin(events: Sender<AppEvent>) -> Result<()> {
    read_input(io::stdin().lock(), events)
}
