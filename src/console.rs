use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::fmt::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::app::{App, AppMsg, AppOutput};
use crate::component::Controller;
use crate::detail::{song_notes, DetailMsg};
use crate::playlist::{ExportAction, ExportState, PlaylistMsg};
use crate::search::{SearchMsg, SearchPhase};
use crate::setlists::SetlistsMsg;

pub const HELP: &str = "\
commands:
  type <text>        edit the artist query (empty clears it)
  focus | close      show / hide the artist dropdown
  pick <n>           pick artist n from the dropdown
  search             search setlists again with the current filters
  month <1-12|->     year <yyyy|->     venue <text>     tour <text>
  open <n>           show setlist n
  toggle <pos>       include / exclude the song at that position
  public <on|off>    playlist visibility
  create             create the playlist
  view               open the created playlist
  whoami | logout    session
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(Action),
    WhoAmI,
    Help,
    Quit,
}

/// Console commands that become app messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Type(String),
    Focus,
    Close,
    Pick(usize),
    Search,
    Month(Option<u32>),
    Year(Option<i32>),
    Venue(String),
    Tour(String),
    Open(usize),
    Toggle(u32),
    Public(bool),
    Create,
    View,
    Logout,
}

impl From<Action> for AppMsg {
    fn from(cmd: Action) -> Self {
        match cmd {
            Action::Type(text) => AppMsg::Search(SearchMsg::QueryChanged(text)),
            Action::Focus => AppMsg::Search(SearchMsg::Focus),
            Action::Close => AppMsg::Search(SearchMsg::DismissDropdown),
            Action::Pick(n) => AppMsg::Search(SearchMsg::Pick(n)),
            Action::Search => AppMsg::Search(SearchMsg::Submit),
            Action::Month(m) => AppMsg::Search(SearchMsg::SetMonth(m)),
            Action::Year(y) => AppMsg::Search(SearchMsg::SetYear(y)),
            Action::Venue(v) => AppMsg::Search(SearchMsg::SetVenue(v)),
            Action::Tour(t) => AppMsg::Search(SearchMsg::SetTour(t)),
            Action::Open(n) => AppMsg::Setlists(SetlistsMsg::Choose(n)),
            Action::Toggle(pos) => AppMsg::Detail(DetailMsg::Toggle(pos)),
            Action::Public(on) => AppMsg::Playlist(PlaylistMsg::SetPublic(on)),
            Action::Create => AppMsg::CreatePlaylist,
            Action::View => AppMsg::Playlist(PlaylistMsg::View),
            Action::Logout => AppMsg::Logout,
        }
    }
}

/// Lists shown to the user are numbered from 1.
fn index(arg: &str) -> Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("expected a number from 1, got {arg:?}")),
    }
}

fn optional<T: std::str::FromStr>(arg: &str) -> Result<Option<T>, String> {
    match arg.trim() {
        "" | "-" => Ok(None),
        value => value
            .parse()
            .map(Some)
            .map_err(|_| format!("can't read {value:?}")),
    }
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (word, rest) = line.trim_start().split_once(' ').unwrap_or((line.trim(), ""));
    let cmd = match word {
        "type" => Action::Type(rest.to_string()),
        "focus" => Action::Focus,
        "close" => Action::Close,
        "pick" => Action::Pick(index(rest)?),
        "search" => Action::Search,
        "month" => Action::Month(optional(rest)?),
        "year" => Action::Year(optional(rest)?),
        "venue" => Action::Venue(rest.trim().to_string()),
        "tour" => Action::Tour(rest.trim().to_string()),
        "open" => Action::Open(index(rest)?),
        "toggle" => Action::Toggle(
            rest.trim()
                .parse()
                .map_err(|_| format!("expected a song position, got {rest:?}"))?,
        ),
        "public" => match rest.trim() {
            "on" | "yes" | "true" => Action::Public(true),
            "off" | "no" | "false" => Action::Public(false),
            other => return Err(format!("expected on/off, got {other:?}")),
        },
        "create" => Action::Create,
        "view" => Action::View,
        "logout" => Action::Logout,
        "whoami" => return Ok(Command::WhoAmI),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "" => return Err(String::new()),
        other => return Err(format!("unknown command {other:?}, try help")),
    };
    Ok(Command::Send(cmd))
}

pub fn render(app: &App, today: NaiveDate) -> String {
    let mut out = String::new();
    let search = app.search();

    let filters = search.filters();
    let _ = writeln!(
        out,
        "artist: {:?}  [month {} | year {} | venue {:?} | tour {:?}]",
        search.query(),
        filters.month.map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
        filters.year.map(|y| y.to_string()).unwrap_or_else(|| "-".into()),
        filters.venue,
        filters.tour,
    );
    match search.phase() {
        SearchPhase::Searching => {
            let _ = writeln!(out, "  searching…");
        }
        SearchPhase::ResultsShown if search.results().is_empty() => {
            let _ = writeln!(out, "  no artists found");
        }
        _ => {}
    }
    if search.dropdown_visible() {
        for (i, artist) in search.results().iter().enumerate() {
            match &artist.disambiguation {
                Some(note) => {
                    let _ = writeln!(out, "  {:>2}. {} ({note})", i + 1, artist.name);
                }
                None => {
                    let _ = writeln!(out, "  {:>2}. {}", i + 1, artist.name);
                }
            }
        }
    }

    let setlists = app.setlists();
    if let Some(selection) = setlists.artist() {
        let _ = writeln!(out, "\n{} – Setlists", selection.artist.name);
        if setlists.is_loading() {
            let _ = writeln!(out, "  loading…");
        }
        if let Some(error) = setlists.error() {
            let _ = writeln!(out, "  {error}");
        }
        for (i, row) in setlists.rows(today).iter().enumerate() {
            let marker = if row.chosen { '>' } else { ' ' };
            let mut line = format!("{marker}{:>3}. {}", i + 1, row.heading);
            if let Some(tour) = &row.tour {
                let _ = write!(line, " · {tour}");
            }
            if !row.date.is_empty() {
                let _ = write!(line, " · {}", row.date);
            }
            if row.is_future {
                line.push_str(" (upcoming)");
            }
            if let Some(songs) = &row.songs {
                let _ = write!(line, " · {songs}");
            }
            let _ = writeln!(out, "{line}");
        }
    }

    let detail = app.detail();
    if let Some(title) = detail.title() {
        let _ = writeln!(out, "\n{title}");
        if detail.is_loading() {
            let _ = writeln!(out, "  loading…");
        }
        if let Some(error) = detail.error() {
            let _ = writeln!(out, "  {error}");
        }
        let selection = detail.selection();
        for song in selection.songs() {
            let check = if selection.is_selected(song.position) { "[x]" } else { "[ ]" };
            let notes = song_notes(song);
            if notes.is_empty() {
                let _ = writeln!(out, "  {check} {:>2}. {}", song.position, song.name);
            } else {
                let _ = writeln!(
                    out,
                    "  {check} {:>2}. {} – {}",
                    song.position,
                    song.name,
                    notes.join(", ")
                );
            }
        }
        if !selection.is_empty() {
            let export = app.export();
            let action = match export.action() {
                ExportAction::Create => "create".to_string(),
                ExportAction::Busy => "creating…".to_string(),
                ExportAction::View(url) => format!("view {url}"),
                ExportAction::Retry => "retry with create".to_string(),
            };
            let _ = writeln!(
                out,
                "  {}/{} selected · {} · {action}",
                selection.selected_count(),
                selection.total(),
                if export.is_public() { "public" } else { "private" },
            );
            if let ExportState::Failed(message) = export.state() {
                let _ = writeln!(out, "  {message}");
            }
        }
    }
    out
}

fn handle_output(app: &mut Controller<App>, output: AppOutput) -> Option<String> {
    match output {
        // The entry echoes programmatic edits like a text widget would.
        AppOutput::SearchText(text) => {
            app.emit(AppMsg::Search(SearchMsg::QueryChanged(text)));
            None
        }
        AppOutput::Notice(message) => Some(message),
    }
}

/// Handles queued messages and applies the outputs they produce until both
/// are empty, so text echoes land before the next command is read. Returns
/// the notices to show.
pub fn apply_pending(
    app: &mut Controller<App>,
    outputs: &mut mpsc::UnboundedReceiver<AppOutput>,
) -> Vec<String> {
    let mut notices = Vec::new();
    loop {
        app.process_pending();
        let mut applied = false;
        while let Ok(output) = outputs.try_recv() {
            applied = true;
            notices.extend(handle_output(app, output));
        }
        if !applied {
            return notices;
        }
    }
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(
    mut app: Controller<App>,
    mut outputs: mpsc::UnboundedReceiver<AppOutput>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = String::new();
    println!("{HELP}");

    loop {
        tokio::select! {
            biased;

            Some(output) = outputs.recv() => {
                if let Some(message) = handle_output(&mut app, output) {
                    println!("» {message}");
                }
            }
            _ = app.next() => {}
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    Ok(Command::Send(cmd)) => app.emit(cmd.into()),
                    Ok(Command::WhoAmI) => match app.model().session().current() {
                        Some(session) => println!("logged in as {}", session.display_name()),
                        None => println!("not logged in"),
                    },
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Quit) => break,
                    Err(message) if message.is_empty() => {}
                    Err(message) => println!("{message}"),
                }
            }
        }

        for message in apply_pending(&mut app, &mut outputs) {
            println!("» {message}");
        }
        let view = render(app.model(), Local::now().date_naive());
        if view != shown {
            println!("{view}");
            shown = view;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_edits_verbatim() {
        assert_eq!(
            parse("type the national\n"),
            Ok(Command::Send(Action::Type("the national".into())))
        );
        assert_eq!(parse("type"), Ok(Command::Send(Action::Type(String::new()))));
    }

    #[test]
    fn numbers_are_one_based() {
        assert_eq!(parse("pick 1"), Ok(Command::Send(Action::Pick(0))));
        assert_eq!(parse("open 3"), Ok(Command::Send(Action::Open(2))));
        assert!(parse("pick 0").is_err());
    }

    #[test]
    fn filters_can_be_unset() {
        assert_eq!(parse("month -"), Ok(Command::Send(Action::Month(None))));
        assert_eq!(parse("year 2019"), Ok(Command::Send(Action::Year(Some(2019)))));
        assert!(parse("year nineteen").is_err());
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert!(parse("dance").unwrap_err().contains("unknown command"));
        assert_eq!(parse("   "), Err(String::new()));
    }
}
