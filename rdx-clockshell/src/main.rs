use anyhow::Result;
use blindclock::prelude::*;
use blindclock::events::forward_clock_events;
use blindclock::projector::LevelView;
use blindclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use chrono_tz::Tz;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_CONFIG_PATH: &str = "blindclock.toml";

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-".repeat(64).dimmed());
    println!("{}", version_string);
    println!("{}", "-".repeat(64).dimmed());
}

/// Spawns a task that prints clock events while `is_listening` is set.
fn spawn_event_listener(engine: &ClockEngine, is_listening: Arc<AtomicBool>) {
    let clock_rx = engine.subscribe_clock_events();
    tokio::spawn(forward_clock_events(clock_rx, move |event| {
        if is_listening.load(Ordering::Relaxed) {
            println!("\n<-- [CLOCK EVENT] {:?}\n>> ", event);
        }
    }));
}

/// Maps a shell command and its arguments to a tournament id and clock action.
fn parse_action(command: &str, args: &[&str]) -> Result<(TournamentId, ClockAction), String> {
    let id = args
        .first()
        .map(|id| TournamentId::from(*id))
        .ok_or_else(|| format!("Usage: {command} <TOURNAMENT>"))?;
    let action = match command {
        "start" => ClockAction::Start,
        "pause" => ClockAction::Pause,
        "resume" => ClockAction::Resume,
        "next" => ClockAction::NextLevel,
        "prev" => ClockAction::PreviousLevel,
        "final" => ClockAction::FinalTable,
        "end" => ClockAction::End,
        "level" => {
            let number = args
                .get(1)
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .ok_or_else(|| "Usage: level <TOURNAMENT> <NUMBER> (levels start at 1)".to_string())?;
            ClockAction::SetLevel { level: number - 1 }
        }
        other => return Err(format!("Unknown command: '{other}'. Type 'help'.")),
    };
    Ok((id, action))
}

/// Formats milliseconds as `mm:ss`, or `h:mm:ss` past an hour.
fn format_countdown(ms: u64) -> String {
    let total = ms / 1_000;
    let (hours, minutes, seconds) = (total / 3_600, (total % 3_600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

fn format_level(level: &LevelView) -> String {
    if level.blind.is_break {
        return format!("Level {} BREAK ({}m)", level.number, level.blind.duration_minutes);
    }
    let mut text = format!(
        "Level {} {}/{}",
        level.number, level.blind.small_blind, level.blind.big_blind
    );
    if level.blind.ante > 0 {
        text.push_str(&format!(" ante {}", level.blind.ante));
    }
    text.push_str(&format!(" ({}m)", level.blind.duration_minutes));
    text
}

fn render(payload: &DisplayPayload, timezone: Tz) {
    let summary = &payload.tournament;
    println!("{} [{}] {}", summary.name.bold(), summary.id, summary.status.to_string().cyan());
    match &payload.current_blind {
        Some(level) => println!(
            "  {}   {} left",
            format_level(level).green().bold(),
            format_countdown(payload.clock.time_remaining_ms).bold()
        ),
        None => println!("  {}", "No current level".dimmed()),
    }
    if let Some(next) = &payload.next_blind {
        println!("  next: {}", format_level(next).dimmed());
    }
    if let Some(started) = payload.clock.level_started_at {
        println!(
            "  level started {}",
            started.with_timezone(&timezone).format("%H:%M:%S %Z")
        );
    }
    if summary.players_remaining > 0 {
        println!(
            "  players {}/{}  avg stack {}",
            summary.players_remaining, summary.current_entries, summary.average_stack
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .init();

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = BlindClockConfig::load(Some(&config_path))?;
    let timezone = config.venue_timezone;

    let repository = Arc::new(InMemoryTournaments::from_records(config.tournaments.clone()));
    let engine = ClockEngine::with_store(repository, ClockStore::new(), config.event_capacity);
    let directory = StaticStaffDirectory::from_entries(&config.staff);
    let clock = SystemClock;

    let is_listening = Arc::new(AtomicBool::new(false));
    spawn_event_listener(&engine, is_listening.clone());
    info!("{} loaded {} tournament(s)", ENGINE_NAME, config.tournaments.len());

    let mut staff: Option<StaffMember> = None;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!("{} console ready. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting clockshell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some((command, rest)) = args.split_first() else {
            continue;
        };

        match *command {
            "login" => match rest.first().and_then(|token| directory.authenticate(token)) {
                Some(member) => {
                    println!("--> Logged in as {}.", member.staff_id.to_string().green());
                    staff = Some(member);
                }
                None => println!("Error: unknown token."),
            },
            "list" => match engine.tournaments().await {
                Ok(records) => {
                    println!("Tournaments:");
                    for record in records {
                        println!(
                            "  {:<24} {:<12} level {} of {}  ({})",
                            record.id.to_string(),
                            record.status.to_string(),
                            record.current_level + 1,
                            record.blind_structure.len(),
                            record.name
                        );
                    }
                }
                Err(e) => println!("Error: {e}"),
            },
            "show" => match rest.first() {
                Some(id) => match engine.display(&TournamentId::from(*id), clock.now()).await {
                    Ok(payload) => render(&payload, timezone),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: show <TOURNAMENT>"),
            },
            "events" => match rest.first() {
                Some(&"on") => {
                    is_listening.store(true, Ordering::Relaxed);
                    println!("--> Printing clock events.");
                }
                Some(&"off") => {
                    is_listening.store(false, Ordering::Relaxed);
                    println!("--> Stopped printing clock events.");
                }
                _ => println!("Usage: events on|off"),
            },
            "help" => {
                println!("Available commands:");
                println!("  login <TOKEN>          - Authenticates as venue staff.");
                println!("  list                   - Lists tournaments.");
                println!("  show <T>               - Shows the clock of tournament T.");
                println!("  start|pause|resume <T> - Starts, pauses or resumes the clock.");
                println!("  next|prev <T>          - Moves one level forward or back.");
                println!("  level <T> <N>          - Jumps to level N (1-based).");
                println!("  final <T>              - Moves to the final table.");
                println!("  end <T>                - Completes the tournament.");
                println!("  events on|off          - Toggles printing of clock events.");
                println!("  exit                   - Quits the shell.");
            }
            "exit" => break,
            _ => {
                let (id, action) = match parse_action(command, rest) {
                    Ok(parsed) => parsed,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                let Some(member) = &staff else {
                    println!("Error: 'login <TOKEN>' before changing a clock.");
                    continue;
                };
                match engine.tournament(&id).await {
                    Ok(record) if directory.may_operate(member, &record) => {}
                    Ok(_) => {
                        println!("Error: you are not staff at this venue.");
                        continue;
                    }
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                }
                match engine.apply(&id, action, clock.now()).await {
                    Ok(payload) => {
                        println!("--> Tournament {} successful.", action.name());
                        render(&payload, timezone);
                    }
                    Err(e) => println!("{} {e}", "Rejected:".red().bold()),
                }
            }
        }
    }

    Ok(())
}
