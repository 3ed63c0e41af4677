use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use brainstorm_application::{ChatOutcome, DiagramUseCase, StepOutcome};
use brainstorm_core::BrainstormError;
use brainstorm_core::element::{Element, find_shape};
use brainstorm_interaction::{OllamaGenerator, load_config};

const SESSION_ID: &str = "cli-session";
const COMMANDS: [&str; 5] = ["/plan", "/next", "/run", "/board", "/steps"];

/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Plan(&'a str),
    Next,
    Run,
    Board,
    Steps,
    Quit,
    Message(&'a str),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line == "quit" || line == "exit" {
            return Command::Quit;
        }
        if !line.starts_with('/') {
            return Command::Message(line);
        }

        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match name {
            "/plan" => Command::Plan(rest.trim()),
            "/next" => Command::Next,
            "/run" => Command::Run,
            "/board" => Command::Board,
            "/steps" => Command::Steps,
            other => Command::Unknown(other),
        }
    }
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_error(err: &BrainstormError) {
    match err {
        BrainstormError::StepFailed { step_index, .. } => {
            eprintln!("{}", format!("Step {} failed: {}", step_index + 1, err).red());
            eprintln!("{}", "Use /next to retry the same step.".bright_black());
        }
        BrainstormError::NoPlan => {
            eprintln!("{}", "No plan yet. Use /plan <request> first.".yellow());
        }
        other => eprintln!("{}", format!("Error: {}", other).red()),
    }
}

fn describe(element: &Element, board: &[Element]) -> Option<String> {
    let label_of = |id: &str| {
        find_shape(board, id)
            .map(|shape| shape.label.clone())
            .unwrap_or_else(|| id.to_string())
    };

    match element {
        Element::Shape(shape) => Some(format!(
            "[{}] {} at ({:.0}, {:.0})",
            shape.geometry.as_str(),
            shape.label,
            shape.x,
            shape.y
        )),
        Element::Connector(connector) => {
            let arrow = format!(
                "{} -> {}",
                label_of(&connector.start_ref),
                label_of(&connector.end_ref)
            );
            Some(match &connector.label {
                Some(label) => format!("{} ({})", arrow, label),
                None => arrow,
            })
        }
        Element::Text(text) if text.container_id.is_none() => Some(format!("\"{}\"", text.content)),
        Element::Text(_) => None,
    }
}

fn print_elements(elements: &[Element], board: &[Element]) {
    for line in elements.iter().filter_map(|e| describe(e, board)) {
        println!("  {}", line.yellow());
    }
}

fn print_reply(reply: &str) {
    for line in reply.lines() {
        println!("{}", line.bright_blue());
    }
}

async fn print_step(usecase: &DiagramUseCase, outcome: &StepOutcome) -> Result<()> {
    print_reply(&outcome.reply);
    let board = usecase.elements(SESSION_ID).await?;
    print_elements(&outcome.new_elements, &board);
    if outcome.plan_complete {
        println!("{}", "Plan complete.".bright_green());
    }
    Ok(())
}

async fn print_chat(usecase: &DiagramUseCase, outcome: &ChatOutcome) -> Result<()> {
    print_reply(&outcome.reply);
    let board = usecase.elements(SESSION_ID).await?;
    print_elements(&outcome.new_elements, &board);
    Ok(())
}

async fn print_steps(usecase: &DiagramUseCase) -> Result<()> {
    let (steps, current, _) = usecase.plan_status(SESSION_ID).await?;
    if steps.is_empty() {
        println!("{}", "No plan yet.".bright_black());
    }
    for (index, step) in steps.iter().enumerate() {
        let line = format!("{}. {}", index + 1, step);
        if index < current {
            println!("  {}", line.bright_black());
        } else if index == current {
            println!("  {}", line.bold());
        } else {
            println!("  {}", line);
        }
    }
    Ok(())
}

/// Executes one REPL command. Returns `false` when the REPL should exit.
async fn dispatch(usecase: &DiagramUseCase, command: Command<'_>) -> Result<bool> {
    match command {
        Command::Quit => return Ok(false),
        Command::Plan("") => println!("{}", "Usage: /plan <request>".yellow()),
        Command::Plan(request) => match usecase.request_plan(SESSION_ID, request).await {
            Ok(_) => print_steps(usecase).await?,
            Err(err) => print_error(&err),
        },
        Command::Next => match usecase.execute_next_step(SESSION_ID).await {
            Ok(outcome) => print_step(usecase, &outcome).await?,
            Err(err) => print_error(&err),
        },
        Command::Run => loop {
            match usecase.execute_next_step(SESSION_ID).await {
                Ok(outcome) => {
                    print_step(usecase, &outcome).await?;
                    if outcome.plan_complete {
                        break;
                    }
                }
                Err(err) => {
                    print_error(&err);
                    break;
                }
            }
        },
        Command::Board => {
            let board = usecase.elements(SESSION_ID).await?;
            if board.is_empty() {
                println!("{}", "The board is empty.".bright_black());
            }
            print_elements(&board, &board);
        }
        Command::Steps => print_steps(usecase).await?,
        Command::Message(text) => match usecase.handle_message(SESSION_ID, text, Vec::new()).await {
            Ok(outcome) => print_chat(usecase, &outcome).await?,
            Err(err) => print_error(&err),
        },
        Command::Unknown(name) => {
            println!("{}", format!("Unknown command: {}", name).bright_black())
        }
    }
    Ok(true)
}

/// The main entry point for the Brainstorm readline REPL.
///
/// Loads configuration, connects the HTTP generator, opens a single session
/// and drives it one command at a time.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config().context("Failed to load configuration")?;
    let generator = OllamaGenerator::new(&config.generator).context("Failed to create generator")?;
    tracing::info!("[Brainstorm] Using generator at {}", generator.endpoint());

    let usecase = DiagramUseCase::new(Arc::new(generator), &config);
    usecase.open_session(SESSION_ID).await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Brainstorm REPL ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/plan <request>' to plan a diagram, '/next' or '/run' to draw it.".bright_black()
    );
    println!(
        "{}",
        "Use '/board' and '/steps' to inspect, or 'quit' to exit.".bright_black()
    );
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if !dispatch(&usecase, Command::parse(trimmed)).await? {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    usecase.close_session(SESSION_ID).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/plan  Design Dropbox "), Command::Plan("Design Dropbox"));
        assert_eq!(Command::parse("/plan"), Command::Plan(""));
        assert_eq!(Command::parse("/next"), Command::Next);
        assert_eq!(Command::parse("/run"), Command::Run);
        assert_eq!(Command::parse("/board"), Command::Board);
        assert_eq!(Command::parse("/steps"), Command::Steps);
        assert_eq!(Command::parse(" exit "), Command::Quit);
        assert_eq!(Command::parse("/nope"), Command::Unknown("/nope"));
        assert_eq!(Command::parse("add a cache"), Command::Message("add a cache"));
    }
}
