use anyhow::Result;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Context, Editor, Helper,
};
use shared::domain::FlagKey;

use crate::console::{AdminConsole, Command, Step};

const COMMANDS: [&str; 19] = [
    "help", "quit", "orgs", "next", "prev", "orgpage", "orgsize", "load", "refresh", "close",
    "show", "search", "toggle", "edit", "set", "page", "pagesize", "definitions", "exit",
];

/// Completes command words, and flag keys after `toggle`, `edit` and `set`.
struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let (start, word, candidates): (usize, &str, Vec<&str>) =
            match line.split_once(char::is_whitespace) {
                None => (0, line, COMMANDS.to_vec()),
                Some((command, rest)) if matches!(command, "toggle" | "edit" | "set") => {
                    if rest.contains(char::is_whitespace) {
                        return Ok((pos, Vec::new()));
                    }
                    let keys = FlagKey::ALL.iter().map(|key| key.as_str()).collect();
                    (line.len() - rest.len(), rest, keys)
                }
                Some(_) => return Ok((pos, Vec::new())),
            };
        let upper = word.to_ascii_uppercase();
        let pairs = candidates
            .into_iter()
            .filter(|candidate| candidate.starts_with(word) || candidate.starts_with(&upper))
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

pub async fn run(console: &mut AdminConsole) -> Result<()> {
    let mut editor: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(ReplHelper));

    println!("Feature Flags Admin. Type 'help' for commands.");
    if let Step::Output(text) = console.execute(Command::Orgs).await {
        println!("{text}");
    }

    loop {
        let line = match editor.readline("flags> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        let mut step = console.execute(command).await;
        // A cancelled prompt leaves the flag untouched.
        while let Step::Prompt { key, current } = step {
            step = match editor.readline_with_initial(
                &format!("New value for {key}: "),
                (current.as_str(), ""),
            ) {
                Ok(input) => console.submit_edit(key, &input).await,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    Step::Output("edit cancelled".to_string())
                }
                Err(err) => return Err(err.into()),
            };
        }
        match step {
            Step::Output(text) => println!("{text}"),
            Step::Quit => break,
            Step::Prompt { .. } => {}
        }
    }
    Ok(())
}
