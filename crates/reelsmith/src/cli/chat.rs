//! Line-oriented chat REPL.

use reelsmith::{ChatLog, ChatRole, ReelsmithConfig, ReelsmithResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// Read lines from stdin and print streamed replies until EOF or `/quit`.
pub async fn run_chat(config: &ReelsmithConfig) -> ReelsmithResult<()> {
    let session = config.chat_session(super::backend(config)?);
    for message in session.log().messages() {
        println!("{}", message.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read from stdin");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        let baseline = session.log().messages().len();
        let mut printed = Vec::new();
        let mut updates = session.subscribe();
        updates.borrow_and_update();

        let send = session.send_message(line);
        tokio::pin!(send);
        loop {
            tokio::select! {
                result = &mut send => {
                    result?;
                    break;
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let log = updates.borrow_and_update().clone();
                    print_replies(&log, baseline, &mut printed);
                }
            }
        }
        print_replies(&session.log(), baseline, &mut printed);
        println!();
    }
    Ok(())
}

/// Print the unseen part of every model message after the user's line.
fn print_replies(log: &ChatLog, baseline: usize, printed: &mut Vec<usize>) {
    let replies = log
        .messages()
        .iter()
        .skip(baseline)
        .filter(|message| message.role == ChatRole::Model);
    for (index, message) in replies.enumerate() {
        if index == printed.len() {
            if index > 0 {
                println!();
            }
            printed.push(0);
        }
        let seen = printed[index];
        print!("{}", message.text.get(seen..).unwrap_or_default());
        printed[index] = message.text.len().max(seen);
    }
    flush();
}

fn flush() {
    if let Err(e) = std::io::stdout().flush() {
        warn!(error = %e, "Failed to flush stdout");
    }
}
