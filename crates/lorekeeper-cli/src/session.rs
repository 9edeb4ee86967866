//! Interactive chat session: streamed replies printed as they arrive, then
//! highlight announcements for the tokens the reply mentioned.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use cliclack::input;
use console::style;

use lorekeeper::assistant::Assistant;
use lorekeeper::highlight::Highlighter;
use lorekeeper::session::SessionState;
use lorekeeper::settings::Settings;

use crate::canvas::ConsoleCanvas;
use crate::scene::Stage;

pub async fn run(settings: Settings, stage: Stage) -> Result<()> {
    println!(
        "lorekeeper · {} · model {} {}",
        settings.backend_base(),
        settings.model,
        style("- type \"exit\" to end the session").dim()
    );
    if stage.tokens.is_empty() {
        println!(
            "{}",
            style("no scene file loaded; replies will not highlight tokens").dim()
        );
    }
    println!();

    let assistant = Assistant::new(settings)?;
    let highlighter = Highlighter::new(Arc::new(ConsoleCanvas::new()));
    let mut state = SessionState::new();

    loop {
        let prompt: String = input("Message:").placeholder("").interact()?;
        if prompt.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        // print the reply incrementally: each update carries the content so
        // far, so only the unseen suffix goes to the terminal
        let mut printed = 0;
        let result = assistant
            .send(&mut state, &prompt, stage.context(), None, |message| {
                let content = &message.content;
                if content.len() > printed {
                    print!("{}", &content[printed..]);
                    let _ = std::io::stdout().flush();
                    printed = content.len();
                }
            })
            .await;
        println!();

        match result {
            Ok(hints) => {
                let reply = state
                    .messages()
                    .last()
                    .map(|message| message.content.clone())
                    .unwrap_or_default();
                let emphasized =
                    highlighter.highlight(&stage.tokens, &hints, &reply, &stage.user);
                for id in &emphasized {
                    let name = stage.token_name(id).unwrap_or(id.as_str());
                    println!("{}", style(format!("  ✦ highlighted {name}")).yellow());
                }
            }
            Err(err) => {
                // the log already carries the error text; just make it loud
                println!("{}", style(format!("  ✗ {err}")).red());
            }
        }
        println!();
    }

    Ok(())
}
