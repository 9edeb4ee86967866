//! One-shot panel actions: the ask box and the retrieval-index maintenance
//! commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cliclack::spinner;
use console::style;

use lorekeeper::assistant::Assistant;
use lorekeeper::client::{JournalEntry, RagClient};
use lorekeeper::highlight::Highlighter;
use lorekeeper::session::SessionState;
use lorekeeper::settings::Settings;

use crate::canvas::ConsoleCanvas;
use crate::scene::Stage;

/// One question, one answer. Plain questions go through the simpler
/// non-streaming endpoint; GM tool prompts run a full streaming exchange so
/// the tool tag reaches the backend and highlights come back.
pub async fn ask(
    settings: &Settings,
    stage: &Stage,
    prompt: &str,
    tool: Option<String>,
) -> Result<()> {
    if let Some(tool) = tool {
        return ask_with_tool(settings, stage, prompt, tool).await;
    }

    let client = RagClient::new(settings)?;
    let spin = spinner();
    spin.start("awaiting reply");
    let reply = client.chat(prompt, stage.scene.as_ref()).await;
    spin.stop("");

    match reply {
        Ok(text) => render_markdown(&text),
        Err(err) => println!("{}", style(format!("✗ {err}")).red()),
    }
    Ok(())
}

async fn ask_with_tool(
    settings: &Settings,
    stage: &Stage,
    prompt: &str,
    tool: String,
) -> Result<()> {
    let assistant = Assistant::new(settings.clone())?;
    let highlighter = Highlighter::new(Arc::new(ConsoleCanvas::new()));
    let mut state = SessionState::new();

    let hints = assistant
        .send(&mut state, prompt, stage.context(), Some(tool), |_| {})
        .await?;

    let reply = state
        .messages()
        .last()
        .map(|message| message.content.clone())
        .unwrap_or_default();
    render_markdown(&reply);

    for id in highlighter.highlight(&stage.tokens, &hints, &reply, &stage.user) {
        let name = stage.token_name(&id).unwrap_or(id.as_str());
        println!("{}", style(format!("  ✦ highlighted {name}")).yellow());
    }
    Ok(())
}

pub async fn models(settings: &Settings) -> Result<()> {
    let client = RagClient::new(settings)?;
    let models = client.models().await?;
    if models.is_empty() {
        println!("backend reports no models");
        return Ok(());
    }
    for model in models {
        println!("{model}");
    }
    Ok(())
}

pub async fn chunks(settings: &Settings) -> Result<()> {
    let client = RagClient::new(settings)?;
    let chunks = client.chunks().await?;
    if chunks.is_empty() {
        println!("retrieval index is empty");
        return Ok(());
    }
    for chunk in chunks {
        println!(
            "{} {}",
            style(format!("{:.3}", chunk.score)).dim(),
            serde_json::to_string(&chunk.payload)?
        );
    }
    Ok(())
}

pub async fn ingest(settings: &Settings, stage: &Stage, url: &str) -> Result<()> {
    let client = RagClient::new(settings)?;
    client.ingest_url(url, stage.scene_id()).await?;
    println!("ingested {url}");
    Ok(())
}

/// Post every .md/.txt file under `dir` as one journal document, the file
/// stem doubling as the document name.
pub async fn ingest_journals(settings: &Settings, stage: &Stage, dir: &Path) -> Result<()> {
    let client = RagClient::new(settings)?;
    let mut ingested = 0usize;

    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading journal dir {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_journal = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "md" || ext == "txt")
            .unwrap_or(false);
        if !is_journal {
            continue;
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading journal {}", path.display()))?;
        if text.trim().is_empty() {
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("journal")
            .to_string();
        client
            .ingest_journal(&JournalEntry {
                id: name.clone(),
                name,
                text,
                scene_id: stage.scene_id().map(str::to_owned),
            })
            .await?;
        ingested += 1;
    }

    if ingested == 0 {
        println!("no journal files found in {}", dir.display());
    } else {
        println!("ingested {ingested} journal(s)");
    }
    Ok(())
}

pub async fn clear_scene(settings: &Settings, stage: &Stage) -> Result<()> {
    let scene_id = stage
        .scene_id()
        .context("clear-scene needs a scene file with scene metadata")?;
    let client = RagClient::new(settings)?;
    client.clear_scene(scene_id).await?;
    println!("cleared scene memory for {scene_id}");
    Ok(())
}

fn render_markdown(content: &str) {
    let rendered = bat::PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print();
    if rendered.is_err() {
        println!("{content}");
    }
}
