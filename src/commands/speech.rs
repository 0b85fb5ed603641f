//! `drivekit say` - local speech synthesis.

use anyhow::{Context, Result};

use crate::api::{self, SpeechClient};
use crate::cli::SayArgs;
use crate::config::Settings;
use crate::error::Error;

pub async fn say(settings: &Settings, args: SayArgs) -> Result<()> {
    let base_url = args
        .engine
        .unwrap_or_else(|| settings.speech_url.clone());
    let client = SpeechClient::new(api::http_client()?, base_url);

    if args.list_speakers {
        return list_speakers(&client).await;
    }

    let text = args
        .text
        .ok_or_else(|| Error::Config("no text given - pass the text to synthesize".to_string()))?;

    println!("Synthesizing {} characters (speaker {})...", text.chars().count(), args.speaker);
    let wav = client.synthesize(&text, args.speaker).await?;

    std::fs::write(&args.out, &wav)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    println!("Wrote {} bytes to {}", wav.len(), args.out.display());
    Ok(())
}

async fn list_speakers(client: &SpeechClient) -> Result<()> {
    let speakers = client.speakers().await?;
    if speakers.is_empty() {
        println!("The engine reports no installed voices.");
        return Ok(());
    }
    for speaker in &speakers {
        println!("{}", speaker.name);
        for style in &speaker.styles {
            println!("  {:>4}  {}", style.id, style.name);
        }
    }
    Ok(())
}
