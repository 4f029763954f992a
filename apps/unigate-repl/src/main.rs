//! Interactive diagnostic console for a running gateway.
//!
//! Keeps an in-memory conversation, streams each turn from the gateway and
//! prints fragments as they arrive. `/raw` dumps the conversation as JSON;
//! EOF or interrupt exits. A standalone tool, not part of the gateway core.

use std::error::Error;
use std::io::{BufRead, Write};

use clap::Parser;
use futures_util::StreamExt;
use wreq::{Client, Method};

use unigate_protocol::{ChatMessage, ChatRequestBody, Role, SseParser, is_done};

#[derive(Parser)]
#[command(name = "unigate-repl")]
struct Cli {
    /// Base URL of a running gateway.
    #[arg(long, default_value = "http://127.0.0.1:8088")]
    gateway: String,
    #[arg(long, default_value = "echo-1")]
    model: String,
    /// Optional system prompt opening the conversation.
    #[arg(long)]
    system: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("unigate-repl failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let client = Client::builder().build()?;
    let url = format!("{}/v1/chat/completions", cli.gateway.trim_end_matches('/'));

    let mut conversation: Vec<ChatMessage> = Vec::new();
    if let Some(system) = &cli.system {
        conversation.push(ChatMessage::new(Role::System, system));
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/raw" {
            println!("{}", serde_json::to_string_pretty(&conversation)?);
            continue;
        }

        conversation.push(ChatMessage::new(Role::User, input));
        match stream_chat(&client, &url, &cli.model, &conversation).await {
            Ok(reply) => {
                println!();
                conversation.push(ChatMessage::new(Role::Assistant, reply));
            }
            Err(err) => {
                eprintln!("request failed: {err}");
                conversation.pop();
            }
        }
    }
    Ok(())
}

/// One streamed turn: POST the conversation, print fragments as they arrive,
/// return the assembled reply.
async fn stream_chat(
    client: &Client,
    url: &str,
    model: &str,
    conversation: &[ChatMessage],
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let body = ChatRequestBody {
        model: model.to_string(),
        messages: conversation.to_vec(),
        max_tokens: None,
        temperature: None,
        stream: Some(true),
    };
    let resp = client
        .request(Method::POST, url)
        .header("content-type", "application/json")
        .body(serde_json::to_vec(&body)?)
        .send()
        .await?;
    let status = resp.status().as_u16();
    if !(200..300).contains(&status) {
        let detail = resp.bytes().await.unwrap_or_default();
        return Err(format!(
            "gateway returned {status}: {}",
            String::from_utf8_lossy(&detail)
        )
        .into());
    }

    let mut stream = resp.bytes_stream();
    let mut parser = SseParser::new();
    let mut reply = String::new();
    while let Some(item) = stream.next().await {
        let chunk = item?;
        for data in parser.push_bytes(&chunk) {
            if is_done(&data) {
                return Ok(reply);
            }
            let value: serde_json::Value = match serde_json::from_str(&data) {
                Ok(value) => value,
                Err(_) => continue,
            };
            if let Some(error) = value.get("error") {
                return Err(format!("stream error: {error}").into());
            }
            if let Some(piece) = value
                .pointer("/choices/0/delta/content")
                .and_then(|v| v.as_str())
            {
                print!("{piece}");
                std::io::stdout().flush()?;
                reply.push_str(piece);
            }
        }
    }
    // Stream closed without [DONE]: aborted upstream; keep what arrived.
    Ok(reply)
}
