//! Line-oriented console transport: reads commands from stdin, dispatches
//! them to the session hub and prints replies.
use crate::command::{parse_command, suggestion, Command, HELP};
use crate::document::read_document;
use anyhow::Result;
use textease_actors::{Action, Reply, SessionHub, UserId};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub struct Console {
    hub: SessionHub,
    user: UserId,
}

enum Step {
    Continue,
    Quit,
}

impl Console {
    pub fn new(hub: SessionHub, user: UserId) -> Self {
        Self { hub, user }
    }

    /// Serve stdin until `/quit`, end of input or Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        stdout
            .write_all(b"TextEase is ready. Send some text, or /help for commands.\n")
            .await?;
        stdout.flush().await?;

        loop {
            let line = tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };

            if let Step::Quit = self.handle_line(&line, &mut stdout).await? {
                break;
            }
        }

        self.hub.end_session(self.user.clone()).await;
        tracing::info!(user = %self.user, "console closed");
        Ok(())
    }

    async fn handle_line<W: AsyncWrite + Unpin>(&self, line: &str, out: &mut W) -> Result<Step> {
        let action = match parse_command(line) {
            Command::Act(action) => action,
            Command::File(path) => match read_document(&path).await {
                Ok(text) => Action::SubmitDocument { text },
                Err(err) => {
                    write_block(out, &format!("Could not load the document: {err:#}")).await?;
                    return Ok(Step::Continue);
                }
            },
            Command::Help => {
                write_block(out, HELP).await?;
                return Ok(Step::Continue);
            }
            Command::Quit => return Ok(Step::Quit),
            Command::Usage(usage) => {
                write_block(out, &format!("Usage: {usage}")).await?;
                return Ok(Step::Continue);
            }
            Command::Unknown(input) => {
                write_block(out, &format!("Unknown command {input}. Try /help.")).await?;
                return Ok(Step::Continue);
            }
            Command::Blank => return Ok(Step::Continue),
        };

        let reply = self.hub.dispatch(self.user.clone(), action).await?;
        write_block(out, &render_reply(&reply)).await?;
        Ok(Step::Continue)
    }
}

pub fn render_reply(reply: &Reply) -> String {
    let mut text = reply.text();
    if !reply.actions.is_empty() {
        let next: Vec<String> = reply.actions.iter().map(suggestion).collect();
        text.push_str("\n\nNext: ");
        text.push_str(&next.join("  "));
    }
    text
}

async fn write_block<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n\n").await?;
    out.flush().await?;
    Ok(())
}
