use crate::prelude::{eprintln, *};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Serve requests from stdin until EOF, one line per message.
///
/// Requests are handled strictly one after another; the next line is not
/// read before the previous response has been flushed.
pub async fn run_stdio(global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Starting MCP server with stdio transport...");
        eprintln!();
    }

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            if global.verbose {
                eprintln!("Received: {trimmed}");
            }

            if let Some(response) = super::handle_request(trimmed, &global).await {
                let response_json = serde_json::to_string(&response)?;

                if global.verbose {
                    eprintln!("Sending: {response_json}");
                }

                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        line.clear();
    }

    log::debug!("stdin closed, stopping MCP server");
    Ok(())
}
