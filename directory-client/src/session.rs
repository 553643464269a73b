//! Interactive session: list, stream, then look users up until `exit`

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::client::{format_detail, format_summary, DirectoryClient};
use crate::error::ClientError;

/// Input that ends the lookup loop
pub const EXIT_COMMAND: &str = "exit";

const PROMPT: &str = "Enter a user id (or 'exit' to quit):";
const USAGE: &str = "Please enter a whole number, or 'exit' to quit";

/// Run a full session against `client`
///
/// RPC failures are written to `output` as `"{Code:?} - {message}"` and the
/// session carries on. Only I/O errors on `input`/`output` end it early.
pub async fn run_session<R, W>(
    client: &mut DirectoryClient,
    input: R,
    output: &mut W,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(output, "Users:")?;
    match client.list_users().await {
        Ok(users) => {
            for user in &users {
                writeln!(output, "{}", format_summary(user))?;
            }
        }
        Err(err) => writeln!(output, "{}", err.report())?,
    }

    writeln!(output, "Streamed users:")?;
    print_stream(client, output).await?;

    let mut lines = input.lines();
    loop {
        writeln!(output, "{}", PROMPT)?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }

        let Ok(user_id) = line.parse::<i32>() else {
            writeln!(output, "{}", USAGE)?;
            continue;
        };

        match client.get_user_by_id(user_id).await {
            Ok(user) => writeln!(output, "{}", format_detail(&user))?,
            Err(err) => {
                tracing::debug!(user_id, error = %err, "Lookup failed");
                writeln!(output, "{}", err.report())?
            }
        }
    }

    writeln!(output, "End")?;
    output.flush()?;
    Ok(())
}

// The stream is dropped on every exit path, which cancels the call
async fn print_stream<W: Write>(
    client: &mut DirectoryClient,
    output: &mut W,
) -> Result<(), ClientError> {
    let mut stream = match client.stream_users().await {
        Ok(stream) => stream,
        Err(err) => {
            writeln!(output, "{}", err.report())?;
            return Ok(());
        }
    };

    loop {
        match stream.message().await {
            Ok(Some(user)) => {
                writeln!(output, "{}", format_summary(&user))?;
                output.flush()?;
            }
            Ok(None) => break,
            Err(status) => {
                writeln!(output, "{}", ClientError::from(status).report())?;
                break;
            }
        }
    }

    Ok(())
}
