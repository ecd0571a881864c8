use std::io::{self, BufRead, Write};

use super::LlmError;

/// Drain a streaming response line-by-line into one string.
///
/// `parse_line` extracts the text piece from one wire line (or `None` for
/// keep-alives and terminators). Pieces are echoed to stdout as they arrive
/// when `echo` is set, so the user watches the message grow, but the caller
/// only receives the fully accumulated text.
pub fn drain_stream<R, F>(reader: R, mut parse_line: F, echo: bool) -> Result<String, LlmError>
where
    R: BufRead,
    F: FnMut(&str) -> Result<Option<String>, LlmError>,
{
    let mut out = String::new();
    let mut stdout = io::stdout();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(piece) = parse_line(line)? {
            out.push_str(&piece);
            if echo {
                print!("{piece}");
                stdout.flush()?;
            }
        }
    }

    if echo && !out.is_empty() {
        println!();
    }

    Ok(out)
}
