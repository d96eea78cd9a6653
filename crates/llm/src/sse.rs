//! Server-Sent Events decoding for streamed completions.
//!
//! Network chunks do not align with event lines, so complete lines are
//! drained from a byte buffer and any trailing partial line waits for the
//! next chunk.

use futures::{StreamExt, future, stream};
use quill_common::{QuillError, Result};

use crate::client::CompletionStream;

/// Remove every complete line from `buffer` and return the `data:` payloads.
///
/// The `[DONE]` sentinel and non-data lines are dropped.
pub fn drain_data_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let Some(last_newline) = buffer.iter().rposition(|b| *b == b'\n') else {
        return Vec::new();
    };

    let complete: Vec<u8> = buffer.drain(..=last_newline).collect();
    String::from_utf8_lossy(&complete)
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').strip_prefix("data:"))
        .map(str::trim)
        .filter(|data| !data.is_empty() && *data != "[DONE]")
        .map(str::to_string)
        .collect()
}

/// Turn an SSE response body into a stream of content deltas.
///
/// `extract` maps one `data:` payload to its text delta, or `None` for
/// events that carry no content.
pub fn decode_stream<F>(
    response: reqwest::Response,
    provider: &'static str,
    extract: F,
) -> CompletionStream
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    let deltas = response
        .bytes_stream()
        .scan(Vec::new(), move |buffer, chunk| {
            let items: Vec<Result<String>> = match chunk {
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    drain_data_lines(buffer)
                        .iter()
                        .filter_map(|data| extract(data))
                        .filter(|delta| !delta.is_empty())
                        .map(Ok)
                        .collect()
                }
                Err(e) => vec![Err(QuillError::Provider(format!(
                    "{provider} stream interrupted: {e}"
                )))],
            };
            future::ready(Some(stream::iter(items)))
        })
        .flatten();

    Box::pin(deltas)
}
