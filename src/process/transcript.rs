/// Strip the Markdown fences a transcription model sometimes wraps around
/// its CSV answer, then trim surrounding whitespace.
///
/// Handles an opening line of ```` ``` ```` followed by an optional one-word
/// info string (```` ```csv ````, ```` ```text ````) and a closing ```` ``` ````.
/// Unfenced text only gets trimmed.
pub fn clean_transcript(text: &str) -> &str {
    split_transcript(text).1
}

/// Like [`clean_transcript`], also returning how many source lines precede
/// the cleaned body.
pub fn split_transcript(text: &str) -> (u64, &str) {
    let mut body = text.trim_end();
    let mut skipped = 0;

    let start = body.trim_start();
    skipped += newlines(&body[..body.len() - start.len()]);
    body = start;

    if let Some(rest) = body.strip_prefix("```") {
        // drop the info string along with the fence line
        body = match rest.find('\n') {
            Some(nl) if is_fence_info(&rest[..nl]) => {
                skipped += 1;
                &rest[nl + 1..]
            }
            None if is_fence_info(rest) => "",
            _ => rest,
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    let start = body.trim_start();
    skipped += newlines(&body[..body.len() - start.len()]);
    (skipped, start.trim_end())
}

/// An info string is a single word; anything with spaces or commas is data.
fn is_fence_info(info: &str) -> bool {
    let info = info.trim();
    !info.contains(|c: char| c.is_whitespace() || c == ',')
}

fn newlines(s: &str) -> u64 {
    s.matches('\n').count() as u64
}
