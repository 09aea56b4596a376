//! Percent-encoding for query string values (RFC 3986 unreserved set).

/// Percent-encode every byte of `input` outside `A-Z a-z 0-9 - . _ ~`.
pub fn encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Like [`encode`], but the result never exceeds `capacity - 1` bytes.
///
/// The cut is moved back to the start of an escape it would split, so the
/// output never ends in a partial `%XX` sequence.
pub fn encode_bounded(input: &str, capacity: usize) -> String {
    let mut out = encode(input);
    let max = capacity.saturating_sub(1);
    if out.len() <= max {
        return out;
    }

    // The encoded form is ASCII and `%` only ever starts an escape.
    let bytes = out.as_bytes();
    let mut cut = max;
    if cut >= 1 && bytes[cut - 1] == b'%' {
        cut -= 1;
    } else if cut >= 2 && bytes[cut - 2] == b'%' {
        cut -= 2;
    }
    out.truncate(cut);
    out
}
