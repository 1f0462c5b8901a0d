/// Delimiter pair bounding inline reasoning markup in streamed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningMarkers {
    pub open: String,
    pub close: String,
}

impl Default for ReasoningMarkers {
    fn default() -> Self {
        Self {
            open: "<think>".to_string(),
            close: "</think>".to_string(),
        }
    }
}

impl ReasoningMarkers {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Remove reasoning-delimited spans from the FULL accumulated text.
///
/// Callers must pass the entire accumulation, never the latest fragment: a
/// delimiter may straddle chunk boundaries, so only whole-buffer
/// reprocessing is correct. The returned string replaces (not extends) the
/// previously visible text.
///
/// Policy, in priority order:
/// 1) remove every complete `open...close` span (non-greedy)
/// 2) an unmatched trailing open marker hides everything after it
/// 3) an orphan close marker discards everything up to and including it
/// 4) trim surrounding blank lines
pub fn strip_reasoning(text: &str, markers: &ReasoningMarkers) -> String {
    let mut visible = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(&markers.open) {
        visible.push_str(&rest[..start]);
        let after_open = &rest[start + markers.open.len()..];
        match after_open.find(&markers.close) {
            Some(end) => rest = &after_open[end + markers.close.len()..],
            None => {
                // Open without close: content is provisionally hidden until
                // the close marker arrives in a later increment.
                rest = "";
            }
        }
    }
    visible.push_str(rest);

    // Recovered case: a close marker with no preceding open marker.
    if let Some(position) = visible.rfind(&markers.close) {
        visible.drain(0..position + markers.close.len());
    }

    visible.trim().to_string()
}
