//! Splitting React hydration messages into notes and a component diff.

/// React's documentation link embedded in hydration messages.
pub const REACT_HYDRATION_ERROR_LINK: &str = "https://react.dev/link/hydration-mismatch";

/// Leading sentences of React's hydration mismatch messages.
const REACT_HYDRATION_START_MESSAGES: &[&str] = &[
    "A tree hydrated but some attributes of the server rendered HTML didn't match the client properties.",
    "Hydration failed because the server rendered HTML didn't match the client.",
    "Hydration failed because the server rendered text didn't match the client.",
];

/// The two parts of a hydration message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegments {
    /// Explanation preceding the documentation link.
    pub notes: String,
    /// Server/client component diff following the link.
    pub component_diff: String,
}

/// Computes diff segments from an error message.
pub trait DiffSegmenter: Send + Sync {
    /// Returns both segments, or `None` when no diff is available.
    fn diff_segments(&self, message: &str) -> Option<DiffSegments>;
}

/// Reads the diff React embeds in its own hydration messages.
///
/// The message layout is a headline, explanatory notes, React's docs link,
/// then the diff lines interleaved with `at ...` stack frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactDiffSegmenter;

impl DiffSegmenter for ReactDiffSegmenter {
    fn diff_segments(&self, message: &str) -> Option<DiffSegments> {
        let message = message.strip_prefix("Error: ").unwrap_or(message);
        if !REACT_HYDRATION_START_MESSAGES
            .iter()
            .any(|start| message.starts_with(start))
        {
            return None;
        }

        let body = match message.find('\n') {
            Some(line_break) => message[line_break + 1..].trim(),
            None => message.trim(),
        };
        let (notes, trailing) = body.split_once(REACT_HYDRATION_ERROR_LINK)?;

        let component_diff = trailing
            .lines()
            .filter(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("at ")
            })
            .collect::<Vec<_>>()
            .join("\n");
        if component_diff.is_empty() {
            return None;
        }

        Some(DiffSegments {
            notes: notes.trim().to_string(),
            component_diff,
        })
    }
}
