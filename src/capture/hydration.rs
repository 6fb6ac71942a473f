//! Hydration diagnostics: the state record, the store the console hook
//! writes, and the classifier deciding which errors are hydration errors.

use std::sync::{Arc, LazyLock};

use {
    parking_lot::RwLock,
    regex::Regex,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::debug,
};

use crate::capture::thrown::ThrownValue;

/// React warning format strings describing a tag mismatch.
const HTML_TAG_WARNINGS: &[&str] = &[
    "Warning: Cannot render a sync or defer <script> outside the main document without knowing its order. Try adding async=\"\" or moving it into the root <head> tag.%s",
    "Warning: In HTML, %s cannot be a child of <%s>.%s\nThis will cause a hydration error.%s",
    "Warning: In HTML, %s cannot be a descendant of <%s>.\nThis will cause a hydration error.%s",
    "Warning: In HTML, text nodes cannot be a child of <%s>.\nThis will cause a hydration error.",
    "Warning: In HTML, whitespace text nodes cannot be a child of <%s>. Make sure you don't have any extra whitespace between tags on each line of your source code.\nThis will cause a hydration error.",
    "Warning: Expected server HTML to contain a matching <%s> in <%s>.%s",
    "Warning: Did not expect server HTML to contain a <%s> in <%s>.%s",
];

/// React warning format strings describing text inside a tag.
const TEXT_IN_TAG_WARNINGS: &[&str] = &[
    "Warning: Expected server HTML to contain a matching text node for \"%s\" in <%s>.%s",
    "Warning: Did not expect server HTML to contain the text node \"%s\" in <%s>.%s",
];

/// React warning format string describing a text mismatch.
pub const TEXT_MISMATCH_WARNING: &str = "Warning: Text content did not match. Server: \"%s\" Client: \"%s\"%s";

static HYDRATION_ERROR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)hydration failed|while hydrating|content does not match|did not match|HTML didn't match|hydrated but some attributes",
    )
    .expect("hydration error pattern compiles")
});

/// Diagnostic bundle attached to hydration errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HydrationErrorState {
    /// Warning format string followed by its arguments.
    pub warning: Option<Vec<String>>,
    /// Component stack reported with the warning.
    pub component_stack: Option<String>,
    /// Server-rendered content.
    pub server_content: Option<String>,
    /// Client-rendered content.
    pub client_content: Option<String>,
    /// Explanatory notes from the diff.
    pub notes: Option<String>,
    /// Structural diff between server and client output.
    pub react_output_component_diff: Option<String>,
}

impl HydrationErrorState {
    /// Overlays every field `other` defines onto `self`.
    ///
    /// # Arguments
    ///
    /// * `other` - State whose defined fields take precedence.
    pub fn merge(&mut self, other: &HydrationErrorState) {
        fn overlay<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
            if source.is_some() {
                target.clone_from(source);
            }
        }

        overlay(&mut self.warning, &other.warning);
        overlay(&mut self.component_stack, &other.component_stack);
        overlay(&mut self.server_content, &other.server_content);
        overlay(&mut self.client_content, &other.client_content);
        overlay(&mut self.notes, &other.notes);
        overlay(
            &mut self.react_output_component_diff,
            &other.react_output_component_diff,
        );
    }

    /// Whether a non-empty warning is present.
    #[must_use]
    pub fn has_warning(&self) -> bool {
        self.warning.as_ref().is_some_and(|warning| !warning.is_empty())
    }
}

/// Read access to the last observed hydration warning.
pub trait HydrationStateSource: Send + Sync {
    /// A copy of the current hydration state.
    fn snapshot(&self) -> HydrationErrorState;
}

/// Shared, mutable record of the last hydration warning.
///
/// Written by the console hook, read by the enricher.
#[derive(Debug, Clone, Default)]
pub struct HydrationStateStore {
    state: Arc<RwLock<HydrationErrorState>>,
}

impl HydrationStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored state.
    pub fn set(&self, state: HydrationErrorState) {
        *self.state.write() = state;
    }

    /// Records a `console.error` call if it is a known hydration warning.
    ///
    /// The call shape is `(format, serverContent, clientContent, componentStack)`.
    ///
    /// # Arguments
    ///
    /// * `args` - Arguments passed to `console.error`.
    ///
    /// # Returns
    ///
    /// `true` if the call was recorded.
    pub fn record_console_args(&self, args: &[ThrownValue]) -> bool {
        let Some(ThrownValue::Other {
            value: Value::String(format),
        }) = args.first()
        else {
            return false;
        };
        if !is_known_hydration_warning(format) {
            return false;
        }

        let text_arg = |index: usize| args.get(index).map(ToString::to_string);
        let server_content = text_arg(1);
        let client_content = text_arg(2);

        let mut state = self.state.write();
        state.warning = Some(vec![
            format.to_string(),
            server_content.clone().unwrap_or_default(),
            client_content.clone().unwrap_or_default(),
        ]);
        state.component_stack = text_arg(3);
        state.server_content = server_content;
        state.client_content = client_content;
        debug!(kind = ?hydration_warning_kind(format), "Recorded hydration warning");
        true
    }
}

impl HydrationStateSource for HydrationStateStore {
    fn snapshot(&self) -> HydrationErrorState {
        self.state.read().clone()
    }
}

/// Category of a known hydration warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationWarningKind {
    /// Tag structure mismatch.
    Tag,
    /// Text node inside a tag.
    TextInTag,
    /// Text content mismatch.
    Text,
}

/// Whether `format` is one of React's hydration warning format strings.
#[must_use]
pub fn is_known_hydration_warning(format: &str) -> bool {
    hydration_warning_kind(format).is_some()
}

/// Categorises a hydration warning format string.
#[must_use]
pub fn hydration_warning_kind(format: &str) -> Option<HydrationWarningKind> {
    if HTML_TAG_WARNINGS.contains(&format) {
        Some(HydrationWarningKind::Tag)
    } else if TEXT_IN_TAG_WARNINGS.contains(&format) {
        Some(HydrationWarningKind::TextInTag)
    } else if format == TEXT_MISMATCH_WARNING {
        Some(HydrationWarningKind::Text)
    } else {
        None
    }
}

/// Decides whether an error is a hydration error.
pub trait HydrationClassifier: Send + Sync {
    /// Classifies an error by its message and stack.
    fn is_hydration_error(&self, message: &str, stack: &str) -> bool;
}

/// Classifies by matching known hydration phrases in the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageHydrationClassifier;

impl HydrationClassifier for MessageHydrationClassifier {
    fn is_hydration_error(&self, message: &str, _stack: &str) -> bool {
        HYDRATION_ERROR_PATTERN.is_match(message)
    }
}
