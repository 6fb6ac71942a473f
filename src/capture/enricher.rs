//! Admission and hydration enrichment of thrown values.

use std::sync::Arc;

use tracing::debug;

use crate::{
    capture::{
        diff::{DiffSegmenter, DiffSegments, ReactDiffSegmenter},
        hydration::{
            HydrationClassifier, HydrationErrorState, HydrationStateSource,
            MessageHydrationClassifier,
        },
        thrown::{CapturedError, JsError, ThrownValue},
    },
    config::{CaptureSettings, DEFAULT_HYDRATION_MESSAGE, HYDRATION_DOCS_LINK},
};

/// Turns raw thrown values into captured errors.
///
/// The enricher owns the raw error while it works on it, so the message
/// suffix and the `details` bundle are written exactly once before the
/// error is shared.
#[derive(Clone)]
pub struct ErrorEnricher {
    /// Hydration error predicate.
    classifier: Arc<dyn HydrationClassifier>,
    /// Diff algorithm.
    segmenter: Arc<dyn DiffSegmenter>,
    /// Last observed hydration warning.
    hydration_state: Arc<dyn HydrationStateSource>,
    /// Link appended to hydration errors without a diff.
    docs_link: String,
    /// Warning used when the ambient state has none.
    default_message: String,
}

impl ErrorEnricher {
    /// Creates an enricher with the default classifier and diff algorithm.
    ///
    /// # Arguments
    ///
    /// * `hydration_state` - Read access to the hydration state store.
    pub fn new(hydration_state: Arc<dyn HydrationStateSource>) -> Self {
        Self {
            classifier: Arc::new(MessageHydrationClassifier),
            segmenter: Arc::new(ReactDiffSegmenter),
            hydration_state,
            docs_link: HYDRATION_DOCS_LINK.to_string(),
            default_message: DEFAULT_HYDRATION_MESSAGE.to_string(),
        }
    }

    /// Creates an enricher using the link and default message from settings.
    pub fn from_settings(
        settings: &CaptureSettings,
        hydration_state: Arc<dyn HydrationStateSource>,
    ) -> Self {
        Self {
            docs_link: settings.hydration_docs_link.clone(),
            default_message: settings.default_hydration_message.clone(),
            ..Self::new(hydration_state)
        }
    }

    /// Replaces the hydration error predicate.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn HydrationClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the diff algorithm.
    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Arc<dyn DiffSegmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// The documentation-link suffix appended to hydration messages.
    #[must_use]
    pub fn docs_suffix(&self) -> String {
        format!("\nSee more info here: {}", self.docs_link)
    }

    /// Admits and enriches a thrown value.
    ///
    /// # Arguments
    ///
    /// * `raw` - The thrown value.
    ///
    /// # Returns
    ///
    /// `None` for values that are not errors or carry no stack. Otherwise
    /// the captured error; hydration errors not yet enriched gain `details`
    /// and, when no diff is available, the documentation-link suffix.
    pub fn enrich(&self, raw: ThrownValue) -> Option<CapturedError> {
        let ThrownValue::Error(mut error) = raw else {
            return None;
        };
        let stack = error.stack.as_deref()?;

        let hydration = self.classifier.is_hydration_error(&error.message, stack);
        if hydration && !error.message.contains(&self.docs_link) {
            self.attach_hydration_details(&mut error);
        }

        CapturedError::admit(error, hydration)
    }

    fn attach_hydration_details(&self, error: &mut JsError) {
        let ambient = self.hydration_state.snapshot();
        let prior = error.details.take().unwrap_or_default();

        let details = match self.segmenter.diff_segments(&error.message) {
            Some(DiffSegments {
                notes,
                component_diff,
            }) => {
                let mut details = prior;
                details.merge(&ambient);
                details.warning = Some(if ambient.has_warning() {
                    ambient.warning.unwrap_or_default()
                } else {
                    vec![self.default_message.clone()]
                });
                details.notes = Some(notes);
                details.react_output_component_diff = Some(component_diff);
                details
            }
            None => {
                let details = if ambient.warning.is_some() {
                    let mut details = prior;
                    details.merge(&ambient);
                    details
                } else {
                    HydrationErrorState::default()
                };
                error.message.push_str(&self.docs_suffix());
                details
            }
        };

        debug!(
            has_diff = details.react_output_component_diff.is_some(),
            has_warning = details.has_warning(),
            "Attached hydration details"
        );
        error.details = Some(details);
    }
}
