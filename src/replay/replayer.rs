//! Drives a fully wired capture pipeline through a recorded trace.

use std::{collections::BTreeMap, sync::Arc};

use {
    parking_lot::Mutex,
    serde::Serialize,
    tracing::{debug, info},
};

use crate::{
    bridge::{ConsoleOutcome, ConsolePatch, ConsoleSink, ErrorEvent, RejectionEvent, WindowBridge},
    capture::{CapturedError, HydrationErrorState, HydrationStateStore},
    config::CaptureSettings,
    error::TraceError,
    replay::trace::{Trace, TraceStep},
    state::{CaptureState, ErrorHandler, Subscription, handler},
};

/// Which handler received a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    /// The error handler.
    Error,
    /// The rejection handler.
    Rejection,
}

/// One handler invocation observed during replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    /// Receiving consumer.
    pub consumer: String,
    /// Receiving handler.
    pub channel: DeliveryChannel,
    /// Delivered message.
    pub message: String,
    /// Whether the error was classified as a hydration error.
    pub hydration: bool,
    /// Delivered hydration diagnostics.
    pub details: Option<HydrationErrorState>,
}

impl Delivery {
    fn new(consumer: &str, channel: DeliveryChannel, error: &CapturedError) -> Self {
        Self {
            consumer: consumer.to_string(),
            channel,
            message: error.message.clone(),
            hydration: error.is_hydration(),
            details: error.details.clone(),
        }
    }
}

/// Summary of a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Handler invocations in order.
    pub deliveries: Vec<Delivery>,
    /// Final error queue length.
    pub queued_errors: usize,
    /// Final rejection queue length.
    pub queued_rejections: usize,
    /// Console calls passed to the original console.
    pub console_forwarded: usize,
    /// Console calls swallowed as navigation signals.
    pub console_swallowed: usize,
    /// Error events whose default handling was prevented.
    pub prevented_events: usize,
}

/// Replays traces against one page session.
pub struct Replayer {
    /// Session state.
    state: CaptureState,
    /// Window listeners.
    window: WindowBridge,
    /// Wrapped console.
    console: ConsolePatch,
    /// Mounted consumers by name.
    consumers: BTreeMap<String, Subscription>,
    /// Deliveries shared with consumer handlers.
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    /// Running counters.
    report: ReplayReport,
}

impl Replayer {
    /// Wires a new page session.
    ///
    /// # Arguments
    ///
    /// * `settings` - Capture settings.
    /// * `console` - Console receiving forwarded calls.
    pub fn new(settings: &CaptureSettings, console: Arc<dyn ConsoleSink>) -> Self {
        let store = HydrationStateStore::new();
        let state = CaptureState::from_settings(settings, Arc::new(store.clone()));
        Self {
            window: WindowBridge::new(state.clone()),
            console: ConsolePatch::new(console, settings.build_mode).with_hydration_store(store),
            state,
            consumers: BTreeMap::new(),
            deliveries: Arc::new(Mutex::new(Vec::new())),
            report: ReplayReport::default(),
        }
    }

    /// The session state.
    #[must_use]
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Applies one step.
    ///
    /// Mounting a consumer that is already mounted remounts it.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::UnknownConsumer` when unmounting a consumer that
    /// is not mounted.
    pub fn apply(&mut self, step: TraceStep) -> Result<(), TraceError> {
        match step {
            TraceStep::Error { error } => {
                let mut event = ErrorEvent::new(error);
                self.window.on_error(&mut event);
                if event.is_default_prevented() {
                    self.report.prevented_events += 1;
                }
            }
            TraceStep::Rejection { reason } => {
                self.window.on_unhandled_rejection(&RejectionEvent { reason });
            }
            TraceStep::Console { args } => match self.console.error(&args) {
                ConsoleOutcome::Forwarded => self.report.console_forwarded += 1,
                ConsoleOutcome::Swallowed => self.report.console_swallowed += 1,
            },
            TraceStep::Mount { consumer } => {
                if let Some(previous) = self.consumers.remove(&consumer) {
                    debug!(consumer = %consumer, "Remounting consumer");
                    previous.unsubscribe();
                }
                let subscription = self.state.subscribe(
                    self.consumer_handler(&consumer, DeliveryChannel::Error),
                    self.consumer_handler(&consumer, DeliveryChannel::Rejection),
                );
                self.consumers.insert(consumer, subscription);
            }
            TraceStep::Unmount { consumer } => {
                let subscription = self
                    .consumers
                    .remove(&consumer)
                    .ok_or(TraceError::UnknownConsumer { name: consumer })?;
                subscription.unsubscribe();
            }
        }
        Ok(())
    }

    /// Applies every step of a trace and unmounts remaining consumers.
    ///
    /// # Errors
    ///
    /// Returns the first `TraceError` raised by a step.
    pub fn run(mut self, trace: Trace) -> Result<ReplayReport, TraceError> {
        for step in trace.steps {
            self.apply(step)?;
        }
        self.consumers.clear();

        let report = self.report();
        info!(
            deliveries = report.deliveries.len(),
            queued_errors = report.queued_errors,
            queued_rejections = report.queued_rejections,
            "Replay finished"
        );
        Ok(report)
    }

    /// Snapshot of the replay so far.
    #[must_use]
    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            deliveries: self.deliveries.lock().clone(),
            queued_errors: self.state.queued_errors().len(),
            queued_rejections: self.state.queued_rejections().len(),
            ..self.report.clone()
        }
    }

    fn consumer_handler(&self, consumer: &str, channel: DeliveryChannel) -> ErrorHandler {
        let deliveries = Arc::clone(&self.deliveries);
        let consumer = consumer.to_string();
        handler(move |error| {
            deliveries
                .lock()
                .push(Delivery::new(&consumer, channel, error));
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        bridge::TracingConsole,
        capture::hydration::TEXT_MISMATCH_WARNING,
        config::{BuildMode, CaptureSettings, HYDRATION_DOCS_LINK},
        error::TraceError,
        replay::{
            replayer::{DeliveryChannel, Replayer},
            trace::{Trace, TraceStep},
        },
    };

    fn replayer() -> Replayer {
        Replayer::new(&CaptureSettings::default(), Arc::new(TracingConsole))
    }

    #[test]
    fn test_full_session() {
        let trace: Trace = format!(
            r#"{{"steps":[
                {{"step":"error","error":{{"type":"error","message":"A","stack":"Error: A"}}}},
                {{"step":"rejection","reason":{{"type":"other","value":"not an error"}}}},
                {{"step":"mount","consumer":"overlay"}},
                {{"step":"console","args":[
                    {{"type":"other","value":{warning}}},
                    {{"type":"other","value":"server"}},
                    {{"type":"other","value":"client"}}
                ]}},
                {{"step":"error","error":{{"type":"error","message":"Hydration failed because the initial UI does not match what was rendered on the server.","stack":"Error"}}}},
                {{"step":"error","error":{{"type":"error","message":"Text content did not match server-rendered HTML.","stack":"Error"}}}},
                {{"step":"rejection","reason":{{"type":"error","message":"R","stack":"Error: R"}}}},
                {{"step":"console","args":[
                    {{"type":"other","value":"The above error occurred"}},
                    {{"type":"error","message":"NEXT_NOT_FOUND","stack":"Error","digest":"NEXT_NOT_FOUND"}}
                ]}},
                {{"step":"error","error":{{"type":"error","message":"NEXT_NOT_FOUND","stack":"Error","digest":"NEXT_NOT_FOUND"}}}},
                {{"step":"unmount","consumer":"overlay"}},
                {{"step":"error","error":{{"type":"error","message":"late","stack":"Error: late"}}}},
                {{"step":"mount","consumer":"late"}}
            ]}}"#,
            warning = serde_json::to_string(TEXT_MISMATCH_WARNING).unwrap()
        )
        .parse()
        .unwrap();

        let report = replayer().run(trace).unwrap();

        let overlay: Vec<_> = report
            .deliveries
            .iter()
            .filter(|delivery| delivery.consumer == "overlay")
            .collect();
        assert_eq!(overlay.len(), 4);
        assert_eq!(overlay[0].message, "A");
        assert!(overlay[1].hydration);
        assert!(overlay[1].message.ends_with(HYDRATION_DOCS_LINK));
        assert!(overlay[1].details.as_ref().unwrap().has_warning());
        assert!(overlay[2].hydration);
        assert_eq!(overlay[3].channel, DeliveryChannel::Rejection);

        let late: Vec<_> = report
            .deliveries
            .iter()
            .filter(|delivery| delivery.consumer == "late")
            .map(|delivery| delivery.message.as_str())
            .collect();
        assert_eq!(late.len(), 4);
        assert_eq!(late[0], "A");
        assert_eq!(late[2], "late");
        assert_eq!(late[3], "R");

        assert_eq!(report.queued_errors, 3);
        assert_eq!(report.queued_rejections, 1);
        assert_eq!(report.console_forwarded, 1);
        assert_eq!(report.console_swallowed, 1);
        assert_eq!(report.prevented_events, 1);
    }

    #[test]
    fn test_production_console_index() {
        let settings = CaptureSettings {
            build_mode: BuildMode::Production,
            ..CaptureSettings::default()
        };
        let mut replayer = Replayer::new(&settings, Arc::new(TracingConsole));
        let trace: Trace = r#"{"steps":[
            {"step":"console","args":[
                {"type":"other","value":"The above error occurred"},
                {"type":"error","message":"NEXT_NOT_FOUND","stack":"Error","digest":"NEXT_NOT_FOUND"}
            ]},
            {"step":"console","args":[
                {"type":"error","message":"NEXT_NOT_FOUND","stack":"Error","digest":"NEXT_NOT_FOUND"}
            ]}
        ]}"#
        .parse()
        .unwrap();
        for step in trace.steps {
            replayer.apply(step).unwrap();
        }

        let report = replayer.report();
        assert_eq!(report.console_forwarded, 1);
        assert_eq!(report.console_swallowed, 1);
    }

    #[test]
    fn test_remount_replays_again() {
        let mut replayer = replayer();
        replayer
            .apply(TraceStep::Error {
                error: crate::capture::JsError::new("once").into(),
            })
            .unwrap();
        for _ in 0..2 {
            replayer
                .apply(TraceStep::Mount {
                    consumer: "overlay".to_string(),
                })
                .unwrap();
        }

        assert_eq!(replayer.report().deliveries.len(), 2);
        assert_eq!(replayer.state().handler_counts(), (1, 1));
    }

    #[test]
    fn test_unmount_unknown_consumer() {
        let error = replayer()
            .apply(TraceStep::Unmount {
                consumer: "ghost".to_string(),
            })
            .unwrap_err();
        assert!(matches!(error, TraceError::UnknownConsumer { name } if name == "ghost"));
    }
}
