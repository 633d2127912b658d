use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use errtally_core::CallerFrame;

use super::ErrorCountAppender;

/// `tracing_subscriber` layer feeding every event into an
/// [`ErrorCountAppender`]. Never filters or alters events for other layers.
#[derive(Clone)]
pub struct ErrorCountLayer {
    appender: ErrorCountAppender,
}

impl ErrorCountLayer {
    pub fn new(appender: ErrorCountAppender) -> Self {
        Self { appender }
    }
}

impl<S: Subscriber> Layer<S> for ErrorCountLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        // `log` records bridged without a module path fall back to the target
        let name = meta.module_path().unwrap_or_else(|| meta.target());
        let frame = CallerFrame::new(name, meta.line().unwrap_or(0));
        self.appender.on_event(meta.level(), frame);
    }
}
