use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

pub fn tracing_init() {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_max_level(Level::DEBUG)
        .with_timer(SinceStart::default())
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global tracing subscriber was already installed");
    }
}

/// Prints milliseconds elapsed since the demo started, which makes the
/// ordering of overlapping activations easy to follow.
#[derive(Debug, Clone, Copy)]
pub struct SinceStart {
    start: chrono::DateTime<chrono::Local>,
}

impl Default for SinceStart {
    fn default() -> Self {
        Self {
            start: chrono::Local::now(),
        }
    }
}

impl FormatTime for SinceStart {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let elapsed = chrono::Local::now() - self.start;
        write!(w, "+{:>5}ms", elapsed.num_milliseconds())
    }
}
