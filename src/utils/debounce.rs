//! Quiet-period debouncing over a tokio task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum Command<T> {
    Update(T),
    Cancel,
}

/// Emits the most recent input once no newer input arrived for `quiet`.
///
/// Each update restarts the timer and replaces the pending value, so a burst
/// of updates yields exactly one emission carrying the last value. Dropping
/// the debouncer flushes a pending value immediately.
///
/// ```no_run
/// use bookfinder::utils::Debouncer;
/// use std::time::Duration;
///
/// # async fn demo() {
/// let (debouncer, mut committed) = Debouncer::spawn(Duration::from_millis(400));
/// debouncer.push("h".to_string());
/// debouncer.push("harry".to_string());
/// assert_eq!(committed.recv().await.as_deref(), Some("harry"));
/// # }
/// ```
#[derive(Debug)]
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<Command<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Start the debouncing task. Must be called within a tokio runtime.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, commands) = mpsc::unbounded_channel();
        let (output, committed) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(quiet, commands, output));
        (Self { input, task }, committed)
    }

    /// Replace the pending value and restart the quiet period.
    ///
    /// Returns `false` if the debouncing task has stopped.
    pub fn push(&self, value: T) -> bool {
        self.input.send(Command::Update(value)).is_ok()
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&self) {
        let _ = self.input.send(Command::Cancel);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<T> std::fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Update(_) => f.write_str("Update"),
            Command::Cancel => f.write_str("Cancel"),
        }
    }
}

async fn run<T>(
    quiet: Duration,
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    output: mpsc::UnboundedSender<T>,
) {
    let mut pending: Option<T> = None;

    loop {
        let Some(value) = pending.take() else {
            match commands.recv().await {
                Some(Command::Update(value)) => pending = Some(value),
                Some(Command::Cancel) => {}
                None => return,
            }
            continue;
        };

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Update(newer)) => pending = Some(newer),
                Some(Command::Cancel) => {}
                None => {
                    let _ = output.send(value);
                    return;
                }
            },
            _ = tokio::time::sleep(quiet) => {
                if output.send(value).is_err() {
                    return;
                }
            }
        }
    }
}
