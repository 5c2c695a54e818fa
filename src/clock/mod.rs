use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

use crate::error::UsageError;
use crate::session::{QuizSession, SessionSnapshot, Transition};

/// Receives the transitions the clock itself causes (ticks, timeouts), in
/// order, on a task of its own. A slow observer never holds up the clock.
///
/// Transitions caused through [`SessionClock::advance`] are returned to the
/// caller instead.
#[async_trait]
pub trait SessionObserver: Send + Sync {
    async fn on_transition(
        &self,
        source: TickSource,
        transition: Transition,
        snapshot: SessionSnapshot,
    );
}

pub type SharedSession = Arc<Mutex<QuizSession>>;

/// Drives a [`QuizSession`] with wall-clock seconds.
///
/// One task keeps a deadline for each of the two one-second clocks: overall and
/// question. The question deadline restarts on every change of question and
/// its ticks carry the epoch they were scheduled in. Seconds missed while the
/// task was held up are caught up one by one in time order, never dropped.
/// The task stops when the session ends or the clock is stopped or dropped.
pub struct SessionClock {
    session: SharedSession,
    epoch_tx: watch::Sender<u64>,
    task: JoinHandle<()>,
}

impl SessionClock {
    pub fn start(session: QuizSession, observer: Arc<dyn SessionObserver>) -> Self {
        let (epoch_tx, epoch_rx) = watch::channel(session.epoch());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Mutex::new(session));
        tokio::spawn(deliver(events_rx, observer));
        let task = tokio::spawn(run_clock(session.clone(), epoch_rx, events_tx));
        Self {
            session,
            epoch_tx,
            task,
        }
    }

    pub async fn select_answer(&self, option: &str) -> Result<SessionSnapshot, UsageError> {
        let mut session = self.session.lock().await;
        session.select_answer(option)?;
        Ok(session.snapshot())
    }

    pub async fn advance(&self) -> Result<Transition, UsageError> {
        let mut session = self.session.lock().await;
        let transition = session.advance()?;
        self.restart_for(&transition);
        Ok(transition)
    }

    /// Picks option `index` of the question that was on screen during `epoch`.
    /// `Ok(None)` when that question is gone or has no such option.
    pub async fn select_option(
        &self,
        epoch: u64,
        index: usize,
    ) -> Result<Option<SessionSnapshot>, UsageError> {
        let mut session = self.session.lock().await;
        if session.is_ended() {
            return Err(UsageError::SessionEnded);
        }
        if session.epoch() != epoch {
            return Ok(None);
        }
        let option = match session.current_question().options.get(index) {
            Some(option) => option.clone(),
            None => return Ok(None),
        };
        session.select_answer(&option)?;
        Ok(Some(session.snapshot()))
    }

    /// Advances past the question shown during `epoch`, if it is still current
    /// and has an answer selected. `Ok(None)` otherwise.
    pub async fn submit(&self, epoch: u64) -> Result<Option<Transition>, UsageError> {
        let mut session = self.session.lock().await;
        if session.is_ended() {
            return Err(UsageError::SessionEnded);
        }
        if session.epoch() != epoch || session.selected_answer().is_none() {
            return Ok(None);
        }
        let transition = session.advance()?;
        self.restart_for(&transition);
        Ok(Some(transition))
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl SessionClock {
    fn restart_for(&self, transition: &Transition) {
        match transition {
            Transition::Advanced { epoch, .. } => {
                // Fails only when the clock task is already gone.
                let _ = self.epoch_tx.send(*epoch);
            }
            Transition::Ended(_) => self.task.abort(),
            _ => {}
        }
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Which clock produced a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    Overall,
    Question,
}

struct ClockEvent {
    source: TickSource,
    transition: Transition,
    snapshot: SessionSnapshot,
}

/// Hands clock events to the observer in order, off the ticking task.
async fn deliver(
    mut events: mpsc::UnboundedReceiver<ClockEvent>,
    observer: Arc<dyn SessionObserver>,
) {
    while let Some(event) = events.recv().await {
        observer
            .on_transition(event.source, event.transition, event.snapshot)
            .await;
    }
}

async fn run_clock(
    session: SharedSession,
    mut epoch_rx: watch::Receiver<u64>,
    events: mpsc::UnboundedSender<ClockEvent>,
) {
    let second = Duration::from_secs(1);
    let mut next_overall = Instant::now() + second;
    let mut next_question = next_overall;
    let mut epoch = *epoch_rx.borrow_and_update();

    loop {
        tokio::select! {
            biased;
            changed = epoch_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                epoch = *epoch_rx.borrow_and_update();
                next_question = Instant::now() + second;
                continue;
            }
            _ = sleep_until(next_overall.min(next_question)) => {}
        }

        let mut session = session.lock().await;
        let mut finished = false;

        // Every overdue second is applied in the order it fell due. Within one
        // instant the overall clock goes first, so when both clocks expire
        // together the session ends on the overall timeout.
        loop {
            let now = Instant::now();
            let (source, due) = if next_overall <= next_question {
                (TickSource::Overall, next_overall)
            } else {
                (TickSource::Question, next_question)
            };
            if due > now {
                break;
            }

            let outcome = match source {
                TickSource::Overall => {
                    next_overall += second;
                    session.tick_overall()
                }
                TickSource::Question => {
                    next_question += second;
                    session.tick_question_for(epoch)
                }
            };

            match outcome {
                Ok(Transition::Stale) => {
                    // The question changed while this task waited for the lock.
                    epoch = session.epoch();
                    next_question = now + second;
                }
                Ok(transition) => {
                    if let Transition::Advanced { epoch: next, .. } = transition {
                        epoch = next;
                        next_question = due + second;
                    }
                    finished = transition.is_ended();
                    let snapshot = session.snapshot();
                    // Fails only when nobody listens any more.
                    let _ = events.send(ClockEvent {
                        source,
                        transition,
                        snapshot,
                    });
                    if finished {
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("session clock stopping: {}", e);
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            break;
        }
    }
}
