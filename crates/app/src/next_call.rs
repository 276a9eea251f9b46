//! Next-call action: runs the [`NextCallPlan`] against the softphone.
//!
//! A run is guarded by two flags shared with the call loop. `busy` rejects
//! re-entrant runs; `ready_for_next` keeps the loop from starting another
//! countdown while a run is in flight. Both are held by a
//! [`SequencePermit`] and restored when it drops, so a run that completes,
//! fails, or is aborted mid-way always leaves the loop able to continue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flowmate_domain::error::FlowMateError;
use flowmate_domain::event::{Event, EventKind};
use flowmate_domain::id::RunId;
use flowmate_domain::locator::{ClickOutcome, Locator};
use flowmate_domain::next_call::{NextCallOutcome, NextCallPlan, NextCallReport};

use crate::ports::{ClickSimulator, EventPublisher};

/// Flags bridging the next-call action and the call loop.
#[derive(Debug)]
pub struct SequenceFlags {
    busy: AtomicBool,
    ready_for_next: AtomicBool,
}

impl Default for SequenceFlags {
    fn default() -> Self {
        Self {
            busy: AtomicBool::new(false),
            ready_for_next: AtomicBool::new(true),
        }
    }
}

impl SequenceFlags {
    /// Whether a run is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Whether the loop may start a new countdown.
    #[must_use]
    pub fn is_ready_for_next(&self) -> bool {
        self.ready_for_next.load(Ordering::Acquire)
    }

    /// Force `ready_for_next` back on (used when the loop stops).
    pub fn reset_ready(&self) {
        self.ready_for_next.store(true, Ordering::Release);
    }
}

/// Exclusive right to run the sequence. Releases both flags on drop.
#[derive(Debug)]
pub struct SequencePermit {
    flags: Arc<SequenceFlags>,
}

impl Drop for SequencePermit {
    fn drop(&mut self) {
        self.flags.ready_for_next.store(true, Ordering::Release);
        self.flags.busy.store(false, Ordering::Release);
    }
}

/// Executes the next-call sequence.
pub struct NextCallAction<C, P> {
    clicker: C,
    publisher: P,
    plan: NextCallPlan,
    flags: Arc<SequenceFlags>,
}

impl<C, P> NextCallAction<C, P>
where
    C: ClickSimulator + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    /// Create an action that runs `plan` through `clicker`.
    pub fn new(clicker: C, publisher: P, plan: NextCallPlan) -> Self {
        Self {
            clicker,
            publisher,
            plan,
            flags: Arc::new(SequenceFlags::default()),
        }
    }

    #[must_use]
    pub fn flags(&self) -> &SequenceFlags {
        &self.flags
    }

    pub(crate) fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Claim the sequence, clearing `ready_for_next`.
    ///
    /// Returns `None` when another run holds it.
    #[must_use]
    pub fn try_begin(&self) -> Option<SequencePermit> {
        self.flags
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.flags.ready_for_next.store(false, Ordering::Release);
        Some(SequencePermit {
            flags: Arc::clone(&self.flags),
        })
    }

    /// Claim the sequence and run it, or report [`NextCallOutcome::Skipped`].
    pub async fn trigger(&self) -> NextCallOutcome {
        match self.try_begin() {
            Some(permit) => self.run(permit).await,
            None => {
                tracing::debug!("next-call sequence already running, skipping");
                NextCallOutcome::Skipped
            }
        }
    }

    /// Run the sequence under an already claimed permit.
    ///
    /// Errors from the page abort the remaining steps and are logged, never
    /// returned.
    #[tracing::instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, permit: SequencePermit) -> NextCallOutcome {
        let run_id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        self.emit(EventKind::NextCallStarted { run_id }).await;

        let outcome = match self.execute().await {
            Ok(report) => {
                tracing::info!(?report, "next-call sequence completed");
                NextCallOutcome::Completed { report }
            }
            Err(err) => {
                tracing::error!(error = %err, "next-call sequence failed");
                NextCallOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };
        drop(permit);

        self.emit(EventKind::NextCallFinished {
            run_id,
            outcome: outcome.clone(),
        })
        .await;
        outcome
    }

    async fn execute(&self) -> Result<NextCallReport, FlowMateError> {
        let plan = &self.plan;

        let mut ended_interaction = false;
        let retry = plan.end_interaction_retry;
        for attempt in 1..=retry.max_attempts {
            if self.clicker.click(&plan.end_interaction).await?.is_clicked() {
                ended_interaction = true;
                break;
            }
            if attempt < retry.max_attempts {
                tokio::time::sleep(retry.delay).await;
            }
        }
        if !ended_interaction {
            tracing::debug!("end interaction control never became clickable");
        }

        let disposition = self.click_once(&plan.disposition).await?;
        let submit = self.click_once(&plan.submit_disposition).await?;

        let mut renew_prompts_dismissed = 0;
        let repeat = plan.cancel_renew_repeat;
        for _ in 0..repeat.max_attempts {
            if self.clicker.click(&plan.cancel_renew).await?.is_clicked() {
                renew_prompts_dismissed += 1;
            }
            tokio::time::sleep(repeat.delay).await;
        }

        Ok(NextCallReport {
            ended_interaction,
            disposition,
            submit,
            renew_prompts_dismissed,
        })
    }

    async fn click_once(&self, target: &Locator) -> Result<ClickOutcome, FlowMateError> {
        let outcome = self.clicker.click(target).await?;
        if !outcome.is_clicked() {
            tracing::debug!(%target, ?outcome, "target not clickable");
        }
        Ok(outcome)
    }

    async fn emit(&self, kind: EventKind) {
        if let Err(err) = self.publisher.publish(Event::new(kind)).await {
            tracing::warn!(error = %err, "failed to publish next-call event");
        }
    }
}
