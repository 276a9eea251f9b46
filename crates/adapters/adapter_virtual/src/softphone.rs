//! Virtual softphone: a scripted call lifecycle driven by clicks.
//!
//! ```text
//! Dialing ──answer_after──▶ Live Call ──end interaction──▶ Wrap Up
//!    │                                                       │ disposition + submit
//!    └───────────── end interaction ────────────────────────▶│
//!                                                            ▼
//!        Dialing ◀──next_call_after── Idle (preview/renew prompt shown)
//! ```

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use flowmate_app::ports::{CallStatusReader, ClickSimulator};
use flowmate_domain::call::RawCallStatus;
use flowmate_domain::error::{ConsoleError, FlowMateError};
use flowmate_domain::locator::{self, ClickOutcome, Locator};

/// Timings and labels of the simulated calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftphoneScript {
    /// How long a call rings before it is answered; `None` never answers.
    pub answer_after: Option<Duration>,
    /// Pause between submitting a disposition and dialing the next call.
    pub next_call_after: Duration,
    /// Call-type label shown for every call.
    pub call_type: String,
    /// Disposition option the wrap-up form offers.
    pub disposition_id: u32,
}

impl Default for SoftphoneScript {
    fn default() -> Self {
        Self {
            answer_after: Some(Duration::from_secs(8)),
            next_call_after: Duration::from_secs(5),
            call_type: "Outbound Call".to_string(),
            disposition_id: flowmate_domain::next_call::DEFAULT_DISPOSITION_ID,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// A call is ringing or connected, placed at `since`.
    Call { since: Instant },
    WrapUp { disposition_selected: bool },
    Idle { since: Instant },
}

#[derive(Debug)]
struct Phone {
    phase: Phase,
    renew_prompt: bool,
    attached: bool,
    calls_completed: u32,
}

/// A softphone frame that reads and clicks like the real one.
pub struct VirtualSoftphone {
    script: SoftphoneScript,
    disposition: Locator,
    phone: Mutex<Phone>,
}

impl VirtualSoftphone {
    /// Start with a call dialing right now.
    #[must_use]
    pub fn new(script: SoftphoneScript) -> Self {
        let disposition = Locator::disposition(script.disposition_id);
        Self {
            script,
            disposition,
            phone: Mutex::new(Phone {
                phase: Phase::Call {
                    since: Instant::now(),
                },
                renew_prompt: false,
                attached: true,
                calls_completed: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phone> {
        self.phone.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate the frame navigating away (`false`) or coming back.
    pub fn set_attached(&self, attached: bool) {
        self.lock().attached = attached;
    }

    /// Calls that went all the way through disposition.
    #[must_use]
    pub fn calls_completed(&self) -> u32 {
        self.lock().calls_completed
    }

    /// Advance time-driven transitions.
    fn settle(&self, phone: &mut Phone, now: Instant) {
        if let Phase::Idle { since } = phone.phase
            && now.duration_since(since) >= self.script.next_call_after
        {
            phone.phase = Phase::Call {
                since: since + self.script.next_call_after,
            };
            tracing::debug!("virtual softphone dialing next call");
        }
    }

    fn status(&self, phone: &Phone, now: Instant) -> RawCallStatus {
        match phone.phase {
            Phase::Call { since } => {
                let elapsed = now.duration_since(since);
                let answered = self
                    .script
                    .answer_after
                    .is_some_and(|answer_after| elapsed >= answer_after);
                let state = if answered { ": Live Call" } else { ": Dialing" };
                RawCallStatus {
                    state_text: Some(state.to_string()),
                    call_type_text: Some(self.script.call_type.clone()),
                    timer_text: Some(stopwatch(elapsed)),
                }
            }
            Phase::WrapUp { .. } => RawCallStatus {
                state_text: Some(": Wrap Up".to_string()),
                call_type_text: Some(self.script.call_type.clone()),
                timer_text: None,
            },
            Phase::Idle { .. } => RawCallStatus::default(),
        }
    }

    fn press(&self, phone: &mut Phone, target: &Locator, now: Instant) -> ClickOutcome {
        if *target == locator::END_INTERACTION {
            if let Phase::Call { .. } = phone.phase {
                phone.phase = Phase::WrapUp {
                    disposition_selected: false,
                };
                return ClickOutcome::Clicked;
            }
            return ClickOutcome::NotFound;
        }
        if *target == self.disposition {
            if let Phase::WrapUp { .. } = phone.phase {
                phone.phase = Phase::WrapUp {
                    disposition_selected: true,
                };
                return ClickOutcome::Clicked;
            }
            return ClickOutcome::NotFound;
        }
        if *target == locator::SUBMIT_DISPOSITION {
            return match phone.phase {
                Phase::WrapUp {
                    disposition_selected: true,
                } => {
                    phone.phase = Phase::Idle { since: now };
                    phone.renew_prompt = true;
                    phone.calls_completed += 1;
                    ClickOutcome::Clicked
                }
                Phase::WrapUp {
                    disposition_selected: false,
                } => ClickOutcome::Disabled,
                Phase::Call { .. } | Phase::Idle { .. } => ClickOutcome::NotFound,
            };
        }
        if *target == locator::CANCEL_PREVIEW_RENEW && phone.renew_prompt {
            phone.renew_prompt = false;
            return ClickOutcome::Clicked;
        }
        ClickOutcome::NotFound
    }
}

fn stopwatch(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

fn detached() -> FlowMateError {
    ConsoleError::Detached {
        surface: "softphone",
    }
    .into()
}

impl CallStatusReader for VirtualSoftphone {
    fn read_call_status(&self) -> impl Future<Output = Result<RawCallStatus, FlowMateError>> + Send {
        let now = Instant::now();
        let result = {
            let mut phone = self.lock();
            if phone.attached {
                self.settle(&mut phone, now);
                Ok(self.status(&phone, now))
            } else {
                Err(detached())
            }
        };
        async move { result }
    }
}

impl ClickSimulator for VirtualSoftphone {
    fn click(
        &self,
        target: &Locator,
    ) -> impl Future<Output = Result<ClickOutcome, FlowMateError>> + Send {
        let now = Instant::now();
        let result = {
            let mut phone = self.lock();
            if phone.attached {
                self.settle(&mut phone, now);
                let outcome = self.press(&mut phone, target, now);
                tracing::trace!(%target, ?outcome, "virtual click");
                Ok(outcome)
            } else {
                Err(detached())
            }
        };
        async move { result }
    }
}
