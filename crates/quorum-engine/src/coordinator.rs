//! Negotiation coordinator: one round of broadcast → collect → match → result.
//!
//! The coordinator fans a requirement out to every participant agent on its own
//! Tokio task, collects their availability until every agent has answered or the
//! round timeout elapses, then hands the gathered windows to the matcher. Each
//! step is reported on the progress stream in order:
//!
//! 1. `Meeting schedule request: ...` announcement
//! 2. one line per participant response, in arrival order, followed by any
//!    malformed-window warnings for that participant
//! 3. timeout/failure warnings for participants that never answered
//! 4. one `Trying time slot ...` line per candidate probed
//! 5. per-attendee acceptances and the `Meeting scheduled:` line, or a warning
//!    that no slot could be found
//!
//! The result is identical to a sequential sweep: reports are re-ordered by
//! participant position before matching.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::CoordinatorConfig;
use crate::error::{Result, ScheduleError};
use crate::matcher::{self, MatchResult};
use crate::participant::{Participant, ParticipantAgent};
use crate::progress::{self, ProgressLine, ProgressSink, ProgressStream, SCHEDULED_MARKER};
use crate::requirement::MeetingRequirement;

/// Phases of a negotiation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    Broadcasting,
    AwaitingResponses,
    Matching,
    Accepted,
    Rejected,
}

/// Runs negotiation rounds with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    config: CoordinatorConfig,
}

/// What became of one participant during the awaiting-responses phase.
#[derive(Debug)]
enum Report {
    Pending,
    Available(Participant),
    Excluded,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run one negotiation round, writing progress lines to `progress`.
    ///
    /// Dropping the returned future cancels the round: every participant task
    /// still in flight is aborted with it and no further lines are written.
    ///
    /// # Errors
    /// - `ScheduleError::InvalidRequirement` if the requirement is malformed or no
    ///   participants were supplied (checked before any agent is contacted), or if
    ///   an agent rejects the requirement.
    /// - `ScheduleError::Cancelled` if the progress consumer goes away mid-round.
    pub async fn negotiate<A: ParticipantAgent>(
        &self,
        requirement: MeetingRequirement,
        agents: Vec<A>,
        progress: &ProgressSink,
    ) -> Result<MatchResult> {
        validate_round(&requirement, &agents)?;
        self.run_round(requirement, agents, progress).await
    }

    /// Validate the request and start a round on the current Tokio runtime.
    ///
    /// Validation happens synchronously, before anything is spawned. The
    /// returned [`Negotiation`] streams progress lines as they are produced.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidRequirement` under the same conditions as
    /// [`Coordinator::negotiate`]'s up-front validation.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<A: ParticipantAgent>(
        &self,
        requirement: MeetingRequirement,
        agents: Vec<A>,
    ) -> Result<Negotiation> {
        validate_round(&requirement, &agents)?;

        let (sink, stream) = progress::channel(self.config.progress_capacity);
        let coordinator = self.clone();
        let task =
            tokio::spawn(async move { coordinator.run_round(requirement, agents, &sink).await });

        Ok(Negotiation {
            progress: stream,
            task: AbortOnDrop(task),
        })
    }

    async fn run_round<A: ParticipantAgent>(
        &self,
        requirement: MeetingRequirement,
        agents: Vec<A>,
        progress: &ProgressSink,
    ) -> Result<MatchResult> {
        let span = info_span!(
            "negotiation",
            meeting = %requirement.name,
            date = %requirement.date,
            participants = agents.len()
        );
        self.round(requirement, agents, progress)
            .instrument(span)
            .await
    }

    async fn round<A: ParticipantAgent>(
        &self,
        requirement: MeetingRequirement,
        agents: Vec<A>,
        progress: &ProgressSink,
    ) -> Result<MatchResult> {
        let mut state = RoundState::Idle;
        transition(&mut state, RoundState::Broadcasting);
        progress
            .emit(ProgressLine::info(format!(
                "Meeting schedule request: {}",
                requirement
            )))
            .await?;

        let distinct = agents.iter().map(|a| a.id()).collect::<BTreeSet<_>>().len();
        if requirement.minimum_participants > distinct {
            info!(
                distinct,
                required = requirement.minimum_participants,
                "fewer participants than quorum, rejecting without broadcast"
            );
            progress
                .emit(ProgressLine::warning(format!(
                    "Not enough participants: {} registered, at least {} required",
                    distinct,
                    requirement.minimum_participants
                )))
                .await?;
            return self.reject(&requirement, &mut state, progress).await;
        }

        let reports = self.collect_reports(&requirement, agents, &mut state, progress).await?;

        transition(&mut state, RoundState::Matching);
        let responders: Vec<Participant> = reports
            .into_iter()
            .filter_map(|report| match report {
                Report::Available(participant) => Some(participant),
                Report::Pending | Report::Excluded => None,
            })
            .collect();

        let outcome = matcher::find_earliest_slot(&requirement, &responders)?;
        for probe in &outcome.probes {
            progress
                .emit(ProgressLine::info(format!(
                    "Trying time slot {}: {} of {} required participants available",
                    probe.slot,
                    probe.available.len(),
                    requirement.minimum_participants
                )))
                .await?;
        }

        let Some(slot) = outcome.result.slot.filter(|_| outcome.result.accepted) else {
            return self.reject(&requirement, &mut state, progress).await;
        };

        transition(&mut state, RoundState::Accepted);
        for attendee in &outcome.result.attendees {
            progress
                .emit(ProgressLine::info(format!("{} accepts {}", attendee, slot)))
                .await?;
        }
        let names: Vec<&str> = outcome.result.attendees.iter().map(String::as_str).collect();
        info!(%slot, attendees = names.len(), "meeting scheduled");
        progress
            .emit(ProgressLine::success(format!(
                "{} [{}] participants agreed on {}",
                SCHEDULED_MARKER,
                names.join(", "),
                slot
            )))
            .await?;
        Ok(outcome.result)
    }

    /// Broadcast the requirement and gather one report per agent, in input order.
    async fn collect_reports<A: ParticipantAgent>(
        &self,
        requirement: &MeetingRequirement,
        agents: Vec<A>,
        state: &mut RoundState,
        progress: &ProgressSink,
    ) -> Result<Vec<Report>> {
        let ids: Vec<String> = agents.iter().map(|a| a.id().to_string()).collect();
        let shared = Arc::new(requirement.clone());

        let mut tasks = JoinSet::new();
        let mut positions = HashMap::new();
        for (index, agent) in agents.into_iter().enumerate() {
            let requirement = Arc::clone(&shared);
            let handle = tasks.spawn(async move { agent.report(&requirement).await });
            positions.insert(handle.id(), index);
        }
        progress
            .emit(ProgressLine::info(format!(
                "Requesting availability from {} participants",
                ids.len()
            )))
            .await?;

        transition(state, RoundState::AwaitingResponses);
        let deadline = Instant::now() + self.config.round_timeout;
        let mut reports: Vec<Report> = ids.iter().map(|_| Report::Pending).collect();

        loop {
            let joined = match time::timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(Some(joined)) => joined,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        timeout_ms = self.config.round_timeout.as_millis() as u64,
                        "round timed out waiting for participants"
                    );
                    break;
                }
            };

            let (task_id, reported) = match joined {
                Ok((task_id, reported)) => (task_id, reported),
                Err(err) => {
                    let Some(&index) = positions.get(&err.id()) else {
                        continue;
                    };
                    warn!(participant = %ids[index], error = %err, "participant task failed");
                    reports[index] = Report::Excluded;
                    progress
                        .emit(ProgressLine::warning(format!(
                            "{} failed to respond; treating as unavailable",
                            ids[index]
                        )))
                        .await?;
                    continue;
                }
            };
            let Some(&index) = positions.get(&task_id) else {
                continue;
            };
            let id = &ids[index];

            match reported {
                Ok(declared) => {
                    reports[index] =
                        self.accept_report(requirement, id, declared, progress).await?;
                }
                Err(err @ ScheduleError::InvalidRequirement(_)) => {
                    warn!(participant = %id, error = %err, "participant rejected the requirement");
                    progress
                        .emit(ProgressLine::warning(format!(
                            "{} rejected the meeting request: {}",
                            id, err
                        )))
                        .await?;
                    return Err(err);
                }
                Err(err) => {
                    warn!(participant = %id, error = %err, "participant failed");
                    reports[index] = Report::Excluded;
                    progress
                        .emit(ProgressLine::warning(format!(
                            "{} failed to respond: {}; treating as unavailable",
                            id, err
                        )))
                        .await?;
                }
            }
        }

        tasks.shutdown().await;

        for (index, report) in reports.iter().enumerate() {
            if matches!(report, Report::Pending) {
                progress
                    .emit(ProgressLine::warning(format!(
                        "{} did not respond within {} ms; treating as unavailable",
                        ids[index],
                        self.config.round_timeout.as_millis()
                    )))
                    .await?;
            }
        }

        Ok(reports)
    }

    /// Screen a participant's declared windows, announcing the response and any
    /// malformed windows.
    async fn accept_report(
        &self,
        requirement: &MeetingRequirement,
        id: &str,
        declared: Participant,
        progress: &ProgressSink,
    ) -> Result<Report> {
        let screening = declared.screen(requirement.date);
        debug!(
            participant = %id,
            usable = screening.usable.len(),
            malformed = screening.malformed.len(),
            off_date = screening.off_date,
            "participant reported"
        );

        progress
            .emit(ProgressLine::info(format!(
                "{} responded with {} usable availability window(s)",
                id,
                screening.usable.len()
            )))
            .await?;

        for defect in &screening.malformed {
            progress
                .emit(ProgressLine::warning(format!("{}; ignoring it", defect)))
                .await?;
        }

        if screening.usable.is_empty() {
            if screening.off_date > 0 {
                progress
                    .emit(ProgressLine::info(format!(
                        "{} has no availability on {}",
                        id, requirement.date
                    )))
                    .await?;
            }
            return Ok(Report::Excluded);
        }

        Ok(Report::Available(Participant::new(id, screening.usable)))
    }

    async fn reject(
        &self,
        requirement: &MeetingRequirement,
        state: &mut RoundState,
        progress: &ProgressSink,
    ) -> Result<MatchResult> {
        transition(state, RoundState::Rejected);
        info!("no feasible slot");
        progress
            .emit(ProgressLine::warning(format!(
                "Unable to find a suitable time: no {}-minute slot on {} suits {} participants",
                requirement.duration_minutes, requirement.date, requirement.minimum_participants
            )))
            .await?;
        Ok(MatchResult::infeasible())
    }
}

fn transition(state: &mut RoundState, next: RoundState) {
    debug!(from = ?*state, to = ?next, "round state");
    *state = next;
}

/// Structural checks that must pass before any agent is contacted.
fn validate_round<A: ParticipantAgent>(
    requirement: &MeetingRequirement,
    agents: &[A],
) -> Result<()> {
    requirement.validate()?;
    if agents.is_empty() {
        return Err(ScheduleError::InvalidRequirement(
            "no participants supplied".to_string(),
        ));
    }
    Ok(())
}

/// Aborts the wrapped task when dropped.
#[derive(Debug)]
struct AbortOnDrop(JoinHandle<Result<MatchResult>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Handle to a round started with [`Coordinator::spawn`].
///
/// Dropping the handle cancels the round.
#[derive(Debug)]
pub struct Negotiation {
    progress: ProgressStream,
    task: AbortOnDrop,
}

impl Negotiation {
    /// The next progress line, or `None` once the round has finished writing.
    pub async fn next_line(&mut self) -> Option<ProgressLine> {
        self.progress.next().await
    }

    /// Stop the round. Participant tasks still in flight are aborted and no
    /// further progress lines are produced beyond those already buffered.
    pub fn cancel(&self) {
        self.task.0.abort();
    }

    /// Wait for the terminal result, collecting every progress line not yet
    /// read.
    ///
    /// # Errors
    /// Returns the round's error, or `ScheduleError::Cancelled` if the round was
    /// cancelled.
    pub async fn finish(mut self) -> (Vec<ProgressLine>, Result<MatchResult>) {
        let mut lines = Vec::new();
        while let Some(line) = self.progress.next().await {
            lines.push(line);
        }

        let result = match (&mut self.task.0).await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(ScheduleError::Cancelled),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        };
        (lines, result)
    }

    /// Wait for the terminal result, discarding unread progress lines.
    ///
    /// # Errors
    /// Same as [`Negotiation::finish`].
    pub async fn outcome(self) -> Result<MatchResult> {
        self.finish().await.1
    }
}
