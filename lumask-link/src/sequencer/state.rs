//! Upload state machine
//!
//! Upload state is a function of the current state and an event. Only the
//! sequencer applies events, under its state lock.

use lumask_protocol::DisplayMode;

/// Identifier of one upload session, unique per sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionId(pub u32);

/// What the state records about a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionInfo {
    pub id: SessionId,
    /// Mode the upload will display in
    pub mode: DisplayMode,
    /// Frames in the session's plan
    pub total_frames: usize,
    /// Frames sent so far
    pub cursor: usize,
}

impl SessionInfo {
    pub fn new(id: SessionId, mode: DisplayMode, total_frames: usize) -> Self {
        Self {
            id,
            mode,
            total_frames,
            cursor: 0,
        }
    }
}

/// Sequencer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// No session; commands and new uploads are accepted
    #[default]
    Idle,
    /// A session is sending frames
    Uploading(SessionInfo),
    /// A session was asked to stop and has not reached a frame boundary yet
    Cancelling(SessionInfo),
}

/// Events that drive state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerEvent {
    /// A caller claimed the link for a new session
    Begin(SessionInfo),
    /// A session finished sending one more frame
    Progress { id: SessionId, cursor: usize },
    /// Cancellation or preemption asked the running session to stop
    StopRequested,
    /// A session sent its commit frame
    Finished(SessionId),
    /// A session stopped at a frame boundary after a stop request
    Stopped(SessionId),
    /// A session's send failed
    Failed(SessionId),
    /// The running session did not stop in time, or the link closed
    ForceIdle,
}

impl SequencerState {
    /// Session currently owning the link, if any
    pub fn session(&self) -> Option<SessionInfo> {
        match self {
            SequencerState::Idle => None,
            SequencerState::Uploading(info) | SequencerState::Cancelling(info) => Some(*info),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SequencerState::Idle)
    }

    /// Check if session `id` should keep sending
    pub fn may_continue(&self, id: SessionId) -> bool {
        matches!(self, SequencerState::Uploading(info) if info.id == id)
    }

    /// Process an event and return the next state
    ///
    /// Events naming a session other than the current one are ignored, so a
    /// session that was forced idle cannot disturb its successor.
    pub fn transition(self, event: SequencerEvent) -> Self {
        use SequencerEvent::*;
        use SequencerState::*;

        match (self, event) {
            (Idle, Begin(info)) => Uploading(info),

            (Uploading(info), Progress { id, cursor }) if info.id == id => {
                Uploading(SessionInfo { cursor, ..info })
            }
            (Uploading(info), StopRequested) => Cancelling(info),
            (Uploading(info), Finished(id)) if info.id == id => Idle,
            (Uploading(info), Failed(id)) if info.id == id => Idle,

            (Cancelling(info), Progress { id, cursor }) if info.id == id => {
                Cancelling(SessionInfo { cursor, ..info })
            }
            // A commit already in flight when the stop arrived still lands
            (Cancelling(info), Finished(id)) if info.id == id => Idle,
            (Cancelling(info), Stopped(id)) if info.id == id => Idle,
            (Cancelling(info), Failed(id)) if info.id == id => Idle,

            (_, ForceIdle) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: u32) -> SessionInfo {
        SessionInfo::new(SessionId(id), DisplayMode::Steady, 10)
    }

    #[test]
    fn test_begin_from_idle() {
        let next = SequencerState::Idle.transition(SequencerEvent::Begin(info(1)));
        assert_eq!(next, SequencerState::Uploading(info(1)));
        assert!(next.may_continue(SessionId(1)));
        assert!(!next.may_continue(SessionId(2)));
    }

    #[test]
    fn test_begin_ignored_while_busy() {
        let busy = SequencerState::Uploading(info(1));
        assert_eq!(busy.transition(SequencerEvent::Begin(info(2))), busy);

        let cancelling = SequencerState::Cancelling(info(1));
        assert_eq!(cancelling.transition(SequencerEvent::Begin(info(2))), cancelling);
    }

    #[test]
    fn test_progress_updates_cursor() {
        let state = SequencerState::Uploading(info(1)).transition(SequencerEvent::Progress {
            id: SessionId(1),
            cursor: 4,
        });
        assert_eq!(state.session().map(|s| s.cursor), Some(4));

        // Stale session id is ignored
        let same = state.transition(SequencerEvent::Progress {
            id: SessionId(9),
            cursor: 7,
        });
        assert_eq!(same, state);
    }

    #[test]
    fn test_commit_returns_to_idle() {
        let state =
            SequencerState::Uploading(info(1)).transition(SequencerEvent::Finished(SessionId(1)));
        assert!(state.is_idle());
    }

    #[test]
    fn test_cancel_path() {
        let cancelling =
            SequencerState::Uploading(info(1)).transition(SequencerEvent::StopRequested);
        assert_eq!(cancelling, SequencerState::Cancelling(info(1)));
        assert!(!cancelling.may_continue(SessionId(1)));

        let idle = cancelling.transition(SequencerEvent::Stopped(SessionId(1)));
        assert!(idle.is_idle());
    }

    #[test]
    fn test_failure_returns_to_idle() {
        for state in [SequencerState::Uploading(info(3)), SequencerState::Cancelling(info(3))] {
            assert!(state.transition(SequencerEvent::Failed(SessionId(3))).is_idle());
            assert_eq!(state.transition(SequencerEvent::Failed(SessionId(4))), state);
        }
    }

    #[test]
    fn test_force_idle_from_any_state() {
        let states = [
            SequencerState::Idle,
            SequencerState::Uploading(info(1)),
            SequencerState::Cancelling(info(1)),
        ];
        for state in states {
            assert!(state.transition(SequencerEvent::ForceIdle).is_idle());
        }
    }

    #[test]
    fn test_stale_session_cannot_end_successor() {
        // Session 1 was forced idle and session 2 started
        let state = SequencerState::Uploading(info(2));
        assert_eq!(state.transition(SequencerEvent::Finished(SessionId(1))), state);
        assert_eq!(state.transition(SequencerEvent::Stopped(SessionId(1))), state);
    }

    #[test]
    fn test_stop_only_applies_to_running_session() {
        assert!(SequencerState::Idle
            .transition(SequencerEvent::StopRequested)
            .is_idle());
        assert!(SequencerState::Uploading(info(1))
            .transition(SequencerEvent::Stopped(SessionId(1)))
            .may_continue(SessionId(1)));
    }
}
