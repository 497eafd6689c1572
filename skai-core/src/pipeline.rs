//! The five-stage analysis pipeline.
//!
//! Tracks which stage is active and which are completed. Navigation is free:
//! any stage can be made active directly, without checking that earlier
//! stages finished. Completion only ever moves forward by one.

use serde::Serialize;
use thiserror::Error;

/// One step of the disaster-response workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Upload,
    Enhance,
    Analyze,
    Summarize,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Upload,
        Stage::Enhance,
        Stage::Analyze,
        Stage::Summarize,
        Stage::Report,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Upload => "Upload Images",
            Stage::Enhance => "GAN Enhancement",
            Stage::Analyze => "SKAI Analysis",
            Stage::Summarize => "AI Summary",
            Stage::Report => "Generate Report",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Upload => "Pre & Post Disaster",
            Stage::Enhance => "Image Processing",
            Stage::Analyze => "Damage Detection",
            Stage::Summarize => "Damage Assessment",
            Stage::Report => "Final Output",
        }
    }

    /// Whether the stage has nothing meaningful to show without images.
    pub fn requires_images(self) -> bool {
        matches!(self, Stage::Enhance | Stage::Analyze)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Why a stage cannot run yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnmetPrecondition {
    #[error("no images have been uploaded")]
    NoImages,
    #[error("{required} is not the active stage (active: {active})")]
    StageNotActive { required: Stage, active: Stage },
    #[error("no report formats selected")]
    NoFormatsSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
}

/// Stage statuses plus the active-index pointer.
///
/// The pointer is always a valid index. At most one stage is `Active`; after
/// the final stage completes, none is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    statuses: [StageStatus; Stage::COUNT],
    active: usize,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    /// Stage 0 active, everything else pending.
    pub fn new() -> Self {
        let mut statuses = [StageStatus::Pending; Stage::COUNT];
        statuses[0] = StageStatus::Active;
        Self {
            statuses,
            active: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_stage(&self) -> Stage {
        Stage::ALL[self.active]
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.statuses[stage.index()]
    }

    /// All stages with their status, in order.
    pub fn snapshot(&self) -> Vec<(Stage, StageStatus)> {
        Stage::ALL
            .iter()
            .map(|&s| (s, self.statuses[s.index()]))
            .collect()
    }

    /// The last stage is completed; further completions change nothing.
    pub fn is_terminal(&self) -> bool {
        self.active == Stage::COUNT - 1 && self.statuses[self.active] == StageStatus::Completed
    }

    /// Point at `index` directly. Out-of-range requests are ignored and
    /// return `false`.
    ///
    /// The previously active stage goes back to `Pending`. Stages skipped
    /// over are not marked completed, and a completed target is reopened.
    pub fn advance_to(&mut self, index: usize) -> bool {
        if index >= Stage::COUNT {
            tracing::debug!(index, "Ignoring out-of-range stage navigation");
            return false;
        }

        if self.statuses[self.active] == StageStatus::Active {
            self.statuses[self.active] = StageStatus::Pending;
        }
        self.active = index;
        self.statuses[index] = StageStatus::Active;
        tracing::debug!(stage = %self.active_stage(), "Navigated to stage");
        true
    }

    /// Mark the active stage completed and activate the next one.
    ///
    /// On the last stage only the completion is recorded; the pointer stays.
    pub fn complete_current_and_advance(&mut self) {
        let finished = self.active_stage();
        self.statuses[self.active] = StageStatus::Completed;

        if self.active + 1 < Stage::COUNT {
            self.active += 1;
            self.statuses[self.active] = StageStatus::Active;
        }

        tracing::debug!(
            completed = %finished,
            active = %self.active_stage(),
            "Stage completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_single_active(state: &PipelineState) {
        let active = state
            .snapshot()
            .iter()
            .filter(|(_, s)| *s == StageStatus::Active)
            .count();
        assert!(active <= 1, "{active} stages active");
    }

    #[test]
    fn test_initial_state() {
        let state = PipelineState::new();
        assert_eq!(state.active_index(), 0);
        assert_eq!(state.status(Stage::Upload), StageStatus::Active);
        for stage in &Stage::ALL[1..] {
            assert_eq!(state.status(*stage), StageStatus::Pending);
        }
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_four_completions_reach_report() {
        let mut state = PipelineState::new();
        for _ in 0..4 {
            state.complete_current_and_advance();
            assert_single_active(&state);
        }

        assert_eq!(state.active_index(), 4);
        for stage in &Stage::ALL[..4] {
            assert_eq!(state.status(*stage), StageStatus::Completed);
        }
        assert_eq!(state.status(Stage::Report), StageStatus::Active);

        state.complete_current_and_advance();
        assert_eq!(state.active_index(), 4);
        assert_eq!(state.status(Stage::Report), StageStatus::Completed);
        assert!(state.is_terminal());

        let terminal = state.clone();
        state.complete_current_and_advance();
        assert_eq!(state, terminal);
    }

    #[test]
    fn test_out_of_range_navigation_is_ignored() {
        let mut state = PipelineState::new();
        state.complete_current_and_advance();
        let before = state.clone();

        assert!(!state.advance_to(5));
        assert!(!state.advance_to(usize::MAX));
        assert_eq!(state, before);
    }

    #[test]
    fn test_free_navigation_does_not_imply_completion() {
        let mut state = PipelineState::new();
        assert!(state.advance_to(3));

        assert_eq!(state.active_stage(), Stage::Summarize);
        assert_eq!(state.status(Stage::Upload), StageStatus::Pending);
        assert_eq!(state.status(Stage::Enhance), StageStatus::Pending);
        assert_eq!(state.status(Stage::Summarize), StageStatus::Active);
        assert_single_active(&state);
    }

    #[test]
    fn test_navigating_back_reopens_completed_stage() {
        let mut state = PipelineState::new();
        state.complete_current_and_advance();
        state.complete_current_and_advance();

        state.advance_to(1);
        assert_eq!(state.status(Stage::Upload), StageStatus::Completed);
        assert_eq!(state.status(Stage::Enhance), StageStatus::Active);
        assert_eq!(state.status(Stage::Analyze), StageStatus::Pending);

        state.complete_current_and_advance();
        assert_eq!(state.active_stage(), Stage::Analyze);
    }

    #[test]
    fn test_navigating_away_from_terminal_keeps_completion() {
        let mut state = PipelineState::new();
        for _ in 0..5 {
            state.complete_current_and_advance();
        }
        state.advance_to(0);
        assert_eq!(state.status(Stage::Report), StageStatus::Completed);
        assert_eq!(state.status(Stage::Upload), StageStatus::Active);
    }

    #[test]
    fn test_reset() {
        let mut state = PipelineState::new();
        state.advance_to(4);
        state.reset();
        assert_eq!(state, PipelineState::new());
    }

    #[test]
    fn test_stage_index_round_trip() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
            assert_eq!(Stage::from_index(i), Some(*stage));
        }
        assert_eq!(Stage::from_index(5), None);
    }
}
