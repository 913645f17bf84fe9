use serde::{Deserialize, Serialize};

/// Upper bound of the progress percentage
pub const MAX_PERCENT: f64 = 100.0;

/// Status label shown while a request is being dispatched
pub const STARTING_STATUS: &str = "Starting...";

/// Progress of one generation request.
///
/// `percent` never decreases over the life of a request. `total == 0` means
/// the service has not (yet) reported chunking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Percentage in `[0, 100]`
    pub percent: f64,
    /// Free-text status label
    pub status: String,
    /// Chunk currently being processed
    pub current: u64,
    /// Number of chunks, 0 when unknown
    pub total: u64,
}

impl ProgressState {
    /// State at the start of a request
    pub fn starting() -> Self {
        Self {
            status: STARTING_STATUS.to_string(),
            ..Self::default()
        }
    }

    /// Fold a progress report into this state.
    ///
    /// Absent fields keep their previous value; the percentage is clamped to
    /// `[0, 100]` and never goes backwards.
    pub fn merge(
        &self,
        percent: f64,
        status: Option<String>,
        current: Option<u64>,
        total: Option<u64>,
    ) -> Self {
        let clamped = if percent.is_nan() {
            self.percent
        } else {
            percent.clamp(0.0, MAX_PERCENT)
        };
        Self {
            percent: clamped.max(self.percent),
            status: status.unwrap_or_else(|| self.status.clone()),
            current: current.unwrap_or(self.current),
            total: total.unwrap_or(self.total),
        }
    }

    /// Whether the service split the input into more than one chunk
    pub fn is_chunked(&self) -> bool {
        self.total > 1
    }

    /// `Chunk 2 of 4` style label, only for chunked requests
    pub fn chunk_label(&self) -> Option<String> {
        self.is_chunked()
            .then(|| format!("Chunk {} of {}", self.current, self.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_previous_values_for_absent_fields() {
        let state = ProgressState::starting().merge(10.0, Some("Processing chunk 1 of 4".into()), Some(1), Some(4));
        let next = state.merge(35.0, None, None, None);

        assert_eq!(next.percent, 35.0);
        assert_eq!(next.status, "Processing chunk 1 of 4");
        assert_eq!(next.current, 1);
        assert_eq!(next.total, 4);
    }

    #[test]
    fn test_percent_is_monotonic_and_clamped() {
        let state = ProgressState::default().merge(60.0, None, None, None);
        assert_eq!(state.merge(20.0, None, None, None).percent, 60.0);
        assert_eq!(state.merge(250.0, None, None, None).percent, 100.0);
        assert_eq!(ProgressState::default().merge(-5.0, None, None, None).percent, 0.0);
    }

    #[test]
    fn test_chunk_label_only_when_chunked() {
        let single = ProgressState::default().merge(50.0, None, Some(1), Some(1));
        assert_eq!(single.chunk_label(), None);

        let chunked = ProgressState::default().merge(50.0, None, Some(2), Some(4));
        assert_eq!(chunked.chunk_label().as_deref(), Some("Chunk 2 of 4"));
    }
}
