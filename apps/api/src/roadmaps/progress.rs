use crate::errors::AppError;
use crate::models::roadmap::{RoadmapStep, StepStatus};

/// Records progress on one step. Completing a step unlocks the next one.
///
/// Only `steps[index]` and, on completion, `steps[index + 1]` are touched.
/// Earlier steps are not re-checked, so completing out of order is allowed.
pub fn advance(
    steps: &mut [RoadmapStep],
    index: i64,
    status: StepStatus,
    score: Option<f64>,
) -> Result<(), AppError> {
    let i = usize::try_from(index)
        .ok()
        .filter(|i| *i < steps.len())
        .ok_or_else(|| AppError::Validation("Invalid step index".into()))?;

    let step = &mut steps[i];
    step.status = status;
    if let Some(score) = score {
        step.quiz_score = Some(score);
    }

    if status == StepStatus::Completed {
        if let Some(next) = steps.get_mut(i + 1) {
            next.status = StepStatus::InProgress;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    fn steps(n: usize) -> Vec<RoadmapStep> {
        (0..n)
            .map(|i| RoadmapStep {
                title: Some(format!("Step {i}")),
                status: StepStatus::NotStarted,
                quiz_score: None,
                extra: Map::new(),
            })
            .collect()
    }

    #[test]
    fn test_completing_unlocks_next() {
        let mut s = steps(3);
        advance(&mut s, 0, StepStatus::Completed, Some(90.0)).unwrap();
        assert_eq!(s[0].status, StepStatus::Completed);
        assert_eq!(s[0].quiz_score, Some(90.0));
        assert_eq!(s[1].status, StepStatus::InProgress);
        assert_eq!(s[2].status, StepStatus::NotStarted);
    }

    #[test]
    fn test_completing_last_step() {
        let mut s = steps(2);
        advance(&mut s, 1, StepStatus::Completed, None).unwrap();
        assert_eq!(s[1].status, StepStatus::Completed);
        assert_eq!(s[0].status, StepStatus::NotStarted);
    }

    #[test]
    fn test_in_progress_does_not_unlock() {
        let mut s = steps(2);
        advance(&mut s, 0, StepStatus::InProgress, None).unwrap();
        assert_eq!(s[1].status, StepStatus::NotStarted);
        assert_eq!(s[0].quiz_score, None);
    }

    #[test]
    fn test_missing_score_keeps_previous() {
        let mut s = steps(2);
        advance(&mut s, 0, StepStatus::InProgress, Some(40.0)).unwrap();
        advance(&mut s, 0, StepStatus::Completed, None).unwrap();
        assert_eq!(s[0].quiz_score, Some(40.0));
    }

    #[test]
    fn test_index_bounds() {
        let mut s = steps(2);
        assert!(advance(&mut s, 2, StepStatus::Completed, None).is_err());
        assert!(advance(&mut s, -1, StepStatus::Completed, None).is_err());
        assert!(advance(&mut [], 0, StepStatus::Completed, None).is_err());
        assert!(s.iter().all(|st| st.status == StepStatus::NotStarted));
    }
}
