//! Growth-stage timeline: map days since sowing to the current stage.

use chrono::NaiveDate;
use serde::Serialize;

use crate::flows::guidance::CropGuidance;

/// Where a crop sits in its growth lifecycle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StagePosition {
    /// Index into the guidance plan's stage list.
    pub stage_index: usize,
    pub stage_name: String,
    /// Whole days since the sowing date.
    pub days_elapsed: u32,
    /// Days spent inside the current stage.
    pub days_into_stage: u32,
    /// The current stage's planned duration.
    pub stage_duration_days: u32,
    /// Fraction of the whole plan completed, clamped to [0, 1].
    pub progress: f32,
}

/// Index of the stage covering `elapsed_days`.
///
/// The first stage whose cumulative duration exceeds the elapsed days wins;
/// at an exact cumulative boundary the next stage is selected. Past the end
/// of the table the final stage is returned. `None` only for an empty table.
pub fn stage_index(durations: &[u32], elapsed_days: u32) -> Option<usize> {
    if durations.is_empty() {
        return None;
    }
    let mut cumulative = 0u32;
    for (i, d) in durations.iter().enumerate() {
        cumulative = cumulative.saturating_add(*d);
        if elapsed_days < cumulative {
            return Some(i);
        }
    }
    Some(durations.len() - 1)
}

/// Compute the crop's position in its guidance plan as of `today`.
///
/// Returns `None` when the plan has no stages or sowing is in the future.
pub fn position(guidance: &CropGuidance, sowing_date: NaiveDate, today: NaiveDate) -> Option<StagePosition> {
    let elapsed = today.signed_duration_since(sowing_date).num_days();
    if elapsed < 0 {
        return None;
    }
    let elapsed = elapsed as u32;

    let durations: Vec<u32> = guidance.stages.iter().map(|s| s.duration_days).collect();
    let index = stage_index(&durations, elapsed)?;

    let before: u32 = durations[..index].iter().sum();
    let total: u32 = durations.iter().sum();
    let stage = &guidance.stages[index];

    let days_into_stage = elapsed.saturating_sub(before);
    let progress = if total == 0 {
        0.0
    } else {
        (elapsed as f32 / total as f32).min(1.0)
    };

    Some(StagePosition {
        stage_index: index,
        stage_name: stage.name.clone(),
        days_elapsed: elapsed,
        days_into_stage,
        stage_duration_days: stage.duration_days,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::guidance::GuidanceStage;

    fn stage(name: &str, duration_days: u32) -> GuidanceStage {
        GuidanceStage {
            name: name.to_string(),
            duration_days,
            tasks: vec![],
            tips: vec![],
        }
    }

    fn plan() -> CropGuidance {
        CropGuidance {
            crop_name: "tomato".to_string(),
            stages: vec![
                stage("Germination", 5),
                stage("Seedling", 20),
                stage("Vegetative Growth", 40),
                stage("Flowering", 30),
                stage("Fruiting", 15),
            ],
        }
    }

    #[test]
    fn day_47_falls_in_third_stage() {
        // Cumulative bounds: [5, 25, 65, 95, 110]. 47 < 65 first at index 2.
        assert_eq!(stage_index(&[5, 20, 40, 30, 15], 47), Some(2));
    }

    #[test]
    fn every_day_inside_a_window_maps_to_that_stage() {
        let durations = [5, 20, 40, 30, 15];
        for day in 0..5 {
            assert_eq!(stage_index(&durations, day), Some(0), "day {day}");
        }
        for day in 5..25 {
            assert_eq!(stage_index(&durations, day), Some(1), "day {day}");
        }
        for day in 25..65 {
            assert_eq!(stage_index(&durations, day), Some(2), "day {day}");
        }
        for day in 65..95 {
            assert_eq!(stage_index(&durations, day), Some(3), "day {day}");
        }
        for day in 95..110 {
            assert_eq!(stage_index(&durations, day), Some(4), "day {day}");
        }
    }

    #[test]
    fn exact_boundary_selects_next_stage() {
        let durations = [5, 20, 40, 30, 15];
        assert_eq!(stage_index(&durations, 5), Some(1));
        assert_eq!(stage_index(&durations, 25), Some(2));
        assert_eq!(stage_index(&durations, 65), Some(3));
    }

    #[test]
    fn beyond_all_durations_returns_final_stage() {
        let durations = [5, 20, 40, 30, 15];
        assert_eq!(stage_index(&durations, 110), Some(4));
        assert_eq!(stage_index(&durations, 400), Some(4));
    }

    #[test]
    fn empty_table_has_no_stage() {
        assert_eq!(stage_index(&[], 10), None);
    }

    #[test]
    fn position_reports_days_into_stage() {
        let sowing = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let today = sowing + chrono::Days::new(47);
        let pos = position(&plan(), sowing, today).unwrap();
        assert_eq!(pos.stage_index, 2);
        assert_eq!(pos.stage_name, "Vegetative Growth");
        assert_eq!(pos.days_elapsed, 47);
        // 47 elapsed − 25 before the stage.
        assert_eq!(pos.days_into_stage, 22);
        assert_eq!(pos.stage_duration_days, 40);
        assert!((pos.progress - 47.0 / 110.0).abs() < 1e-6);
    }

    #[test]
    fn position_past_plan_end_clamps_progress() {
        let sowing = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let today = sowing + chrono::Days::new(365);
        let pos = position(&plan(), sowing, today).unwrap();
        assert_eq!(pos.stage_name, "Fruiting");
        assert_eq!(pos.progress, 1.0);
    }

    #[test]
    fn future_sowing_yields_none() {
        let sowing = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        assert!(position(&plan(), sowing, today).is_none());
    }
}
