//! Property tests for the temporal windower

use proptest::prelude::*;
use zenith_algorithms::{TemporalWindow, WindowIndex};

/// Non-decreasing timestamps built from a start time and non-negative gaps
fn timestamps() -> impl Strategy<Value = Vec<i64>> {
    (-1_000i64..1_000, prop::collection::vec(0i64..20, 1..200)).prop_map(|(start, gaps)| {
        gaps.iter()
            .scan(start, |time, gap| {
                *time += gap;
                Some(*time)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn offsets_match_definition(
        timestamps in timestamps(),
        step_size in 1i64..25,
        window_size in 1i64..40
    ) {
        let index = WindowIndex::new(&timestamps, step_size, window_size).unwrap();
        let min = timestamps[0];
        let max = *timestamps.last().unwrap();

        prop_assert_eq!(index.num_steps() as i64, (max - min) / step_size);
        prop_assert_eq!(index.end_offsets().len(), index.num_steps());

        for i in 0..index.num_steps() {
            let start_threshold = min + i as i64 * step_size;
            let end_threshold = start_threshold + window_size;
            prop_assert_eq!(
                index.start_offsets()[i],
                timestamps.partition_point(|&t| t < start_threshold)
            );
            prop_assert_eq!(
                index.end_offsets()[i],
                timestamps.partition_point(|&t| t < end_threshold)
            );
            prop_assert!(index.start_offsets()[i] <= index.end_offsets()[i]);
        }

        for pair in index.start_offsets().windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        for pair in index.end_offsets().windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert!(index.end_offsets().iter().all(|&o| o <= timestamps.len()));
    }

    #[test]
    fn playback_loops_and_ranges_stay_in_bounds(
        timestamps in timestamps(),
        step_size in 1i64..10,
        window_size in 1i64..30,
        window_steps in 1usize..50
    ) {
        let index = WindowIndex::new(&timestamps, step_size, window_size).unwrap();
        let num_steps = index.num_steps();
        let mut window = TemporalWindow::new(index);
        window.set_window_steps(window_steps);
        window.advance(0);

        for _ in 0..num_steps {
            let range = window.visible_range();
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= timestamps.len());
            window.advance(1);
        }
        prop_assert_eq!(window.current_step(), 0);
    }

    #[test]
    fn advance_zero_is_idempotent(
        timestamps in timestamps(),
        step_size in 1i64..10,
        window_size in 1i64..30,
        current_step in 0usize..400,
        window_steps in 0usize..400
    ) {
        let index = WindowIndex::new(&timestamps, step_size, window_size).unwrap();
        let mut window = TemporalWindow::new(index);
        window.set_current_step(current_step);
        window.set_window_steps(window_steps);
        window.advance(0);
        let snapshot = window.clone();

        for _ in 0..5 {
            window.advance(0);
            prop_assert_eq!(&window, &snapshot);
        }
    }
}
