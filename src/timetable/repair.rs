//! Non-monotonic stop-time repair.
//!
//! Some feeds encode a rolling-stock rotation as a single trip: the
//! outbound leg, then the return the same vehicle performs the next day,
//! with the clock jumping backward by many hours in between. The repair
//! splits such trips at backward jumps, re-merges compatible segments, and
//! keeps the longest consistent piece otherwise, so the query engine only
//! ever sees trips whose times are non-decreasing.

use crate::domain::StopTime;

/// A clock step backward by more than this is a rotation boundary rather
/// than schedule noise. Experimental constant.
const BACKWARD_JUMP_SECS: i32 = 10 * 60;

/// Repair a trip's stop times into a canonical non-decreasing sequence.
///
/// Input is `(stop_sequence, stop_time)` pairs in any order; output is the
/// surviving stop times, sorted by time. An empty input yields an empty
/// output (the caller drops such trips).
pub fn repair_stop_times(mut raw: Vec<(u32, StopTime)>) -> Vec<StopTime> {
    if raw.is_empty() {
        return Vec::new();
    }

    // 1. File order is not trustworthy; sequence numbers are.
    raw.sort_by_key(|(seq, _)| *seq);

    // 2. Split at every backward jump beyond the threshold.
    let mut segments: Vec<Vec<StopTime>> = Vec::new();
    let mut current: Vec<StopTime> = Vec::new();
    for (_, st) in raw {
        if let Some(prev) = current.last() {
            if st.arrival_time - prev.departure_time < -BACKWARD_JUMP_SECS {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(st);
    }
    segments.push(current);

    // 3. Order segments by their first time, then re-concatenate adjacent
    // segments whose boundary is consistent: the next segment may start at
    // most 10 minutes before the previous one ended.
    segments.sort_by_key(|seg| seg[0].arrival_time);
    let mut merged: Vec<Vec<StopTime>> = Vec::new();
    for seg in segments {
        match merged.last_mut() {
            Some(prev)
                if seg[0].arrival_time - prev[prev.len() - 1].departure_time
                    >= -BACKWARD_JUMP_SECS =>
            {
                prev.extend(seg);
            }
            _ => merged.push(seg),
        }
    }

    // 4. If pieces remain non-mergeable, keep the longest.
    let mut best = merged
        .into_iter()
        .max_by_key(|seg| seg.len())
        .unwrap_or_default();

    // 5. Concatenation can leave sequence numbers out of order; the
    // canonical trip is ordered by time.
    best.sort_by_key(|st| (st.arrival_time, st.departure_time));
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayTime, StopId};

    fn st(stop: &str, time: &str) -> StopTime {
        let t = DayTime::parse(time).unwrap();
        StopTime {
            stop_id: StopId::from_raw(stop),
            arrival_time: t,
            departure_time: t,
        }
    }

    fn assert_non_decreasing(times: &[StopTime]) {
        for pair in times.windows(2) {
            assert!(
                pair[1].arrival_time >= pair[0].departure_time,
                "times go backward: {:?} then {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn well_formed_trip_is_unchanged() {
        let raw = vec![
            (1, st("TI:a", "11:36:00")),
            (2, st("TI:b", "12:22:00")),
            (3, st("TI:c", "13:11:00")),
        ];
        let repaired = repair_stop_times(raw.clone());
        assert_eq!(
            repaired,
            raw.into_iter().map(|(_, s)| s).collect::<Vec<_>>()
        );
    }

    #[test]
    fn unsorted_sequence_numbers_are_sorted_first() {
        let raw = vec![
            (3, st("TI:c", "13:11:00")),
            (1, st("TI:a", "11:36:00")),
            (2, st("TI:b", "12:22:00")),
        ];
        let repaired = repair_stop_times(raw);
        assert_eq!(repaired[0].stop_id, StopId::from_raw("TI:a"));
        assert_non_decreasing(&repaired);
    }

    #[test]
    fn rotation_is_split_and_reordered() {
        // Outbound (3 stops), then the next day's return (2 stops) encoded
        // in the same trip with the clock jumping back between seq 38 and
        // 39. The segments are time-disjoint, so ordered by first time
        // they are boundary-consistent and recombine.
        let raw = vec![
            (5, st("TI:a", "11:36:00")),
            (24, st("TI:b", "12:22:00")),
            (38, st("TI:c", "13:11:00")),
            (39, st("TI:d", "6:30:00")),
            (90, st("TI:e", "8:31:00")),
        ];
        let repaired = repair_stop_times(raw);

        assert_non_decreasing(&repaired);
        assert_eq!(repaired[0].stop_id, StopId::from_raw("TI:d"));
        assert_eq!(repaired.last().unwrap().stop_id, StopId::from_raw("TI:c"));
    }

    #[test]
    fn overlapping_segments_keep_longest() {
        // Two segments covering overlapping time windows cannot be
        // concatenated; the longer one survives.
        let raw = vec![
            (1, st("TI:a", "11:00:00")),
            (2, st("TI:b", "12:00:00")),
            (3, st("TI:c", "13:00:00")),
            (4, st("TI:x", "11:30:00")),
            (5, st("TI:y", "12:30:00")),
        ];
        let repaired = repair_stop_times(raw);

        assert_eq!(repaired.len(), 3);
        assert_eq!(repaired[0].stop_id, StopId::from_raw("TI:a"));
        assert_eq!(repaired[2].stop_id, StopId::from_raw("TI:c"));
        assert_non_decreasing(&repaired);
    }

    #[test]
    fn compatible_segments_are_recombined() {
        // A small backward jump at the boundary (8 min) splits nothing;
        // a large one (2 h) splits, but the segments ordered by time are
        // boundary-consistent and re-concatenate.
        let raw = vec![
            (1, st("TI:c", "13:00:00")),
            (2, st("TI:d", "14:00:00")),
            (3, st("TI:a", "10:00:00")),
            (4, st("TI:b", "11:00:00")),
        ];
        let repaired = repair_stop_times(raw);

        assert_eq!(repaired.len(), 4);
        assert_eq!(repaired[0].stop_id, StopId::from_raw("TI:a"));
        assert_eq!(repaired[3].stop_id, StopId::from_raw("TI:d"));
        assert_non_decreasing(&repaired);
    }

    #[test]
    fn small_backward_jitter_does_not_split() {
        // 5 minutes backward is under the threshold: kept as-is, then
        // sorted by time at the end.
        let raw = vec![
            (1, st("SNCF:a", "10:00:00")),
            (2, st("SNCF:b", "9:56:00")),
            (3, st("SNCF:c", "10:30:00")),
        ];
        let repaired = repair_stop_times(raw);
        assert_eq!(repaired.len(), 3);
        assert_non_decreasing(&repaired);
    }

    #[test]
    fn empty_input() {
        assert!(repair_stop_times(Vec::new()).is_empty());
    }
}
