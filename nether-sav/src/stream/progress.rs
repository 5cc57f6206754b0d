//! Advisory progress reporting

use std::fmt;

use tracing::info;

/// Stage of an encode session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressPhase {
    Header,
    Objects,
    Entities,
    Finalizing,
    Done,
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgressPhase::Header => "header",
            ProgressPhase::Objects => "objects",
            ProgressPhase::Entities => "entities",
            ProgressPhase::Finalizing => "finalizing",
            ProgressPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Receives progress updates. Never affects the encoded output.
pub trait Progress {
    fn report(&mut self, phase: ProgressPhase, message: &str, percent: u8);
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _phase: ProgressPhase, _message: &str, _percent: u8) {}
}

/// Logs each update at info level, skipping repeats of the same percentage
#[derive(Debug, Default)]
pub struct TracingProgress {
    last: Option<(ProgressPhase, u8)>,
}

impl Progress for TracingProgress {
    fn report(&mut self, phase: ProgressPhase, message: &str, percent: u8) {
        if self.last == Some((phase, percent)) {
            return;
        }
        self.last = Some((phase, percent));
        info!(%phase, percent, "{message}");
    }
}

impl<F> Progress for F
where
    F: FnMut(ProgressPhase, &str, u8),
{
    fn report(&mut self, phase: ProgressPhase, message: &str, percent: u8) {
        self(phase, message, percent)
    }
}

/// Percentage reported while streaming.
///
/// The objects pass spans 0-48 and the entities pass 48-96, leaving the rest
/// for finalization. Every level takes an equal slice of each band, so the
/// values rise monotonically within a phase.
pub(crate) fn stream_percent(
    level: usize,
    levels: usize,
    pass: usize,
    done: usize,
    total: usize,
) -> u8 {
    const BAND: f64 = 48.0;

    let fraction = if total == 0 {
        1.0
    } else {
        done.min(total) as f64 / total as f64
    };
    let within = BAND * (level as f64 + fraction) / levels.max(1) as f64;
    let base = if pass == 0 { 0.0 } else { BAND };
    (base + within.clamp(0.0, BAND)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_phases() {
        assert_eq!(stream_percent(0, 1, 0, 0, 10), 0);
        assert_eq!(stream_percent(0, 1, 0, 10, 10), 48);
        assert_eq!(stream_percent(0, 1, 1, 5, 10), 72);
        assert_eq!(stream_percent(0, 1, 1, 10, 10), 96);
    }

    #[test]
    fn test_phase_bands_across_levels() {
        for pass in 0..2 {
            let (low, high) = if pass == 0 { (0, 48) } else { (48, 96) };
            let mut last = low;
            for level in 0..3 {
                for done in 0..=4 {
                    let percent = stream_percent(level, 3, pass, done, 4);
                    assert!((low..=high).contains(&percent), "{percent} outside {low}..={high}");
                    assert!(percent >= last);
                    last = percent;
                }
            }
            assert_eq!(last, high);
        }
    }

    #[test]
    fn test_empty_level_counts_as_done() {
        assert_eq!(stream_percent(0, 2, 0, 0, 0), 24);
        assert_eq!(stream_percent(1, 2, 1, 0, 0), 96);
    }

    #[test]
    fn test_closure_progress() {
        let mut seen = Vec::new();
        {
            let mut sink = |phase: ProgressPhase, _: &str, percent: u8| seen.push((phase, percent));
            sink.report(ProgressPhase::Objects, "batch 1", 10);
            sink.report(ProgressPhase::Done, "done", 100);
        }
        assert_eq!(
            seen,
            vec![(ProgressPhase::Objects, 10), (ProgressPhase::Done, 100)]
        );
    }
}
