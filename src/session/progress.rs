//! Upload progress reporting

use super::controller::Shared;
use super::SessionState;

/// Highest value a collaborator can report; only the session sets `PROGRESS_DONE`.
pub const PROGRESS_CAP: u8 = 99;
pub const PROGRESS_DONE: u8 = 100;

/// Handed to the upload collaborator. Reports are clamped so progress never
/// goes backwards and never reaches completion before the upload resolves.
#[derive(Clone)]
pub struct ProgressReporter {
    shared: Shared,
    epoch: u64,
}

impl ProgressReporter {
    pub(crate) fn new(shared: Shared, epoch: u64) -> Self {
        Self { shared, epoch }
    }

    /// A reporter wired to nothing, for driving uploaders outside a session.
    pub fn detached() -> Self {
        Self { shared: Shared::detached(), epoch: 0 }
    }

    pub fn report_percent(&self, percent: u8) {
        let value = percent.min(PROGRESS_CAP);
        self.shared.update(|inner| {
            if inner.epoch != self.epoch || inner.state != SessionState::Uploading {
                return false;
            }
            if value <= inner.progress {
                return false;
            }
            inner.progress = value;
            true
        });
    }

    pub fn report_fraction(&self, done: u64, total: u64) {
        let percent = if total == 0 {
            0
        } else {
            (u128::from(done.min(total)) * 100 / u128::from(total)) as u8
        };
        self.report_percent(percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_reporter_is_inert() {
        let reporter = ProgressReporter::detached();
        reporter.report_percent(50);
        reporter.report_fraction(10, 0);
        assert_eq!(reporter.shared.lock().progress, 0);
    }

    #[test]
    fn fraction_handles_huge_totals() {
        let shared = Shared::detached();
        shared.update(|inner| {
            inner.state = SessionState::Uploading;
            true
        });
        let reporter = ProgressReporter::new(shared.clone(), 0);

        reporter.report_fraction(u64::MAX / 2, u64::MAX);
        assert_eq!(shared.lock().progress, 49);
        reporter.report_fraction(u64::MAX, u64::MAX);
        assert_eq!(shared.lock().progress, PROGRESS_CAP);
    }
}
