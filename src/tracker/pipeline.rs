use std::io::Write;
use crate::error::Error;
use crate::ui::output::Reporter;
use super::classify::classify;
use super::containers::FlowRecord;
use super::core::FlowTracker;
use super::filter::AddressFilter;
use super::utils::Dissection;

/// One frame at a time: classify, filter, track, report.
pub struct Pipeline<W: Write> {
    filter: AddressFilter,
    tracker: FlowTracker,
    reporter: Reporter<W>,
    frames: u64,
    skipped: u64,
    filtered: u64,
}

impl<W: Write> Pipeline<W> {
    pub fn new(filter: AddressFilter, tracker: FlowTracker, reporter: Reporter<W>) -> Self {
        Self {
            filter,
            tracker,
            reporter,
            frames: 0,
            skipped: 0,
            filtered: 0,
        }
    }

    /// Runs a frame through every stage. Returns the flow that was reported, if any.
    ///
    /// Only a failed write is an error; frames that can't be classified are skipped.
    pub fn process(&mut self, frame: &impl Dissection) -> Result<Option<FlowRecord>, Error> {
        self.frames += 1;

        let Some(packet) = classify(frame) else {
            self.skipped += 1;
            return Ok(None);
        };

        if self.filter.should_drop(packet.src, packet.dst) {
            log::trace!("Filtered public traffic {} -> {}", packet.src, packet.dst);
            self.filtered += 1;
            return Ok(None);
        }

        let Some(record) = self.tracker.observe(&packet) else {
            return Ok(None);
        };
        self.reporter.report(&record)?;
        Ok(Some(record))
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &FlowTracker {
        &self.tracker
    }

    pub fn log_summary(&self) {
        let stats = self.tracker.stats();
        log::info!(
            "Processed {} frames: {} skipped, {} filtered, {} tracked ({} SYNs, {} absorbed), {} connections reported, {} flows still in table",
            self.frames,
            self.skipped,
            self.filtered,
            stats.observed,
            stats.initiations,
            stats.absorbed,
            stats.emitted,
            self.tracker.len()
        );
    }

    #[cfg(test)]
    pub fn into_reporter(self) -> Reporter<W> {
        self.reporter
    }
}
