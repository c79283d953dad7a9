use std::collections::HashMap;
use super::containers::{ClassifiedPacket, FlowKey, FlowRecord, Transport};

/// Running totals, logged when capture ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub observed: u64,
    pub initiations: u64,
    pub emitted: u64,
    pub absorbed: u64,
}

/// Connection table plus the per-protocol admission rules.
///
/// TCP entries live from the SYN until the first bare ACK on the same key, which
/// reports the flow and removes it. UDP entries are created and reported on first
/// sight and are never removed, so a UDP key is reported at most once per run.
/// Nothing here errors: packets that match no rule are counted and dropped.
#[derive(Debug)]
pub struct FlowTracker {
    table: HashMap<FlowKey, FlowRecord>,
    track_udp: bool,
    stats: TrackerStats,
}

impl FlowTracker {
    pub fn new(track_udp: bool) -> Self {
        Self {
            table: HashMap::new(),
            track_udp,
            stats: TrackerStats::default(),
        }
    }

    /// Feeds one packet through the state machine, returning the record to report, if any.
    pub fn observe(&mut self, packet: &ClassifiedPacket) -> Option<FlowRecord> {
        self.stats.observed += 1;
        let key = packet.key();

        let emitted = match packet.transport {
            Transport::Tcp { flags, .. } if flags.is_initiation() => {
                // A repeated SYN just replaces the pending entry
                log::debug!("Pending {key}");
                self.table.insert(key, FlowRecord::from(&key));
                self.stats.initiations += 1;
                None
            }
            Transport::Tcp { flags, .. } if flags.is_bare_ack() => {
                let record = self.table.remove(&key);
                if record.is_some() {
                    log::debug!("Handshake completed {key}");
                }
                record
            }
            Transport::Tcp { .. } => None,
            Transport::Udp { .. } if !self.track_udp => None,
            Transport::Udp { .. } => {
                if self.table.contains_key(&key) {
                    None
                } else {
                    log::debug!("First sight {key}");
                    let record = FlowRecord::from(&key);
                    self.table.insert(key, record.clone());
                    Some(record)
                }
            }
        };

        match emitted {
            Some(_) => self.stats.emitted += 1,
            None => self.stats.absorbed += 1,
        }
        emitted
    }

    #[cfg(test)]
    pub fn is_tracked(&self, key: &FlowKey) -> bool {
        self.table.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }
}
