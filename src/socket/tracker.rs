//! Lifecycle of the sockets that matched a registration.
//!
//! Every poll tags the entries it touches with the current generation. Whatever still carries
//! an older generation once all rows are processed was not in the file this time, i.e. the
//! socket was closed or its registration was withdrawn, and is purged.

use std::net::SocketAddrV4;

use super::candidate::Candidates;
use super::handler::{SocketLifecycleListener, SocketStatistics, SocketStatisticsHandler};
use crate::decoder::SocketRow;
use crate::identifier::SocketIdentifier;
use crate::table::FixedKeyTable;

const KEY_LEN: usize = 16;

/// Instance identifier plus the full inode, which the identifier only keeps 16 bits of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InstanceKey {
    identifier: SocketIdentifier,
    inode: u64,
}

fn encode_key(key: &InstanceKey, buf: &mut [u8; KEY_LEN]) {
    buf[..8].copy_from_slice(&key.identifier.as_raw().to_be_bytes());
    buf[8..].copy_from_slice(&key.inode.to_be_bytes());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    receive_queue_depth: u64,
    transmit_queue_depth: u64,
    drops: Option<u64>,
}

#[derive(Debug)]
struct TrackedSocket {
    requested: SocketAddrV4,
    identifier: SocketIdentifier,
    inode: u64,
    last: Option<Sample>,
    generation: u64,
}

pub(super) struct Tracker {
    entries: FixedKeyTable<InstanceKey, TrackedSocket, KEY_LEN>,
    generation: u64,
    stale: Vec<[u8; KEY_LEN]>,
    listener: Box<dyn SocketLifecycleListener + Send>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("entries", &self.entries)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Finds the registration a row belongs to.
///
/// Inode-qualified registrations win over plain ones, exact ports over wildcard ports.
pub(super) fn lookup(
    candidates: &Candidates,
    plain: SocketIdentifier,
    inode: u64,
) -> Option<SocketAddrV4> {
    let instance = plain.overlay_inode(inode);
    [
        instance,
        instance.as_wildcard_port(),
        plain,
        plain.as_wildcard_port(),
    ]
    .iter()
    .find_map(|id| candidates.get(id).copied())
}

impl Tracker {
    pub(super) fn new(listener: Box<dyn SocketLifecycleListener + Send>) -> Self {
        Self {
            entries: FixedKeyTable::new(encode_key),
            generation: 0,
            stale: Vec::new(),
            listener,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Matches one decoded row against `candidates` and reports it to `handler` if it is new or
    /// any of its values changed.
    pub(super) fn observe<H>(
        &mut self,
        candidates: &Candidates,
        row: &SocketRow,
        drops: Option<u64>,
        handler: &mut H,
    ) where
        H: SocketStatisticsHandler + ?Sized,
    {
        let Some(requested) = lookup(candidates, row.identifier, row.inode) else {
            return;
        };

        let identifier = row.identifier.overlay_inode(row.inode);
        let key = self.entries.encode(&InstanceKey {
            identifier,
            inode: row.inode,
        });
        let port = row.identifier.port();

        if self.entries.get_encoded(&key).is_none() {
            self.listener
                .socket_monitoring_started(*requested.ip(), port, row.inode);
            self.entries.put_encoded(
                key,
                TrackedSocket {
                    requested,
                    identifier,
                    inode: row.inode,
                    last: None,
                    generation: self.generation,
                },
            );
        }
        let Some(tracked) = self.entries.get_encoded_mut(&key) else {
            return;
        };

        let sample = Sample {
            receive_queue_depth: row.receive_queue_depth,
            transmit_queue_depth: row.transmit_queue_depth,
            drops,
        };
        let changed = tracked.last != Some(sample);
        tracked.last = Some(sample);
        tracked.generation = self.generation;

        if changed {
            handler.on_statistics_updated(&SocketStatistics {
                address: *tracked.requested.ip(),
                port,
                identifier: row.identifier,
                inode: tracked.inode,
                receive_queue_depth: sample.receive_queue_depth,
                transmit_queue_depth: sample.transmit_queue_depth,
                drops: sample.drops,
            });
        }
    }

    /// Purges every entry the current poll did not touch and starts the next generation.
    pub(super) fn finish_poll(&mut self) {
        let generation = self.generation;
        self.stale.extend(
            self.entries
                .iter()
                .filter(|(_, tracked)| tracked.generation != generation)
                .map(|(key, _)| *key),
        );

        for key in self.stale.drain(..) {
            if let Some(tracked) = self.entries.remove_encoded(&key) {
                self.listener.socket_monitoring_stopped(
                    *tracked.requested.ip(),
                    tracked.identifier.port(),
                    tracked.inode,
                );
            }
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Starts the next generation without purging, after a poll that did not see the whole
    /// table.
    pub(super) fn abandon_poll(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::testing::{Event, RecordingListener};
    use std::net::Ipv4Addr;

    fn row(address: Ipv4Addr, port: u16, rx: u64, inode: u64) -> SocketRow {
        SocketRow {
            identifier: SocketIdentifier::new(address, port),
            transmit_queue_depth: 0,
            receive_queue_depth: rx,
            inode,
        }
    }

    fn candidates(entries: &[(SocketIdentifier, SocketAddrV4)]) -> Candidates {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_lookup_priority() {
        let address = Ipv4Addr::new(10, 0, 0, 1);
        let plain = SocketIdentifier::new(address, 80);
        let requested = |port| SocketAddrV4::new(address, port);

        let mut all = candidates(&[
            (plain.as_wildcard_port(), requested(0)),
            (plain, requested(1)),
            (plain.overlay_inode(7).as_wildcard_port(), requested(2)),
            (plain.overlay_inode(7), requested(3)),
        ]);
        assert_eq!(lookup(&all, plain, 7), Some(requested(3)));

        all.remove(&plain.overlay_inode(7));
        assert_eq!(lookup(&all, plain, 7), Some(requested(2)));

        all.remove(&plain.overlay_inode(7).as_wildcard_port());
        assert_eq!(lookup(&all, plain, 7), Some(requested(1)));

        all.remove(&plain);
        assert_eq!(lookup(&all, plain, 7), Some(requested(0)));

        all.clear();
        assert_eq!(lookup(&all, plain, 7), None);
    }

    #[test]
    fn test_inode_registration_ignores_other_inodes() {
        let address = Ipv4Addr::new(10, 0, 0, 1);
        let plain = SocketIdentifier::new(address, 80);
        let registered = candidates(&[(plain.overlay_inode(7), SocketAddrV4::new(address, 80))]);
        assert!(lookup(&registered, plain, 8).is_none());
        assert!(lookup(&registered, plain, 7).is_some());
    }

    #[test]
    fn test_changes_and_purge() {
        let events = RecordingListener::default();
        let mut tracker = Tracker::new(Box::new(events.clone()));
        let address = Ipv4Addr::new(127, 0, 0, 1);
        let registered = candidates(&[(
            SocketIdentifier::wildcard_port(address),
            SocketAddrV4::new(address, 0),
        )]);

        let mut updates = Vec::new();
        let mut handler = |stats: &SocketStatistics| updates.push(*stats);

        tracker.observe(&registered, &row(address, 53, 0, 100), Some(0), &mut handler);
        tracker.observe(&registered, &row(address, 54, 0, 101), Some(0), &mut handler);
        tracker.finish_poll();
        assert_eq!(tracker.len(), 2);

        // unchanged 53, changed 54
        tracker.observe(&registered, &row(address, 53, 0, 100), Some(0), &mut handler);
        tracker.observe(&registered, &row(address, 54, 9, 101), Some(0), &mut handler);
        tracker.finish_poll();

        // 54 disappears
        tracker.observe(&registered, &row(address, 53, 0, 100), Some(0), &mut handler);
        tracker.finish_poll();
        assert_eq!(tracker.len(), 1);

        // nothing left
        tracker.finish_poll();
        assert_eq!(tracker.len(), 0);

        assert_eq!(updates.len(), 3);
        assert_eq!(updates[2].port, 54);
        assert_eq!(updates[2].receive_queue_depth, 9);
        assert_eq!(updates[2].address, address);
        assert_eq!(
            *events.0.lock().unwrap(),
            vec![
                Event::Started(address, 53, 100),
                Event::Started(address, 54, 101),
                Event::Stopped(address, 54, 101),
                Event::Stopped(address, 53, 100),
            ]
        );
    }

    #[test]
    fn test_new_inode_is_a_new_instance() {
        let events = RecordingListener::default();
        let mut tracker = Tracker::new(Box::new(events.clone()));
        let address = Ipv4Addr::new(127, 0, 0, 1);
        let socket = SocketAddrV4::new(address, 53);
        let registered = candidates(&[(SocketIdentifier::from(socket), socket)]);
        let mut handler = |_: &SocketStatistics| {};

        tracker.observe(&registered, &row(address, 53, 0, 100), None, &mut handler);
        tracker.finish_poll();
        // same port, socket recreated; inodes share their low 16 bits
        tracker.observe(&registered, &row(address, 53, 0, 100 + 0x1_0000), None, &mut handler);
        tracker.finish_poll();

        assert_eq!(
            *events.0.lock().unwrap(),
            vec![
                Event::Started(address, 53, 100),
                Event::Started(address, 53, 100 + 0x1_0000),
                Event::Stopped(address, 53, 100),
            ]
        );
    }
}
