use std::collections::HashMap;
use std::net::SocketAddrV4;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::identifier::{Result, SocketIdentifier, SocketSpec};

/// Immutable view of the registered sockets.
pub type Candidates = HashMap<SocketIdentifier, SocketAddrV4>;

/// The set of sockets callers asked to monitor.
///
/// Every mutation copies the current snapshot, applies one change and publishes the copy with
/// a compare-and-swap, retrying against the newer snapshot if another writer got there first.
/// Readers never block and always see a complete snapshot.
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    snapshot: ArcSwap<Candidates>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in the sockets described by `spec`.
    ///
    /// # Returns
    ///
    /// `true` if the spec was not registered before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAddressFamily`](crate::identifier::Error) for IPv6 specs.
    pub fn begin_monitoring(&self, spec: impl Into<SocketSpec>) -> Result<bool> {
        let spec = spec.into();
        let identifier = spec.identifier()?;
        let requested = spec.requested_address()?;

        let previous = self.snapshot.rcu(|current| {
            let mut next = Candidates::clone(current);
            next.insert(identifier, requested);
            next
        });
        let added = !previous.contains_key(&identifier);
        if added {
            log::debug!("registered socket candidate {identifier} for {requested}");
        }
        Ok(added)
    }

    /// Removes a registration made with an equal `spec`.
    ///
    /// # Returns
    ///
    /// `true` if the spec was registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAddressFamily`](crate::identifier::Error) for IPv6 specs.
    pub fn end_monitoring(&self, spec: impl Into<SocketSpec>) -> Result<bool> {
        let identifier = spec.into().identifier()?;

        let previous = self.snapshot.rcu(|current| {
            if !current.contains_key(&identifier) {
                return Arc::clone(current);
            }
            let mut next = Candidates::clone(current);
            next.remove(&identifier);
            Arc::new(next)
        });
        let removed = previous.contains_key(&identifier);
        if removed {
            log::debug!("deregistered socket candidate {identifier}");
        }
        Ok(removed)
    }

    /// Replaces every registration at once.
    ///
    /// # Errors
    ///
    /// Fails without changing the registry if any spec is not IPv4.
    pub fn replace_all<I>(&self, specs: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<SocketSpec>,
    {
        let mut next = Candidates::new();
        for spec in specs {
            let spec = spec.into();
            next.insert(spec.identifier()?, spec.requested_address()?);
        }
        log::debug!("replaced socket candidates with {} entries", next.len());
        self.snapshot.store(Arc::new(next));
        Ok(())
    }

    /// Returns the current snapshot.
    ///
    /// Registrations made after this call are not visible in the returned snapshot.
    pub fn snapshot(&self) -> Arc<Candidates> {
        self.snapshot.load_full()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::thread;

    #[test]
    fn test_begin_and_end_monitoring() {
        let registry = CandidateRegistry::new();
        let socket = SocketAddrV4::new(Ipv4Addr::new(192, 168, 122, 1), 53);

        assert!(registry.begin_monitoring(socket).unwrap());
        assert!(!registry.begin_monitoring(socket).unwrap());
        assert_eq!(registry.len(), 1);

        let snapshot = registry.snapshot();
        assert_eq!(
            snapshot.get(&SocketIdentifier::from(socket)),
            Some(&socket)
        );

        assert!(registry.end_monitoring(socket).unwrap());
        assert!(!registry.end_monitoring(socket).unwrap());
        assert!(registry.is_empty());

        // a snapshot taken earlier is unaffected
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_address_only_registration() {
        let registry = CandidateRegistry::new();
        let address = Ipv4Addr::new(10, 0, 0, 1);
        registry.begin_monitoring(address).unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(
            snapshot.get(&SocketIdentifier::wildcard_port(address)),
            Some(&SocketAddrV4::new(address, 0))
        );
    }

    #[test]
    fn test_rejects_ipv6() {
        let registry = CandidateRegistry::new();
        let err = registry
            .begin_monitoring(IpAddr::from([0u16, 0, 0, 0, 0, 0, 0, 1]))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::identifier::Error::UnsupportedAddressFamily(_)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_replace_all() {
        let registry = CandidateRegistry::new();
        registry
            .begin_monitoring(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 1))
            .unwrap();
        registry
            .replace_all([
                SocketSpec::Socket(SocketAddr::from(([127, 0, 0, 1], 2))),
                SocketSpec::Address(IpAddr::from([127, 0, 0, 2])),
            ])
            .unwrap();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains_key(&SocketIdentifier::new(Ipv4Addr::LOCALHOST, 1)));
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(CandidateRegistry::new());
        let handles: Vec<_> = (0..8u8)
            .map(|thread_id| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for port in 0..100u16 {
                        let socket = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, thread_id), port + 1);
                        registry.begin_monitoring(socket).unwrap();
                        if port % 2 == 0 {
                            registry.end_monitoring(socket).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8 * 50);
    }
}
