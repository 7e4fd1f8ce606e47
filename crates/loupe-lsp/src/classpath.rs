//! Classpath snapshot cache.
//!
//! Resolving a classpath means scanning every entry for reachable types, an
//! expensive operation that must not repeat when the dependency list has
//! not changed. The cache keys scans by an order-sensitive fingerprint of
//! the entry list: an unchanged list is a pure lookup, a changed list scans
//! once and evicts the least-recently-used snapshot beyond capacity.
//!
//! Scans run on a worker thread and are bounded by a timeout. A failed or
//! timed-out scan never clears the cache: the last good snapshot stays
//! authoritative and the failure is reported upward as a degraded-mode
//! warning.

use crossbeam_channel::{bounded, RecvTimeoutError};
use loupe_core::{ClassInfo, FrontEnd, FrontEndError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Order-sensitive fingerprint of a classpath entry list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint an ordered entry list.
    ///
    /// Entries are hashed in order with a separator, so reordering the
    /// same entries yields a different fingerprint.
    pub fn of(entries: &[PathBuf]) -> Self {
        use std::fmt::Write;

        let mut hasher = Sha256::new();
        for entry in entries {
            hasher.update(entry.to_string_lossy().as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Hex form of the fingerprint.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable result of one classpath scan.
///
/// Shared by `Arc` across every generation built against it; dropped when
/// the last generation or in-flight query releases it.
#[derive(Debug)]
pub struct ClasspathSnapshot {
    fingerprint: Fingerprint,
    entries: Vec<PathBuf>,
    /// Qualified name -> class.
    types: HashMap<String, ClassInfo>,
    /// Simple name -> qualified names, for unqualified lookup.
    simple: HashMap<String, Vec<String>>,
}

impl ClasspathSnapshot {
    fn build(fingerprint: Fingerprint, entries: Vec<PathBuf>, classes: Vec<ClassInfo>) -> Self {
        let mut types = HashMap::with_capacity(classes.len());
        let mut simple: HashMap<String, Vec<String>> = HashMap::new();
        for class in classes {
            simple
                .entry(class.simple_name.clone())
                .or_default()
                .push(class.qualified_name.clone());
            types.insert(class.qualified_name.clone(), class);
        }
        Self {
            fingerprint,
            entries,
            types,
            simple,
        }
    }

    /// Snapshot of an empty classpath.
    pub fn empty() -> Self {
        Self::build(Fingerprint::of(&[]), Vec::new(), Vec::new())
    }

    /// The fingerprint this snapshot was built from.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// The entry list this snapshot was built from.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Look up a type by qualified or simple name. Ambiguous simple names
    /// resolve to the first qualified match in scan order.
    pub fn lookup(&self, name: &str) -> Option<&ClassInfo> {
        if let Some(class) = self.types.get(name) {
            return Some(class);
        }
        self.simple
            .get(name)
            .and_then(|qualified| qualified.first())
            .and_then(|qualified| self.types.get(qualified))
    }

    /// All known types, in no particular order.
    pub fn types(&self) -> impl Iterator<Item = &ClassInfo> {
        self.types.values()
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the snapshot knows no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Why a scan attempt produced no fresh snapshot.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan did not finish within the configured timeout.
    #[error("classpath scan timed out after {0:?}")]
    Timeout(Duration),

    /// The front end's scanner failed.
    #[error(transparent)]
    FrontEnd(#[from] FrontEndError),
}

/// Outcome of [`ClasspathCache::resolve`]: always a usable snapshot, plus
/// the degradation cause when the snapshot is stale.
#[derive(Debug)]
pub struct Resolution {
    /// The snapshot to analyze against. On scan failure this is the last
    /// good snapshot (or the empty one if none exists yet).
    pub snapshot: Arc<ClasspathSnapshot>,
    /// Set when the requested entry list could not be scanned.
    pub degraded: Option<ScanError>,
}

/// Fingerprint-keyed cache of classpath snapshots.
pub struct ClasspathCache {
    /// Snapshots in LRU order, most recently used last.
    snapshots: Vec<Arc<ClasspathSnapshot>>,
    capacity: usize,
    scan_timeout: Duration,
    scan_count: u64,
}

/// Default number of retained snapshots: current and previous, so rapid
/// toggling between two dependency lists never rescans.
pub const DEFAULT_CAPACITY: usize = 2;

/// Default scan timeout.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

impl ClasspathCache {
    /// Create a cache with the default capacity and timeout.
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_CAPACITY, DEFAULT_SCAN_TIMEOUT)
    }

    /// Create a cache with explicit capacity and scan timeout.
    pub fn with_settings(capacity: usize, scan_timeout: Duration) -> Self {
        Self {
            snapshots: Vec::new(),
            capacity: capacity.max(1),
            scan_timeout,
            scan_count: 0,
        }
    }

    /// Update the retained-snapshot capacity, evicting if shrunk.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
        }
    }

    /// Update the scan timeout.
    pub fn set_scan_timeout(&mut self, timeout: Duration) {
        self.scan_timeout = timeout;
    }

    /// Number of scan attempts performed so far.
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// The most recently used snapshot, if any.
    pub fn last_good(&self) -> Option<Arc<ClasspathSnapshot>> {
        self.snapshots.last().cloned()
    }

    /// Fetch a snapshot by fingerprint without scanning, refreshing its
    /// LRU position on a hit.
    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<Arc<ClasspathSnapshot>> {
        let pos = self
            .snapshots
            .iter()
            .position(|s| s.fingerprint() == fingerprint)?;
        let snapshot = self.snapshots.remove(pos);
        self.snapshots.push(Arc::clone(&snapshot));
        Some(snapshot)
    }

    /// Resolve an ordered entry list to a snapshot.
    ///
    /// A fingerprint hit returns the stored snapshot without scanning.
    /// A miss scans through `front_end` on a worker thread, bounded by the
    /// configured timeout; on failure the last good snapshot is returned
    /// with `degraded` set.
    pub fn resolve(&mut self, entries: &[PathBuf], front_end: Arc<dyn FrontEnd>) -> Resolution {
        let fingerprint = Fingerprint::of(entries);

        if let Some(pos) = self
            .snapshots
            .iter()
            .position(|s| *s.fingerprint() == fingerprint)
        {
            // Hit: refresh LRU order, no rescan.
            let snapshot = self.snapshots.remove(pos);
            self.snapshots.push(Arc::clone(&snapshot));
            tracing::debug!(fingerprint = %fingerprint, "classpath cache hit");
            return Resolution {
                snapshot,
                degraded: None,
            };
        }

        self.scan_count += 1;
        tracing::info!(
            entries = entries.len(),
            fingerprint = %fingerprint,
            "scanning classpath"
        );

        match self.scan_bounded(entries.to_vec(), front_end) {
            Ok(classes) => {
                let snapshot = Arc::new(ClasspathSnapshot::build(
                    fingerprint,
                    entries.to_vec(),
                    classes,
                ));
                self.snapshots.push(Arc::clone(&snapshot));
                while self.snapshots.len() > self.capacity {
                    self.snapshots.remove(0);
                }
                Resolution {
                    snapshot,
                    degraded: None,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "classpath scan failed, keeping last good snapshot");
                let snapshot = self
                    .last_good()
                    .unwrap_or_else(|| Arc::new(ClasspathSnapshot::empty()));
                Resolution {
                    snapshot,
                    degraded: Some(err),
                }
            }
        }
    }

    /// Run one scan on a worker thread, abandoning it on timeout.
    fn scan_bounded(
        &self,
        entries: Vec<PathBuf>,
        front_end: Arc<dyn FrontEnd>,
    ) -> Result<Vec<ClassInfo>, ScanError> {
        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name("classpath-scan".to_string())
            .spawn(move || {
                // The receiver may be gone if the scan timed out; a failed
                // send just drops the stale result.
                let _ = tx.send(front_end.scan_classpath(&entries));
            })
            .map_err(|e| {
                ScanError::FrontEnd(FrontEndError::Scan {
                    message: format!("could not spawn scan thread: {e}"),
                })
            })?;

        match rx.recv_timeout(self.scan_timeout) {
            Ok(result) => result.map_err(ScanError::from),
            Err(RecvTimeoutError::Timeout) => Err(ScanError::Timeout(self.scan_timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ScanError::FrontEnd(FrontEndError::Scan {
                message: "scan thread terminated without a result".to_string(),
            })),
        }
    }
}

impl Default for ClasspathCache {
    fn default() -> Self {
        Self::new()
    }
}
