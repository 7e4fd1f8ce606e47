//! Session orchestrator: the generation lifecycle.
//!
//! The session owns the one mutator path (recompilation) and serves the
//! many reader paths (queries). Readers never lock anything for the
//! duration of their work: [`Session::snapshot`] clones the pair of `Arc`s
//! behind one short-lived read lock, and everything those `Arc`s point to
//! is immutable after publication. The mutator builds the next generation
//! entirely off to the side and publishes it with a single swap.
//!
//! Dependency import is a background task with a supersession ticket: only
//! the latest requested import for the workspace may publish; older ones
//! finish and are discarded.

use crate::classpath::{ClasspathCache, ClasspathSnapshot, Fingerprint};
use crate::compile::compile_open_set;
use crate::config::Config;
use crate::generation::Generation;
use crate::vfs::{canonical_uri, DocumentStore};
use loupe_core::{DependencyResolver, FrontEnd};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Orchestrator state, visible for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No recompilation pending or running.
    Idle,
    /// A generation is being built off to the side.
    Recompiling,
    /// A generation was just swapped in; transitions to Idle once the
    /// mutator confirms no follow-up pass is needed.
    Published,
}

/// The atomically-captured pair every query runs against.
#[derive(Clone)]
pub struct WorldSnapshot {
    /// The current generation at capture time.
    pub generation: Arc<Generation>,
    /// The classpath snapshot that generation was built against.
    pub classpath: Arc<ClasspathSnapshot>,
}

struct World {
    generation: Arc<Generation>,
    classpath: Arc<ClasspathSnapshot>,
}

/// One analysis session for one workspace.
pub struct Session {
    front_end: Arc<dyn FrontEnd>,
    resolver: Option<Arc<dyn DependencyResolver>>,
    documents: Mutex<DocumentStore>,
    cache: Mutex<ClasspathCache>,
    current: RwLock<World>,
    /// Serializes the mutator path; never held while readers snapshot.
    compile_lock: Mutex<()>,
    state: Mutex<SessionState>,
    config: Mutex<Config>,
    /// Latest requested classpath entry list.
    classpath_entries: Mutex<Vec<PathBuf>>,
    /// Fingerprint of the last attempted (possibly failed) scan, so a
    /// degraded classpath is not re-scanned on every edit.
    last_scan_attempt: Mutex<Option<Fingerprint>>,
    /// Pending one-time notifications for the transport layer.
    warnings: Mutex<Vec<String>>,
    /// Shared empty snapshot: an empty entry list never scans.
    empty_classpath: Arc<ClasspathSnapshot>,
    generations: AtomicU64,
    import_seq: AtomicU64,
}

impl Session {
    /// Create a session with the given collaborators and configuration.
    pub fn new(
        front_end: Arc<dyn FrontEnd>,
        resolver: Option<Arc<dyn DependencyResolver>>,
        config: Config,
    ) -> Self {
        let cache = ClasspathCache::with_settings(config.cache_capacity, config.scan_timeout());
        let empty_classpath = Arc::new(ClasspathSnapshot::empty());
        Self {
            front_end,
            resolver,
            documents: Mutex::new(DocumentStore::new()),
            cache: Mutex::new(cache),
            current: RwLock::new(World {
                generation: Arc::new(Generation::empty()),
                classpath: Arc::clone(&empty_classpath),
            }),
            compile_lock: Mutex::new(()),
            state: Mutex::new(SessionState::Idle),
            config: Mutex::new(config),
            classpath_entries: Mutex::new(Vec::new()),
            last_scan_attempt: Mutex::new(None),
            warnings: Mutex::new(Vec::new()),
            empty_classpath,
            generations: AtomicU64::new(0),
            import_seq: AtomicU64::new(0),
        }
    }

    /// Capture the current generation and classpath pair.
    ///
    /// One short-lived read lock, two `Arc` clones; the query then runs
    /// entirely against immutable data.
    pub fn snapshot(&self) -> WorldSnapshot {
        let current = self.current.read();
        WorldSnapshot {
            generation: Arc::clone(&current.generation),
            classpath: Arc::clone(&current.classpath),
        }
    }

    /// Current orchestrator state.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Handle a document-open notification.
    pub fn open_document(&self, uri: &str, text: &str) {
        let uri = canonical_uri(uri);
        tracing::info!(uri = %uri, "document opened");
        self.documents.lock().open(&uri, text);
        self.recompile();
    }

    /// Handle a full-text document change.
    pub fn change_document(&self, uri: &str, text: &str) {
        let uri = canonical_uri(uri);
        tracing::debug!(uri = %uri, "document changed");
        self.documents.lock().change(&uri, text);
        self.recompile();
    }

    /// Handle a document-close notification.
    pub fn close_document(&self, uri: &str) {
        let uri = canonical_uri(uri);
        tracing::info!(uri = %uri, "document closed");
        self.documents.lock().close(&uri);
        self.recompile();
    }

    /// Current edit version of an open document.
    pub fn document_version(&self, uri: &str) -> Option<u64> {
        self.documents.lock().version(&canonical_uri(uri))
    }

    /// Apply a new configuration.
    pub fn set_config(&self, config: Config) {
        {
            let mut cache = self.cache.lock();
            cache.set_capacity(config.cache_capacity);
            cache.set_scan_timeout(config.scan_timeout());
        }
        *self.config.lock() = config;
    }

    /// Whether the dependency resolver is enabled and present.
    pub fn resolver_active(&self) -> bool {
        self.resolver.is_some() && self.config.lock().resolver_enabled
    }

    /// Replace the classpath entry list and run the one recompilation the
    /// update owes.
    pub fn apply_classpath(&self, entries: Vec<PathBuf>) {
        tracing::info!(entries = entries.len(), "classpath updated");
        *self.classpath_entries.lock() = entries;
        // A fresh list may retry a previously failed scan.
        *self.last_scan_attempt.lock() = None;
        self.recompile();
    }

    /// Discover the project's classpath on a background thread.
    ///
    /// Does not block recompilation of already-open files. A newer call
    /// supersedes this one: whichever import finishes last checks its
    /// ticket and discards itself if it lost.
    pub fn import_dependencies(self: Arc<Self>, project_root: PathBuf) {
        let Some(resolver) = self.resolver.clone() else {
            tracing::debug!("no dependency resolver configured");
            return;
        };
        if !self.config.lock().resolver_enabled {
            tracing::info!("dependency resolver disabled by configuration");
            return;
        }

        let ticket = self.import_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let session = self;
        let spawned = thread::Builder::new()
            .name("dependency-import".to_string())
            .spawn(move || {
                tracing::info!(root = %project_root.display(), "importing project dependencies");
                match resolver.discover(&project_root) {
                    Ok(mut entries) => {
                        if session.import_seq.load(Ordering::SeqCst) != ticket {
                            tracing::debug!("discarding superseded dependency import");
                            return;
                        }
                        if session.config.lock().include_system_entries {
                            entries.extend(system_entries());
                        }
                        session.apply_classpath(entries);
                    }
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            "dependency resolution failed; previous classpath remains in effect"
                        );
                        session.push_warning(format!("Dependency resolution failed: {err}"));
                    }
                }
            });
        if let Err(err) = spawned {
            tracing::error!(error = %err, "could not spawn dependency import");
        }
    }

    /// Drain pending one-time warnings.
    pub fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.warnings.lock())
    }

    fn push_warning(&self, message: String) {
        tracing::warn!("{message}");
        self.warnings.lock().push(message);
    }

    /// Resolve the latest entry list to a snapshot without paying a rescan
    /// for a list that already failed.
    fn resolve_classpath(&self) -> Arc<ClasspathSnapshot> {
        let entries = self.classpath_entries.lock().clone();
        if entries.is_empty() {
            // Nothing to scan before the first dependency import.
            return Arc::clone(&self.empty_classpath);
        }
        let fingerprint = Fingerprint::of(&entries);
        let mut cache = self.cache.lock();

        if let Some(snapshot) = cache.get(&fingerprint) {
            return snapshot;
        }

        {
            let mut attempted = self.last_scan_attempt.lock();
            if attempted.as_ref() == Some(&fingerprint) {
                // This list already failed to scan; stay degraded on the
                // last good snapshot until a new import arrives.
                return cache
                    .last_good()
                    .unwrap_or_else(|| Arc::clone(&self.empty_classpath));
            }
            *attempted = Some(fingerprint);
        }

        let resolution = cache.resolve(&entries, Arc::clone(&self.front_end));
        if let Some(err) = resolution.degraded {
            self.push_warning(format!(
                "Classpath scan failed; completion will miss external members: {err}"
            ));
        }
        resolution.snapshot
    }

    /// Rebuild and publish a generation if the open set or classpath
    /// changed. Runs the follow-up pass when an edit lands mid-compile.
    pub fn recompile(&self) {
        let _mutator = self.compile_lock.lock();

        loop {
            let classpath = self.resolve_classpath();

            // Capture the open set and clear dirtiness in one step; edits
            // arriving after this point re-mark the store and get the
            // follow-up pass below.
            let open_set = {
                let mut documents = self.documents.lock();
                let fingerprint_changed = self.current.read().generation.classpath_fingerprint()
                    != classpath.fingerprint();
                if !documents.is_dirty() && !fingerprint_changed {
                    break;
                }
                documents.clear_dirty();
                documents.open_set()
            };

            *self.state.lock() = SessionState::Recompiling;
            let compiled = compile_open_set(self.front_end.as_ref(), &open_set, &classpath);
            let id = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
            let generation = Arc::new(Generation::build(
                id,
                compiled,
                classpath.fingerprint().clone(),
            ));
            tracing::info!(
                generation = id,
                files = generation.file_count(),
                "publishing generation"
            );

            {
                let mut current = self.current.write();
                current.generation = generation;
                current.classpath = classpath;
            }
            *self.state.lock() = SessionState::Published;

            if !self.documents.lock().is_dirty() {
                break;
            }
        }

        *self.state.lock() = SessionState::Idle;
    }
}

/// Platform library locations appended when system-entry inclusion is on.
fn system_entries() -> Vec<PathBuf> {
    std::env::var_os("JAVA_HOME")
        .map(|home| {
            let lib = PathBuf::from(home).join("lib");
            vec![lib.join("modules"), lib]
        })
        .unwrap_or_default()
}
