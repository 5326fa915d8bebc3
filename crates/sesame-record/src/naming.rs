//! Experiment directory allocation.
//!
//! Every experiment name carries a trailing four-digit nonce (`Exp_0007`).
//! A requested name without one gets the next counter value appended; a name
//! that already has one keeps it unless it collides, in which case the
//! suffix is replaced, never stacked. The counter is shared process-wide so
//! rapid back-to-back sessions never race for the same name, and the final
//! `create_dir` is the atomic claim.

use crate::error::SessionError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info};

/// Nonces are formatted with four digits.
const NONCE_MODULUS: u32 = 10_000;

static GLOBAL_NONCE: NonceCounter = NonceCounter::new(0);

/// Monotonic nonce source.
#[derive(Debug)]
pub struct NonceCounter(AtomicU32);

impl NonceCounter {
    pub const fn new(start: u32) -> Self {
        Self(AtomicU32::new(start))
    }

    /// The process-wide counter.
    pub fn global() -> &'static NonceCounter {
        &GLOBAL_NONCE
    }

    /// Take the next nonce.
    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) % NONCE_MODULUS
    }

    /// Peek without consuming.
    pub fn current(&self) -> u32 {
        self.0.load(Ordering::SeqCst) % NONCE_MODULUS
    }
}

impl Default for NonceCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Split `name_NNNN` into (`name`, Some(NNNN)); names without a trailing
/// nonce come back whole.
pub fn split_nonce(name: &str) -> (&str, Option<u32>) {
    let bytes = name.as_bytes();
    if bytes.len() >= 5 {
        let at = bytes.len() - 5;
        let tail = &bytes[at + 1..];
        if bytes[at] == b'_' && tail.iter().all(u8::is_ascii_digit) {
            let nonce = name[at + 1..].parse().ok();
            return (&name[..at], nonce);
        }
    }
    (name, None)
}

fn with_nonce(base: &str, nonce: u32) -> String {
    format!("{base}_{nonce:04}")
}

/// A created experiment directory and the artifact paths that hang off it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentHandle {
    parent: PathBuf,
    name: String,
}

impl ExperimentHandle {
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// Final, de-duplicated experiment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the per-frame images.
    pub fn dir(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    /// Composite video, next to the image directory.
    pub fn video_path(&self) -> PathBuf {
        self.parent.join(format!("{}.avi", self.name))
    }

    /// Per-session geometry CSV, next to the image directory.
    pub fn csv_path(&self) -> PathBuf {
        self.parent.join(format!("{}.csv", self.name))
    }

    fn is_taken(parent: &Path, name: &str) -> bool {
        parent.join(name).exists()
            || parent.join(format!("{name}.avi")).exists()
            || parent.join(format!("{name}.csv")).exists()
    }
}

/// Allocate using the process-wide counter.
pub fn allocate(parent: &Path, requested: &str) -> Result<ExperimentHandle, SessionError> {
    allocate_with(NonceCounter::global(), parent, requested)
}

/// Allocate a unique experiment directory under `parent`.
pub fn allocate_with(
    counter: &NonceCounter,
    parent: &Path,
    requested: &str,
) -> Result<ExperimentHandle, SessionError> {
    let requested = requested.trim();
    if requested.is_empty()
        || requested.contains(['/', '\\'])
        || requested == "."
        || requested == ".."
    {
        return Err(SessionError::InvalidName(requested.to_string()));
    }
    if !parent.is_dir() {
        return Err(SessionError::ParentMissing(parent.to_path_buf()));
    }

    let (base, existing) = split_nonce(requested);
    let mut candidate = match existing {
        Some(_) => requested.to_string(),
        None => with_nonce(base, counter.next()),
    };

    for _ in 0..NONCE_MODULUS {
        if !ExperimentHandle::is_taken(parent, &candidate) {
            let dir = parent.join(&candidate);
            match std::fs::create_dir(&dir) {
                Ok(()) => {
                    info!(dir = %dir.display(), "Created experiment directory");
                    return Ok(ExperimentHandle {
                        parent: parent.to_path_buf(),
                        name: candidate,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(source) => return Err(SessionError::Io { path: dir, source }),
            }
        }
        debug!(name = %candidate, "Experiment name taken, advancing nonce");
        candidate = with_nonce(base, counter.next());
    }

    Err(SessionError::Exhausted {
        base: base.to_string(),
    })
}
