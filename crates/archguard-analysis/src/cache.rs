//! On-disk verdict cache.
//!
//! Each verdict is stored as `<fingerprint>.json` in one flat directory. A
//! fingerprint covers everything that can change a verdict, so entries are
//! never invalidated explicitly; a changed input simply misses.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use archguard_core::Verdict;
use sha2::{Digest, Sha256};
use tracing::debug;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Deterministic cache key for one judgment.
///
/// Components are length-prefixed before hashing so that moving text from
/// one component into a neighbor always changes the key.
pub fn fingerprint(
    model: &str,
    adr_text: &str,
    file_context: &str,
    system_prompt: &str,
    prompt_template: &str,
) -> String {
    let mut hasher = Sha256::new();
    for part in [model, adr_text, file_context, system_prompt, prompt_template] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Verdict store keyed by [`fingerprint`].
///
/// Reads and writes take no lock: a fingerprint always maps to the same
/// verdict, and writes land via rename so readers never see a partial file.
#[derive(Clone, Debug)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }

    /// Stored verdict for `fingerprint`. Missing and unreadable entries are both `None`.
    pub fn get(&self, fingerprint: &str) -> Option<Verdict> {
        let data = std::fs::read(self.entry_path(fingerprint)).ok()?;
        match serde_json::from_slice(&data) {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                debug!(fingerprint, error = %e, "corrupt cache entry treated as miss");
                None
            }
        }
    }

    /// Store `verdict` under `fingerprint`, replacing any existing entry.
    pub fn put(&self, fingerprint: &str, verdict: &Verdict) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(verdict).map_err(std::io::Error::other)?;
        let tmp = self.dir.join(format!(
            "{fingerprint}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, self.entry_path(fingerprint)).inspect_err(|_| {
            let _ = std::fs::remove_file(&tmp);
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
