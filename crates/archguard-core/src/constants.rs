//! Well-known file names, directories, and analysis defaults.

/// Configuration file expected at the repository root.
pub const CONFIG_FILE_NAME: &str = "archguard.yaml";

/// Working directory for archguard state, relative to the repository root.
pub const STATE_DIR: &str = ".archguard";

/// Default location of the persisted ADR index.
pub const DEFAULT_INDEX_FILE: &str = ".archguard/index.json";

/// Default location of the verdict cache.
pub const DEFAULT_CACHE_DIR: &str = ".archguard/cache";

/// Token ceiling applied when none is configured.
pub const DEFAULT_MAX_TOKENS: usize = 8000;

/// Worker count applied when none is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Number of ADR candidates considered per file.
pub const DEFAULT_TOP_K: usize = 3;

/// Outstanding embedding calls allowed while building the index.
pub const INDEX_BUILD_CONCURRENCY: usize = 5;

/// Byte cap on the text embedded to query the index for a file.
pub const MAX_QUERY_BYTES: usize = 6000;

/// Leading characters of a file scanned for suppression markers.
pub const SUPPRESSION_SCAN_CHARS: usize = 2000;

/// Marker prefix that disables an ADR for a file, e.g. `archguard-ignore: 0001`.
pub const SUPPRESSION_MARKER: &str = "archguard-ignore:";
