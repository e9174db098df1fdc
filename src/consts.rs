/// Name of the tunable knob controlling how many parcels are batched per send.
pub const COALESCED_PARCELS: &str = "coalesced_parcels";

/// Member of the space file that holds per-parameter candidate definitions.
pub const TUNING_SPACE_KEY: &str = "tuning_space";

/// Region the built-in policy dispatches for when none is configured.
pub const DEFAULT_REGION: &str = "time per transaction";

/// Built-in candidate list used when no valid space file is supplied.
pub const DEFAULT_COALESCE_SPACE: [&str; 11] = [
    "2", "4", "8", "16", "24", "32", "64", "128", "256", "512", "1024",
];

/// Number of trigger firings a candidate is held before it is measured.
pub const DEFAULT_WINDOW: usize = 3;

/// Preferred starting value for a fresh tuning session.
pub const DEFAULT_INITIAL_VALUE: i64 = 256;

// Bounds of a stepped space when the file omits them.
pub const DEFAULT_MIN: i64 = 4;
pub const DEFAULT_MAX: i64 = 2048;
pub const DEFAULT_STEP: i64 = 4;

/// Largest candidate grid a space may describe.
pub const MAX_CANDIDATES: usize = 1 << 16;
