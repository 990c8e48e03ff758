//! Constants Module
//!
//! Shared constants for the service: defaults, limits, code formats.

// ============================================
// APPLICATION CONSTANTS
// ============================================

pub const APP_NAME: &str = "MedPredict";

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for every API route
pub const API_PREFIX: &str = "/api";

// ============================================
// SERVER DEFAULTS
// ============================================

pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8000;

/// Requests per key per window
pub const DEFAULT_RATE_LIMIT: u32 = 120;

pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Per-request handler timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_TELEMETRY_DIR: &str = "./telemetry";

/// Events held in memory before flushing to disk
pub const DEFAULT_TELEMETRY_BUFFER: usize = 1000;

// ============================================
// IDENTIFIERS
// ============================================

/// Bearer tokens look like `mp_<32 alphanumerics>`
pub const TOKEN_PREFIX: &str = "mp_";
pub const TOKEN_LEN: usize = 32;

/// Doctor codes look like `DR-XXXXXXXX`; no 0/O/1/I to avoid misreads
pub const DOCTOR_CODE_PREFIX: &str = "DR-";
pub const DOCTOR_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const DOCTOR_CODE_LEN: usize = 8;
pub const DOCTOR_CODE_ATTEMPTS: usize = 30;

/// Health entry ids look like `E<16 hex>`
pub const HEALTH_ENTRY_PREFIX: &str = "E";

// ============================================
// ACCOUNTS
// ============================================

/// PBKDF2-HMAC-SHA256 iterations for new password hashes
pub const DEFAULT_PASSWORD_ROUNDS: u32 = 210_000;
/// Lowest accepted `MEDPREDICT_PASSWORD_ROUNDS`
pub const MIN_PASSWORD_ROUNDS: u32 = 1_000;
pub const PASSWORD_SALT_LEN: usize = 16;
pub const PASSWORD_HASH_LEN: usize = 32;
pub const MIN_PASSWORD_LEN: usize = 6;

// ============================================
// API LIMITS
// ============================================

pub const MAX_CHAT_MESSAGE_LEN: usize = 2000;

/// Rows in the overview's top-risk and recent-assessment lists
pub const OVERVIEW_LIST_LEN: usize = 4;

/// Most recent logged entries plotted per trend series
pub const TREND_POINTS: usize = 8;
