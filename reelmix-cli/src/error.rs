// ============================================================================
// reelmix-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and process exit codes
//
// The CLI reports core errors as they are. The only CLI-specific concern is
// mapping them to an exit status.

use reelmix_core::{CoreError, CoreResult};

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Exit status for fatal errors.
pub const EXIT_FAILURE: i32 = 1;

/// Exit status for a run cancelled by the user (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

/// Maps a fatal error to the process exit status.
pub fn exit_code(error: &CoreError) -> i32 {
    if error.is_cancelled() {
        EXIT_CANCELLED
    } else {
        EXIT_FAILURE
    }
}
