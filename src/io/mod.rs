// Process-level I/O for the daemon
pub mod lock; // Single-instance lock file
pub mod signals; // Unix signal handling
