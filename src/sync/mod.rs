//! Debounced persistence scheduling

mod scheduler;

pub use scheduler::DebouncedSync;
