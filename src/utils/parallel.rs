/// Parallel processing utilities

/// Resolve a requested thread count; 0 means all available cores
pub fn effective_threads(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}

pub fn configure_thread_pool(threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(effective_threads(threads))
        .build_global()
}
