use crate::constants;

/// Returns the number of download workers to use for a given number of items
/// Can be overridden by setting the environment variable MIRROR_NUM_THREADS
/// Defaults to 3x the number of CPUs, but never more workers than items
pub fn num_workers_for_items(num_items: usize) -> usize {
    // If the environment variable is set, use that
    if let Ok(num_threads) = std::env::var("MIRROR_NUM_THREADS") {
        if let Ok(num_threads) = num_threads.parse::<usize>() {
            return num_threads;
        }
    }

    let num_workers = constants::WORKERS_PER_CPU * num_cpus::get();

    if num_workers > num_items {
        num_items
    } else {
        num_workers
    }
}
