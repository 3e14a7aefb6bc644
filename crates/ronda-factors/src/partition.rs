//! Map over independent per-security partitions.

use rayon::prelude::*;

/// Apply `f` to every partition, returning results in input order.
///
/// With `parallel` set the partitions are processed on the rayon pool;
/// otherwise sequentially. Both paths give identical output.
pub fn map_partitions<T, R, F>(partitions: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        partitions.par_iter().map(f).collect()
    } else {
        partitions.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_matches_sequential() {
        let items: Vec<u64> = (0..1000).collect();
        let seq = map_partitions(&items, false, |x| x * 2);
        let par = map_partitions(&items, true, |x| x * 2);
        assert_eq!(seq, par);
        assert_eq!(par[999], 1998);
    }
}
