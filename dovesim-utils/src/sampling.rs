//! Generic helpers for splitting work and drawing weighted samples.

use rand::{distributions::WeightedIndex, prelude::*};

/// Divide `items` into `n` roughly equal contiguous chunks.
///
/// The first `n - 1` chunks hold `items.len() / n` elements each; the last
/// chunk takes the remainder. Requires `0 < n <= items.len()`.
pub fn chunk<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    assert!(n > 0 && n <= items.len());

    let stride = items.len() / n;
    let mut chunks: Vec<Vec<T>> = Vec::with_capacity(n);

    for idx in 0..n - 1 {
        chunks.push(items[idx * stride..(idx + 1) * stride].to_vec());
    }
    chunks.push(items[(n - 1) * stride..].to_vec());

    chunks
}

/// Draw up to `n` distinct elements uniformly at random, in random order.
/// Returns fewer than `n` elements when the input is shorter.
pub fn random_sample<T, R>(items: impl IntoIterator<Item = T>, n: usize, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let mut elems: Vec<T> = items.into_iter().collect();
    elems.shuffle(rng);
    elems.truncate(n);
    elems
}

/// Pick one element uniformly at random, or `None` on an empty slice.
pub fn single_random_sample<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.gen_range(0..items.len())])
    }
}

/// Draw `n` keys from a `(key, weight)` sequence, each key chosen with
/// probability proportional to its weight.
///
/// Returns an empty vector when every weight is zero (or the sequence is
/// empty), since no draw is meaningful in that case.
pub fn sample_by_weights<'a, K, W, R>(
    pairs: impl Iterator<Item = (&'a K, &'a W)>,
    n: usize,
    rng: &mut R,
) -> Vec<K>
where
    K: Clone + 'a,
    W: Copy + Into<f64> + 'a,
    R: Rng + ?Sized,
{
    let (keys, weights): (Vec<&K>, Vec<f64>) =
        pairs.map(|(k, w)| (k, (*w).into())).unzip();

    let Ok(dist) = WeightedIndex::new(&weights) else {
        return Vec::new();
    };

    (0..n).map(|_| keys[dist.sample(rng)].clone()).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn chunk_splits_evenly() {
        let items: Vec<u32> = (0..10).collect();
        let chunks = chunk(&items, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], vec![0, 1, 2]);
        assert_eq!(chunks[1], vec![3, 4, 5]);
        assert_eq!(chunks[2], vec![6, 7, 8, 9]);
    }

    #[test]
    fn chunk_single() {
        let items = vec![1, 2, 3];
        let chunks = chunk(&items, 1);
        assert_eq!(chunks, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn chunk_covers_all_items() {
        let items: Vec<u32> = (0..17).collect();
        let chunks = chunk(&items, 4);
        let total: usize = chunks.iter().map(Vec::len).sum();
        assert_eq!(total, items.len());
        let flat: Vec<u32> = chunks.into_iter().flatten().collect();
        assert_eq!(flat, items);
    }

    #[test]
    fn random_sample_draws_distinct_elements() {
        let mut rng = StdRng::seed_from_u64(11);
        let pool: Vec<u32> = (0..20).collect();

        let mut drawn = random_sample(pool.iter().copied(), 5, &mut rng);
        assert_eq!(drawn.len(), 5);
        drawn.sort_unstable();
        drawn.dedup();
        assert_eq!(drawn.len(), 5);
        assert!(drawn.iter().all(|x| pool.contains(x)));
    }

    #[test]
    fn random_sample_caps_at_the_input_size() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut drawn = random_sample(vec![1, 2, 3], 10, &mut rng);
        drawn.sort_unstable();
        assert_eq!(drawn, vec![1, 2, 3]);
    }

    #[test]
    fn single_sample_handles_empty_and_singleton() {
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(single_random_sample::<u32, _>(&[], &mut rng), None);
        assert_eq!(single_random_sample(&[7], &mut rng), Some(&7));

        let pool = [1, 2, 3];
        let picked = single_random_sample(&pool, &mut rng).unwrap();
        assert!(pool.contains(picked));
    }

    #[test]
    fn weighted_draws_respect_zero_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let pairs = [("a".to_string(), 0.0), ("b".to_string(), 1.0)];
        let drawn = sample_by_weights(pairs.iter().map(|(k, w)| (k, w)), 100, &mut rng);
        assert_eq!(drawn.len(), 100);
        assert!(drawn.iter().all(|k| k == "b"));
    }

    #[test]
    fn weighted_draws_empty_when_all_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        let pairs = [("a".to_string(), 0.0)];
        let drawn = sample_by_weights(pairs.iter().map(|(k, w)| (k, w)), 3, &mut rng);
        assert!(drawn.is_empty());
    }
}
