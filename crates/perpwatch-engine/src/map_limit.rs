//! Bounded-concurrency ordered map.

use futures_util::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Apply `f` to every item with at most `limit` calls in flight.
///
/// `max(1, limit)` logical workers share an atomic cursor; each worker
/// claims the next unclaimed index until the input is exhausted. Results
/// land in their input slot, so output order matches input order no matter
/// which call completes first.
///
/// `f` is infallible at this layer: per-item checks are expected to catch
/// internally and resolve to a sentinel rather than abort siblings.
pub async fn map_limit<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    let slots: Vec<Mutex<Option<T>>> = items.into_iter().map(|i| Mutex::new(Some(i))).collect();
    let results: Vec<Mutex<Option<R>>> = (0..total).map(|_| Mutex::new(None)).collect();
    let cursor = AtomicUsize::new(0);

    let workers = (0..limit.max(1)).map(|_| {
        let cursor = &cursor;
        let slots = &slots;
        let results = &results;
        let f = &f;
        async move {
            loop {
                let i = cursor.fetch_add(1, Ordering::SeqCst);
                if i >= total {
                    break;
                }
                // Each index is claimed exactly once via the cursor.
                let item = slots[i].lock().take().expect("slot claimed twice");
                let out = f(item).await;
                *results[i].lock() = Some(out);
            }
        }
    });

    join_all(workers).await;

    results
        .into_iter()
        .map(|m| m.into_inner().expect("worker filled every claimed slot"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_order_preserved_under_varied_latency() {
        // Later items finish first; output must still follow input order.
        let items = vec![('a', 50u64), ('b', 10), ('c', 40), ('d', 5), ('e', 30)];
        let out = map_limit(items, 2, |(tag, delay_ms)| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            tag
        })
        .await;
        assert_eq!(out, vec!['a', 'b', 'c', 'd', 'e']);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..25).collect();
        let limit = 4;
        {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            map_limit(items, limit, move |i| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    i
                }
            })
            .await;
        }

        assert!(peak.load(Ordering::SeqCst) <= limit);
        assert!(peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_limit_larger_than_input() {
        let out = map_limit(vec![1, 2, 3], 10, |i| async move { i * 2 }).await;
        assert_eq!(out, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_zero_limit_treated_as_one() {
        let out = map_limit(vec![1, 2], 0, |i| async move { i + 1 }).await;
        assert_eq!(out, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<i32> = map_limit(Vec::<i32>::new(), 3, |i| async move { i }).await;
        assert!(out.is_empty());
    }
}
