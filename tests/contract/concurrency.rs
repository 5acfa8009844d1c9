//! Concurrent units of work never lose an update.
//!
//! `native` rejects the later of two conflicting commits, so the work is
//! retried; `redb` and `lmdb` serialize writers and never conflict.

use std::sync::{Arc, Barrier};
use std::thread;

use crate::harness::{all_backends, read};
use tkv::{parse_counter, KvResult, RetryConfig};

const THREADS: usize = 4;
const ROUNDS: usize = 25;

fn patient() -> RetryConfig {
    RetryConfig::default()
        .with_max_retries(10_000)
        .with_base_delay_ms(0)
        .with_max_delay_ms(1)
}

#[test]
fn concurrent_increments_are_not_lost() {
    for b in all_backends() {
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let client = b.client.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..ROUNDS {
                        client
                            .txn_with_retry(&patient(), |tx| tx.incr_by(b"hits", 1))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let total = parse_counter(&read(&b.client, b"hits").unwrap()).unwrap();
        assert_eq!(total, (THREADS * ROUNDS) as i64, "backend {}", b.name);
    }
}

#[test]
fn concurrent_appends_are_not_lost() {
    for b in all_backends() {
        let handles: Vec<_> = (0..THREADS as u8)
            .map(|t| {
                let client = b.client.clone();
                thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        client
                            .txn_with_retry(&patient(), |tx| tx.append(b"log", &[t]))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let log = read(&b.client, b"log").unwrap();
        assert_eq!(log.len(), THREADS * ROUNDS, "backend {}", b.name);
        for t in 0..THREADS as u8 {
            assert_eq!(log.iter().filter(|&&x| x == t).count(), ROUNDS);
        }
    }
}

#[test]
fn disjoint_writers_all_commit() {
    for b in all_backends() {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let client = b.client.clone();
                thread::spawn(move || {
                    for i in 0..ROUNDS {
                        let key = format!("t{}/{:03}", t, i);
                        client.txn(|tx| tx.set(key.as_bytes(), b"x")).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let keys = b.client.txn(|tx| tx.scan_keys(b"t")).unwrap();
        assert_eq!(keys.len(), THREADS * ROUNDS, "backend {}", b.name);
    }
}

#[test]
fn conflicting_read_modify_write_is_retryable() {
    for b in all_backends() {
        if b.name != "native" {
            // Single-writer engines cannot run two write transactions at once
            continue;
        }
        let err = b
            .client
            .txn(|tx| -> KvResult<()> {
                tx.incr_by(b"n", 1)?;
                b.client.txn(|other| other.incr_by(b"n", 1))?;
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(parse_counter(&read(&b.client, b"n").unwrap()).unwrap(), 1);
    }
}
