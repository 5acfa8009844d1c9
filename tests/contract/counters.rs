//! Counters and append.

use crate::harness::{all_backends, read, seed};
use tkv::{pack_counter, parse_counter, KvError, KvResult};

#[test]
fn increments_compose() {
    for b in all_backends() {
        b.client.txn(|tx| tx.incr_by(b"n", 7)).unwrap();
        let last = b.client.txn(|tx| tx.incr_by(b"n", -10)).unwrap();
        assert_eq!(last, -3, "backend {}", b.name);
        assert_eq!(parse_counter(&read(&b.client, b"n").unwrap()).unwrap(), -3);
    }
}

#[test]
fn increments_in_one_transaction_compose() {
    for b in all_backends() {
        let values = b
            .client
            .txn(|tx| Ok::<_, KvError>((tx.incr_by(b"n", 2)?, tx.incr_by(b"n", 3)?)))
            .unwrap();
        assert_eq!(values, (2, 5), "backend {}", b.name);
    }
}

#[test]
fn zero_increment_never_creates_key() {
    for b in all_backends() {
        assert_eq!(b.client.txn(|tx| tx.incr_by(b"n", 0)).unwrap(), 0);
        assert_eq!(read(&b.client, b"n"), None, "backend {}", b.name);

        seed(&b.client, b"m", &pack_counter(41));
        assert_eq!(b.client.txn(|tx| tx.incr_by(b"m", 0)).unwrap(), 41);
    }
}

#[test]
fn counter_encoding_is_shared_with_codec() {
    for b in all_backends() {
        seed(&b.client, b"n", &pack_counter(i64::MAX - 1));
        assert_eq!(b.client.txn(|tx| tx.incr_by(b"n", 1)).unwrap(), i64::MAX);

        let overflow = b.client.txn(|tx| tx.incr_by(b"n", 1)).unwrap_err();
        assert!(matches!(overflow, KvError::CounterOverflow { .. }), "backend {}", b.name);
        assert_eq!(parse_counter(&read(&b.client, b"n").unwrap()).unwrap(), i64::MAX);
    }
}

#[test]
fn malformed_counter_is_fatal() {
    for b in all_backends() {
        seed(&b.client, b"n", b"abc");
        let err = b.client.txn(|tx| tx.incr_by(b"n", 1)).unwrap_err();
        assert!(matches!(err, KvError::InvalidCounter(3)), "backend {}", b.name);
        assert!(err.is_fatal());
    }
}

#[test]
fn appends_compose() {
    for b in all_backends() {
        let first = b.client.txn(|tx| tx.append(b"log", b"ab")).unwrap();
        assert_eq!(first, b"ab".to_vec());
        b.client
            .txn(|tx| -> KvResult<()> {
                tx.append(b"log", b"cd")?;
                tx.append(b"log", b"")?;
                Ok(())
            })
            .unwrap();
        assert_eq!(read(&b.client, b"log"), Some(b"abcd".to_vec()), "backend {}", b.name);
    }
}
