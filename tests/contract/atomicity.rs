//! All-or-nothing commits.

use crate::harness::{all_backends, read, seed_all};
use tkv::{KvError, KvResult};

#[test]
fn failed_work_leaves_no_trace() {
    for b in all_backends() {
        seed_all(&b.client, &[("keep", "1"), ("drop", "2")]);

        let result = b.client.txn(|tx| -> KvResult<()> {
            tx.set(b"keep", b"changed")?;
            tx.delete(b"drop")?;
            tx.set(b"new", b"3")?;
            tx.incr_by(b"count", 10)?;
            tx.append(b"log", b"entry")?;
            Err(KvError::aborted("validation failed"))
        });
        assert!(result.is_err(), "backend {}", b.name);

        let state = b
            .client
            .txn(|tx| tx.gets(&[&b"keep"[..], &b"drop"[..], &b"new"[..], &b"count"[..], &b"log"[..]]))
            .unwrap();
        assert_eq!(
            state,
            vec![Some(b"1".to_vec()), Some(b"2".to_vec()), None, None, None],
            "backend {}",
            b.name
        );
    }
}

#[test]
fn contract_error_mid_work_rolls_back() {
    for b in all_backends() {
        let err = b
            .client
            .txn(|tx| -> KvResult<()> {
                tx.set(b"before", b"x")?;
                tx.scan_keys(&[0xff])?;
                tx.set(b"after", b"y")
            })
            .unwrap_err();
        assert!(matches!(err, KvError::KeyOverflow(_)), "backend {}", b.name);
        assert_eq!(read(&b.client, b"before"), None, "backend {}", b.name);
        assert_eq!(read(&b.client, b"after"), None, "backend {}", b.name);
    }
}

#[test]
fn batch_delete_is_atomic() {
    for b in all_backends() {
        seed_all(&b.client, &[("a", "1"), ("b", "2"), ("c", "3")]);
        b.client
            .txn(|tx| tx.dels(&[&b"a"[..], &b"c"[..], &b"missing"[..]]))
            .unwrap();
        let left = b.client.txn(|tx| tx.scan_keys(b"")).unwrap();
        assert_eq!(left, vec![b"b".to_vec()], "backend {}", b.name);
    }
}

#[test]
fn rolled_back_work_survives_no_reopen() {
    for b in all_backends() {
        seed_all(&b.client, &[("k", "committed")]);
        let _ = b.client.txn(|tx| -> KvResult<()> {
            tx.set(b"k", b"uncommitted")?;
            Err(KvError::aborted("no"))
        });

        let b = b.reopen();
        assert_eq!(read(&b.client, b"k"), Some(b"committed".to_vec()), "backend {}", b.name);
    }
}
