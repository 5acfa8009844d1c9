//! Basic read/write behavior and the reference scenario.

use crate::harness::{all_backends, read};
use tkv::{parse_counter, KvError, KvResult};

#[test]
fn unwritten_keys_are_absent() {
    for b in all_backends() {
        let got = b
            .client
            .txn(|tx| tx.gets(&[&b"x"[..], &b"y"[..], &[0xff, 0x00][..]]))
            .unwrap();
        assert_eq!(got, vec![None, None, None], "backend {}", b.name);
    }
}

#[test]
fn write_is_visible_in_same_and_later_transactions() {
    for b in all_backends() {
        let inside = b
            .client
            .txn(|tx| {
                tx.set(b"k", b"v1")?;
                let first = tx.get(b"k")?;
                tx.set(b"k", b"v2")?;
                Ok::<_, KvError>((first, tx.get(b"k")?))
            })
            .unwrap();
        assert_eq!(inside, (Some(b"v1".to_vec()), Some(b"v2".to_vec())), "backend {}", b.name);
        assert_eq!(read(&b.client, b"k"), Some(b"v2".to_vec()), "backend {}", b.name);
    }
}

#[test]
fn delete_is_visible_immediately() {
    for b in all_backends() {
        crate::harness::seed(&b.client, b"k", b"v");
        let after = b
            .client
            .txn(|tx| {
                tx.delete(b"k")?;
                tx.get(b"k")
            })
            .unwrap();
        assert_eq!(after, None, "backend {}", b.name);
        assert_eq!(read(&b.client, b"k"), None, "backend {}", b.name);
    }
}

#[test]
fn reference_scenario() {
    for b in all_backends() {
        let client = &b.client;

        client
            .txn(|tx| -> KvResult<()> {
                tx.set(b"a", &[1])?;
                tx.set(b"b", &[2])
            })
            .unwrap();
        assert_eq!(read(client, b"a"), Some(vec![1]));
        assert_eq!(read(client, b"b"), Some(vec![2]));

        client.txn(|tx| tx.incr_by(b"c", 5)).unwrap();
        assert_eq!(parse_counter(&read(client, b"c").unwrap()).unwrap(), 5);

        client.txn(|tx| tx.incr_by(b"c", -3)).unwrap();
        assert_eq!(parse_counter(&read(client, b"c").unwrap()).unwrap(), 2);

        let result = client.txn(|tx| -> KvResult<()> {
            tx.set(b"z", &[9])?;
            Err(KvError::aborted("work failed"))
        });
        assert!(matches!(result, Err(KvError::Aborted(_))), "backend {}", b.name);
        assert_eq!(read(client, b"z"), None, "backend {}", b.name);
    }
}

#[test]
fn committed_data_survives_reopen() {
    for b in all_backends() {
        crate::harness::seed_all(&b.client, &[("persist", "yes"), ("other", "1")]);
        b.client.txn(|tx| tx.delete(b"other")).unwrap();

        let b = b.reopen();
        assert_eq!(read(&b.client, b"persist"), Some(b"yes".to_vec()), "backend {}", b.name);
        assert_eq!(read(&b.client, b"other"), None, "backend {}", b.name);
    }
}
