//! Range and prefix scans.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::harness::{all_backends, seed_all};
use tkv::{next_key, KvError, KvResult};

fn keys_of(map: &tkv::KvMap) -> Vec<&[u8]> {
    map.keys().map(Vec::as_slice).collect()
}

#[test]
fn range_is_half_open() {
    for b in all_backends() {
        seed_all(&b.client, &[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
        let got = b.client.txn(|tx| tx.scan_range(b"b", b"d", None)).unwrap();
        assert_eq!(keys_of(&got), vec![&b"b"[..], &b"c"[..]], "backend {}", b.name);
        assert_eq!(got[&b"c"[..]], b"3".to_vec());
    }
}

#[test]
fn empty_and_single_key_ranges() {
    for b in all_backends() {
        seed_all(&b.client, &[("a", "1"), ("b", "2")]);
        let (empty, reversed, single) = b
            .client
            .txn(|tx| {
                Ok::<_, KvError>((
                    tx.scan_range(b"b", b"b", None)?,
                    tx.scan_range(b"b", b"a", None)?,
                    tx.scan_range(b"a", b"a\x00", None)?,
                ))
            })
            .unwrap();
        assert!(empty.is_empty(), "backend {}", b.name);
        assert!(reversed.is_empty(), "backend {}", b.name);
        assert_eq!(keys_of(&single), vec![&b"a"[..]], "backend {}", b.name);
    }
}

#[test]
fn filter_selects_entries() {
    for b in all_backends() {
        seed_all(&b.client, &[("n/1", "odd"), ("n/2", "even"), ("n/3", "odd")]);
        let only_odd = |_: &[u8], v: &[u8]| v == b"odd";
        let got = b
            .client
            .txn(|tx| tx.scan_values(b"n/", Some(&only_odd)))
            .unwrap();
        assert_eq!(keys_of(&got), vec![&b"n/1"[..], &b"n/3"[..]], "backend {}", b.name);
    }
}

#[test]
fn prefix_scans_stay_inside_prefix() {
    for b in all_backends() {
        seed_all(
            &b.client,
            &[("dir", "x"), ("dir/a", "1"), ("dir/b", "2"), ("dir0", "y"), ("dis", "z")],
        );
        let keys = b.client.txn(|tx| tx.scan_keys(b"dir/")).unwrap();
        assert_eq!(keys, vec![b"dir/a".to_vec(), b"dir/b".to_vec()], "backend {}", b.name);

        let all = b.client.txn(|tx| tx.scan_keys(b"")).unwrap();
        assert_eq!(all.len(), 5, "backend {}", b.name);
    }
}

#[test]
fn exist_checks_prefix() {
    for b in all_backends() {
        seed_all(&b.client, &[("user/7", "x")]);
        let (user, users, group) = b
            .client
            .txn(|tx| Ok::<_, KvError>((tx.exist(b"user/")?, tx.exist(b"users")?, tx.exist(b"group")?)))
            .unwrap();
        assert!(user, "backend {}", b.name);
        assert!(!users, "backend {}", b.name);
        assert!(!group, "backend {}", b.name);
    }
}

#[test]
fn scans_see_own_writes_and_deletes() {
    for b in all_backends() {
        seed_all(&b.client, &[("p/1", "old"), ("p/2", "old"), ("p/3", "old")]);
        let keys = b
            .client
            .txn(|tx| -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
                tx.set(b"p/2", b"new")?;
                tx.set(b"p/4", b"added")?;
                tx.dels(&[&b"p/1"[..], &b"p/9"[..]])?;
                Ok(tx.scan_values(b"p/", None)?.into_iter().collect())
            })
            .unwrap();
        assert_eq!(
            keys,
            vec![
                (b"p/2".to_vec(), b"new".to_vec()),
                (b"p/3".to_vec(), b"old".to_vec()),
                (b"p/4".to_vec(), b"added".to_vec()),
            ],
            "backend {}",
            b.name
        );
    }
}

#[test]
fn exist_on_all_ff_prefix() {
    for b in all_backends() {
        b.client
            .txn(|tx| tx.set(&[0xff, 0x01], b"top"))
            .unwrap();
        let (short, exact, longer) = b
            .client
            .txn(|tx| {
                Ok::<_, KvError>((tx.exist(&[0xff])?, tx.exist(&[0xff, 0x01])?, tx.exist(&[0xff, 0xff])?))
            })
            .unwrap();
        assert!(short, "backend {}", b.name);
        assert!(exact, "backend {}", b.name);
        assert!(!longer, "backend {}", b.name);
    }
}

#[test]
fn all_ff_prefix_is_key_overflow() {
    for b in all_backends() {
        let err = b.client.txn(|tx| tx.scan_keys(&[0xff, 0xff])).unwrap_err();
        assert!(matches!(err, KvError::KeyOverflow(_)), "backend {}", b.name);
        assert!(err.is_fatal());
    }
}

#[test]
fn walk_stops_early() {
    for b in all_backends() {
        seed_all(&b.client, &[("a", "1"), ("b", "2"), ("c", "3")]);
        let mut seen = Vec::new();
        b.client
            .txn(|tx| {
                tx.walk(b"", None, &mut |k, _| {
                    seen.push(k.to_vec());
                    seen.len() < 2
                })
            })
            .unwrap();
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec()], "backend {}", b.name);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Scans return exactly the committed keys in `[begin, end)`
    #[test]
    fn scan_range_matches_model(
        entries in prop::collection::btree_map(
            prop::collection::vec(0u8..4, 1..4),
            prop::collection::vec(any::<u8>(), 0..4),
            0..12,
        ),
        begin in prop::collection::vec(0u8..4, 0..3),
        end in prop::collection::vec(0u8..4, 0..3),
    ) {
        for b in all_backends() {
            b.client
                .txn(|tx| -> KvResult<()> {
                    for (k, v) in &entries {
                        tx.set(k, v)?;
                    }
                    Ok(())
                })
                .unwrap();

            let got = b.client.txn(|tx| tx.scan_range(&begin, &end, None)).unwrap();
            let expected: BTreeMap<Vec<u8>, Vec<u8>> = entries
                .iter()
                .filter(|(k, _)| begin.as_slice() <= k.as_slice() && k.as_slice() < end.as_slice())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            prop_assert_eq!(got, expected, "backend {}", b.name);
        }
    }

    /// A prefix scan returns exactly the keys carrying the prefix
    #[test]
    fn prefix_scan_matches_model(
        keys in prop::collection::btree_set(prop::collection::vec(prop_oneof![Just(0u8), Just(0xfe), Just(0xff)], 1..4), 0..10),
        prefix in prop::collection::vec(prop_oneof![Just(0u8), Just(0xfe)], 0..3),
    ) {
        prop_assume!(next_key(&prefix).is_ok());
        for b in all_backends() {
            b.client
                .txn(|tx| -> KvResult<()> {
                    for k in &keys {
                        tx.set(k, b"")?;
                    }
                    Ok(())
                })
                .unwrap();
            let got = b.client.txn(|tx| tx.scan_keys(&prefix)).unwrap();
            let expected: Vec<Vec<u8>> = keys.iter().filter(|k| k.starts_with(&prefix)).cloned().collect();
            prop_assert_eq!(got, expected, "backend {}", b.name);
        }
    }
}
