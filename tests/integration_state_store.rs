//! PostgreSQL State Store Integration Tests
//!
//! Require a running database. Run with:
//! DATABASE_URL=postgres://... cargo test --test integration_state_store -- --ignored

use std::sync::Arc;

use chrono::Utc;
use ledger_core::handlers::{CreateAccountCommand, DepositCommand, TransferCommand};
use ledger_core::state::{ChangeSet, Read, UnitOfWork, Write};
use ledger_core::{db, LedgerError, LedgerFacade, OperationContext, PgStateStore, StateStore, StoreError};

mod common;

#[tokio::test]
#[ignore]
async fn test_put_get_range() {
    let pool = common::setup_test_db().await;
    assert!(db::check_schema(&pool).await.unwrap());
    let store = PgStateStore::new(pool);

    let version = store
        .apply(ChangeSet {
            reads: vec![],
            writes: vec![
                Write {
                    key: "\0k\0a\0".to_string(),
                    value: Some(b"1".to_vec()),
                },
                Write {
                    key: "\0k\0b\0".to_string(),
                    value: Some(b"2".to_vec()),
                },
                Write {
                    key: "\0other\0".to_string(),
                    value: Some(b"3".to_vec()),
                },
            ],
        })
        .await
        .unwrap();

    let a = store.get("\0k\0a\0").await.unwrap().unwrap();
    assert_eq!(a.value, b"1");
    assert_eq!(a.version, version);

    let scanned = store.range_scan("\0k\0", "\0k\u{1}").await.unwrap();
    let keys: Vec<&str> = scanned.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["\0k\0a\0", "\0k\0b\0"]);
}

#[tokio::test]
#[ignore]
async fn test_stale_read_conflicts() {
    let pool = common::setup_test_db().await;
    let store = PgStateStore::new(pool);

    let first = store
        .apply(ChangeSet {
            reads: vec![],
            writes: vec![Write {
                key: "\0k\0".to_string(),
                value: Some(b"1".to_vec()),
            }],
        })
        .await
        .unwrap();

    store
        .apply(ChangeSet {
            reads: vec![Read {
                key: "\0k\0".to_string(),
                version: Some(first),
            }],
            writes: vec![Write {
                key: "\0k\0".to_string(),
                value: Some(b"2".to_vec()),
            }],
        })
        .await
        .unwrap();

    let stale = store
        .apply(ChangeSet {
            reads: vec![Read {
                key: "\0k\0".to_string(),
                version: Some(first),
            }],
            writes: vec![Write {
                key: "\0k\0".to_string(),
                value: None,
            }],
        })
        .await;
    assert!(matches!(stale, Err(StoreError::Conflict { .. })));
    assert!(store.get("\0k\0").await.unwrap().is_some());
}

#[tokio::test]
#[ignore]
async fn test_ledger_over_postgres() {
    let pool = common::setup_test_db().await;
    let ledger: LedgerFacade<PgStateStore> = LedgerFacade::new(Arc::new(PgStateStore::new(pool)));
    let ctx = OperationContext::generate();

    for id in ["A", "B"] {
        ledger
            .create_account(CreateAccountCommand::new(id, Utc::now()), &ctx)
            .await
            .unwrap();
    }
    ledger
        .deposit(
            DepositCommand::new("A", 500, Utc::now()).with_reference_number("r1"),
            &ctx,
        )
        .await
        .unwrap();
    ledger
        .transfer(
            TransferCommand::new("A", "B", 200, Utc::now()).with_reference_number("r2"),
            &ctx,
        )
        .await
        .unwrap();

    assert_eq!(ledger.get_account("A").await.unwrap().balance().minor_units(), 300);
    assert_eq!(ledger.get_account("B").await.unwrap().balance().minor_units(), 200);

    let replay = ledger
        .transfer(
            TransferCommand::new("A", "B", 200, Utc::now()).with_reference_number("r2"),
            &ctx,
        )
        .await;
    assert!(matches!(replay, Err(LedgerError::Duplicate { .. })));

    let view = ledger.get_transfer("A", "B", "r2").await.unwrap();
    assert_eq!(view.amount.minor_units(), 200);
}

#[tokio::test]
#[ignore]
async fn test_interleaved_units_over_postgres() {
    let pool = common::setup_test_db().await;
    let store = PgStateStore::new(pool);

    store
        .apply(ChangeSet {
            reads: vec![],
            writes: vec![Write {
                key: "\0counter\0".to_string(),
                value: Some(b"0".to_vec()),
            }],
        })
        .await
        .unwrap();

    let mut first = UnitOfWork::new(&store);
    let mut second = UnitOfWork::new(&store);
    first.get("\0counter\0").await.unwrap();
    second.get("\0counter\0").await.unwrap();
    first.put("\0counter\0", b"1".to_vec());
    second.put("\0counter\0", b"2".to_vec());

    first.commit().await.unwrap();
    let result = second.commit().await;
    assert!(matches!(result, Err(StoreError::Conflict { .. })));

    let value = store.get("\0counter\0").await.unwrap().unwrap();
    assert_eq!(value.value, b"1");
}
