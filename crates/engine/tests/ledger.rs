use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Allocation, BillStatus, ConflictDetail, CreatePaymentCmd, Directive, Engine, EngineError,
    MAX_AMOUNT_MINOR, NewBillCmd, NewSupplierCmd, PaymentListFilter, PaymentMode,
    StatementLineKind, UpdatePaymentCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A fresh database file, so that several connections and worker threads
/// really run side by side.
async fn engine_with_file_db() -> (Arc<Engine>, DatabaseConnection, PathBuf) {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (Arc::new(engine), db, path)
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, 10, 0, 0).unwrap()
}

async fn supplier(engine: &Engine, name: &str) -> Uuid {
    engine
        .new_supplier(NewSupplierCmd::new(name))
        .await
        .unwrap()
        .id
}

async fn bill(engine: &Engine, supplier_id: Uuid, number: &str, amount: i64, d: u32) -> Uuid {
    engine
        .new_bill(NewBillCmd::new(supplier_id, number, amount).date(day(d)))
        .await
        .unwrap()
        .id
}

async fn paid(engine: &Engine, bill_id: Uuid) -> i64 {
    engine.bill(bill_id).await.unwrap().paid_minor()
}

/// Every stored status must match the one derived from the stored amounts.
async fn assert_statuses_consistent(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let rows = db
        .query_all(Statement::from_string(
            backend,
            "SELECT status, paid_minor, amount_minor FROM bills",
        ))
        .await
        .unwrap();
    for row in rows {
        let status: String = row.try_get("", "status").unwrap();
        let paid: i64 = row.try_get("", "paid_minor").unwrap();
        let amount: i64 = row.try_get("", "amount_minor").unwrap();
        assert!(paid >= 0 && paid <= amount + 1, "paid {paid} out of range");
        assert_eq!(status, BillStatus::derive(paid, amount).as_str());
    }
}

#[tokio::test]
async fn auto_allocation_pays_oldest_bills_first() {
    let (engine, db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b3 = bill(&engine, supplier_id, "B-3", 10_000, 3).await;
    let b1 = bill(&engine, supplier_id, "B-1", 10_000, 1).await;
    let b2 = bill(&engine, supplier_id, "B-2", 10_000, 2).await;

    let payment = engine
        .create_payment(CreatePaymentCmd::new(supplier_id, 15_000))
        .await
        .unwrap();

    assert_eq!(
        payment.bills_allocated(),
        &[Allocation::new(b1, 10_000), Allocation::new(b2, 5_000)]
    );
    assert_eq!(payment.mode, PaymentMode::Other);
    assert_eq!(engine.bill(b1).await.unwrap().status(), BillStatus::Paid);
    assert_eq!(
        engine.bill(b2).await.unwrap().status(),
        BillStatus::PartiallyPaid
    );
    assert_eq!(engine.bill(b3).await.unwrap().status(), BillStatus::Credit);
    assert_statuses_consistent(&db).await;
}

#[tokio::test]
async fn manual_directive_is_capped_and_rest_flows_to_auto() {
    let (engine, db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let older = bill(&engine, supplier_id, "B-1", 50_000, 1).await;
    let middle = bill(&engine, supplier_id, "B-2", 50_000, 2).await;
    let directed = bill(&engine, supplier_id, "B-3", 50_000, 3).await;

    let payment = engine
        .create_payment(
            CreatePaymentCmd::new(supplier_id, 100_000)
                .mode(PaymentMode::BankTransfer)
                .directive(Directive::manual(directed, 20_000)),
        )
        .await
        .unwrap();

    assert_eq!(
        payment.bills_allocated(),
        &[
            Allocation::new(directed, 20_000),
            Allocation::new(older, 50_000),
            Allocation::new(middle, 30_000),
        ]
    );
    assert_eq!(paid(&engine, directed).await, 20_000);
    assert_eq!(payment.unallocated_minor(), 0);
    assert_statuses_consistent(&db).await;
}

#[tokio::test]
async fn excess_amount_is_kept_unallocated() {
    let (engine, _db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b1 = bill(&engine, supplier_id, "B-1", 10_000, 1).await;

    let payment = engine
        .create_payment(CreatePaymentCmd::new(supplier_id, 12_000))
        .await
        .unwrap();

    assert_eq!(payment.amount_minor, 12_000);
    assert_eq!(payment.allocated_minor(), 10_000);
    assert_eq!(payment.unallocated_minor(), 2_000);
    assert_eq!(paid(&engine, b1).await, 10_000);
}

#[tokio::test]
async fn create_payment_rejects_bad_input() {
    let (engine, _db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let other_id = supplier(&engine, "Other").await;
    let foreign = bill(&engine, other_id, "X-1", 10_000, 1).await;

    let err = engine
        .create_payment(CreatePaymentCmd::new(supplier_id, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .create_payment(CreatePaymentCmd::new(Uuid::new_v4(), 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .create_payment(
            CreatePaymentCmd::new(supplier_id, 1_000).directive(Directive::full(foreign)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    assert_eq!(paid(&engine, foreign).await, 0);

    let err = engine
        .create_payment(
            CreatePaymentCmd::new(supplier_id, 1_000).directive(Directive::manual(foreign, -5)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let history = engine
        .list_payments(&PaymentListFilter::default())
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn directive_to_unknown_bill_is_skipped() {
    let (engine, _db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b1 = bill(&engine, supplier_id, "B-1", 10_000, 1).await;

    let payment = engine
        .create_payment(
            CreatePaymentCmd::new(supplier_id, 4_000).directive(Directive::full(Uuid::new_v4())),
        )
        .await
        .unwrap();

    assert_eq!(payment.bills_allocated(), &[Allocation::new(b1, 4_000)]);
}

#[tokio::test]
async fn update_payment_reverts_then_reallocates() {
    let (engine, db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b1 = bill(&engine, supplier_id, "B-1", 10_000, 1).await;
    let b2 = bill(&engine, supplier_id, "B-2", 10_000, 2).await;

    let payment = engine
        .create_payment(
            CreatePaymentCmd::new(supplier_id, 10_000)
                .date(day(5))
                .mode(PaymentMode::Cash),
        )
        .await
        .unwrap();
    assert_eq!(paid(&engine, b1).await, 10_000);

    let updated = engine
        .update_payment(UpdatePaymentCmd::new(payment.id, 15_000))
        .await
        .unwrap();
    assert_eq!(updated.id, payment.id);
    assert_eq!(updated.date, day(5));
    assert_eq!(updated.mode, PaymentMode::Cash);
    assert_eq!(paid(&engine, b1).await, 10_000);
    assert_eq!(paid(&engine, b2).await, 5_000);

    let updated = engine
        .update_payment(
            UpdatePaymentCmd::new(payment.id, 5_000)
                .mode(PaymentMode::Upi)
                .directive(Directive::full(b2)),
        )
        .await
        .unwrap();
    assert_eq!(updated.bills_allocated(), &[Allocation::new(b2, 5_000)]);
    assert_eq!(updated.mode, PaymentMode::Upi);
    assert_eq!(paid(&engine, b1).await, 0);
    assert_eq!(paid(&engine, b2).await, 5_000);

    let stored = engine.payment(payment.id).await.unwrap();
    assert_eq!(stored, updated);
    assert_statuses_consistent(&db).await;
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let missing = Uuid::new_v4();

    let err = engine
        .update_payment(UpdatePaymentCmd::new(missing, 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(matches!(
        engine.delete_payment(missing).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert!(matches!(
        engine.restore_payment(missing).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert!(matches!(
        engine.supplier_statement(missing).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert!(matches!(
        engine.bill(missing).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}

#[tokio::test]
async fn delete_then_restore_round_trip() {
    let (engine, db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b1 = bill(&engine, supplier_id, "B-1", 30_000, 1).await;

    let payment = engine
        .create_payment(CreatePaymentCmd::new(supplier_id, 30_000).mode(PaymentMode::Cheque))
        .await
        .unwrap();
    assert_eq!(engine.bill(b1).await.unwrap().status(), BillStatus::Paid);

    let archived = engine.delete_payment(payment.id).await.unwrap();
    assert_eq!(archived.original_payment_id, payment.id);
    assert_eq!(archived.bills_allocated(), payment.bills_allocated());
    let reverted = engine.bill(b1).await.unwrap();
    assert_eq!(reverted.due_minor(), 30_000);
    assert_eq!(reverted.status(), BillStatus::Credit);
    assert!(matches!(
        engine.payment(payment.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert_eq!(engine.list_archived_payments().await.unwrap().len(), 1);

    let restored = engine.restore_payment(archived.id).await.unwrap();
    assert_ne!(restored.id, payment.id);
    assert_eq!(restored.amount_minor, 30_000);
    assert_eq!(restored.mode, PaymentMode::Cheque);
    assert_eq!(restored.bills_allocated(), payment.bills_allocated());

    let bill = engine.bill(b1).await.unwrap();
    assert_eq!(bill.due_minor(), 0);
    assert_eq!(bill.status(), BillStatus::Paid);
    assert!(engine.list_archived_payments().await.unwrap().is_empty());
    assert!(matches!(
        engine.archived_payment(archived.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert_statuses_consistent(&db).await;
}

#[tokio::test]
async fn restore_conflict_leaves_bill_untouched() {
    let (engine, db) = engine_with_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b1 = bill(&engine, supplier_id, "B-1", 10_000, 1).await;

    let first = engine
        .create_payment(
            CreatePaymentCmd::new(supplier_id, 8_000).directive(Directive::full(b1)),
        )
        .await
        .unwrap();
    let archived = engine.delete_payment(first.id).await.unwrap();

    engine
        .create_payment(CreatePaymentCmd::new(supplier_id, 5_000))
        .await
        .unwrap();
    assert_eq!(paid(&engine, b1).await, 5_000);

    let err = engine.restore_payment(archived.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::RestoreConflict(ConflictDetail {
            bill_id: b1,
            bill_number: Some("B-1".to_string()),
            required_minor: 8_000,
            available_minor: Some(5_000),
        })
    );
    assert_eq!(
        err.to_string(),
        "Cannot restore payment: bill B-1 has insufficient balance. Required: 80.00, Available: 50.00"
    );

    assert_eq!(paid(&engine, b1).await, 5_000);
    assert_eq!(engine.list_archived_payments().await.unwrap().len(), 1);
    let history = engine
        .list_payments(&PaymentListFilter::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_statuses_consistent(&db).await;
}

#[tokio::test]
async fn list_payments_filters_and_orders() {
    let (engine, _db) = engine_with_db().await;
    let acme = supplier(&engine, "ACME").await;
    let other = supplier(&engine, "Other").await;
    bill(&engine, acme, "B-1", 100_000, 1).await;
    bill(&engine, other, "X-1", 100_000, 1).await;

    let cash = engine
        .create_payment(
            CreatePaymentCmd::new(acme, 1_000)
                .date(day(4))
                .mode(PaymentMode::Cash),
        )
        .await
        .unwrap();
    let upi = engine
        .create_payment(
            CreatePaymentCmd::new(acme, 2_000)
                .date(day(6))
                .mode(PaymentMode::Upi),
        )
        .await
        .unwrap();
    let foreign = engine
        .create_payment(
            CreatePaymentCmd::new(other, 3_000)
                .date(day(4))
                .mode(PaymentMode::Cash),
        )
        .await
        .unwrap();

    let ids = |payments: Vec<engine::Payment>| payments.into_iter().map(|p| p.id).collect::<Vec<_>>();

    let all = engine
        .list_payments(&PaymentListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.first().map(|p| p.id), Some(upi.id));
    assert_eq!(all.len(), 3);

    let by_supplier = PaymentListFilter {
        supplier_id: Some(acme),
        ..Default::default()
    };
    assert_eq!(
        ids(engine.list_payments(&by_supplier).await.unwrap()),
        vec![upi.id, cash.id]
    );

    let by_mode = PaymentListFilter {
        mode: Some(PaymentMode::Cash),
        ..Default::default()
    };
    let mut cash_ids = ids(engine.list_payments(&by_mode).await.unwrap());
    cash_ids.sort();
    let mut expected = vec![cash.id, foreign.id];
    expected.sort();
    assert_eq!(cash_ids, expected);

    let by_day = PaymentListFilter {
        day: NaiveDate::from_ymd_opt(2025, 3, 6),
        ..Default::default()
    };
    assert_eq!(ids(engine.list_payments(&by_day).await.unwrap()), vec![upi.id]);
}

#[tokio::test]
async fn overview_and_statement() {
    let (engine, _db) = engine_with_db().await;
    let zeta = supplier(&engine, "Zeta").await;
    let acme = supplier(&engine, "ACME").await;
    bill(&engine, acme, "B-2", 5_000, 3).await;
    bill(&engine, acme, "B-1", 10_000, 1).await;
    engine
        .create_payment(
            CreatePaymentCmd::new(acme, 4_000)
                .date(day(2))
                .mode(PaymentMode::Cash),
        )
        .await
        .unwrap();

    let overview = engine.suppliers_overview().await.unwrap();
    let names: Vec<&str> = overview.iter().map(|o| o.supplier.name.as_str()).collect();
    assert_eq!(names, vec!["ACME", "Zeta"]);
    assert_eq!(overview[0].total_credit_minor, 11_000);
    assert_eq!(overview[0].bills[0].bill_number, "B-1");
    assert_eq!(overview[1].supplier.id, zeta);
    assert!(overview[1].bills.is_empty());

    let statement = engine.supplier_statement(acme).await.unwrap();
    let kinds: Vec<StatementLineKind> = statement.lines.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StatementLineKind::Bill,
            StatementLineKind::Payment,
            StatementLineKind::Bill,
        ]
    );
    assert_eq!(statement.lines[1].reference, "Cash");
    assert_eq!(statement.closing_balance_minor(), 11_000);
}

#[tokio::test]
async fn new_records_are_validated() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_supplier(NewSupplierCmd::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let supplier = engine
        .new_supplier(NewSupplierCmd::new("  ACME  ").email(" ").phone("555-0100"))
        .await
        .unwrap();
    assert_eq!(supplier.name, "ACME");
    assert_eq!(supplier.email, None);
    assert_eq!(supplier.phone.as_deref(), Some("555-0100"));
    assert_eq!(engine.supplier(supplier.id).await.unwrap(), supplier);

    let err = engine
        .new_bill(NewBillCmd::new(supplier.id, "B-1", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .new_bill(NewBillCmd::new(supplier.id, "B-1", i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .create_payment(CreatePaymentCmd::new(supplier.id, MAX_AMOUNT_MINOR + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .new_bill(NewBillCmd::new(Uuid::new_v4(), "B-1", 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let bill = engine
        .new_bill(NewBillCmd::new(supplier.id, "B-1", 1_000))
        .await
        .unwrap();
    assert_eq!(bill.paid_minor(), 0);
    assert_eq!(bill.status(), BillStatus::Credit);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_on_one_supplier_stay_consistent() {
    let (engine, db, path) = engine_with_file_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b1 = bill(&engine, supplier_id, "B-1", 100_000, 1).await;
    let b2 = bill(&engine, supplier_id, "B-2", 100_000, 2).await;

    let first = engine
        .create_payment(
            CreatePaymentCmd::new(supplier_id, 30_000).directive(Directive::full(b1)),
        )
        .await
        .unwrap();
    let archived = engine.delete_payment(first.id).await.unwrap();

    let archive_id = archived.id;
    let restore = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.restore_payment(archive_id).await })
    };
    let creates: Vec<_> = (0..10)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .create_payment(CreatePaymentCmd::new(supplier_id, 1_000))
                    .await
            })
        })
        .collect();

    restore.await.unwrap().unwrap();
    for create in creates {
        create.await.unwrap().unwrap();
    }

    let payments = engine
        .list_payments(&PaymentListFilter::default())
        .await
        .unwrap();
    assert_eq!(payments.len(), 11);
    for bill_id in [b1, b2] {
        let allocated: i64 = payments
            .iter()
            .flat_map(|p| p.bills_allocated())
            .filter(|a| a.bill_id == bill_id)
            .map(|a| a.amount_minor)
            .sum();
        assert_eq!(paid(&engine, bill_id).await, allocated);
    }
    assert_eq!(paid(&engine, b1).await + paid(&engine, b2).await, 40_000);
    assert!(engine.list_archived_payments().await.unwrap().is_empty());
    assert_statuses_consistent(&db).await;

    std::fs::remove_file(path).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn update_racing_delete_reads_the_current_payment() {
    let (engine, db, path) = engine_with_file_db().await;
    let supplier_id = supplier(&engine, "ACME").await;
    let b1 = bill(&engine, supplier_id, "B-1", 50_000, 1).await;

    let payment_id = engine
        .create_payment(CreatePaymentCmd::new(supplier_id, 10_000))
        .await
        .unwrap()
        .id;

    let update = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .update_payment(UpdatePaymentCmd::new(payment_id, 20_000))
                .await
        })
    };
    let delete = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.delete_payment(payment_id).await })
    };

    let archived = delete.await.unwrap().unwrap();
    match update.await.unwrap() {
        Ok(updated) => assert_eq!(archived.amount_minor, updated.amount_minor),
        Err(err) => {
            assert!(matches!(err, EngineError::KeyNotFound(_)));
            assert_eq!(archived.amount_minor, 10_000);
        }
    }

    assert_eq!(paid(&engine, b1).await, 0);
    assert!(
        engine
            .list_payments(&PaymentListFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert_statuses_consistent(&db).await;

    std::fs::remove_file(path).unwrap();
}
