//! Ledger schema.
//!
//! - `suppliers`: parties bills are owed to
//! - `bills`: amounts owed, with the paid part and derived status
//! - `payments` / `payment_allocations`: payments and their split over bills
//! - `archived_payments` / `archived_allocations`: deleted payments kept for restore

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Suppliers {
    Table,
    Id,
    Name,
    Email,
    Phone,
}

#[derive(Iden)]
enum Bills {
    Table,
    Id,
    SupplierId,
    BillNumber,
    AmountMinor,
    PaidMinor,
    Status,
    Date,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    SupplierId,
    AmountMinor,
    Date,
    Mode,
}

#[derive(Iden)]
enum PaymentAllocations {
    Table,
    Id,
    PaymentId,
    Position,
    BillId,
    AmountMinor,
}

#[derive(Iden)]
enum ArchivedPayments {
    Table,
    Id,
    OriginalPaymentId,
    SupplierId,
    AmountMinor,
    Date,
    Mode,
    DeletedAt,
}

#[derive(Iden)]
enum ArchivedAllocations {
    Table,
    Id,
    ArchivedPaymentId,
    Position,
    BillId,
    AmountMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suppliers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suppliers::Name).string().not_null())
                    .col(ColumnDef::new(Suppliers::Email).string())
                    .col(ColumnDef::new(Suppliers::Phone).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bills::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Bills::SupplierId).string().not_null())
                    .col(ColumnDef::new(Bills::BillNumber).string().not_null())
                    .col(ColumnDef::new(Bills::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bills::PaidMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bills::Status)
                            .string()
                            .not_null()
                            .default("credit"),
                    )
                    .col(ColumnDef::new(Bills::Date).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-supplier_id")
                            .from(Bills::Table, Bills::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bills-supplier_id-date")
                    .table(Bills::Table)
                    .col(Bills::SupplierId)
                    .col(Bills::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::SupplierId).string().not_null())
                    .col(
                        ColumnDef::new(Payments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Date).timestamp().not_null())
                    .col(ColumnDef::new(Payments::Mode).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-supplier_id")
                            .from(Payments::Table, Payments::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-supplier_id-date")
                    .table(Payments::Table)
                    .col(Payments::SupplierId)
                    .col(Payments::Date)
                    .to_owned(),
            )
            .await?;

        // bill_id carries no foreign key: allocations outlive the bills they name.
        manager
            .create_table(
                Table::create()
                    .table(PaymentAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentAllocations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentAllocations::PaymentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAllocations::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentAllocations::BillId).string().not_null())
                    .col(
                        ColumnDef::new(PaymentAllocations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_allocations-payment_id")
                            .from(PaymentAllocations::Table, PaymentAllocations::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payment_allocations-payment_id")
                    .table(PaymentAllocations::Table)
                    .col(PaymentAllocations::PaymentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ArchivedPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArchivedPayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArchivedPayments::OriginalPaymentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedPayments::SupplierId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedPayments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ArchivedPayments::Date).timestamp().not_null())
                    .col(ColumnDef::new(ArchivedPayments::Mode).string().not_null())
                    .col(
                        ColumnDef::new(ArchivedPayments::DeletedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-archived_payments-deleted_at")
                    .table(ArchivedPayments::Table)
                    .col(ArchivedPayments::DeletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ArchivedAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArchivedAllocations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArchivedAllocations::ArchivedPaymentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedAllocations::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedAllocations::BillId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedAllocations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-archived_allocations-archived_payment_id")
                            .from(
                                ArchivedAllocations::Table,
                                ArchivedAllocations::ArchivedPaymentId,
                            )
                            .to(ArchivedPayments::Table, ArchivedPayments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-archived_allocations-archived_payment_id")
                    .table(ArchivedAllocations::Table)
                    .col(ArchivedAllocations::ArchivedPaymentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArchivedAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ArchivedPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suppliers::Table).to_owned())
            .await
    }
}
