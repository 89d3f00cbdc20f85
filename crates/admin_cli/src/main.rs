use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, MoneyCents, NewBillCmd, NewSupplierCmd, StatementLineKind};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ledger_admin")]
#[command(about = "Admin utilities for the supplier ledger (bootstrap suppliers/bills)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./ledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Supplier(Supplier),
    Bill(Bill),
    /// Print a supplier's bills and payments with the running balance.
    Statement(StatementArgs),
}

#[derive(Args, Debug)]
struct Supplier {
    #[command(subcommand)]
    command: SupplierCommand,
}

#[derive(Subcommand, Debug)]
enum SupplierCommand {
    Create(SupplierCreateArgs),
    /// Every supplier with its outstanding credit.
    List,
}

#[derive(Args, Debug)]
struct SupplierCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args, Debug)]
struct Bill {
    #[command(subcommand)]
    command: BillCommand,
}

#[derive(Subcommand, Debug)]
enum BillCommand {
    Create(BillCreateArgs),
}

#[derive(Args, Debug)]
struct BillCreateArgs {
    #[arg(long)]
    supplier_id: Uuid,
    #[arg(long)]
    number: String,
    /// Amount in major units, e.g. `1250.50`.
    #[arg(long)]
    amount: MoneyCents,
    /// Bill date (`YYYY-MM-DD`), defaults to now.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct StatementArgs {
    #[arg(long)]
    supplier_id: Uuid,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Supplier(Supplier {
            command: SupplierCommand::Create(args),
        }) => {
            let mut cmd = NewSupplierCmd::new(args.name);
            cmd.email = args.email;
            cmd.phone = args.phone;
            let supplier = engine.new_supplier(cmd).await?;
            println!("created supplier: {} ({})", supplier.name, supplier.id);
        }
        Command::Supplier(Supplier {
            command: SupplierCommand::List,
        }) => {
            for entry in engine.suppliers_overview().await? {
                println!(
                    "{} ({}): {} bills, credit {}",
                    entry.supplier.name,
                    entry.supplier.id,
                    entry.bills.len(),
                    MoneyCents::new(entry.total_credit_minor)
                );
            }
        }
        Command::Bill(Bill {
            command: BillCommand::Create(args),
        }) => {
            let mut cmd = NewBillCmd::new(args.supplier_id, args.number, args.amount.cents());
            if let Some(date) = args.date {
                let Some(start) = date.and_hms_opt(0, 0, 0) else {
                    eprintln!("invalid date: {date}");
                    std::process::exit(2);
                };
                cmd = cmd.date(start.and_utc());
            }
            let bill = engine.new_bill(cmd).await?;
            println!(
                "created bill: {} for {} ({})",
                bill.bill_number,
                MoneyCents::new(bill.amount_minor),
                bill.id
            );
        }
        Command::Statement(args) => {
            let statement = engine.supplier_statement(args.supplier_id).await?;
            println!("{}", statement.supplier.name);
            for line in &statement.lines {
                let (sign, status) = match line.kind {
                    StatementLineKind::Bill => ("+", line.status.map_or("", |s| s.as_str())),
                    StatementLineKind::Payment => ("-", ""),
                };
                println!(
                    "{}  {:<16} {sign}{:>12} {:>12}  {status}",
                    line.date.format("%Y-%m-%d"),
                    line.reference,
                    MoneyCents::new(line.amount_minor).to_string(),
                    MoneyCents::new(line.balance_minor).to_string(),
                );
            }
            println!(
                "balance: {}",
                MoneyCents::new(statement.closing_balance_minor())
            );
        }
    }

    Ok(())
}
