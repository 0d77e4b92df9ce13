use std::path::PathBuf;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use tally_core::{
    EntityId, Mutation, OpKind, Record, RecordKind, Resolution, StoreLocation, SyncSettings,
};
use tempfile::TempDir;

use crate::cli::{AddArgs, Cli, Commands, ConflictCommands, EditArgs, KeepVersion};
use crate::commands::add::run_add;
use crate::commands::common::{
    format_queue_lines, format_record_lines, format_relative_time, parse_amount, parse_date,
    parse_entity_id, parse_kind, queue_entry_to_item, Context,
};
use crate::commands::conflicts::run_conflicts_resolve;
use crate::commands::delete::run_delete;
use crate::commands::edit::{apply_edits, run_edit};
use crate::commands::list::list_records;
use crate::commands::sync::{format_report, run_sync};
use crate::error::CliError;

fn test_db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("nested").join("tally.db")
}

async fn open_local(dir: &TempDir) -> Context {
    Context::open(&test_db_path(dir), SyncSettings::default())
        .await
        .unwrap()
}

fn add_args(amount: i64, kind: RecordKind, day: u32) -> AddArgs {
    AddArgs {
        amount: Decimal::from(amount),
        kind,
        date: NaiveDate::from_ymd_opt(2026, 5, day),
        category: None,
        note: Some("lunch".to_string()),
        user: "1".to_string(),
    }
}

fn edit_args(id: &str) -> EditArgs {
    EditArgs {
        id: id.to_string(),
        amount: None,
        kind: None,
        date: None,
        category: None,
        note: None,
    }
}

#[test]
fn parse_amount_requires_positive_decimal() {
    assert_eq!(parse_amount(" 12.50 ").unwrap(), Decimal::new(1250, 2));
    assert!(parse_amount("0").is_err());
    assert!(parse_amount("-3").is_err());
    assert!(parse_amount("twelve").is_err());
}

#[test]
fn parse_kind_and_date() {
    assert_eq!(parse_kind("Income").unwrap(), RecordKind::Income);
    assert!(parse_kind("transfer").is_err());
    assert_eq!(
        parse_date("2026-05-01").unwrap(),
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    );
    assert!(parse_date("05/01/2026").is_err());
}

#[test]
fn parse_entity_id_prefers_numbers() {
    assert_eq!(parse_entity_id(" 42 "), EntityId::Number(42));
    assert_eq!(
        parse_entity_id("local-abc"),
        EntityId::Text("local-abc".to_string())
    );
}

#[test]
fn format_relative_time_units() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
    assert_eq!(format_relative_time(now - Duration::seconds(30), now), "just now");
    assert_eq!(format_relative_time(now - Duration::minutes(2), now), "2m ago");
    assert_eq!(format_relative_time(now - Duration::hours(2), now), "2h ago");
    assert_eq!(format_relative_time(now + Duration::hours(1), now), "just now");
}

#[test]
fn format_record_lines_sign_amounts() {
    let income = Record::new(
        EntityId::Number(1),
        Decimal::new(1000, 1),
        RecordKind::Income,
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
    );
    let expense = Record::new(
        EntityId::Number(1),
        Decimal::new(450, 2),
        RecordKind::Expense,
        NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
    )
    .with_note("bus");

    let lines = format_record_lines(&[income, expense]);
    assert!(lines[0].contains("+100.00"));
    assert!(lines[0].contains("2026-05-01"));
    assert!(lines[1].contains("-4.50"));
    assert!(lines[1].ends_with("bus"));
}

#[test]
fn apply_edits_detects_no_op() {
    let record = Record::new(
        EntityId::Number(1),
        Decimal::from(5),
        RecordKind::Expense,
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
    )
    .with_note("tea");

    assert!(apply_edits(&record, &edit_args("1")).is_none());

    let mut same_amount = edit_args("1");
    same_amount.amount = Some(Decimal::from(5));
    assert!(apply_edits(&record, &same_amount).is_none());

    let mut clear_note = edit_args("1");
    clear_note.note = Some("  ".to_string());
    assert_eq!(apply_edits(&record, &clear_note).unwrap().note, None);
}

#[test]
fn keep_version_maps_to_resolution() {
    assert_eq!(Resolution::from(KeepVersion::Local), Resolution::UseLocal);
    assert_eq!(Resolution::from(KeepVersion::Server), Resolution::UseServer);
}

#[test]
fn cli_parses_conflict_resolution() {
    let cli = Cli::parse_from([
        "tally",
        "--db-path",
        "/tmp/tally.db",
        "conflicts",
        "resolve",
        "conflict-1-7",
        "--use",
        "server",
    ]);

    assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/tally.db")));
    let Commands::Conflicts {
        command: ConflictCommands::Resolve { id, keep },
    } = cli.command
    else {
        panic!("expected conflicts resolve");
    };
    assert_eq!(id, "conflict-1-7");
    assert_eq!(keep, KeepVersion::Server);
}

#[test]
fn cli_parses_add_with_defaults() {
    let cli = Cli::parse_from(["tally", "add", "9.99", "--note", "book"]);

    let Commands::Add(args) = cli.command else {
        panic!("expected add");
    };
    assert_eq!(args.amount, Decimal::new(999, 2));
    assert_eq!(args.kind, RecordKind::Expense);
    assert_eq!(args.user, "1");
    assert!(args.date.is_none());
}

#[test]
fn format_report_mentions_problems_only_when_present() {
    let mut report = tally_core::SyncReport {
        records_pulled: 3,
        categories_pulled: 1,
        pushed: 2,
        conflicts: 0,
        retried: 0,
        dropped: 0,
        synced_at: Utc::now(),
    };
    assert_eq!(
        format_report(&report),
        "Sync completed: pulled 3 records, 1 categories; pushed 2"
    );

    report.conflicts = 1;
    report.dropped = 1;
    let rendered = format_report(&report);
    assert!(rendered.contains("1 conflicts"));
    assert!(rendered.contains("1 dropped"));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "multi_thread")]
async fn add_edit_delete_queue_locally_without_remote() {
    let dir = TempDir::new().unwrap();
    let ctx = open_local(&dir).await;

    let first = run_add(&ctx, add_args(12, RecordKind::Expense, 1))
        .await
        .unwrap();
    run_add(&ctx, add_args(900, RecordKind::Income, 3))
        .await
        .unwrap();
    assert!(first.is_temporary());

    let all = list_records(&ctx, 10, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].kind, RecordKind::Income);

    let expenses = list_records(&ctx, 10, Some(RecordKind::Expense))
        .await
        .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].id, first);

    let mut edit = edit_args(&first.to_string());
    edit.amount = Some(Decimal::from(15));
    run_edit(&ctx, edit).await.unwrap();
    assert_eq!(
        ctx.find_record(&first).await.unwrap().amount,
        Decimal::from(15)
    );

    run_delete(&ctx, &first.to_string()).await.unwrap();
    assert!(matches!(
        ctx.find_record(&first).await,
        Err(CliError::RecordNotFound(_))
    ));

    let entries = ctx.engine.queue().list().await.unwrap();
    let ops = entries
        .iter()
        .map(|entry| entry.mutation.op_kind())
        .collect::<Vec<_>>();
    assert_eq!(
        ops,
        vec![OpKind::Create, OpKind::Create, OpKind::Update, OpKind::Delete]
    );
    assert!(matches!(
        entries[3].mutation,
        Mutation::DeleteRecord { ref entity_id } if *entity_id == first
    ));

    let item = queue_entry_to_item(&entries[2]);
    assert_eq!(item.op, "UPDATE");
    assert_eq!(item.entity, "record");
    assert_eq!(format_queue_lines(&entries, Utc::now()).len(), 4);
    assert_eq!(ctx.engine.status().pending_count, 4);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "multi_thread")]
async fn edit_without_changes_is_rejected() {
    let dir = TempDir::new().unwrap();
    let ctx = open_local(&dir).await;
    let id = run_add(&ctx, add_args(4, RecordKind::Expense, 2))
        .await
        .unwrap();

    let result = run_edit(&ctx, edit_args(&id.to_string())).await;
    assert!(matches!(result, Err(CliError::NothingToUpdate)));
    assert_eq!(ctx.engine.queue().len().await.unwrap(), 1);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "multi_thread")]
async fn delete_unknown_record_fails() {
    let dir = TempDir::new().unwrap();
    let ctx = open_local(&dir).await;

    let result = run_delete(&ctx, "404").await;
    assert!(matches!(result, Err(CliError::RecordNotFound(id)) if id == "404"));
    assert!(ctx.engine.queue().is_empty().await.unwrap());
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "multi_thread")]
async fn remote_commands_require_configuration() {
    let dir = TempDir::new().unwrap();
    let ctx = open_local(&dir).await;

    assert!(matches!(
        run_sync(&ctx, false).await,
        Err(CliError::SyncNotConfigured)
    ));
    assert!(matches!(
        run_conflicts_resolve(&ctx, "conflict-1-1", Resolution::UseServer).await,
        Err(CliError::SyncNotConfigured)
    ));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "multi_thread")]
async fn local_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let ctx = open_local(&dir).await;
        run_add(&ctx, add_args(7, RecordKind::Expense, 9))
            .await
            .unwrap()
    };

    let ctx = open_local(&dir).await;
    assert_eq!(ctx.find_record(&id).await.unwrap().amount, Decimal::from(7));
    assert_eq!(ctx.engine.queue().len().await.unwrap(), 1);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "multi_thread")]
async fn unusable_db_path_falls_back_to_memory() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let ctx = Context::open(&blocker.join("tally.db"), SyncSettings::default())
        .await
        .unwrap();
    assert_eq!(ctx.engine.store().location(), &StoreLocation::Memory);

    let id = run_add(&ctx, add_args(3, RecordKind::Expense, 4))
        .await
        .unwrap();
    assert_eq!(ctx.find_record(&id).await.unwrap().amount, Decimal::from(3));
    assert_eq!(ctx.engine.queue().len().await.unwrap(), 1);
}
