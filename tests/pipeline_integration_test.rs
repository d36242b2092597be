//! Integration tests for the report pipeline
//!
//! The runner is driven with in-memory database and transfer doubles; the
//! produced files are inspected on disk with flate2 and tar readers.

mod common;

use common::{
    config_for, home_with_queries, row, run_date, MockDatabase, MockTransfer, QueryResult,
};
use flate2::read::GzDecoder;
use reporter::core::report::ReportRunner;
use reporter::domain::{JobStage, ReportName};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

const SV_QUERY: &str = "SELECT id, name FROM sales_view";

fn sv_result() -> QueryResult {
    QueryResult::rows(
        &["id", "name"],
        vec![
            row(&[Some("1"), Some("alpha")]),
            row(&[Some("2"), None]),
            row(&[Some("3"), Some("x,y")]),
        ],
    )
}

const SV_CSV: &str = "id,name\r\n1,alpha\r\n2,\r\n3,\"x,y\"\r\n";

fn archive_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (name, content)
        })
        .collect()
}

fn name(value: &str) -> ReportName {
    ReportName::new(value).unwrap()
}

#[tokio::test]
async fn test_successful_job_produces_archive_and_uploads_it() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let database = MockDatabase::new(vec![(SV_QUERY, sv_result())]);
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(
        config_for(home.path(), &["sv"], 2),
        Arc::new(database.clone()),
        Arc::new(transfer.clone()),
    );

    let outcome = runner.run_job(&name("sv"), run_date()).await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.stage, JobStage::Done);
    assert_eq!(outcome.rows, Some(3));

    let reports_dir = home.path().join("reports");
    let csv_path = reports_dir.join("rprt_sv20240131.csv");
    let archive_path = reports_dir.join("rprt_sv20240131.tar.gz");
    assert!(!csv_path.exists());
    assert!(archive_path.exists());

    // M rows and a header give M+1 records, in order
    let entries = archive_entries(&archive_path);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "rprt_sv20240131.csv");
    assert_eq!(String::from_utf8(entries[0].1.clone()).unwrap(), SV_CSV);
    assert_eq!(SV_CSV.matches("\r\n").count(), 4);

    let archive_bytes = std::fs::read(&archive_path).unwrap();
    assert_eq!(outcome.archive_bytes, Some(archive_bytes.len() as u64));
    assert_eq!(outcome.checksum.as_ref().map(String::len), Some(64));

    let uploads = transfer.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].remote, "./reports/rprt_sv20240131.tar.gz");
    assert_eq!(uploads[0].content, archive_bytes);
    assert_eq!(*transfer.sessions_closed.lock().unwrap(), 1);

    // the session is closed before the archive step, after every batch
    assert_eq!(
        database.events(),
        vec![
            "connect".to_string(),
            format!("execute:{SV_QUERY}"),
            "batch:2".to_string(),
            "batch:1".to_string(),
            "close".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_empty_result_writes_header_only() {
    let home = home_with_queries(&[("empty", "SELECT a, b, c FROM nothing")]);
    let database = MockDatabase::new(vec![(
        "SELECT a, b, c FROM nothing",
        QueryResult::rows(&["a", "b", "c"], Vec::new()),
    )]);
    let runner = ReportRunner::new(
        config_for(home.path(), &["empty"], 10),
        Arc::new(database),
        Arc::new(MockTransfer::new()),
    );

    let outcome = runner.run_job(&name("empty"), run_date()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.rows, Some(0));
    let entries = archive_entries(&home.path().join("reports/rprt_empty20240131.tar.gz"));
    assert_eq!(entries[0].1, b"a,b,c\r\n");
}

#[tokio::test]
async fn test_missing_query_does_not_stop_later_reports() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let database = MockDatabase::new(vec![(SV_QUERY, sv_result())]);
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(
        config_for(home.path(), &["ghost", "sv"], 1000),
        Arc::new(database.clone()),
        Arc::new(transfer.clone()),
    );

    let summary = runner.run_all(run_date()).await;

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.outcomes[0].report.as_str(), "ghost");
    assert_eq!(summary.outcomes[0].failed_at, Some(JobStage::ReadingQuery));
    assert!(summary.outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .contains("ghost.sql"));
    assert!(summary.outcomes[1].is_success());
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 1);

    // the failed job never reached the database
    assert_eq!(database.events().iter().filter(|e| *e == "connect").count(), 1);
    assert_eq!(transfer.uploads().len(), 1);
}

#[tokio::test]
async fn test_every_report_attempted_once_in_order() {
    let home = home_with_queries(&[
        ("first", "SELECT 1 AS n"),
        ("second", "SELECT broken"),
        ("third", "SELECT 3 AS n"),
    ]);
    let database = MockDatabase::new(vec![
        ("SELECT 1 AS n", QueryResult::rows(&["n"], vec![row(&[Some("1")])])),
        (
            "SELECT broken",
            QueryResult::Fail("ERROR: column \"broken\" does not exist".to_string()),
        ),
        ("SELECT 3 AS n", QueryResult::rows(&["n"], vec![row(&[Some("3")])])),
    ]);
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(
        config_for(home.path(), &["first", "second", "third"], 100),
        Arc::new(database.clone()),
        Arc::new(transfer.clone()),
    );

    let summary = runner.run_all(run_date()).await;

    let order: Vec<&str> = summary.outcomes.iter().map(|o| o.report.as_str()).collect();
    assert_eq!(order, vec!["first", "second", "third"]);
    assert_eq!(summary.outcomes[1].failed_at, Some(JobStage::Querying));
    assert!(summary.outcomes[1]
        .error
        .as_deref()
        .unwrap()
        .contains("does not exist"));

    let executed: Vec<String> = database
        .events()
        .into_iter()
        .filter(|e| e.starts_with("execute:"))
        .collect();
    assert_eq!(
        executed,
        vec![
            "execute:SELECT 1 AS n",
            "execute:SELECT broken",
            "execute:SELECT 3 AS n"
        ]
    );

    let remotes: Vec<String> = transfer.uploads().into_iter().map(|u| u.remote).collect();
    assert_eq!(
        remotes,
        vec![
            "./reports/rprt_first20240131.tar.gz",
            "./reports/rprt_third20240131.tar.gz"
        ]
    );

    // a failed query leaves no tabular file behind
    assert!(!home.path().join("reports/rprt_second20240131.csv").exists());
}

#[tokio::test]
async fn test_rejected_upload_keeps_archive() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let database = MockDatabase::new(vec![(SV_QUERY, sv_result())]);
    let runner = ReportRunner::new(
        config_for(home.path(), &["sv"], 1000),
        Arc::new(database),
        Arc::new(MockTransfer::rejecting()),
    );

    let summary = runner.run_all(run_date()).await;

    assert_eq!(summary.failed(), 1);
    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.stage, JobStage::Failed);
    assert_eq!(outcome.failed_at, Some(JobStage::Uploading));
    assert!(outcome.error.as_deref().unwrap().contains("permission denied"));
    assert_eq!(outcome.rows, Some(3));

    let reports_dir = home.path().join("reports");
    assert!(reports_dir.join("rprt_sv20240131.tar.gz").exists());
    assert!(!reports_dir.join("rprt_sv20240131.csv").exists());
}

#[tokio::test]
async fn test_unreachable_database_fails_in_querying() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(
        config_for(home.path(), &["sv"], 1000),
        Arc::new(MockDatabase::unreachable()),
        Arc::new(transfer.clone()),
    );

    let outcome = runner.run_job(&name("sv"), run_date()).await;

    assert_eq!(outcome.failed_at, Some(JobStage::Querying));
    assert!(outcome.error.as_deref().unwrap().contains("database is down"));
    assert!(transfer.uploads().is_empty());
    assert!(!home.path().join("reports").exists());
}

#[tokio::test]
async fn test_same_day_rerun_overwrites_outputs() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let database = MockDatabase::new(vec![(SV_QUERY, sv_result())]);
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(
        config_for(home.path(), &["sv"], 1000),
        Arc::new(database),
        Arc::new(transfer.clone()),
    );

    let first = runner.run_job(&name("sv"), run_date()).await;
    let second = runner.run_job(&name("sv"), run_date()).await;

    assert!(first.is_success());
    assert!(second.is_success());

    let files: Vec<String> = std::fs::read_dir(home.path().join("reports"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["rprt_sv20240131.tar.gz".to_string()]);

    let uploads = transfer.uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].remote, uploads[1].remote);
}

#[tokio::test]
async fn test_custom_layout_and_delimiter() {
    let home = home_with_queries(&[]);
    let queries = home.path().join("queries");
    std::fs::create_dir_all(&queries).unwrap();
    std::fs::write(queries.join("sv.sql"), format!("{SV_QUERY}\n")).unwrap();

    let mut config = config_for(home.path(), &["sv"], 1000);
    config.reports.query_dir = Some("queries".into());
    config.reports.output_dir = Some("out/daily".into());
    config.output.delimiter = ';';
    config.output.line_terminator = "lf".to_string();
    config.transfer.destination_root = "/incoming/".to_string();

    let database = MockDatabase::new(vec![(SV_QUERY, sv_result())]);
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(config, Arc::new(database), Arc::new(transfer.clone()));

    let outcome = runner.run_job(&name("sv"), run_date()).await;
    assert!(outcome.is_success(), "{:?}", outcome.error);

    let entries = archive_entries(&home.path().join("out/daily/rprt_sv20240131.tar.gz"));
    assert_eq!(
        String::from_utf8(entries[0].1.clone()).unwrap(),
        "id;name\n1;alpha\n2;\n3;x,y\n"
    );
    assert_eq!(
        transfer.uploads()[0].remote,
        "/incoming/rprt_sv20240131.tar.gz"
    );
}

#[tokio::test]
async fn test_deletion_failure_stops_before_upload() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let csv_path = home.path().join("reports/rprt_sv20240131.csv");

    // once the result is exhausted, a directory takes the tabular file's
    // place: it still archives, but remove_file cannot delete it
    let blocked = csv_path.clone();
    let database = MockDatabase::new(vec![(SV_QUERY, sv_result())]).on_exhausted(move || {
        std::fs::remove_file(&blocked).unwrap();
        std::fs::create_dir(&blocked).unwrap();
    });
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(
        config_for(home.path(), &["sv"], 1000),
        Arc::new(database),
        Arc::new(transfer.clone()),
    );

    let outcome = runner.run_job(&name("sv"), run_date()).await;

    assert_eq!(outcome.stage, JobStage::Failed);
    assert_eq!(outcome.failed_at, Some(JobStage::CleaningUp));
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("rprt_sv20240131.csv"));
    assert!(home.path().join("reports/rprt_sv20240131.tar.gz").exists());
    assert!(transfer.uploads().is_empty());
    assert_eq!(*transfer.sessions_closed.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_database_session_released_on_every_path() {
    let home = home_with_queries(&[
        ("ok", "SELECT 1 AS n"),
        ("broken", "SELECT broken"),
        ("partial", SV_QUERY),
    ]);
    let database = MockDatabase::new(vec![
        ("SELECT 1 AS n", QueryResult::rows(&["n"], vec![row(&[Some("1")])])),
        (
            "SELECT broken",
            QueryResult::Fail("ERROR: syntax error at end of input".to_string()),
        ),
        (
            SV_QUERY,
            QueryResult::fail_after(
                &["id", "name"],
                vec![row(&[Some("1"), Some("alpha")])],
                "ERROR: canceling statement due to statement timeout",
            ),
        ),
    ]);
    let runner = ReportRunner::new(
        config_for(home.path(), &["ok", "broken", "partial"], 100),
        Arc::new(database.clone()),
        Arc::new(MockTransfer::new()),
    );

    let summary = runner.run_all(run_date()).await;

    assert_eq!(summary.succeeded(), 1);
    let connects = database.events().iter().filter(|e| *e == "connect").count();
    assert_eq!(connects, 3);
    assert_eq!(database.sessions_released(), 3);
    // only the successful job closes explicitly; the others are dropped
    assert_eq!(database.events().iter().filter(|e| *e == "close").count(), 1);
}

#[tokio::test]
async fn test_fetch_failure_keeps_partial_tabular_file() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let database = MockDatabase::new(vec![(
        SV_QUERY,
        QueryResult::fail_after(
            &["id", "name"],
            vec![
                row(&[Some("1"), Some("alpha")]),
                row(&[Some("2"), None]),
            ],
            "ERROR: canceling statement due to statement timeout",
        ),
    )]);
    let transfer = MockTransfer::new();
    let runner = ReportRunner::new(
        config_for(home.path(), &["sv"], 2),
        Arc::new(database.clone()),
        Arc::new(transfer.clone()),
    );

    let outcome = runner.run_job(&name("sv"), run_date()).await;

    assert_eq!(outcome.failed_at, Some(JobStage::WritingLocal));
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("statement timeout"));
    assert_eq!(database.sessions_released(), 1);

    let reports_dir = home.path().join("reports");
    let partial = std::fs::read_to_string(reports_dir.join("rprt_sv20240131.csv")).unwrap();
    assert_eq!(partial, "id,name\r\n1,alpha\r\n2,\r\n");
    assert!(!reports_dir.join("rprt_sv20240131.tar.gz").exists());
    assert!(transfer.uploads().is_empty());
}

#[tokio::test]
async fn test_transfer_authentication_failure_keeps_archive() {
    let home = home_with_queries(&[("sv", SV_QUERY)]);
    let database = MockDatabase::new(vec![(SV_QUERY, sv_result())]);
    let transfer = MockTransfer::refusing();
    let runner = ReportRunner::new(
        config_for(home.path(), &["sv", "sv"], 1000),
        Arc::new(database),
        Arc::new(transfer.clone()),
    );

    let summary = runner.run_all(run_date()).await;

    // both attempts reach the upload stage; the failure does not stop the run
    assert_eq!(summary.outcomes.len(), 2);
    for outcome in &summary.outcomes {
        assert_eq!(outcome.failed_at, Some(JobStage::Uploading));
        let error = outcome.error.as_deref().unwrap();
        assert!(error.starts_with("Connection error: Authentication as 'reports'"));
        assert!(error.contains("caused by: Username/PublicKey combination invalid"));
    }

    let reports_dir = home.path().join("reports");
    assert!(reports_dir.join("rprt_sv20240131.tar.gz").exists());
    assert!(!reports_dir.join("rprt_sv20240131.csv").exists());
    assert!(transfer.uploads().is_empty());
    assert_eq!(*transfer.sessions_closed.lock().unwrap(), 0);
}
