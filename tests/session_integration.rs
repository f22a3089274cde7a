//! Session ticks end to end: retrieval, thresholds, notifications and the
//! snapshot file, with east served by wiremock.

mod common;

use chrono::Local;
use common::bodies::{EAST_NULL_VALUE, EAST_OK, EAST_PATH};
use common::{config_json, write_config, RecordingNotifier};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use stock_runner::engine::SequenceRandom;
use stock_runner::{AlertClass, Retrieval, RunnerPaths, Session};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn east(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(EAST_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn start(paths: RunnerPaths, notifier: Arc<RecordingNotifier>) -> Session {
    Session::start(paths, notifier, Box::new(SequenceRandom::new(vec![]))).unwrap()
}

fn touch_later(path: &std::path::Path) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_failed_tick_keeps_notified_set() {
    let server = east(503, "").await;
    let home = tempfile::tempdir().unwrap();
    let paths = write_config(home.path(), &config_json(&server.uri(), 1.0));
    let today = Local::now().date_naive();

    // a snapshot written earlier today carries slot 0
    fs::write(&paths.data_file, r#"{"notified":[0],"prices":[["上证",1.5]]}"#).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = start(paths.clone(), notifier.clone());
    session.seed(today);
    assert_eq!(session.notified(), vec![0]);

    let mut writer = session.store().open().unwrap();
    let snapshot = session.tick(&mut writer, today).await.unwrap();

    assert_eq!(snapshot.prices, Retrieval::Failure("503".to_string()));
    assert_eq!(snapshot.notified, vec![0]);
    assert!(notifier.calls().is_empty());
    assert_eq!(
        fs::read_to_string(&paths.data_file).unwrap(),
        r#"{"notified":[0],"prices":"503"}"#
    );

    drop(writer);
    assert!(!paths.lock_file.exists());
}

#[test_log::test(tokio::test)]
async fn test_crossing_notifies_once() {
    let server = east(200, EAST_OK).await;
    let home = tempfile::tempdir().unwrap();
    let paths = write_config(home.path(), &config_json(&server.uri(), 1.0));
    let today = Local::now().date_naive();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = start(paths.clone(), notifier.clone());
    session.seed(today);
    let mut writer = session.store().open().unwrap();

    let first = session.tick(&mut writer, today).await.unwrap();
    assert_eq!(first.notified, vec![1]);
    assert!(paths.lock_file.exists());

    let second = session.tick(&mut writer, today).await.unwrap();
    assert_eq!(second.notified, vec![1]);

    assert_eq!(
        notifier.calls(),
        vec![(vec!["贵州: -1.02".to_string()], Some(AlertClass::Down))]
    );
    assert_eq!(
        fs::read_to_string(&paths.data_file).unwrap(),
        r#"{"notified":[1],"prices":[["上证",0.39],["贵州",-1.02]]}"#
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_value_raises_anomaly() {
    let server = east(200, EAST_NULL_VALUE).await;
    let home = tempfile::tempdir().unwrap();
    let paths = write_config(home.path(), &config_json(&server.uri(), 1.0));
    let today = Local::now().date_naive();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = start(paths, notifier.clone());
    let mut writer = session.store().open().unwrap();
    let snapshot = session.tick(&mut writer, today).await.unwrap();

    assert!(snapshot.notified.is_empty());
    let calls = notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, None);
    assert!(calls[0].0[0].ends_with("贵州 has no value (slot 1)"));
}

#[test_log::test(tokio::test)]
async fn test_reload_resets_notified_set() {
    let server = east(200, EAST_OK).await;
    let home = tempfile::tempdir().unwrap();
    let paths = write_config(home.path(), &config_json(&server.uri(), 1.0));
    let today = Local::now().date_naive();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = start(paths.clone(), notifier.clone());
    let mut writer = session.store().open().unwrap();
    assert_eq!(session.tick(&mut writer, today).await.unwrap().notified, vec![1]);

    // raise the down threshold so -1.02 no longer crosses
    fs::write(&paths.config_file, config_json(&server.uri(), 5.0)).unwrap();
    touch_later(&paths.config_file);

    let snapshot = session.tick(&mut writer, today).await.unwrap();
    assert!(snapshot.notified.is_empty());
    assert_eq!(session.state().config.threshold.down, rust_decimal_macros::dec!(5));
    assert_eq!(notifier.calls().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_invalid_reload_keeps_previous_config() {
    let server = east(200, EAST_OK).await;
    let home = tempfile::tempdir().unwrap();
    let paths = write_config(home.path(), &config_json(&server.uri(), 1.0));
    let today = Local::now().date_naive();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = start(paths.clone(), notifier.clone());
    let mut writer = session.store().open().unwrap();
    session.tick(&mut writer, today).await.unwrap();

    fs::write(&paths.config_file, r#"{"indices":["000001"],"threshold":{"indices":[],"up":1,"down":1}}"#)
        .unwrap();
    touch_later(&paths.config_file);

    assert!(!session.reload_if_changed(today));
    assert_eq!(session.notified(), vec![1]);
    assert_eq!(session.state().config.codes, vec!["600519"]);
}

#[test_log::test(tokio::test)]
async fn test_new_day_clears_notified_set() {
    let server = east(200, EAST_OK).await;
    let home = tempfile::tempdir().unwrap();
    let paths = write_config(home.path(), &config_json(&server.uri(), 1.0));
    let today = Local::now().date_naive();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = start(paths, notifier.clone());
    let mut writer = session.store().open().unwrap();
    session.tick(&mut writer, today).await.unwrap();

    let tomorrow = today.succ_opt().unwrap();
    let snapshot = session.tick(&mut writer, tomorrow).await.unwrap();
    assert_eq!(snapshot.notified, vec![1]);
    assert_eq!(notifier.calls().len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_rest_day_refreshes_stale_snapshot_once() {
    let server = east(200, EAST_OK).await;
    let home = tempfile::tempdir().unwrap();
    let paths = write_config(home.path(), &config_json(&server.uri(), 1.0));
    let today = Local::now().date_naive();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = start(paths.clone(), notifier.clone());

    assert!(session.refresh_rest_day(today).await.unwrap());
    assert_eq!(
        fs::read_to_string(&paths.data_file).unwrap(),
        r#"{"notified":[],"prices":[["上证",0.39],["贵州",-1.02]]}"#
    );
    assert!(!paths.lock_file.exists());

    assert!(!session.refresh_rest_day(today).await.unwrap());
    assert!(notifier.calls().is_empty());
}
