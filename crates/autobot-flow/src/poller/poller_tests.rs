use super::*;
use crate::testing::{EventLog, FakePage};
use autobot_browser::BrowserError;

const RELOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn test_empty_inbox_never_clicks_and_sleeps_between_reloads() {
    let log = EventLog::default();
    let page = FakePage::new(log.clone());
    let config = PollerConfig::default();
    let poller = InboxPoller::new(&page, &config, RELOAD_TIMEOUT);

    for _ in 0..3 {
        let report = poller.cycle().await.unwrap();
        assert_eq!(report, CycleReport::default());
    }

    assert!(!log.any(|e| e.starts_with("open_conversation")));
    assert_eq!(log.count("open_action_menu"), 0);
    assert_eq!(log.count("click_routing_flow"), 0);

    let reloads = log.times("reload");
    assert_eq!(reloads.len(), 3);
    // Each cycle waits out the unread scan and then the check interval.
    let expected = config.unread_wait() + config.check_interval();
    for pair in reloads.windows(2) {
        assert_eq!(pair[1] - pair[0], expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_batch_processed_in_document_order() {
    let log = EventLog::default();
    let page = FakePage::new(log.clone())
        .with_unread_batches(&[3])
        .missing_flow_at(2);
    let config = PollerConfig::default();
    let poller = InboxPoller::new(&page, &config, RELOAD_TIMEOUT);

    let report = poller.poll_once().await.unwrap();

    assert_eq!(
        report,
        CycleReport {
            found: 3,
            processed: 3,
            tagged: 2,
            missing_flow: 1,
            aborted_at: None,
        }
    );
    let opened: Vec<String> = log
        .events()
        .into_iter()
        .filter(|e| e.starts_with("open_conversation"))
        .collect();
    assert_eq!(
        opened,
        vec![
            "open_conversation:1",
            "open_conversation:2",
            "open_conversation:3"
        ]
    );
    assert_eq!(log.count("routing_flow_missing"), 1);
    assert_eq!(log.count("reload"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_item_aborts_batch_and_reloads() {
    let log = EventLog::default();
    let page = FakePage::new(log.clone())
        .with_unread_batches(&[5, 2])
        .failing_at(3);
    let config = PollerConfig::default();
    let poller = InboxPoller::new(&page, &config, RELOAD_TIMEOUT);

    let report = poller.poll_once().await.unwrap();

    assert_eq!(report.found, 5);
    assert_eq!(report.processed, 2);
    assert_eq!(report.aborted_at, Some(3));
    assert!(log.position("open_conversation:3").is_some());
    assert!(log.position("open_conversation:4").is_none());
    assert!(log.position("open_conversation:5").is_none());
    // Protective reload straight after the failure.
    let failed = log.position("open_conversation:3").unwrap();
    assert_eq!(log.position("reload"), Some(failed + 1));

    // The next cycle scans the inbox from scratch.
    let next = poller.poll_once().await.unwrap();
    assert_eq!(next.found, 2);
    assert_eq!(next.processed, 2);
    assert_eq!(log.count("unread_conversations"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_settle_delays_between_steps() {
    let log = EventLog::default();
    let page = FakePage::new(log.clone()).with_unread_batches(&[1]);
    let config = PollerConfig::default();
    let poller = InboxPoller::new(&page, &config, RELOAD_TIMEOUT);

    let start = tokio::time::Instant::now();
    poller.poll_once().await.unwrap();

    let opened = log.times("open_conversation:1")[0];
    let menu = log.times("open_action_menu")[0];
    let flow = log.times("click_routing_flow")[0];
    assert_eq!(menu - opened, config.open_settle());
    assert_eq!(flow - menu, config.menu_settle());
    assert_eq!(
        tokio::time::Instant::now() - start,
        config.open_settle() + config.menu_settle() + config.after_flow()
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_when_browser_disconnects() {
    let log = EventLog::default();
    let page = FakePage::new(log.clone()).disconnected();
    let config = PollerConfig::default();
    let poller = InboxPoller::new(&page, &config, RELOAD_TIMEOUT);

    let result = tokio::time::timeout(Duration::from_secs(7 * 24 * 3600), poller.run())
        .await
        .expect("poller kept running against a dead browser");

    let err = result.unwrap_err();
    assert!(err.is_disconnected());
    assert!(matches!(err, PageError::Browser(BrowserError::NotConnected)));
    assert_eq!(log.count("wait_for_unread"), 1);
    assert_eq!(log.count("reload"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_mid_batch_is_returned() {
    let log = EventLog::default();
    let page = FakePage::new(log.clone())
        .with_unread_batches(&[3])
        .disconnecting_at(2);
    let config = PollerConfig::default();
    let poller = InboxPoller::new(&page, &config, RELOAD_TIMEOUT);

    let err = poller.poll_once().await.unwrap_err();

    assert!(err.is_disconnected());
    assert!(log.position("open_conversation:2").is_some());
    assert!(log.position("open_conversation:3").is_none());
    // No protective reload against a browser that is gone.
    assert_eq!(log.count("reload"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reload_timeout_does_not_stop_polling() {
    let log = EventLog::default();
    let page = FakePage::new(log.clone()).reload_times_out();
    let config = PollerConfig::default();
    let poller = InboxPoller::new(&page, &config, RELOAD_TIMEOUT);

    for _ in 0..2 {
        assert_eq!(poller.cycle().await.unwrap(), CycleReport::default());
    }
    assert_eq!(log.count("reload"), 2);
}

#[test]
fn test_report_display() {
    let report = CycleReport {
        found: 4,
        processed: 1,
        tagged: 1,
        missing_flow: 0,
        aborted_at: Some(2),
    };
    assert_eq!(
        report.to_string(),
        "found=4 processed=1 tagged=1 missing_flow=0 aborted_at=2"
    );
}
