//! Notification expiry as seen through the app

use std::time::Duration;

use tokio::{task, time};

use cmdpad_engine::{App, Settings, Severity};

async fn run_timers() {
    for _ in 0..8 {
        task::yield_now().await;
    }
}

fn app_with_delay(secs: u64) -> App {
    let settings = Settings {
        notification_delay: Duration::from_secs(secs),
        ..Settings::default()
    };
    App::new(&settings).unwrap()
}

#[tokio::test(start_paused = true)]
async fn notification_expires_on_tick() {
    let mut app = app_with_delay(5);
    app.push_notification("hello", Severity::Info);

    time::advance(Duration::from_secs(5)).await;
    run_timers().await;
    app.tick();
    assert!(app.notification().is_none());
}

#[tokio::test(start_paused = true)]
async fn only_newest_notification_survives_first_deadline() {
    let mut app = app_with_delay(5);

    // Empty submit: first notification.
    app.submit();
    time::advance(Duration::from_secs(1)).await;
    // Reset: second notification supersedes the first.
    app.reset();

    time::advance(Duration::from_secs(4)).await;
    run_timers().await;
    app.tick();
    assert_eq!(
        app.notification().unwrap().text(),
        "Fields cleared successfully"
    );

    time::advance(Duration::from_secs(1)).await;
    run_timers().await;
    app.tick();
    assert!(app.notification().is_none());
}

#[tokio::test(start_paused = true)]
async fn configured_delay_is_honoured() {
    let mut app = app_with_delay(2);
    app.push_notification("short", Severity::Success);

    time::advance(Duration::from_secs(2)).await;
    run_timers().await;
    app.tick();
    assert!(app.notification().is_none());
}
