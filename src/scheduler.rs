use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Tick,
    Resumed,
}

/// Repeating refresh timer gated on page visibility.
pub struct UpdateScheduler {
    interval: Duration,
}

impl UpdateScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Runs until the visibility sender is dropped.
    pub async fn run<F, Fut>(self, mut visibility: watch::Receiver<bool>, mut refresh: F)
    where
        F: FnMut(Trigger) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut was_visible = *visibility.borrow();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if was_visible {
                        refresh(Trigger::Tick).await;
                    } else {
                        debug!("page hidden, skipping refresh");
                    }
                }
                changed = visibility.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let visible = *visibility.borrow_and_update();
                    if visible && !was_visible {
                        refresh(Trigger::Resumed).await;
                        ticker.reset();
                    }
                    was_visible = visible;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::sleep;

    fn recorder() -> (Arc<Mutex<Vec<Trigger>>>, impl FnMut(Trigger) -> std::future::Ready<()>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let refresh = move |trigger: Trigger| {
            sink.lock().unwrap().push(trigger);
            std::future::ready(())
        };
        (seen, refresh)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_interval_while_visible() {
        let (tx, rx) = watch::channel(true);
        let (seen, refresh) = recorder();
        let task = tokio::spawn(UpdateScheduler::new(Duration::from_secs(30)).run(rx, refresh));

        sleep(Duration::from_secs(95)).await;
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::Tick; 3]);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn visible_to_visible_is_not_a_resume() {
        let (tx, rx) = watch::channel(true);
        let (seen, refresh) = recorder();
        let task = tokio::spawn(UpdateScheduler::new(Duration::from_secs(30)).run(rx, refresh));

        sleep(Duration::from_secs(5)).await;
        tx.send_replace(true);
        tx.send_replace(true);
        sleep(Duration::from_secs(10)).await;
        assert!(seen.lock().unwrap().is_empty());

        sleep(Duration::from_secs(20)).await;
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::Tick]);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_page_suspends_and_resume_refreshes_immediately() {
        let (tx, rx) = watch::channel(true);
        let (seen, refresh) = recorder();
        let task = tokio::spawn(UpdateScheduler::new(Duration::from_secs(30)).run(rx, refresh));

        sleep(Duration::from_secs(31)).await;
        tx.send_replace(false);
        sleep(Duration::from_secs(120)).await;
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::Tick]);

        tx.send_replace(true);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::Tick, Trigger::Resumed]);

        // The interval restarts from the resume.
        sleep(Duration::from_secs(25)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.lock().unwrap().last(), Some(&Trigger::Tick));

        drop(tx);
        task.await.unwrap();
    }
}
