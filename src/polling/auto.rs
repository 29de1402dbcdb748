//! Background driver for automatic polling

use crate::polling::scheduler::{epoch_millis, PollScheduler};
use crate::transport::Publisher;
use crossbeam_channel::{after, bounded, select, Sender};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on a single wait, so a re-enabled scheduler is noticed
const MAX_WAIT: Duration = Duration::from_millis(250);

/// Publishes due poll rounds on a background thread.
///
/// The scheduler lock is only held to take a round; publishing happens after
/// it is released. Stopping (or dropping) the poller disables the scheduler
/// and joins the thread; once `stop` returns no further poll is published.
pub struct AutoPoller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoPoller {
    pub fn start<P>(
        scheduler: Arc<Mutex<PollScheduler>>,
        publisher: Arc<Mutex<P>>,
    ) -> io::Result<Self>
    where
        P: Publisher + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        scheduler.lock().set_enabled(true, epoch_millis());

        let handle = thread::Builder::new()
            .name("auto-poll".to_string())
            .spawn(move || {
                loop {
                    let wait = scheduler
                        .lock()
                        .time_until_due(epoch_millis())
                        .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT));

                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(after(wait)) -> _ => {
                            let round = scheduler.lock().due_round(epoch_millis());
                            if let Some(round) = round {
                                round.publish(&mut *publisher.lock());
                            }
                        }
                    }
                }

                scheduler.lock().set_enabled(false, epoch_millis());
                debug!("auto poll stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel, which wakes the select
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("auto poll thread panicked");
            }
        }
    }
}

impl Drop for AutoPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryPublisher, TransportResult};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn shared_scheduler(interval_ms: u64) -> Arc<Mutex<PollScheduler>> {
        Arc::new(Mutex::new(PollScheduler::new(
            "uwb/trilateration/poll_request",
            vec!["T1".to_string()],
            interval_ms,
        )))
    }

    /// Publisher that blocks like a congested broker connection
    #[derive(Default)]
    struct BlockingPublisher {
        in_flight: Arc<AtomicBool>,
        published: Arc<AtomicUsize>,
    }

    impl Publisher for BlockingPublisher {
        fn publish(&mut self, _topic: &str, _payload: &[u8]) -> TransportResult<()> {
            self.in_flight.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(400));
            self.published.fetch_add(1, Ordering::SeqCst);
            self.in_flight.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_first_poll_is_immediate_and_stop_is_final() {
        let scheduler = shared_scheduler(20);
        let publisher = Arc::new(Mutex::new(MemoryPublisher::new()));
        let poller = AutoPoller::start(Arc::clone(&scheduler), Arc::clone(&publisher)).unwrap();
        assert!(scheduler.lock().is_enabled());

        thread::sleep(Duration::from_millis(100));
        poller.stop();

        let sent_after_stop = publisher.lock().sent().len();
        assert!(sent_after_stop >= 1);
        assert!(!scheduler.lock().is_enabled());

        thread::sleep(Duration::from_millis(60));
        assert_eq!(publisher.lock().sent().len(), sent_after_stop);
    }

    #[test]
    fn test_drop_stops_thread() {
        let scheduler = shared_scheduler(10_000);
        let publisher = Arc::new(Mutex::new(MemoryPublisher::new()));
        {
            let _poller = AutoPoller::start(Arc::clone(&scheduler), publisher).unwrap();
            thread::sleep(Duration::from_millis(30));
        }

        assert!(!scheduler.lock().is_enabled());
        assert_eq!(scheduler.lock().rounds(), 1);
    }

    #[test]
    fn test_scheduler_stays_available_while_publishing() {
        let scheduler = shared_scheduler(10_000);
        let blocking = BlockingPublisher::default();
        let in_flight = Arc::clone(&blocking.in_flight);
        let published = Arc::clone(&blocking.published);
        let poller =
            AutoPoller::start(Arc::clone(&scheduler), Arc::new(Mutex::new(blocking))).unwrap();

        thread::sleep(Duration::from_millis(100));
        assert!(in_flight.load(Ordering::SeqCst));

        let guard = scheduler.try_lock_for(Duration::from_millis(150));
        assert!(guard.is_some());
        drop(guard);

        poller.stop();
        assert_eq!(published.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_polling_resumes_after_reenable() {
        let scheduler = shared_scheduler(20);
        let publisher = Arc::new(Mutex::new(MemoryPublisher::new()));
        let poller = AutoPoller::start(Arc::clone(&scheduler), Arc::clone(&publisher)).unwrap();

        thread::sleep(Duration::from_millis(60));
        scheduler.lock().set_enabled(false, epoch_millis());
        thread::sleep(Duration::from_millis(100));
        let sent_while_off = publisher.lock().sent().len();
        assert!(sent_while_off >= 1);

        thread::sleep(Duration::from_millis(100));
        assert_eq!(publisher.lock().sent().len(), sent_while_off);

        scheduler.lock().set_enabled(true, epoch_millis());
        thread::sleep(Duration::from_millis(500));
        poller.stop();

        assert!(publisher.lock().sent().len() > sent_while_off);
    }
}
