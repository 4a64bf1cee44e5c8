pub trait Probe {
    type Msg: Send;
    type Pay: Clone + Send;

    fn event(&self, evt: Self::Msg);
    fn payload(&self) -> &Self::Pay;
}

pub trait ProbeReceive {
    type Msg: Send;

    fn recv(&self) -> Self::Msg;
    fn reset_timer(&mut self);
    fn last_event_milliseconds(&self) -> u64;
    fn last_event_seconds(&self) -> u64;
}

/// A `std::sync::mpsc::channel()` based probe, suitable for asserting on
/// events emitted from actor handlers in a single local test process.
pub mod channel {
    use super::{Probe, ProbeReceive};

    use chrono::prelude::*;
    use std::sync::mpsc::{channel, Receiver, Sender};

    pub fn probe<T: Send>() -> (ChannelProbe<(), T>, ChannelProbeReceive<T>) {
        probe_with_payload(())
    }

    pub fn probe_with_payload<P: Clone + Send, T: Send>(
        payload: P,
    ) -> (ChannelProbe<P, T>, ChannelProbeReceive<T>) {
        let (tx, rx) = channel::<T>();

        let probe = ChannelProbe {
            payload: Some(payload),
            tx: tx.clone(),
        };

        let receiver = ChannelProbeReceive {
            rx,
            tx,
            timer_start: Utc::now(),
        };

        (probe, receiver)
    }

    #[derive(Clone, Debug)]
    pub struct ChannelProbe<P, T> {
        payload: Option<P>,
        tx: Sender<T>,
    }

    impl<P, T> Probe for ChannelProbe<P, T>
    where
        P: Clone + Send,
        T: Send,
    {
        type Msg = T;
        type Pay = P;

        fn event(&self, evt: T) {
            drop(self.tx.send(evt));
        }

        fn payload(&self) -> &P {
            self.payload.as_ref().unwrap()
        }
    }

    #[allow(dead_code)]
    pub struct ChannelProbeReceive<T> {
        rx: Receiver<T>,
        tx: Sender<T>,
        timer_start: DateTime<Utc>,
    }

    impl<T: Send> ProbeReceive for ChannelProbeReceive<T> {
        type Msg = T;

        fn recv(&self) -> T {
            self.rx.recv().unwrap()
        }

        fn reset_timer(&mut self) {
            self.timer_start = Utc::now();
        }

        fn last_event_milliseconds(&self) -> u64 {
            let now = Utc::now();
            now.time()
                .signed_duration_since(self.timer_start.time())
                .num_milliseconds() as u64
        }

        fn last_event_seconds(&self) -> u64 {
            let now = Utc::now();
            now.time()
                .signed_duration_since(self.timer_start.time())
                .num_seconds() as u64
        }
    }
}

/// Mimics assert_eq! against the next event received by the probe.
#[macro_export]
macro_rules! p_assert_eq {
    ($listen:expr, $expected:expr) => {
        assert_eq!($listen.recv(), $expected);
    };
}

/// Evaluates events sent from the probe against a vector of expected
/// events, irrespective of arrival order. Each matched event is removed
/// from the expected vector; the assertion completes when none remain.
#[macro_export]
macro_rules! p_assert_events {
    ($listen:expr, $expected:expr) => {
        let mut expected = $expected.clone();

        loop {
            match expected.iter().position(|x| x == &$listen.recv()) {
                Some(pos) => {
                    expected.remove(pos);
                    if expected.len() == 0 {
                        break;
                    }
                }
                _ => assert!(false, "probe received an unexpected event"),
            }
        }
    };
}

#[macro_export]
macro_rules! p_timer {
    ($listen:expr) => {
        $listen.last_event_milliseconds()
    };
}

#[cfg(test)]
mod tests {
    use super::channel::{probe, probe_with_payload};
    use super::{Probe, ProbeReceive};
    use std::thread;

    #[test]
    fn chan_probe() {
        let (probe, listen) = probe();

        thread::spawn(move || {
            probe.event("some event");
        });

        assert_eq!(listen.recv(), "some event");
    }

    #[test]
    fn chan_probe_with_payload() {
        let payload = "test data".to_string();
        let (probe, listen) = probe_with_payload(payload);

        thread::spawn(move || {
            if probe.payload() == "test data" {
                probe.event("data received");
            } else {
                probe.event("");
            }
        });

        assert_eq!(listen.recv(), "data received");
    }

    #[test]
    fn p_assert_eq() {
        let (probe, listen) = probe();
        probe.event("test".to_string());
        p_assert_eq!(listen, "test".to_string());
    }

    #[test]
    fn p_assert_events() {
        let (probe, listen) = probe();
        let expected = vec!["event_1", "event_2", "event_3"];
        probe.event("event_2");
        probe.event("event_1");
        probe.event("event_3");
        p_assert_events!(listen, expected);
    }
}
