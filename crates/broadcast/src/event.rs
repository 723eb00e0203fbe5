use thermowatch_protocol::{Fault, FaultEvent, LiveMessage, Reading};

/// Event delivered to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// History window at subscription time, oldest first. Always first.
    History(Vec<Reading>),
    /// A reading accepted after the subscriber's snapshot.
    Reading(Reading),
    /// A sensor fault; never part of history.
    Fault(Fault),
}

impl From<Event> for LiveMessage {
    fn from(event: Event) -> Self {
        match event {
            Event::History(readings) => LiveMessage::TemperatureHistory(readings),
            Event::Reading(reading) => LiveMessage::Temperature(reading),
            Event::Fault(fault) => LiveMessage::Error(FaultEvent::from(&fault)),
        }
    }
}
