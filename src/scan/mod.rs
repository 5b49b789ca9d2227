//! Scan input: record parsing and the background reader.

mod parse;
mod reader;

pub use reader::{InputEvent, InputSource, spawn_reader};

/// Reader state as shown to the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReaderStatus {
    #[default]
    Idle,
    Connected(String),
    Disconnected(Option<String>),
}

impl ReaderStatus {
    pub fn observe(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Connected(label) => *self = Self::Connected(label.clone()),
            InputEvent::Disconnected(reason) => *self = Self::Disconnected(reason.clone()),
            InputEvent::Scan(_) => {}
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Idle => "Not connected".to_owned(),
            Self::Connected(label) => format!("Connected to {label}"),
            Self::Disconnected(None) => "Input closed".to_owned(),
            Self::Disconnected(Some(reason)) => format!("Disconnected: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_reader_events() {
        let mut status = ReaderStatus::default();
        assert_eq!(status.describe(), "Not connected");

        status.observe(&InputEvent::Connected("/dev/ttyACM0".to_owned()));
        assert!(status.is_connected());
        status.observe(&InputEvent::Scan("A".to_owned()));
        assert!(status.is_connected());

        status.observe(&InputEvent::Disconnected(Some("unplugged".to_owned())));
        assert!(!status.is_connected());
        assert_eq!(status.describe(), "Disconnected: unplugged");
    }
}
