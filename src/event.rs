use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEventKind};

#[derive(Debug, Clone)]
pub enum Event {
    Tick,
    Render,
    Key(KeyEvent),
    /// Mouse wheel; true scrolls down
    Wheel(bool),
}

impl Event {
    pub fn is_quit(&self) -> bool {
        matches!(
            self,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            })
        )
    }

    pub fn from_mouse(kind: MouseEventKind) -> Option<Self> {
        match kind {
            MouseEventKind::ScrollDown => Some(Event::Wheel(true)),
            MouseEventKind::ScrollUp => Some(Event::Wheel(false)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(Event::Key(key).is_quit());
    }

    #[test]
    fn plain_c_does_not_quit() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(!Event::Key(key).is_quit());
    }

    #[test]
    fn wheel_maps_direction() {
        assert!(matches!(
            Event::from_mouse(MouseEventKind::ScrollDown),
            Some(Event::Wheel(true))
        ));
        assert!(Event::from_mouse(MouseEventKind::Moved).is_none());
    }
}
