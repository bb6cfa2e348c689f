use crate::session::SessionSnapshot;

#[derive(Debug)]
pub enum UserEvent {
    SessionChanged(SessionSnapshot),
    SessionLost,
    Quit,
}
