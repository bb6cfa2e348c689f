use crate::events::UserEvent;
use crate::session::SessionSnapshot;
use crossbeam_channel::{unbounded, Receiver, Sender};
use eframe::egui;
use log::{info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, SystemTime};

const POLL_INTERVAL: Duration = Duration::from_millis(400);

pub struct RuntimeHandles {
    pub rx: Receiver<UserEvent>,
    pub tx: Sender<UserEvent>,
}

pub fn build_runtime(ctx: &egui::Context, session_path: Option<PathBuf>) -> RuntimeHandles {
    let (tx, rx) = unbounded::<UserEvent>();
    match session_path {
        Some(path) => spawn_session_watcher(path, tx.clone(), ctx.clone()),
        None => warn!("No session file location, running apps will stay empty"),
    }
    RuntimeHandles { rx, tx }
}

fn spawn_session_watcher(path: PathBuf, tx: Sender<UserEvent>, ctx: egui::Context) {
    info!("watching {}", path.display());
    thread::spawn(move || {
        let mut last_seen: Option<SystemTime> = None;
        let mut present = false;
        loop {
            let modified = std::fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .ok();
            let event = match modified {
                Some(stamp) if last_seen != Some(stamp) => {
                    last_seen = Some(stamp);
                    SessionSnapshot::load(&path).map(|snapshot| {
                        present = true;
                        UserEvent::SessionChanged(snapshot)
                    })
                }
                None if present => {
                    present = false;
                    last_seen = None;
                    Some(UserEvent::SessionLost)
                }
                _ => None,
            };
            if let Some(event) = event {
                if tx.send(event).is_err() {
                    break;
                }
                ctx.request_repaint();
            }
            thread::sleep(POLL_INTERVAL);
        }
    });
}
