// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background persistence of the project collection.
//!
//! Saving encodes every image of every project, so it runs on a worker
//! thread fed through a channel. Snapshots are written in the order they
//! were submitted; the last one wins.

use super::serialization::save_projects;
use super::store::KeyValueStore;
use crate::models::project::Project;
use std::sync::mpsc::{channel, Sender};
use std::thread::JoinHandle;

enum FlushCommand {
    Save(Vec<Project>),
    Sync(Sender<()>),
}

/// Owns the persistence thread.
pub struct FlushWorker {
    sender: Option<Sender<FlushCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl FlushWorker {
    /// Start a worker writing into `store`.
    pub fn spawn(store: Box<dyn KeyValueStore>) -> Self {
        let (sender, receiver) = channel::<FlushCommand>();

        let handle = std::thread::Builder::new()
            .name("session-flush".to_string())
            .spawn(move || {
                for command in receiver {
                    match command {
                        FlushCommand::Save(projects) => save_projects(store.as_ref(), &projects),
                        FlushCommand::Sync(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
            });

        match handle {
            Ok(handle) => Self {
                sender: Some(sender),
                handle: Some(handle),
            },
            Err(e) => {
                log::error!("Failed to start persistence thread, saving is disabled: {}", e);
                Self {
                    sender: None,
                    handle: None,
                }
            }
        }
    }

    /// Queue a snapshot for saving.
    pub fn submit(&self, projects: Vec<Project>) {
        if let Some(ref sender) = self.sender {
            if sender.send(FlushCommand::Save(projects)).is_err() {
                log::error!("Persistence thread has stopped, snapshot dropped");
            }
        }
    }

    /// Block until every queued snapshot has been written (or has failed).
    pub fn wait_idle(&self) {
        if let Some(ref sender) = self.sender {
            let (ack, done) = channel();
            if sender.send(FlushCommand::Sync(ack)).is_ok() {
                let _ = done.recv();
            }
        }
    }
}

impl Drop for FlushWorker {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Persistence thread panicked");
            }
        }
    }
}
