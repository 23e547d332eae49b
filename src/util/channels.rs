// Copyright (c) 2024 Mike Tsao

use crossbeam::channel::{Receiver, Sender};

/// Both ends of an unbounded [crossbeam::channel]. Services keep one of these
/// for inputs and one for events, handing clones of the ends to their worker
/// threads.
#[derive(Debug)]
pub struct CrossbeamChannel<T> {
    #[allow(missing_docs)]
    pub sender: Sender<T>,
    #[allow(missing_docs)]
    pub receiver: Receiver<T>,
}
impl<T> Default for CrossbeamChannel<T> {
    fn default() -> Self {
        let (sender, receiver) = crossbeam::channel::unbounded();
        Self { sender, receiver }
    }
}
impl<T> CrossbeamChannel<T> {
    /// Clones of both ends, for handing to another thread.
    pub fn ends(&self) -> (Sender<T>, Receiver<T>) {
        (self.sender.clone(), self.receiver.clone())
    }
}
