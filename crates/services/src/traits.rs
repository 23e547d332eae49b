// Copyright (c) 2024 Mike Tsao

//! Traits used by services.

use crossbeam::channel::{Receiver, RecvError, SelectedOperation, Sender};

/// Service methods.
///
/// A service runs a daemon on its own thread. Clients talk to it only through
/// crossbeam channels: they send Inputs and listen for Events.
pub trait ProvidesService<I: core::fmt::Debug, E: core::fmt::Debug> {
    /// The sender side of the Input channel. Clone it freely.
    fn sender(&self) -> &Sender<I>;

    /// Sends one Input, logging instead of failing if the daemon is gone.
    fn send_input(&self, input: I) {
        if let Err(e) = self.sender().try_send(input) {
            log::warn!("While sending: {e:?}");
        }
    }

    /// The receiver side of the Event channel.
    fn receiver(&self) -> &Receiver<E>;

    /// Completes a receive inside a crossbeam select loop, logging failures.
    fn recv_operation<T>(oper: SelectedOperation, r: &Receiver<T>) -> Result<T, RecvError> {
        let result = oper.recv(r);
        if let Err(e) = result {
            log::warn!("ProvidesService: while receiving from {r:?}: {e}");
        }
        result
    }
}
