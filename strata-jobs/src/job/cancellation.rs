use tokio::sync::oneshot::{self, error::TryRecvError};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reason {
    /// stop for good
    Stop,
    /// stop, then run the same job again as a new execution
    Restart,
}

#[derive(Debug)]
pub struct Request {
    pub reason: Reason,
    response_send: oneshot::Sender<()>,
}

impl Request {
    pub fn acknowledge(self) {
        if self.response_send.send(()).is_err() {
            tracing::warn!("response receiver dropped");
        }
    }
}

#[derive(Debug)]
pub struct Send(oneshot::Sender<Request>);

impl Send {
    /// Asks the job to stop and waits until it acknowledges.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(self, reason: Reason) {
        let (response_send, response_recv) = oneshot::channel();
        let request = Request {
            reason,
            response_send,
        };
        if self.0.send(request).is_err() {
            tracing::debug!("receiver dropped, job won't be cancelled");
        } else if let Err(error) = response_recv.await {
            tracing::debug!(%error, "response sender dropped");
        }
    }
}

#[derive(Debug)]
pub struct Recv(oneshot::Receiver<Request>);

impl Recv {
    /// Returns a pending request without waiting. Jobs call this between work items.
    pub fn try_recv(&mut self) -> Option<Request> {
        match self.0.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => None,
        }
    }
}

pub fn new() -> (Send, Recv) {
    let (send, recv) = oneshot::channel();
    (Send(send), Recv(recv))
}
