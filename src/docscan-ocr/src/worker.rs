//! Single background worker serving queued recognitions in FIFO order

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::assembler::RecognizedText;
use crate::error::{OcrError, Result};
use crate::frame::Frame;

/// Which stages a recognition runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizeOptions {
    pub run_detect: bool,
    pub run_classify: bool,
    pub run_recognize: bool,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            run_detect: true,
            run_classify: true,
            run_recognize: true,
        }
    }
}

type SuccessCallback = Box<dyn FnOnce(Vec<RecognizedText>) + Send>;
type ErrorCallback = Box<dyn FnOnce(i32, String) + Send>;

pub(crate) enum Reply {
    Callbacks {
        on_success: SuccessCallback,
        on_error: ErrorCallback,
    },
    Channel(oneshot::Sender<Result<Vec<RecognizedText>>>),
}

impl Reply {
    pub(crate) fn deliver(self, result: Result<Vec<RecognizedText>>) {
        match self {
            Reply::Callbacks {
                on_success,
                on_error,
            } => match result {
                Ok(results) => on_success(results),
                Err(e @ (OcrError::Fault(_) | OcrError::WorkerUnavailable)) => {
                    on_error(e.code(), e.to_string())
                }
                // Callbacks see what `recognize` would return
                Err(e) => {
                    error!("recognize failed: {}", e);
                    on_success(Vec::new())
                }
            },
            Reply::Channel(tx) => {
                if tx.send(result).is_err() {
                    debug!("recognition receiver dropped before completion");
                }
            }
        }
    }
}

pub(crate) struct Request {
    pub(crate) frame: Option<Frame>,
    pub(crate) options: RecognizeOptions,
    pub(crate) reply: Reply,
}

pub(crate) struct Worker {
    tx: Option<mpsc::UnboundedSender<Request>>,
    handle: Option<JoinHandle<()>>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Worker {
    /// Start the worker thread. `run` performs one recognition.
    pub(crate) fn spawn<F>(run: F) -> Result<Self>
    where
        F: Fn(Option<&Frame>, RecognizeOptions) -> Result<Vec<RecognizedText>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Request>();

        let handle = thread::Builder::new()
            .name("docscan-recognizer".to_string())
            .spawn(move || {
                while let Some(request) = rx.blocking_recv() {
                    let Request {
                        frame,
                        options,
                        reply,
                    } = request;

                    let result = panic::catch_unwind(AssertUnwindSafe(|| run(frame.as_ref(), options)))
                        .unwrap_or_else(|payload| {
                            let message = panic_message(payload.as_ref());
                            error!("recognition panicked: {}", message);
                            Err(OcrError::Fault(message))
                        });

                    // A panicking callback must not take the queue down with it
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| reply.deliver(result))) {
                        error!("recognition callback panicked: {}", panic_message(payload.as_ref()));
                    }
                }
                info!("recognition worker stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue a request, handing it back if the worker is gone
    pub(crate) fn submit(&self, request: Request) -> std::result::Result<(), Request> {
        match &self.tx {
            Some(tx) => tx.send(request).map_err(|e| e.0),
            None => Err(request),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the channel lets queued requests drain before the thread exits
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("recognition worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;

    fn text(s: &str) -> RecognizedText {
        RecognizedText::new(s, 1.0, [0.0; 8])
    }

    #[test]
    fn test_requests_run_in_order() {
        let worker = Worker::spawn(|frame, _| {
            let width = frame.map(|f| f.width()).unwrap_or(0);
            Ok(vec![text(&width.to_string())])
        })
        .unwrap();

        let mut receivers = Vec::new();
        for width in 1..=5 {
            let (tx, rx) = oneshot::channel();
            let frame = Frame::new(width, 1, vec![0; width as usize * 4]).unwrap();
            worker
                .submit(Request {
                    frame: Some(frame),
                    options: RecognizeOptions::default(),
                    reply: Reply::Channel(tx),
                })
                .map_err(|_| "submit failed")
                .unwrap();
            receivers.push(rx);
        }

        for (i, rx) in receivers.into_iter().enumerate() {
            let results = rx.blocking_recv().unwrap().unwrap();
            assert_eq!(results[0].text, (i + 1).to_string());
        }
    }

    #[test]
    fn test_panic_reported_and_worker_survives() {
        let worker = Worker::spawn(|frame, _| {
            if frame.is_none() {
                panic!("no frame");
            }
            Ok(Vec::new())
        })
        .unwrap();

        let (tx, rx) = std_mpsc::channel();
        let tx_ok = tx.clone();
        worker
            .submit(Request {
                frame: None,
                options: RecognizeOptions::default(),
                reply: Reply::Callbacks {
                    on_success: Box::new(|_| panic!("unexpected success")),
                    on_error: Box::new(move |code, msg| tx.send((code, msg)).unwrap()),
                },
            })
            .map_err(|_| "submit failed")
            .unwrap();

        let (code, msg) = rx.recv().unwrap();
        assert_eq!(code, -1);
        assert!(msg.contains("no frame"));

        let (done_tx, done_rx) = std_mpsc::channel();
        worker
            .submit(Request {
                frame: Some(Frame::new(1, 1, vec![0; 4]).unwrap()),
                options: RecognizeOptions::default(),
                reply: Reply::Callbacks {
                    on_success: Box::new(move |r| done_tx.send(r.len()).unwrap()),
                    on_error: Box::new(move |_, _| tx_ok.send((0, String::new())).unwrap()),
                },
            })
            .map_err(|_| "submit failed")
            .unwrap();
        assert_eq!(done_rx.recv().unwrap(), 0);
    }

    fn callbacks(tx: std_mpsc::Sender<std::result::Result<usize, i32>>) -> Reply {
        let err_tx = tx.clone();
        Reply::Callbacks {
            on_success: Box::new(move |r| tx.send(Ok(r.len())).unwrap()),
            on_error: Box::new(move |code, _| err_tx.send(Err(code)).unwrap()),
        }
    }

    #[test]
    fn test_callbacks_mirror_recognize() {
        let (tx, rx) = std_mpsc::channel();
        let truncated = crate::decoder::decode(&[1.0, 0.0, 0.5]).unwrap_err();

        callbacks(tx.clone()).deliver(Err(OcrError::Decode(truncated)));
        assert_eq!(rx.recv().unwrap(), Ok(0));

        callbacks(tx.clone()).deliver(Err(OcrError::Inference("boom".into())));
        assert_eq!(rx.recv().unwrap(), Ok(0));

        callbacks(tx.clone()).deliver(Err(OcrError::Fault("panic".into())));
        assert_eq!(rx.recv().unwrap(), Err(-1));

        callbacks(tx).deliver(Err(OcrError::WorkerUnavailable));
        assert_eq!(rx.recv().unwrap(), Err(-4));
    }

    #[test]
    fn test_drop_drains_queue() {
        let (tx, rx) = std_mpsc::channel();
        {
            let worker = Worker::spawn(|_, _| Ok(Vec::new())).unwrap();
            for i in 0..3 {
                let tx = tx.clone();
                worker
                    .submit(Request {
                        frame: None,
                        options: RecognizeOptions::default(),
                        reply: Reply::Callbacks {
                            on_success: Box::new(move |_| tx.send(i).unwrap()),
                            on_error: Box::new(|_, _| {}),
                        },
                    })
                    .map_err(|_| "submit failed")
                    .unwrap();
            }
        }
        drop(tx);
        let seen: Vec<i32> = rx.iter().collect();
        assert_eq!(seen, vec![0, 1, 2]);
    }
}
