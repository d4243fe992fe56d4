//! Recognition engine lifecycle
//!
//! `Uninitialized → Initialized → Released`, where released is the same as
//! uninitialized and the engine can be initialized again. The state lock is
//! held for the whole of a recognition, so `initialize`/`release` never
//! interleave with one in flight.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::assembler::{assemble_all, RecognizedText};
use crate::assets::{stage_assets, AssetProvider};
use crate::config::EngineConfig;
use crate::decoder::decode;
use crate::error::{OcrError, Result};
use crate::frame::Frame;
use crate::inference::{InferParams, InferenceEngine, InferenceFactory};
use crate::labels::LabelTable;
use crate::worker::{RecognizeOptions, Reply, Request, Worker};

/// Resources that exist only while initialized
struct Loaded {
    labels: Arc<LabelTable>,
    predictor: Box<dyn InferenceEngine>,
}

struct Shared {
    factory: Box<dyn InferenceFactory>,
    state: Mutex<Option<Loaded>>,
    ready: AtomicBool,
    det_long_size: AtomicU32,
}

impl Shared {
    fn try_recognize(
        &self,
        frame: Option<&Frame>,
        options: RecognizeOptions,
    ) -> Result<Vec<RecognizedText>> {
        let mut state = self.state.lock();

        let Some(loaded) = state.as_mut() else {
            error!("not initialized");
            return Ok(Vec::new());
        };

        let Some(frame) = frame else {
            error!("frame is absent");
            return Ok(Vec::new());
        };

        let params = InferParams {
            max_detection_size: self.det_long_size.load(Ordering::Relaxed),
            run_detect: options.run_detect,
            run_classify: options.run_classify,
            run_recognize: options.run_recognize,
        };
        debug!(
            "running inference on {}x{} frame, det long size {}",
            frame.width(), frame.height(), params.max_detection_size
        );

        let buffer = loaded.predictor.infer(frame, &params)?;
        let regions = decode(&buffer)?;
        let results = assemble_all(&regions, &loaded.labels);

        info!("recognized {} texts", results.len());
        Ok(results)
    }
}

/// Text recognition engine with an owned single-worker queue
pub struct RecognitionEngine {
    shared: Arc<Shared>,
    worker: Worker,
}

impl RecognitionEngine {
    /// Create an uninitialized engine that builds predictors with `factory`
    pub fn new(factory: impl InferenceFactory + 'static) -> Result<Self> {
        let shared = Arc::new(Shared {
            factory: Box::new(factory),
            state: Mutex::new(None),
            ready: AtomicBool::new(false),
            det_long_size: AtomicU32::new(EngineConfig::default().det_long_size),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = Worker::spawn(move |frame, options| worker_shared.try_recognize(frame, options))?;

        Ok(Self { shared, worker })
    }

    /// Initialize with the default configuration apart from threads and
    /// detection size. A no-op when already initialized.
    pub fn initialize(
        &self,
        provider: &dyn AssetProvider,
        thread_count: usize,
        det_long_size: u32,
    ) -> Result<()> {
        self.initialize_with_config(provider, &EngineConfig::with_threads(thread_count, det_long_size))
    }

    /// Stage assets, load the dictionary and build the predictor.
    ///
    /// Any failure leaves the engine uninitialized.
    pub fn initialize_with_config(
        &self,
        provider: &dyn AssetProvider,
        config: &EngineConfig,
    ) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.is_some() {
            warn!("already initialized");
            return Ok(());
        }

        let loaded = self.load(provider, config).map_err(|e| {
            error!("init failed: {}", e);
            e
        })?;

        self.shared
            .det_long_size
            .store(config.det_long_size, Ordering::Relaxed);
        *state = Some(loaded);
        self.shared.ready.store(true, Ordering::Release);
        info!("init success");
        Ok(())
    }

    fn load(&self, provider: &dyn AssetProvider, config: &EngineConfig) -> Result<Loaded> {
        let staged_dir = stage_assets(provider, config)?;

        let dictionary = provider
            .open(&config.asset_path(&config.keys_file))
            .map_err(|e| OcrError::Dictionary(format!("cannot open {}: {}", config.keys_file, e)))?;
        let labels = LabelTable::from_reader(dictionary)?;

        let predictor_config = config.predictor_config(&staged_dir);
        info!("model paths: det={:?}", predictor_config.det_model_path);
        let predictor = self.shared.factory.create(&predictor_config)?;

        Ok(Loaded {
            labels: Arc::new(labels),
            predictor,
        })
    }

    /// Recognize with every stage enabled
    pub fn recognize(&self, frame: Option<&Frame>) -> Vec<RecognizedText> {
        self.recognize_with(frame, RecognizeOptions::default())
    }

    /// Recognize, swallowing faults into an empty result
    pub fn recognize_with(
        &self,
        frame: Option<&Frame>,
        options: RecognizeOptions,
    ) -> Vec<RecognizedText> {
        match self.try_recognize(frame, options) {
            Ok(results) => results,
            Err(e) => {
                error!("recognize failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Recognize, reporting inference and decode faults.
    ///
    /// An uninitialized engine or an absent frame is still an empty success.
    pub fn try_recognize(
        &self,
        frame: Option<&Frame>,
        options: RecognizeOptions,
    ) -> Result<Vec<RecognizedText>> {
        self.shared.try_recognize(frame, options)
    }

    /// Queue a recognition on the background worker.
    ///
    /// Exactly one of the callbacks runs, on the worker thread, in
    /// submission order relative to other queued work. `on_success` gets
    /// the same list `recognize` would return, so decode and inference
    /// errors arrive there as an empty list. `on_error` only sees a panic
    /// during recognition (-1) or a stopped worker (-4).
    pub fn recognize_async<S, E>(&self, frame: Option<Frame>, on_success: S, on_error: E)
    where
        S: FnOnce(Vec<RecognizedText>) + Send + 'static,
        E: FnOnce(i32, String) + Send + 'static,
    {
        self.enqueue(Request {
            frame,
            options: RecognizeOptions::default(),
            reply: Reply::Callbacks {
                on_success: Box::new(on_success),
                on_error: Box::new(on_error),
            },
        });
    }

    /// Queue a recognition and receive its outcome on a channel.
    ///
    /// Unlike the callbacks, the channel carries the `try_recognize` result.
    pub fn submit(
        &self,
        frame: Option<Frame>,
        options: RecognizeOptions,
    ) -> oneshot::Receiver<Result<Vec<RecognizedText>>> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Request {
            frame,
            options,
            reply: Reply::Channel(tx),
        });
        rx
    }

    fn enqueue(&self, request: Request) {
        if let Err(request) = self.worker.submit(request) {
            error!("recognition worker is gone, rejecting request");
            request.reply.deliver(Err(OcrError::WorkerUnavailable));
        }
    }

    /// Free the predictor and dictionary. Safe to call repeatedly.
    pub fn release(&self) {
        let mut state = self.shared.state.lock();
        if let Some(mut loaded) = state.take() {
            loaded.predictor.release();
        }
        self.shared.ready.store(false, Ordering::Release);
        info!("released");
    }

    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }

    /// Detection long side used from the next recognition on
    pub fn set_det_long_size(&self, size: u32) {
        self.shared.det_long_size.store(size, Ordering::Relaxed);
    }

    pub fn det_long_size(&self) -> u32 {
        self.shared.det_long_size.load(Ordering::Relaxed)
    }

    /// Current dictionary, if initialized
    pub fn labels(&self) -> Option<Arc<LabelTable>> {
        self.shared
            .state
            .lock()
            .as_ref()
            .map(|loaded| Arc::clone(&loaded.labels))
    }
}
