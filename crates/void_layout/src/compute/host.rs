//! Background layout execution.
//!
//! # Flow
//!
//! ```text
//! Caller                    Dispatcher thread          rayon pool (all cores)
//! ┌──────────────────┐
//! │ host.acquire()   │ starts both on first use
//! │ host.submit(req) │── job N ──► queue, FIFO ──► install(run_request)
//! └────────┬─────────┘             one at a time      │ parse mode
//!          │                                          │ compute_layout(...)
//!          │  ◄── Progress(0.1) ──────────────────────│   par_iter repulsion
//!          │  ◄── Completed(map) ─────────────────────│ exactly one terminal
//! ┌────────▼─────────┐
//! │ handle.poll()    │ non-blocking, once per frame
//! │ handle.wait(t)   │ blocking, for callers that can suspend
//! └──────────────────┘
//! host.dispose() closes the queue and raises the discard flag: the running
//! job stops at its next iteration, queued jobs exit without replying, and
//! their handles report `Disconnected`.
//! ```
//!
//! Every request gets its own channel and a monotonically increasing
//! [`RequestToken`]. Callers that only care about the newest request check
//! [`AsyncComputeHost::is_current`] and drop older handles.
//!
//! # Usage
//!
//! ```ignore
//! let mut host = AsyncComputeHost::new();
//! let mut handle = host.submit(ComputeRequest::new(nodes, edges, "force"))?;
//!
//! // Each frame
//! match handle.poll() {
//!     Some(Ok(positions)) => apply(positions),
//!     Some(Err(err)) => keep_previous_positions(err),
//!     None => show_progress(handle.progress()),
//! }
//!
//! host.dispose();
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{self as channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use web_time::Instant;

use crate::error::ComputeError;
use crate::layout::{compute_layout_cancellable, LayoutParams};
use crate::types::{Edge, GraphInput, Node, PositionMap};

/// Identifies one submitted request. Later requests have larger tokens.
pub type RequestToken = u64;

/// Layout job, copied into the background context.
#[derive(Clone, Debug)]
pub struct ComputeRequest {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
  /// Layout mode name as accepted by [`LayoutParams::mode`].
  pub mode: String,
  /// Force iteration override.
  pub iterations: Option<usize>,
  /// Per-mode parameters the name resolves against.
  pub params: LayoutParams,
}

impl ComputeRequest {
  pub fn new(nodes: Vec<Node>, edges: Vec<Edge>, mode: impl Into<String>) -> Self {
    Self {
      nodes,
      edges,
      mode: mode.into(),
      iterations: None,
      params: LayoutParams::default(),
    }
  }

  pub fn with_iterations(mut self, iterations: usize) -> Self {
    self.iterations = Some(iterations);
    self
  }

  pub fn with_params(mut self, params: LayoutParams) -> Self {
    self.params = params;
    self
  }
}

/// Message from the background context.
#[derive(Clone, Debug, PartialEq)]
pub enum ComputeEvent {
  /// Fraction done in `[0, 1]`; non-decreasing per request.
  Progress(f64),
  /// Terminal: the finished layout.
  Completed(PositionMap),
  /// Terminal: description of what went wrong.
  Failed(String),
}

impl ComputeEvent {
  #[inline]
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Self::Progress(_))
  }
}

/// Caller side of one request.
#[derive(Debug)]
pub struct LayoutHandle {
  token: RequestToken,
  receiver: Receiver<ComputeEvent>,
  progress: f64,
  finished: bool,
}

impl LayoutHandle {
  pub fn token(&self) -> RequestToken {
    self.token
  }

  /// Latest progress seen by [`poll`](Self::poll) or [`wait`](Self::wait).
  pub fn progress(&self) -> f64 {
    self.progress
  }

  /// True once a terminal result has been returned.
  pub fn is_finished(&self) -> bool {
    self.finished
  }

  /// Next raw event, if one is ready.
  pub fn try_next(&mut self) -> Option<ComputeEvent> {
    if self.finished {
      return None;
    }
    match self.receiver.try_recv() {
      Ok(event) => {
        self.observe(&event);
        Some(event)
      }
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => {
        self.finished = true;
        Some(ComputeEvent::Failed(ComputeError::Disconnected.to_string()))
      }
    }
  }

  /// Drain pending progress and return the terminal result once it arrives.
  ///
  /// Returns `None` while the request is still running and after the result
  /// has already been taken.
  pub fn poll(&mut self) -> Option<Result<PositionMap, ComputeError>> {
    if self.finished {
      return None;
    }
    loop {
      match self.receiver.try_recv() {
        Ok(event) => {
          if let Some(result) = self.settle(event) {
            return Some(result);
          }
        }
        Err(TryRecvError::Empty) => return None,
        Err(TryRecvError::Disconnected) => {
          self.finished = true;
          return Some(Err(ComputeError::Disconnected));
        }
      }
    }
  }

  /// Block until the terminal result arrives or `timeout` elapses.
  pub fn wait(&mut self, timeout: Duration) -> Result<PositionMap, ComputeError> {
    if self.finished {
      return Err(ComputeError::Disconnected);
    }
    let deadline = Instant::now() + timeout;
    loop {
      let remaining = deadline.saturating_duration_since(Instant::now());
      match self.receiver.recv_timeout(remaining) {
        Ok(event) => {
          if let Some(result) = self.settle(event) {
            return result;
          }
        }
        Err(RecvTimeoutError::Timeout) => return Err(ComputeError::Timeout),
        Err(RecvTimeoutError::Disconnected) => {
          self.finished = true;
          return Err(ComputeError::Disconnected);
        }
      }
    }
  }

  fn observe(&mut self, event: &ComputeEvent) {
    match event {
      ComputeEvent::Progress(value) => self.progress = self.progress.max(*value),
      ComputeEvent::Completed(_) => {
        self.progress = 1.0;
        self.finished = true;
      }
      ComputeEvent::Failed(_) => self.finished = true,
    }
  }

  fn settle(&mut self, event: ComputeEvent) -> Option<Result<PositionMap, ComputeError>> {
    self.observe(&event);
    match event {
      ComputeEvent::Progress(_) => None,
      ComputeEvent::Completed(positions) => Some(Ok(positions)),
      ComputeEvent::Failed(reason) => Some(Err(ComputeError::Failed(reason))),
    }
  }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Live background context.
struct Context {
  /// Requests in submission order. The dispatcher runs one at a time.
  jobs: Sender<Job>,
  /// Pool each job runs inside, so layout `par_iter` uses every worker.
  pool: Arc<rayon::ThreadPool>,
  /// Set on dispose so running and queued jobs exit without replying.
  discarded: Arc<AtomicBool>,
}

/// Owner of the single background layout context.
///
/// The context is created by [`acquire`](Self::acquire) (or lazily by the
/// first [`submit`](Self::submit)) and released by
/// [`dispose`](Self::dispose) or on drop.
#[derive(Default)]
pub struct AsyncComputeHost {
  context: Option<Context>,
  next_token: RequestToken,
  latest: Option<RequestToken>,
}

impl AsyncComputeHost {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create the background context if it does not exist yet.
  pub fn acquire(&mut self) -> Result<(), ComputeError> {
    if self.context.is_some() {
      return Ok(());
    }
    let pool = Arc::new(
      rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("void-layout-{}", i))
        .build()?,
    );
    let (jobs, queue) = channel::unbounded::<Job>();
    let workers = Arc::clone(&pool);
    std::thread::Builder::new()
      .name("void-layout-dispatch".to_string())
      .spawn(move || {
        for job in queue {
          workers.install(job);
        }
      })?;
    self.context = Some(Context {
      jobs,
      pool,
      discarded: Arc::new(AtomicBool::new(false)),
    });
    tracing::debug!(threads = self.worker_threads(), "background layout context acquired");
    Ok(())
  }

  pub fn is_acquired(&self) -> bool {
    self.context.is_some()
  }

  /// Worker threads available to a running layout, if acquired.
  pub fn worker_threads(&self) -> Option<usize> {
    self.context.as_ref().map(|context| context.pool.current_num_threads())
  }

  /// Release the background context.
  ///
  /// Requests that have not replied yet are discarded; their handles report
  /// [`ComputeError::Disconnected`]. A running force layout stops at its next
  /// iteration. Does not block on it.
  pub fn dispose(&mut self) {
    if let Some(context) = self.context.take() {
      context.discarded.store(true, Ordering::Release);
      tracing::debug!(latest = ?self.latest, "background layout context disposed");
    }
  }

  /// Queue `request` on the background context.
  pub fn submit(&mut self, request: ComputeRequest) -> Result<LayoutHandle, ComputeError> {
    self.acquire()?;
    let Some(context) = self.context.as_ref() else {
      return Err(ComputeError::Disconnected);
    };

    self.next_token += 1;
    let token = self.next_token;
    self.latest = Some(token);

    let (sender, receiver) = channel::unbounded();
    let discarded = Arc::clone(&context.discarded);
    tracing::debug!(token, mode = %request.mode, nodes = request.nodes.len(), "layout request submitted");
    let job: Job = Box::new(move || run_request(token, request, &sender, &discarded));
    context.jobs.send(job).map_err(|_| ComputeError::Disconnected)?;

    Ok(LayoutHandle {
      token,
      receiver,
      progress: 0.0,
      finished: false,
    })
  }

  /// Token of the most recent submission.
  pub fn latest_token(&self) -> Option<RequestToken> {
    self.latest
  }

  /// True when `token` belongs to the most recent submission.
  pub fn is_current(&self, token: RequestToken) -> bool {
    self.latest == Some(token)
  }
}

impl Drop for AsyncComputeHost {
  fn drop(&mut self) {
    self.dispose();
  }
}

#[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "compute::run_request", fields(token = token)))]
fn run_request(token: RequestToken, request: ComputeRequest, sender: &Sender<ComputeEvent>, discarded: &AtomicBool) {
  if discarded.load(Ordering::Acquire) {
    return;
  }
  // Send errors mean the handle was dropped; nobody is listening.
  let send = |event: ComputeEvent| {
    if !discarded.load(Ordering::Acquire) {
      let _ = sender.send(event);
    }
  };

  let mode = match request.params.mode(&request.mode, request.iterations) {
    Ok(mode) => mode,
    Err(err) => {
      tracing::warn!(token, %err, "background layout rejected");
      send(ComputeEvent::Failed(err.to_string()));
      return;
    }
  };

  let graph = GraphInput::new(request.nodes, request.edges);
  let mut last = 0.0f64;
  let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
    compute_layout_cancellable(
      &graph,
      &mode,
      &mut |value| {
        if value >= last {
          last = value;
          send(ComputeEvent::Progress(value));
        }
      },
      discarded,
    )
  }));

  match outcome {
    Ok(positions) => send(ComputeEvent::Completed(positions)),
    Err(payload) => {
      let reason = panic_message(payload.as_ref());
      tracing::warn!(token, %reason, "background layout panicked");
      send(ComputeEvent::Failed(reason));
    }
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "layout panicked".to_string()
  }
}

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;
