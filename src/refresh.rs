//! Single-flight access-token refresh coordination.
//!
//! [`RefreshCoordinator`] owns the "refresh in progress" flag and the queue of requests
//! waiting on that refresh. The first request to observe a 401 enlists as leader and gets a
//! [`RefreshTicket`]; every later one only gets a [`PendingRetry`] handle. Settling the ticket
//! fulfills all handles in the order they were enlisted, then clears the flag so the next
//! expiry can start a fresh cycle.
//!
//! The flag check, the flag set, and the enqueue happen under one lock, so the at-most-one
//! refresh guarantee holds on multi-threaded executors too.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::{
	mem,
	task::{Context, Poll},
};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, session::TokenSecret};

/// Outcome delivered to every request queued behind a refresh.
pub type RetryOutcome = Result<TokenSecret, RefreshFailure>;

/// Why a refresh did not produce a new access token. Cloned to every queued request.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct RefreshFailure {
	/// HTTP status of the refresh response, when one was received.
	pub status: Option<u16>,
	/// Human-readable reason.
	pub message: String,
}
impl RefreshFailure {
	/// Creates a failure without an HTTP status.
	pub fn new(message: impl Into<String>) -> Self {
		Self { status: None, message: message.into() }
	}

	/// Attaches the HTTP status of the refresh response.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Failure used when a leader goes away without settling its refresh.
	pub fn abandoned() -> Self {
		Self::new("Refresh was abandoned before it completed")
	}
}

/// What a request that just saw a 401 should do next.
#[derive(Debug)]
pub enum Enlistment<'a> {
	/// A refresh finished after the request was sent; retry with this token.
	Fresh(TokenSecret),
	/// A refresh is running; wait for it.
	Follower(PendingRetry),
	/// No refresh is running; run one and settle the ticket.
	Leader(PendingRetry, RefreshTicket<'a>),
}

#[derive(Debug, Default)]
struct State {
	refreshing: bool,
	generation: u64,
	epoch: u64,
	latest: Option<TokenSecret>,
	forgotten: bool,
	queue: Vec<oneshot::Sender<RetryOutcome>>,
}

/// Owned flag-and-queue state shared by every clone of a client.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	state: Mutex<State>,
}
impl RefreshCoordinator {
	/// Sets the in-progress flag if it is clear and returns the ticket that must settle it.
	pub fn begin_refresh(&self) -> Option<RefreshTicket<'_>> {
		let mut state = self.state.lock();

		if state.refreshing {
			return None;
		}

		Some(self.start_locked(&mut state))
	}

	/// Appends a handle that resolves with the outcome of the current (or next) refresh.
	pub fn enqueue(&self) -> PendingRetry {
		let (tx, rx) = oneshot::channel();

		self.state.lock().queue.push(tx);

		PendingRetry(rx)
	}

	/// Enqueues a handle and, if no refresh is running, starts one, as a single critical section.
	pub fn enlist(&self) -> (PendingRetry, Option<RefreshTicket<'_>>) {
		let (tx, rx) = oneshot::channel();
		let mut state = self.state.lock();

		state.queue.push(tx);

		let ticket = (!state.refreshing).then(|| self.start_locked(&mut state));

		(PendingRetry(rx), ticket)
	}

	/// Like [`Self::enlist`], but first checks whether a refresh that finished after `epoch`
	/// already produced a token other than `rejected`.
	///
	/// `epoch` is the value [`Self::epoch`] returned before the rejected request was sent.
	pub fn enlist_since(&self, epoch: u64, rejected: Option<&TokenSecret>) -> Enlistment<'_> {
		let mut state = self.state.lock();

		if !state.refreshing && state.epoch > epoch {
			let fresher = state.latest.as_ref().filter(|latest| rejected != Some(*latest));

			if let Some(token) = fresher {
				return Enlistment::Fresh(token.clone());
			}
		}

		let (tx, rx) = oneshot::channel();

		state.queue.push(tx);

		if state.refreshing {
			Enlistment::Follower(PendingRetry(rx))
		} else {
			Enlistment::Leader(PendingRetry(rx), self.start_locked(&mut state))
		}
	}

	/// Fulfills every queued handle with `token`, in enqueue order, and clears the flag.
	///
	/// Returns the number of handles that were fulfilled.
	pub fn resolve(&self, token: TokenSecret) -> usize {
		self.settle(None, Ok(token)).unwrap_or_default()
	}

	/// Fails every queued handle with `failure` and clears the flag.
	///
	/// Returns the number of handles that were failed.
	pub fn reject(&self, failure: RefreshFailure) -> usize {
		self.settle(None, Err(failure)).unwrap_or_default()
	}

	/// Returns `true` while a refresh is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().refreshing
	}

	/// Returns the number of queued handles.
	pub fn pending_len(&self) -> usize {
		self.state.lock().queue.len()
	}

	/// Drops the token kept for late 401s once the session ends.
	///
	/// A refresh still running at this point settles without leaving its token behind, so
	/// nothing issued to the ended session is handed to a later request.
	pub fn forget(&self) {
		let mut state = self.state.lock();

		state.latest = None;
		state.forgotten = state.refreshing;
	}

	/// Returns how many refreshes have produced a token so far.
	pub fn epoch(&self) -> u64 {
		self.state.lock().epoch
	}

	fn start_locked(&self, state: &mut State) -> RefreshTicket<'_> {
		state.refreshing = true;
		state.forgotten = false;
		state.generation = state.generation.wrapping_add(1);

		RefreshTicket { coordinator: self, generation: state.generation, settled: false }
	}

	/// Drains the queue and clears the flag, then delivers `outcome` to every drained handle.
	///
	/// With `Some(generation)` nothing happens unless that cycle is still the running one.
	fn settle(&self, generation: Option<u64>, outcome: RetryOutcome) -> Option<usize> {
		let waiters = {
			let mut state = self.state.lock();

			if generation.is_some_and(|g| !(state.refreshing && state.generation == g)) {
				return None;
			}

			state.refreshing = false;

			match &outcome {
				Ok(token) => {
					state.epoch = state.epoch.wrapping_add(1);
					state.latest = (!state.forgotten).then(|| token.clone());
				},
				Err(_) => state.latest = None,
			}

			state.forgotten = false;

			mem::take(&mut state.queue)
		};
		let count = waiters.len();

		for waiter in waiters {
			// A receiver that went away simply does not retry.
			let _ = waiter.send(outcome.clone());
		}

		Some(count)
	}
}

/// Proof of leadership over one refresh cycle.
///
/// Dropping an unsettled ticket rejects the queue with [`RefreshFailure::abandoned`], so a
/// cancelled leader never strands its followers. Settling a ticket whose cycle was already
/// settled through the coordinator is a no-op.
#[derive(Debug)]
#[must_use = "an unsettled ticket rejects every queued request when dropped"]
pub struct RefreshTicket<'a> {
	coordinator: &'a RefreshCoordinator,
	generation: u64,
	settled: bool,
}
impl RefreshTicket<'_> {
	/// Fulfills the queue with `token`. Returns the number of fulfilled handles.
	pub fn resolve(mut self, token: TokenSecret) -> usize {
		self.settled = true;

		self.coordinator.settle(Some(self.generation), Ok(token)).unwrap_or_default()
	}

	/// Fails the queue with `failure`. Returns the number of failed handles.
	pub fn reject(mut self, failure: RefreshFailure) -> usize {
		self.settled = true;

		self.coordinator.settle(Some(self.generation), Err(failure)).unwrap_or_default()
	}
}
impl Drop for RefreshTicket<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.settle(Some(self.generation), Err(RefreshFailure::abandoned()));
		}
	}
}

/// Future-like handle for one request waiting on a refresh.
#[derive(Debug)]
pub struct PendingRetry(oneshot::Receiver<RetryOutcome>);
impl Future for PendingRetry {
	type Output = RetryOutcome;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.0)
			.poll(cx)
			.map(|received| received.unwrap_or_else(|_| Err(RefreshFailure::abandoned())))
	}
}
