//! Async/await support for TSIF capture.
//!
//! Provides a waker-backed client and a future that resolves once packets
//! are ready to read.

use core::future::poll_fn;
use core::task::{Poll, Waker};

use super::primitives::{AtomicWaker, CriticalSectionCell};
use super::shared::SharedTsif;
use crate::driver::config::State;
use crate::driver::error::Result;
use crate::driver::tsif::{ClientHandle, TsifClient, TsifSnapshot};
use crate::hal::datamover::DataMover;
use crate::hal::memory::DmaAllocator;
use crate::hal::stream::StreamControl;

/// Client that wakes an async task on every driver notification.
///
/// # Example
///
/// ```ignore
/// static CLIENT: AsyncTsifClient = AsyncTsifClient::new();
///
/// let handle = TSIF.with(|t| t.attach(&CLIENT))?;
/// TSIF.start(handle)?;
/// loop {
///     let snap = wait_for_packets(&TSIF, &CLIENT, handle).await?;
///     // read [snap.ri, snap.wi), then reclaim
///     TSIF.reclaim(handle, snap.wi)?;
/// }
/// ```
pub struct AsyncTsifClient {
    waker: AtomicWaker,
    events: CriticalSectionCell<u32>,
}

impl AsyncTsifClient {
    /// Create a new client (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            waker: AtomicWaker::new(),
            events: CriticalSectionCell::new(0),
        }
    }

    /// Notifications received so far
    pub fn events(&self) -> u32 {
        self.events.with_ref(|n| *n)
    }

    /// Register the task to wake on the next notification
    pub fn register(&self, waker: &Waker) {
        self.waker.register(waker);
    }
}

impl Default for AsyncTsifClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TsifClient for AsyncTsifClient {
    fn notify(&self) {
        self.events.with(|n| *n = n.wrapping_add(1));
        self.waker.wake();
    }
}

/// Wait until the client has packets to read or capture has stopped.
///
/// Resolves with the snapshot that satisfied the wait. A snapshot in
/// [`State::Stopped`] means no more packets will arrive.
pub async fn wait_for_packets<A, M, S>(
    tsif: &SharedTsif<A, M, S>,
    client: &AsyncTsifClient,
    handle: ClientHandle,
) -> Result<TsifSnapshot>
where
    A: DmaAllocator,
    M: DataMover,
    S: StreamControl,
{
    let ready = || -> Result<Option<TsifSnapshot>> {
        tsif.with(|t| {
            let snap = t.state(handle)?;
            if snap.state == State::Stopped || t.available_packets() > 0 {
                Ok(Some(snap))
            } else {
                Ok(None)
            }
        })
    };

    poll_fn(|cx| {
        if let Some(snap) = ready()? {
            return Poll::Ready(Ok(snap));
        }
        client.register(cx.waker());
        // Re-check: a notification may have landed before registration
        match ready()? {
            Some(snap) => Poll::Ready(Ok(snap)),
            None => Poll::Pending,
        }
    })
    .await
}
