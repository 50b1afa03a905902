//! Port trait definitions
//!
//! The client talks to the network, the wall clock and the scheduler only
//! through these traits, so every component can be driven by in-memory
//! doubles in tests.

pub mod clock;
pub mod transport;

pub use clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
pub use transport::{ApiRequest, Method, Transport};
