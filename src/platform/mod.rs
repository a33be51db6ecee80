//! Platform abstraction layer
//!
//! Everything that touches wall-clock time or threads lives here, so `sim`
//! stays pure:
//! - Session clock
//! - Fixed tick scheduling
//! - The ticking thread and its input latch

pub mod clock;
pub mod game_loop;
pub mod schedule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use game_loop::{Game, GameLoop, InputLatch};
pub use schedule::TickSchedule;
