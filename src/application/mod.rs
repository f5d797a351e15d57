//! Application層
//!
//! 共有状態・状態機械・スレッドループとそれらを束ねるコーディネータ。
//! デバイスI/Oはポート越しにのみ行い、この層はevdev/uinputを知らない。

pub mod coordinator;
pub mod runtime_state;
pub mod scheduler;
pub mod stats;
pub mod threads;
pub mod timing;

pub use coordinator::ClickerRunner;
pub use runtime_state::RuntimeState;
pub use scheduler::{ClickAction, ClickPlanner};
pub use stats::ClickStats;
pub use threads::StatusEvent;
pub use timing::MonotonicClock;
