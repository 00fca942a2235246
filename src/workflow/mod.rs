pub mod screening_flow;
pub mod session;
pub mod session_ctx;

pub use screening_flow::ScreeningFlow;
pub use session::{SessionState, TestSession};
pub use session_ctx::SessionCtx;
