mod session;
mod sign_in;
mod step_up;

pub use session::session_handler;
pub use sign_in::{login_handler, logout_handler, register_handler};
pub use step_up::mfa_verify_handler;
