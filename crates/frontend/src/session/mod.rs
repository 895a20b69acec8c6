//! Client-side session: state, HTTP access and the Yew context around them.

pub mod api;
pub mod context;
pub mod provider;
pub mod state;

pub use context::Session;
pub use provider::{use_session, UserContextProvider};
pub use state::{FormField, SessionState, ToastKind};
