pub mod logging;
pub mod response;
pub mod session;
pub mod text;
