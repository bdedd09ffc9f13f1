mod channel;
pub mod codec;
mod error;
pub mod termios;

pub use channel::PtyChannel;
pub use error::PtyError;
