mod message;
mod patterns;

pub use message::Message;
pub use patterns::channel_matches;
