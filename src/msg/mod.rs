// Msg module - the custody transaction messages
// Wire envelopes, typed commands, effect payloads, codec and stateless validation

mod builder;
mod codec;
mod effect;
mod model;
mod validator;

pub use builder::*;
pub use codec::*;
pub use effect::*;
pub use model::*;
pub use validator::*;
