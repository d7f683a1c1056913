//*** START FILE: src/parsing/mod.rs ***//
pub mod translate_response;

pub use translate_response::parse_translation;
//*** END FILE: src/parsing/mod.rs ***//
