pub mod history;
pub mod key;

pub use history::History;
pub use key::encode;
pub use key::encode_game;
pub use key::parse;
pub use key::Parsed;
