pub mod action;
pub mod game;
pub mod menu;
pub mod odds;
pub mod position;
pub mod seat;
pub mod showdown;
pub mod table;
pub mod turn;

pub use action::AbstractAction;
pub use action::ActionTable;
pub use game::Action;
pub use game::Game;
pub use menu::MenuTable;
pub use odds::Odds;
pub use position::positions;
pub use position::Position;
pub use seat::Seat;
pub use table::TableState;
pub use turn::Turn;
