pub mod state;
pub mod tool_events;
pub mod turn;
