pub mod demos;
pub mod events;
pub mod region;
pub mod widget;
