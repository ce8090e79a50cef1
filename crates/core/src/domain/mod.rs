pub mod item;
pub mod order;
