pub mod auth;
pub mod bounds;
pub mod colors;
pub mod display;
pub mod form;
pub mod mock;
pub mod venue;
pub mod wire;

pub use bounds::*;
pub use colors::category_color;
pub use venue::*;
