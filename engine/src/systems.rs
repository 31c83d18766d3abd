pub mod abilities;
pub mod advance;
pub mod ai;
pub mod attacks;
pub mod collision;
pub mod movement;
pub mod outcome;
pub mod perception;

pub use movement::step_toward;
