pub mod earnings;
pub mod health;
pub mod months;
