pub mod gifts;
pub mod orders;
pub mod wallet;
