pub mod gifts;
pub mod orders;
pub mod promos;
pub mod topups;
pub mod wallets;
