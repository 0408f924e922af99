pub mod gift;
pub mod order;
pub mod promo;
pub mod review;
pub mod wallet;
