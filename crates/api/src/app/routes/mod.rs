pub mod balance;
pub mod locations;
pub mod movements;
pub mod products;
