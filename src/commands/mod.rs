pub mod crypto;
pub mod vote;
