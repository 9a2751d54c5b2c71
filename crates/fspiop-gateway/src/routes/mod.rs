pub mod health;
pub mod participants;
pub mod parties;
pub mod transfers;
