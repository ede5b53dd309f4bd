pub mod config;
pub mod doctor;
pub mod ledger;
pub mod run;
