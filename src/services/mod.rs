pub mod alerts;
pub mod ledger;
pub mod registry;
pub mod reports;
