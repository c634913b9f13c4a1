// Models module for data structures
pub mod connection;
pub mod facts;
pub mod inventory;
pub mod module_args;
pub mod module_result;
