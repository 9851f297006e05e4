pub mod links;
pub mod table;
