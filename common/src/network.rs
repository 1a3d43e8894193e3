pub mod address;
pub mod interface;
pub mod mac;
pub mod node;
