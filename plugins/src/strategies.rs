pub mod multicast;
pub mod neighbor_discovery;
pub mod ping6;
pub mod router_discovery;
