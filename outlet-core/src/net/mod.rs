//! Address leasing and name publication for the soft access point.
//!
//! Clients joining the access point get an address from the [`dhcp`] lease
//! server and find the dashboard by name through the [`mdns`] records. The
//! protocol work is done by `edge-dhcp` and `edge-mdns`; this module pins down
//! what the device hands out and advertises so the firmware tasks stay thin.

pub mod dhcp;
pub mod mdns;
