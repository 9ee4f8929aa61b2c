// LinkedIn bridge: OAuth sign-in, profile snapshots, and URL-based enrichment.

pub mod enrichment;
pub mod handlers;
pub mod oauth;
pub mod state_store;
