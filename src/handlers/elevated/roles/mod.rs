pub mod status; // GET /api/roles/status - dry-run reconciliation plan

pub use status::status;
