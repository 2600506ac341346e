// handlers/public/mod.rs - Public handlers (no authentication required)

pub mod ensure_admin; // GET /ensure-admin - run role reconciliation
pub mod service;      // GET /, GET /health, 404 fallback

pub use ensure_admin::ensure_admin;
pub use service::{health, not_found, root};
